//! Runtime type synthesis from declarative record schemas, plus the harness
//! that compares it against map, dynamic and static JSON decoding.
pub mod schema;
pub mod ir;
pub mod synth;
pub mod record;
pub mod de;
pub mod date;
pub mod path_de;
pub mod error;
pub mod transport;
pub mod compare;
pub mod cli;

pub use error::{DecodeError, FetchError, SynthesisError, TransportError};
pub use ir::{FieldKind, FieldTy, SynthesizedType};
pub use record::{FieldValue, Record};
pub use schema::{PropertyType, Schema, SchemaProperty};
pub use synth::synthesize;
