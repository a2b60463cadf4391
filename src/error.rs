//! Error types shared by synthesis, decoding and transport.
use thiserror::Error;

use crate::ir::FieldKind;

/// Failure of a single `synthesize` call. No partial type is ever returned alongside one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("invalid type identifier: {name:?}")]
    InvalidIdentifier { name: String },

    #[error("property `{property}` has unsupported type `{kind}`")]
    UnsupportedPropertyType { property: String, kind: String },

    #[error("malformed schema at `{path}`: {reason}")]
    MalformedSchema { path: String, reason: String },
}

/// JSON could not be decoded into the requested shape.
#[derive(Error, Debug)]
#[error("at JSON path {path} → {message}")]
pub struct DecodeError {
    pub path: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: reqwest::StatusCode },
}

/// Error of the schema transport adapter: either the bytes never arrived or they did not decode.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(TransportError::Request(err))
    }
}

/// Fetching a schema and synthesizing its type in one step.
#[derive(Error, Debug)]
pub enum RemoteTypeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Misuse of the accessors on a synthesized record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("type `{type_name}` has no field `{field}`")]
    UnknownField { type_name: String, field: String },

    #[error("field `{field}` holds {expected}, got {found}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },
}
