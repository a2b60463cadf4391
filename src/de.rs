//! Decode JSON into `Record`s by walking a `SynthesizedType`.
//!
//! Keys are matched against declared field names without allocating; unknown
//! keys are skipped, missing or repeated ones are errors, like a derived
//! `Deserialize` on a hand-written struct.
use std::fmt;
use std::io;
use std::sync::Arc;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::error::DecodeError;
use crate::ir::{FieldTy, SynthesizedType};
use crate::path_de::seed_from_reader_with_path;
use crate::record::{FieldValue, Record};

/// Decode a JSON array of objects into records of `ty`.
pub fn decode_records<R: io::Read>(ty: &Arc<SynthesizedType>, reader: R) -> Result<Vec<Record>, DecodeError> {
    let mut out = Vec::new();
    for_each_record(ty, reader, |record| out.push(record))?;
    Ok(out)
}

/// Stream a JSON array, handing each record to `sink` as soon as it is complete.
/// Returns how many records were seen.
pub fn for_each_record<R, F>(ty: &Arc<SynthesizedType>, reader: R, sink: F) -> Result<usize, DecodeError>
where
    R: io::Read,
    F: FnMut(Record),
{
    seed_from_reader_with_path(SeqSeed { ty, sink }, reader)
}

/// Decode a single JSON object into a record of `ty`.
pub fn decode_record<R: io::Read>(ty: &Arc<SynthesizedType>, reader: R) -> Result<Record, DecodeError> {
    seed_from_reader_with_path(RecordSeed::new(ty), reader)
}

#[derive(Clone, Copy)]
pub struct RecordSeed<'a> {
    ty: &'a Arc<SynthesizedType>,
}

impl<'a> RecordSeed<'a> {
    pub fn new(ty: &'a Arc<SynthesizedType>) -> Self {
        Self { ty }
    }
}

impl<'de, 'a> DeserializeSeed<'de> for RecordSeed<'a> {
    type Value = Record;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a> Visitor<'de> for RecordSeed<'a> {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an object of type {}", self.ty.name())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut slots: Vec<Option<FieldValue>> = vec![None; self.ty.len()];
        while let Some(key) = map.next_key_seed(KeySeed { ty: self.ty })? {
            match key {
                Some((index, name, field_ty)) => {
                    if slots[index].is_some() {
                        return Err(de::Error::custom(format_args!("duplicate field `{name}`")));
                    }
                    slots[index] = Some(map.next_value_seed(FieldSeed { ty: field_ty })?);
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        let mut values = Vec::with_capacity(slots.len());
        for ((name, _), slot) in self.ty.fields().zip(slots) {
            match slot {
                Some(value) => values.push(value),
                None => return Err(de::Error::custom(format_args!("missing field `{name}`"))),
            }
        }
        Ok(Record::from_parts(Arc::clone(self.ty), values))
    }
}

/// Resolves an object key to the field it names, if any.
struct KeySeed<'a> {
    ty: &'a SynthesizedType,
}

impl<'de, 'a> DeserializeSeed<'de> for KeySeed<'a> {
    type Value = Option<(usize, &'a str, &'a FieldTy)>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(self)
    }
}

impl<'de, 'a> Visitor<'de> for KeySeed<'a> {
    type Value = Option<(usize, &'a str, &'a FieldTy)>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a field name")
    }

    fn visit_str<E: de::Error>(self, key: &str) -> Result<Self::Value, E> {
        Ok(self.ty.lookup(key))
    }
}

struct FieldSeed<'a> {
    ty: &'a FieldTy,
}

impl<'de, 'a> DeserializeSeed<'de> for FieldSeed<'a> {
    type Value = FieldValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        match self.ty {
            FieldTy::String => String::deserialize(deserializer).map(FieldValue::String),
            FieldTy::Number => f64::deserialize(deserializer).map(FieldValue::Number),
            FieldTy::Bool => bool::deserialize(deserializer).map(FieldValue::Bool),
            FieldTy::Date => crate::date::text::deserialize(deserializer).map(FieldValue::Date),
            FieldTy::Seq(elem) => {
                let mut items = Vec::new();
                deserializer.deserialize_seq(SeqSeed { ty: elem, sink: |r| items.push(r) })?;
                Ok(FieldValue::Seq(items))
            }
        }
    }
}

/// Array of records; each element goes to `sink` as soon as it is decoded.
struct SeqSeed<'a, F> {
    ty: &'a Arc<SynthesizedType>,
    sink: F,
}

impl<'de, 'a, F: FnMut(Record)> DeserializeSeed<'de> for SeqSeed<'a, F> {
    type Value = usize;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, 'a, F: FnMut(Record)> Visitor<'de> for SeqSeed<'a, F> {
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an array of {}", self.ty.name())
    }

    fn visit_seq<A: SeqAccess<'de>>(mut self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut count = 0usize;
        while let Some(record) = seq.next_element_seed(RecordSeed::new(self.ty))? {
            (self.sink)(record);
            count += 1;
        }
        Ok(count)
    }
}

// ------------------------------- Tests ------------------------------------ //
