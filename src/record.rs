//! Instances of a `SynthesizedType`.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::date::{self, DateTimeValue};
use crate::error::AccessError;
use crate::ir::{FieldKind, FieldTy, SynthesizedType};

/// One value per declared field, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: Arc<SynthesizedType>,
    values: Vec<FieldValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Date(DateTimeValue),
    Bool(bool),
    Seq(Vec<Record>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Date(_) => FieldKind::Date,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Seq(_) => FieldKind::Seq,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTimeValue> {
        match self {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Record]> {
        match self {
            FieldValue::Seq(items) => Some(items),
            _ => None,
        }
    }

    fn default_for(ty: &FieldTy) -> Self {
        match ty {
            FieldTy::String => FieldValue::String(String::new()),
            FieldTy::Number => FieldValue::Number(0.0),
            FieldTy::Date => FieldValue::Date(DateTime::<Utc>::UNIX_EPOCH.fixed_offset()),
            FieldTy::Bool => FieldValue::Bool(false),
            FieldTy::Seq(_) => FieldValue::Seq(Vec::new()),
        }
    }
}

impl SynthesizedType {
    /// A record with every field at its default value.
    pub fn instantiate(self: &Arc<Self>) -> Record {
        let values = self.fields().map(|(_, ty)| FieldValue::default_for(ty)).collect();
        Record { ty: Arc::clone(self), values }
    }
}

impl Record {
    /// Caller guarantees `values` lines up with `ty`'s fields.
    pub(crate) fn from_parts(ty: Arc<SynthesizedType>, values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(ty.len(), values.len());
        Self { ty, values }
    }

    pub fn ty(&self) -> &Arc<SynthesizedType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.ty.index_of(name).map(|i| &self.values[i])
    }

    /// Replace a field's value, returning the old one.
    ///
    /// The value must have the field's kind; sequences must hold records of
    /// the field's element type.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<FieldValue, AccessError> {
        let Some((index, _, field_ty)) = self.ty.lookup(name) else {
            return Err(AccessError::UnknownField {
                type_name: self.ty.name().to_owned(),
                field: name.to_owned(),
            });
        };
        let mismatch = || AccessError::KindMismatch {
            field: name.to_owned(),
            expected: field_ty.kind(),
            found: value.kind(),
        };
        if field_ty.kind() != value.kind() {
            return Err(mismatch());
        }
        if let (FieldTy::Seq(elem), FieldValue::Seq(items)) = (field_ty, &value) {
            if items.iter().any(|item| !Arc::ptr_eq(&item.ty, elem) && *item.ty != **elem) {
                return Err(mismatch());
            }
        }
        Ok(std::mem::replace(&mut self.values[index], value))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.ty.fields().map(|(name, _)| name).zip(self.values.iter())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Date(d) => serializer.serialize_str(&date::format(d)),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Seq(items) => serializer.collect_seq(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyType, Schema, SchemaProperty};
    use crate::synth::synthesize;

    fn person() -> Arc<SynthesizedType> {
        synthesize(&Schema::new(
            "Person",
            vec![
                SchemaProperty::scalar("id", PropertyType::Number),
                SchemaProperty::scalar("born", PropertyType::Date),
                SchemaProperty::array("tags", vec![SchemaProperty::scalar("label", PropertyType::String)]),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn instantiate_uses_defaults() {
        let rec = person().instantiate();
        assert_eq!(rec.type_name(), "Person");
        assert_eq!(rec.get("id"), Some(&FieldValue::Number(0.0)));
        assert_eq!(rec.get("born").and_then(FieldValue::as_date).map(|d| d.timestamp()), Some(0));
        assert_eq!(rec.get("tags").and_then(FieldValue::as_seq).map(<[Record]>::len), Some(0));
        assert_eq!(rec.get("missing"), None);
    }

    #[test]
    fn set_checks_names_and_kinds() {
        let ty = person();
        let mut rec = ty.instantiate();
        assert_eq!(rec.set("id", FieldValue::Number(7.0)), Ok(FieldValue::Number(0.0)));
        assert_eq!(rec.get("id").and_then(FieldValue::as_f64), Some(7.0));

        assert_eq!(
            rec.set("id", FieldValue::Bool(true)),
            Err(AccessError::KindMismatch {
                field: "id".into(),
                expected: FieldKind::Number,
                found: FieldKind::Bool,
            })
        );
        assert!(matches!(
            rec.set("nope", FieldValue::Bool(true)),
            Err(AccessError::UnknownField { .. })
        ));

        // a Person is not a Person_tags
        let wrong_elem = FieldValue::Seq(vec![ty.instantiate()]);
        assert!(rec.set("tags", wrong_elem).is_err());

        let tag_ty = ty.field("tags").and_then(FieldTy::element).unwrap();
        let mut tag = tag_ty.instantiate();
        tag.set("label", FieldValue::String("x".into())).unwrap();
        rec.set("tags", FieldValue::Seq(vec![tag])).unwrap();
        assert_eq!(rec.get("tags").and_then(FieldValue::as_seq).map(<[Record]>::len), Some(1));
    }

    #[test]
    fn serializes_in_declaration_order() {
        let ty = person();
        let mut rec = ty.instantiate();
        rec.set("id", FieldValue::Number(1.5)).unwrap();
        let text = serde_json::to_string(&rec).unwrap();
        assert_eq!(text, r#"{"id":1.5,"born":"1970-01-01T00:00:00+00:00","tags":[]}"#);
    }
}
