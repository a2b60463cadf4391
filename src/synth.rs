//! Schema → `SynthesizedType`.
//!
//! One call, one private namespace:
//! - the root takes the schema's name;
//! - every Array property gets an element type named `<enclosing>_<property>`;
//! - `<enclosing>_<property>` is not injective (`A`+`b_c` vs `A_b`+`c`), so a
//!   name already taken in this call gets `_2`, `_3`, … in traversal order.
//!
//! Names depend only on the schema's structure. Nothing is cached between calls.
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::SynthesisError;
use crate::ir::{FieldTy, SynthesizedType};
use crate::schema::{PropertyType, Schema, SchemaProperty};

/// Joins an enclosing type name and an array property name.
pub const SEPARATOR: &str = "_";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*$").expect("identifier pattern is valid"));

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Build the composite type described by `schema`.
///
/// The schema is only borrowed; the returned type owns copies of every name.
pub fn synthesize(schema: &Schema) -> Result<Arc<SynthesizedType>, SynthesisError> {
    check_identifier(&schema.name)?;

    // reject unknown kinds before allocating anything
    for prop in schema.visit() {
        if let PropertyType::Other(raw) = &prop.kind {
            return Err(SynthesisError::UnsupportedPropertyType {
                property: prop.name.clone(),
                kind: raw.clone(),
            });
        }
    }

    let mut names = Namespace::default();
    names.taken.insert(schema.name.clone());
    let ty = build(&mut names, schema.name.clone(), &schema.name, &schema.properties)?;
    debug!(root = %schema.name, types = names.taken.len(), "synthesized schema");
    Ok(ty)
}

#[derive(Default)]
struct Namespace {
    taken: HashSet<String>,
}

impl Namespace {
    fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}{SEPARATOR}{n}");
            if self.taken.insert(candidate.clone()) {
                warn!(derived = %base, renamed = %candidate, "element type name collision");
                return candidate;
            }
            n += 1;
        }
    }
}

fn build(
    names: &mut Namespace,
    type_name: String,
    path: &str,
    props: &[SchemaProperty],
) -> Result<Arc<SynthesizedType>, SynthesisError> {
    let mut fields = IndexMap::with_capacity(props.len());
    for prop in props {
        let field_path = format!("{path}.{}", prop.name);
        if prop.name.is_empty() {
            return Err(SynthesisError::InvalidIdentifier { name: field_path });
        }
        if fields.contains_key(&prop.name) {
            return Err(SynthesisError::MalformedSchema {
                path: field_path,
                reason: "duplicate property name".into(),
            });
        }
        let ty = match &prop.kind {
            PropertyType::String => FieldTy::String,
            PropertyType::Number => FieldTy::Number,
            PropertyType::Date => FieldTy::Date,
            PropertyType::Bool => FieldTy::Bool,
            PropertyType::Array => {
                if prop.properties.is_empty() {
                    return Err(SynthesisError::MalformedSchema {
                        path: field_path,
                        reason: "array property declares no element properties".into(),
                    });
                }
                let derived = format!("{type_name}{SEPARATOR}{}", prop.name);
                check_identifier(&derived)?;
                let elem_name = names.claim(derived);
                FieldTy::Seq(build(names, elem_name, &field_path, &prop.properties)?)
            }
            PropertyType::Other(raw) => {
                return Err(SynthesisError::UnsupportedPropertyType {
                    property: prop.name.clone(),
                    kind: raw.clone(),
                });
            }
        };
        fields.insert(prop.name.clone(), ty);
    }
    debug!(type_name = %type_name, fields = fields.len(), "built type");
    Ok(Arc::new(SynthesizedType::new(type_name, fields)))
}

fn check_identifier(name: &str) -> Result<(), SynthesisError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SynthesisError::InvalidIdentifier { name: name.to_owned() })
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FieldKind;
    use serde_json::json;

    fn schema(v: serde_json::Value) -> Schema {
        serde_json::from_value(v).unwrap()
    }

    fn nested_schema() -> Schema {
        schema(json!({
            "name": "A",
            "properties": [
                { "name": "x", "type": "Number" },
                { "name": "b", "type": "Array", "properties": [
                    { "name": "y", "type": "String" },
                    { "name": "c", "type": "Array", "properties": [
                        { "name": "z", "type": "Bool" },
                        { "name": "when", "type": "Date" }
                    ]}
                ]}
            ]
        }))
    }

    #[test]
    fn flat_schema_maps_scalar_kinds() {
        let s = schema(json!({
            "name": "Flat",
            "properties": [
                { "name": "s", "type": "String" },
                { "name": "n", "type": "Number" },
                { "name": "d", "type": "Date" },
                { "name": "b", "type": "Bool" }
            ]
        }));
        let ty = synthesize(&s).unwrap();
        assert_eq!(ty.name(), "Flat");
        let fields = ty.fields().map(|(n, t)| (n.to_owned(), t.kind())).collect::<Vec<_>>();
        assert_eq!(
            fields,
            vec![
                ("s".to_owned(), FieldKind::String),
                ("n".to_owned(), FieldKind::Number),
                ("d".to_owned(), FieldKind::Date),
                ("b".to_owned(), FieldKind::Bool),
            ]
        );
        assert_eq!(ty.types().len(), 1);
    }

    #[test]
    fn nested_arrays_yield_depth_plus_one_types() {
        let s = nested_schema();
        let ty = synthesize(&s).unwrap();
        let names = ty.types().iter().map(|t| t.name().to_owned()).collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "A_b", "A_b_c"]);
        assert_eq!(names.len(), s.depth() + 1);

        let b = ty.field("b").and_then(FieldTy::element).unwrap();
        assert_eq!(b.name(), "A_b");
        let c = b.field("c").and_then(FieldTy::element).unwrap();
        assert_eq!(c.name(), "A_b_c");
        assert_eq!(c.field("when"), Some(&FieldTy::Date));
    }

    #[test]
    fn empty_array_properties_is_malformed() {
        let s = schema(json!({
            "name": "A",
            "properties": [{ "name": "b", "type": "Array", "properties": [] }]
        }));
        match synthesize(&s) {
            Err(SynthesisError::MalformedSchema { path, .. }) => assert_eq!(path, "A.b"),
            other => panic!("unexpected: {other:?}"),
        }
        let absent = schema(json!({
            "name": "A",
            "properties": [{ "name": "b", "type": "Array" }]
        }));
        assert!(matches!(synthesize(&absent), Err(SynthesisError::MalformedSchema { .. })));
    }

    #[test]
    fn properties_under_a_scalar_are_ignored() {
        let s = schema(json!({
            "name": "Row",
            "properties": [
                { "name": "x", "type": "String", "properties": [
                    { "name": "p", "type": "Currency" }
                ]}
            ]
        }));
        let ty = synthesize(&s).unwrap();
        assert_eq!(ty.name(), "Row");
        assert_eq!(ty.len(), 1);
        assert_eq!(ty.field("x").map(FieldTy::kind), Some(FieldKind::String));
        assert_eq!(ty.types().len(), 1);
    }

    #[test]
    fn unknown_kind_is_rejected_not_defaulted() {
        let s = schema(json!({
            "name": "Order",
            "properties": [
                { "name": "lines", "type": "Array", "properties": [
                    { "name": "price", "type": "Currency" }
                ]}
            ]
        }));
        assert_eq!(
            synthesize(&s),
            Err(SynthesisError::UnsupportedPropertyType {
                property: "price".into(),
                kind: "Currency".into(),
            })
        );
    }

    #[test]
    fn illegal_names_are_rejected_at_any_level() {
        let root = Schema::new("9lives", vec![]);
        assert!(matches!(synthesize(&root), Err(SynthesisError::InvalidIdentifier { .. })));

        let empty = Schema::new("", vec![]);
        assert!(matches!(synthesize(&empty), Err(SynthesisError::InvalidIdentifier { .. })));

        let nested = Schema::new(
            "Ok",
            vec![SchemaProperty::array(
                "bad-name",
                vec![SchemaProperty::scalar("x", PropertyType::Bool)],
            )],
        );
        assert_eq!(
            synthesize(&nested),
            Err(SynthesisError::InvalidIdentifier { name: "Ok_bad-name".into() })
        );
    }

    #[test]
    fn scalar_field_names_only_need_to_be_non_empty() {
        let s = Schema::new("Row", vec![SchemaProperty::scalar("first-name", PropertyType::String)]);
        let ty = synthesize(&s).unwrap();
        assert_eq!(ty.field("first-name"), Some(&FieldTy::String));
    }

    #[test]
    fn duplicate_property_is_malformed() {
        let s = Schema::new(
            "Row",
            vec![
                SchemaProperty::scalar("a", PropertyType::String),
                SchemaProperty::scalar("a", PropertyType::Number),
            ],
        );
        assert!(matches!(synthesize(&s), Err(SynthesisError::MalformedSchema { .. })));
    }

    #[test]
    fn colliding_derived_names_stay_unique() {
        // A.b_c → "A_b_c" and A.b.c → "A_b" + "c" → "A_b_c"
        let leaf = || vec![SchemaProperty::scalar("v", PropertyType::Number)];
        let s = Schema::new(
            "A",
            vec![
                SchemaProperty::array("b_c", leaf()),
                SchemaProperty::array("b", vec![SchemaProperty::array("c", leaf())]),
            ],
        );
        let ty = synthesize(&s).unwrap();
        let names = ty.types().iter().map(|t| t.name().to_owned()).collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "A_b_c", "A_b", "A_b_c_2"]);

        // deterministic across calls
        let again = synthesize(&s).unwrap();
        assert_eq!(*ty, *again);
    }

    #[test]
    fn identical_schemas_give_equivalent_types() {
        let a = synthesize(&nested_schema()).unwrap();
        let b = synthesize(&nested_schema()).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
        let shape = |t: &SynthesizedType| {
            t.fields().map(|(n, f)| (n.to_owned(), f.kind())).collect::<Vec<_>>()
        };
        assert_eq!(shape(&a), shape(&b));
    }

    #[test]
    fn concurrent_synthesis_is_independent() {
        let s = nested_schema();
        let expected = synthesize(&s).unwrap();
        std::thread::scope(|scope| {
            let handles = (0..8).map(|_| scope.spawn(|| synthesize(&s))).collect::<Vec<_>>();
            for h in handles {
                let ty = h.join().unwrap().unwrap();
                assert_eq!(*ty, *expected);
            }
        });
    }

    #[test]
    fn input_schema_is_left_untouched() {
        let s = nested_schema();
        let before = s.clone();
        let _ = synthesize(&s).unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn render_lists_every_type() {
        let ty = synthesize(&nested_schema()).unwrap();
        let text = ty.render();
        assert!(text.contains("struct A {\n    x: f64,\n    b: Vec<A_b>,\n}"));
        assert!(text.contains("struct A_b_c {"));
        assert!(text.contains("when: DateTime<FixedOffset>,"));
    }
}
