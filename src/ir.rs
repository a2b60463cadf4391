// Shape IR produced by the synthesizer. No serde_json::Value here.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// A composite type built at runtime from a `Schema`.
///
/// Instances are `Record`s; the seeds in `crate::de` walk this description to
/// populate them straight from JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedType {
    name: String,
    fields: IndexMap<String, FieldTy>, // declaration order == schema order
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldTy {
    String,
    Number,                        // f64
    Date,                          // chrono::DateTime<FixedOffset>
    Bool,
    Seq(Arc<SynthesizedType>),     // array of a nested element type
}

/// Storage kind of a field or value, without the element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Date,
    Bool,
    Seq,
}

impl FieldTy {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldTy::String => FieldKind::String,
            FieldTy::Number => FieldKind::Number,
            FieldTy::Date => FieldKind::Date,
            FieldTy::Bool => FieldKind::Bool,
            FieldTy::Seq(_) => FieldKind::Seq,
        }
    }

    pub fn element(&self) -> Option<&Arc<SynthesizedType>> {
        match self {
            FieldTy::Seq(elem) => Some(elem),
            _ => None,
        }
    }

    fn storage(&self) -> String {
        match self {
            FieldTy::String => "String".into(),
            FieldTy::Number => "f64".into(),
            FieldTy::Date => "DateTime<FixedOffset>".into(),
            FieldTy::Bool => "bool".into(),
            FieldTy::Seq(elem) => format!("Vec<{}>", elem.name),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Date => "a date-time",
            FieldKind::Bool => "a boolean",
            FieldKind::Seq => "a sequence",
        })
    }
}

impl SynthesizedType {
    pub(crate) fn new(name: String, fields: IndexMap<String, FieldTy>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldTy)> + '_ {
        self.fields.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn field(&self, name: &str) -> Option<&FieldTy> {
        self.fields.get(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    /// Position, declared name and type of `name`.
    pub fn lookup(&self, name: &str) -> Option<(usize, &str, &FieldTy)> {
        self.fields.get_full(name).map(|(i, key, ty)| (i, key.as_str(), ty))
    }

    pub fn field_at(&self, index: usize) -> Option<(&str, &FieldTy)> {
        self.fields.get_index(index).map(|(name, ty)| (name.as_str(), ty))
    }

    /// This type followed by every nested element type, depth-first.
    pub fn types(&self) -> Vec<&SynthesizedType> {
        let mut out = vec![self];
        for ty in self.fields.values() {
            if let FieldTy::Seq(elem) = ty {
                out.extend(elem.types());
            }
        }
        out
    }

    /// Declaration-style listing of this type and its nested element types.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, ty) in self.types().into_iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("struct {} {{\n", ty.name));
            for (name, field) in &ty.fields {
                out.push_str(&format!("    {name}: {},\n", field.storage()));
            }
            out.push_str("}\n");
        }
        out
    }
}

impl fmt::Display for SynthesizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
