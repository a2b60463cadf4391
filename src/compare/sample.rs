//! The statically declared counterpart of the published sample schema.
use serde::{Deserialize, Serialize};

use crate::date::DateTimeValue;
use crate::record::Record;
use crate::schema::{PropertyType, Schema, SchemaProperty};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: f64,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    #[serde(with = "crate::date::text")]
    pub date_of_birth: DateTimeValue,
    pub dependents: Vec<Dependent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: String,
    pub name: String,
}

impl Employee {
    /// Schema the endpoint publishes for this record shape.
    pub fn schema() -> Schema {
        Schema::new(
            "Employee",
            vec![
                SchemaProperty::scalar("id", PropertyType::Number),
                SchemaProperty::scalar("firstName", PropertyType::String),
                SchemaProperty::scalar("lastName", PropertyType::String),
                SchemaProperty::scalar("jobTitle", PropertyType::String),
                SchemaProperty::scalar("dateOfBirth", PropertyType::Date),
                SchemaProperty::array(
                    "dependents",
                    vec![
                        SchemaProperty::scalar("id", PropertyType::String),
                        SchemaProperty::scalar("name", PropertyType::String),
                    ],
                ),
            ],
        )
    }
}

/// Index of the first position where the two decodings disagree, if any.
///
/// Both sides are re-encoded to JSON values and compared key by key, so field
/// order does not matter but every value does.
pub fn first_mismatch(records: &[Record], employees: &[Employee]) -> Result<Option<usize>, serde_json::Error> {
    if records.len() != employees.len() {
        return Ok(Some(records.len().min(employees.len())));
    }
    for (i, (record, employee)) in records.iter().zip(employees).enumerate() {
        if serde_json::to_value(record)? != serde_json::to_value(employee)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}
