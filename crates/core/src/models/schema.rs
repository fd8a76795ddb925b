//! Typed form schema and instance validation.
//!
//! A template's `schema_config` describes sections of fields consumed by the form renderer.
//! The core never renders fields, but it checks filled data against the declared field types
//! whenever an instance enters the store, so malformed payloads are rejected at the boundary
//! instead of being persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Textarea,
    Select,
    Date,
    /// Any field type this core does not know; values are not checked.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub sections: Vec<FormSection>,
}

/// One field whose value does not match its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Joins violations into one human-readable line.
pub fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormSchema {
    pub fn from_config(config: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(config)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Checks `data` against the declared fields.
    ///
    /// `data` must be a JSON object. Undeclared keys and `null` values pass; `required` is not
    /// enforced because instances are validated on every edit, while they are still incomplete.
    pub fn validate(&self, data: &Value) -> Result<(), Vec<FieldViolation>> {
        let Some(object) = data.as_object() else {
            return Err(vec![FieldViolation {
                field: "$".into(),
                reason: "document data must be a JSON object".into(),
            }]);
        };

        let violations: Vec<FieldViolation> = self
            .fields()
            .filter_map(|field| {
                let value = object.get(&field.name)?;
                check_field(field, value).err().map(|reason| FieldViolation {
                    field: field.name.clone(),
                    reason,
                })
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_field(field: &FormField, value: &Value) -> Result<(), String> {
    if value.is_null() {
        return Ok(());
    }

    match field.field_type {
        FieldType::Text | FieldType::Textarea => match value {
            Value::String(_) => Ok(()),
            _ => Err("expected text".into()),
        },
        FieldType::Number => match value {
            Value::Number(_) => Ok(()),
            Value::String(s)
                if s.trim().is_empty()
                    || s.trim().parse::<f64>().is_ok_and(|n| n.is_finite()) =>
            {
                Ok(())
            }
            _ => Err("expected a number".into()),
        },
        FieldType::Date => match value {
            Value::String(s) if s.is_empty() => Ok(()),
            Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| format!("expected a YYYY-MM-DD date, got '{s}'")),
            _ => Err("expected a date string".into()),
        },
        FieldType::Select => match (value, &field.options) {
            (Value::String(s), _) if s.is_empty() => Ok(()),
            (Value::String(s), Some(options)) if !options.iter().any(|o| o == s) => {
                Err(format!("'{s}' is not one of the allowed options"))
            }
            (Value::String(_), _) => Ok(()),
            _ => Err("expected one of the options".into()),
        },
        FieldType::Other => Ok(()),
    }
}
