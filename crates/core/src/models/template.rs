//! Document templates as published by the catalog.

use crate::models::schema::FormSchema;
use chrono::{DateTime, Utc};
use clinica_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity of a template in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TemplateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How a template is rendered. Only `Dynamic` templates go through the schema-driven renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TemplateKind {
    #[default]
    Dynamic,
    Static,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

fn default_active() -> bool {
    true
}

/// A clinic-defined document schema with its catalog metadata.
///
/// Immutable once fetched; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Template {
    pub id: TemplateId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: TemplateKind,
    /// Lowercase specialty keywords, matched as substrings of a user's specialty.
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default = "empty_object")]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub schema_config: Value,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Template {
    /// A dynamic template with no specialties and an empty schema.
    pub fn new(id: impl Into<TemplateId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            kind: TemplateKind::Dynamic,
            specialties: Vec::new(),
            schema_config: empty_object(),
            active: true,
            created_at: None,
        }
    }

    pub fn with_specialties<I, S>(mut self, specialties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specialties = specialties.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schema(mut self, schema_config: Value) -> Self {
        self.schema_config = schema_config;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == TemplateKind::Dynamic
    }

    /// Typed view of `schema_config`.
    ///
    /// A config that does not describe sections yields an empty schema, so data for the template
    /// is only checked for being a JSON object.
    pub fn form_schema(&self) -> FormSchema {
        match FormSchema::from_config(&self.schema_config) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(
                    template_id = %self.id,
                    "schema_config does not describe form sections: {e}"
                );
                FormSchema::default()
            }
        }
    }
}

/// Request body for creating or replacing a catalog template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewTemplate {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub title: NonEmptyText,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: TemplateKind,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default = "empty_object")]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub schema_config: Value,
}
