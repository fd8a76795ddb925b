//! The content envelope persisted on a medical record.
//!
//! The envelope is a JSON object of named *slices*. Each slice is owned by one editor:
//! `filled_forms` by the attendance editor, `mealPlan` by the meal-plan editor. Slices the
//! current writer does not own are carried through untouched.

use crate::constants::FILLED_FORMS_SLICE;
use crate::error::{ClinicError, ClinicResult};
use crate::models::template::TemplateId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A typed slice of the content envelope, stored under [`ContentSlice::KEY`].
pub trait ContentSlice: Serialize + DeserializeOwned {
    const KEY: &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContentEnvelope(Map<String, Value>);

impl<'de> Deserialize<'de> for ContentEnvelope {
    // Records written before any slice existed carry `content: null`.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Self(map.unwrap_or_default()))
    }
}

impl ContentEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Overwrites one slice with an already-serialised value.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Reads a typed slice. Absent or `null` slices read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidSlice`] if the stored value does not match the slice type.
    pub fn slice<S: ContentSlice>(&self) -> ClinicResult<Option<S>> {
        match self.0.get(S::KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => S::deserialize(value)
                .map(Some)
                .map_err(|source| ClinicError::InvalidSlice {
                    slice: S::KEY,
                    source,
                }),
        }
    }

    /// Overwrites a typed slice, leaving every other slice untouched.
    pub fn set_slice<S: ContentSlice>(&mut self, slice: &S) -> ClinicResult<()> {
        let value = serde_json::to_value(slice).map_err(ClinicError::Serialization)?;
        self.0.insert(S::KEY.to_string(), value);
        Ok(())
    }

    /// Envelope holding exactly one slice.
    pub fn with_only<S: ContentSlice>(slice: &S) -> ClinicResult<Self> {
        let mut envelope = Self::new();
        envelope.set_slice(slice)?;
        Ok(envelope)
    }

    /// Copy of `self` with each of `owned` overwritten; other slices survive.
    pub fn merged(&self, owned: &Map<String, Value>) -> Self {
        let mut merged = self.clone();
        for (key, value) in owned {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ContentEnvelope {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(feature = "openapi")]
impl<'s> utoipa::ToSchema<'s> for ContentEnvelope {
    fn schema() -> (
        &'s str,
        utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
    ) {
        let object = utoipa::openapi::ObjectBuilder::new()
            .description(Some(
                "Named content slices, e.g. `filled_forms` and `mealPlan`",
            ))
            .build();
        (
            "ContentEnvelope",
            utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object)),
        )
    }
}

/// One dynamic document as persisted in the `filled_forms` slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledForm {
    pub template_id: TemplateId,
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: String,
    #[serde(default)]
    pub data: Value,
    /// When the enclosing save composed this entry; not the first-fill time.
    ///
    /// Restamped on every save, so a missing or unreadable stamp reads as `None` rather than
    /// failing the whole slice.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub filled_at: Option<DateTime<Utc>>,
}

fn lenient_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilledForms(pub Vec<FilledForm>);

impl ContentSlice for FilledForms {
    const KEY: &'static str = FILLED_FORMS_SLICE;
}

impl FilledForms {
    pub fn iter(&self) -> impl Iterator<Item = &FilledForm> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
