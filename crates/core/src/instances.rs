//! Per-template document instances being filled in during one attendance.
//!
//! The store is keyed by template id and enforces last-write-wins: each edit replaces the whole
//! value for its template. Values are validated against the template's form schema on the way
//! in; a rejected edit leaves the previous value in place.

use crate::error::{ClinicError, ClinicResult};
use crate::models::schema::describe_violations;
use crate::models::{FilledForms, Template, TemplateId};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// A template's filled data.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInstance {
    pub template_id: TemplateId,
    pub data: Value,
}

/// Persisted entries that could not be restored cleanly on load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationReport {
    /// Entries whose template is no longer in the catalog. Skipped.
    pub orphaned: Vec<TemplateId>,
    /// Entries seeded despite not matching their template's current schema.
    pub invalid: Vec<TemplateId>,
}

impl HydrationReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.invalid.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DocumentInstances {
    values: HashMap<TemplateId, Value>,
}

impl DocumentInstances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces the value for `template`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInstance`] if `value` does not match the template's schema.
    pub fn set_value(&mut self, template: &Template, value: Value) -> ClinicResult<()> {
        if let Err(violations) = template.form_schema().validate(&value) {
            return Err(ClinicError::InvalidInstance {
                template_id: template.id.to_string(),
                violations: describe_violations(&violations),
            });
        }
        self.values.insert(template.id.clone(), value);
        Ok(())
    }

    pub fn get(&self, template_id: &TemplateId) -> Option<DocumentInstance> {
        self.values.get(template_id).map(|data| DocumentInstance {
            template_id: template_id.clone(),
            data: data.clone(),
        })
    }

    /// The value for `template_id`, or an empty object if nothing was entered.
    pub fn value_for(&self, template_id: &TemplateId) -> Value {
        self.values
            .get(template_id)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Drops the instance; reselecting the template later starts from an empty object.
    pub fn remove(&mut self, template_id: &TemplateId) -> Option<Value> {
        self.values.remove(template_id)
    }

    /// Drops every instance whose template is not in `keep`.
    pub fn retain<'a, I>(&mut self, keep: I)
    where
        I: IntoIterator<Item = &'a TemplateId>,
    {
        let keep: HashSet<&TemplateId> = keep.into_iter().collect();
        self.values.retain(|id, _| keep.contains(id));
    }

    /// Restores instances from a persisted `filled_forms` slice.
    ///
    /// Returns the templates to select, in persisted order. Entries naming a template that is
    /// not in `catalog` are never materialised. Data that no longer validates is still seeded.
    pub fn hydrate(
        &mut self,
        filled_forms: &FilledForms,
        catalog: &[Template],
    ) -> (Vec<Template>, HydrationReport) {
        let mut selected: Vec<Template> = Vec::new();
        let mut report = HydrationReport::default();

        for entry in filled_forms.iter() {
            let Some(template) = catalog.iter().find(|t| t.id == entry.template_id) else {
                tracing::warn!(
                    template_id = %entry.template_id,
                    "skipping persisted document for a template missing from the catalog"
                );
                report.orphaned.push(entry.template_id.clone());
                continue;
            };

            if !selected.iter().any(|t| t.id == template.id) {
                selected.push(template.clone());
            }

            // Null data means nothing was entered; the template composes as `{}`.
            if entry.data.is_null() {
                self.values.remove(&template.id);
                continue;
            }

            if let Err(violations) = template.form_schema().validate(&entry.data) {
                tracing::warn!(
                    template_id = %template.id,
                    "persisted document does not match its schema: {}",
                    describe_violations(&violations)
                );
                report.invalid.push(template.id.clone());
            }
            self.values.insert(template.id.clone(), entry.data.clone());
        }

        (selected, report)
    }
}
