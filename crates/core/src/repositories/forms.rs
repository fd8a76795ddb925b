//! Template catalog storage.
//!
//! Templates live as `<id>.json` under `clinic_data/templates/`. Deleting a template removes
//! its file; records that still reference it keep their data, and editors skip such entries as
//! orphans when restoring a selection.

use crate::config::CoreConfig;
use crate::error::{ClinicError, ClinicResult};
use crate::models::{NewTemplate, Template, TemplateId};
use crate::repositories::shared::{delete_json, list_json, read_json, write_json_atomic};
use chrono::Utc;
use clinica_uuid::UuidService;
use std::sync::Arc;

/// Service for managing the template catalog.
#[derive(Clone, Debug)]
pub struct FormsService {
    cfg: Arc<CoreConfig>,
}

impl FormsService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Adds a new active template with a freshly allocated id.
    ///
    /// Specialty keywords are trimmed, lower-cased and blanks are dropped, since matching
    /// compares them against a lower-cased specialty.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError` if the template file cannot be written.
    pub fn create_template(&self, new: NewTemplate) -> ClinicResult<Template> {
        let id = TemplateId::new(UuidService::new().to_string());
        let template = Template {
            id,
            title: new.title.into_inner(),
            description: new.description,
            kind: new.kind,
            specialties: normalise_keywords(new.specialties),
            schema_config: new.schema_config,
            active: true,
            created_at: Some(Utc::now()),
        };

        write_json_atomic(&self.cfg.templates_dir(), template.id.as_str(), &template)?;
        tracing::info!(template_id = %template.id, title = %template.title, "template created");
        Ok(template)
    }

    /// Every active template, oldest first (ties broken by id).
    pub fn list_templates(&self) -> Vec<Template> {
        let mut templates: Vec<Template> = list_json::<Template>(&self.cfg.templates_dir())
            .into_iter()
            .filter(|t| t.active)
            .collect();
        templates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        templates
    }

    /// # Errors
    ///
    /// Returns [`ClinicError::TemplateNotFound`] if no template has this id.
    pub fn get_template(&self, id: &str) -> ClinicResult<Template> {
        read_json(&self.cfg.templates_dir(), id)?
            .ok_or_else(|| ClinicError::TemplateNotFound(id.to_string()))
    }

    /// Replaces the editable fields of a template; id, `created_at` and `active` are kept.
    pub fn update_template(&self, id: &str, update: NewTemplate) -> ClinicResult<Template> {
        let mut template = self.get_template(id)?;
        template.title = update.title.into_inner();
        template.description = update.description;
        template.kind = update.kind;
        template.specialties = normalise_keywords(update.specialties);
        template.schema_config = update.schema_config;

        write_json_atomic(&self.cfg.templates_dir(), id, &template)?;
        tracing::info!(template_id = %template.id, "template updated");
        Ok(template)
    }

    /// # Errors
    ///
    /// Returns [`ClinicError::TemplateNotFound`] if no template has this id.
    pub fn delete_template(&self, id: &str) -> ClinicResult<()> {
        if !delete_json(&self.cfg.templates_dir(), id)? {
            return Err(ClinicError::TemplateNotFound(id.to_string()));
        }
        tracing::info!(template_id = id, "template deleted");
        Ok(())
    }
}

fn normalise_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}
