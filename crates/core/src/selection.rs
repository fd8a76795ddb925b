//! Template picker: the user-editable selection of documents attached to an attendance.
//!
//! The picker holds a *working* selection of template ids, seeded from the templates already
//! attached to the record every time it is opened. Confirming materialises the selection in
//! catalog order; the picker keeps no ordering of its own.

use crate::client::TemplateCatalog;
use crate::matcher::is_recommended;
use crate::models::{Template, TemplateId};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
enum CatalogState {
    #[default]
    Closed,
    Loading,
    Ready(Vec<Template>),
}

/// One catalog template as shown in the picker.
#[derive(Debug, Clone, Copy)]
pub struct PickerEntry<'a> {
    pub template: &'a Template,
    pub selected: bool,
    pub recommended: bool,
}

#[derive(Debug, Default)]
pub struct TemplatePicker {
    catalog: CatalogState,
    selected: HashSet<TemplateId>,
}

impl TemplatePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the picker with exactly `initial_ids` selected and fetches the catalog.
    ///
    /// Unsaved toggles from a previous opening are discarded. If the catalog cannot be fetched
    /// the failure is logged and the picker stays loading; there is no retry.
    pub async fn open<I>(&mut self, catalog: &dyn TemplateCatalog, initial_ids: I)
    where
        I: IntoIterator<Item = TemplateId>,
    {
        self.selected = initial_ids.into_iter().collect();
        self.catalog = CatalogState::Loading;

        match catalog.list_templates().await {
            Ok(templates) => {
                tracing::debug!(count = templates.len(), "template catalog loaded");
                self.catalog = CatalogState::Ready(templates);
            }
            Err(e) => {
                tracing::error!("error loading templates: {e}");
            }
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.catalog, CatalogState::Closed)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.catalog, CatalogState::Loading)
    }

    /// Flips membership of `id` in the working selection.
    pub fn toggle(&mut self, id: &TemplateId) {
        if !self.selected.remove(id) {
            self.selected.insert(id.clone());
        }
    }

    pub fn is_selected(&self, id: &TemplateId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Catalog templates with their selection and recommendation flags, in catalog order.
    ///
    /// Empty while the catalog is not loaded.
    pub fn entries(&self, user_specialty: Option<&str>) -> Vec<PickerEntry<'_>> {
        let CatalogState::Ready(templates) = &self.catalog else {
            return Vec::new();
        };
        templates
            .iter()
            .map(|template| PickerEntry {
                template,
                selected: self.selected.contains(&template.id),
                recommended: is_recommended(user_specialty, template),
            })
            .collect()
    }

    /// Materialises the working selection in catalog order and closes the picker.
    ///
    /// Returns `None`, leaving the picker as it is, while the catalog has not been loaded.
    pub fn confirm(&mut self) -> Option<Vec<Template>> {
        let CatalogState::Ready(templates) = &self.catalog else {
            return None;
        };
        let chosen: Vec<Template> = templates
            .iter()
            .filter(|t| self.selected.contains(&t.id))
            .cloned()
            .collect();
        self.catalog = CatalogState::Closed;
        Some(chosen)
    }

    /// Closes without applying the working selection.
    pub fn close(&mut self) {
        self.catalog = CatalogState::Closed;
    }
}
