use crate::composer::{compose, primary_content};
use crate::config::PrimarySaveMode;
use crate::editor::EditorContext;
use crate::error::{ClinicError, ClinicResult};
use crate::instances::{DocumentInstances, HydrationReport};
use crate::matcher::offers_meal_plan;
use crate::models::{
    Appointment, BaseForm, ContentSlice, FilledForms, MedicalRecord, Patient, RecordPayload,
    Template, TemplateId,
};
use crate::reconcile::Reconciler;
use crate::selection::TemplatePicker;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// The primary attendance editor: base form plus the selected dynamic documents.
pub struct AttendanceEditor {
    ctx: EditorContext,
    appointment: Appointment,
    patient: Patient,
    base_form: BaseForm,
    selected: Vec<Template>,
    instances: DocumentInstances,
    picker: TemplatePicker,
    hydration: HydrationReport,
    needs_document_selection: bool,
    reconciler: Reconciler,
}

impl AttendanceEditor {
    /// Loads the record for `appointment_id` and restores its documents.
    ///
    /// If the record has a `filled_forms` slice the catalog is fetched to restore the selection;
    /// a catalog failure is logged and leaves the selection empty. An appointment without a record
    /// yet starts with [`AttendanceEditor::needs_document_selection`] set.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::FetchFailure`] (or a not-found error) if the record cannot be read.
    /// - [`ClinicError::InvalidSlice`] if the stored `filled_forms` slice is malformed.
    pub async fn open(ctx: EditorContext, appointment_id: &str) -> ClinicResult<Self> {
        let loaded = ctx
            .gateway
            .get_record(appointment_id)
            .await
            .map_err(|e| e.into_fetch("record"))?;

        let mut editor = Self {
            reconciler: Reconciler::new(ctx.gateway.clone()),
            ctx,
            appointment: loaded.appointment,
            patient: loaded.patient,
            base_form: BaseForm::default(),
            selected: Vec::new(),
            instances: DocumentInstances::new(),
            picker: TemplatePicker::new(),
            hydration: HydrationReport::default(),
            needs_document_selection: false,
        };

        let Some(record) = loaded.record else {
            editor.needs_document_selection = true;
            return Ok(editor);
        };
        editor.base_form = record.base_form();

        // An unreadable slice must not be recomposed as empty and saved over.
        if let Some(filled_forms) = record.content.slice::<FilledForms>()? {
            match editor.ctx.catalog.list_templates().await {
                Ok(catalog) => {
                    let (selected, report) = editor.instances.hydrate(&filled_forms, &catalog);
                    editor.selected = selected;
                    editor.hydration = report;
                }
                Err(e) => {
                    tracing::error!(appointment_id, "error loading templates: {e}");
                }
            }
        }

        Ok(editor)
    }

    pub fn appointment(&self) -> &Appointment {
        &self.appointment
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn base_form(&self) -> &BaseForm {
        &self.base_form
    }

    pub fn base_form_mut(&mut self) -> &mut BaseForm {
        &mut self.base_form
    }

    /// Selected templates, in the order their documents will be saved.
    pub fn selected(&self) -> &[Template] {
        &self.selected
    }

    pub fn instances(&self) -> &DocumentInstances {
        &self.instances
    }

    /// What could not be restored when the session was opened.
    pub fn hydration_report(&self) -> &HydrationReport {
        &self.hydration
    }

    /// True until documents are chosen for an appointment that had no record.
    pub fn needs_document_selection(&self) -> bool {
        self.needs_document_selection
    }

    /// Whether the finished screen should offer the meal-plan editor to this user.
    pub fn offers_meal_plan(&self) -> bool {
        offers_meal_plan(self.ctx.user_specialty())
    }

    pub fn picker(&self) -> &TemplatePicker {
        &self.picker
    }

    /// Opens the picker seeded with the current selection.
    pub async fn open_picker(&mut self) {
        let current: Vec<TemplateId> = self.selected.iter().map(|t| t.id.clone()).collect();
        self.picker.open(self.ctx.catalog.as_ref(), current).await;
    }

    pub fn toggle_template(&mut self, id: &TemplateId) {
        self.picker.toggle(id);
    }

    /// Applies the picker's selection. Documents of deselected templates are discarded.
    ///
    /// Returns false if the catalog never loaded and nothing was applied.
    pub fn confirm_picker(&mut self) -> bool {
        let Some(chosen) = self.picker.confirm() else {
            return false;
        };
        self.instances.retain(chosen.iter().map(|t| &t.id));
        self.selected = chosen;
        self.needs_document_selection = false;
        true
    }

    pub fn close_picker(&mut self) {
        self.picker.close();
    }

    /// Deselects one template and discards its document.
    pub fn remove_template(&mut self, id: &TemplateId) {
        self.selected.retain(|t| &t.id != id);
        self.instances.remove(id);
    }

    /// Replaces the document for a selected template.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::TemplateNotFound`] if `id` is not selected.
    /// - [`ClinicError::InvalidInstance`] if `value` does not match the template's schema.
    pub fn set_document_value(&mut self, id: &TemplateId, value: Value) -> ClinicResult<()> {
        let template = self
            .selected
            .iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| ClinicError::TemplateNotFound(id.to_string()))?;
        self.instances.set_value(template, value)
    }

    pub fn document_value(&self, id: &TemplateId) -> Value {
        self.instances.value_for(id)
    }

    /// The `filled_forms` slice as it would be saved at `now`.
    pub fn compose(&self, now: DateTime<Utc>) -> FilledForms {
        compose(&self.selected, &self.instances, now)
    }

    /// Submits the base form and the composed documents.
    ///
    /// With [`PrimarySaveMode::ReplaceContent`] the submitted envelope holds `filled_forms` only,
    /// so any other slice on the record (such as a meal plan) is dropped. With
    /// [`PrimarySaveMode::MergeSlices`] only `filled_forms` is overwritten. A failure is logged
    /// and returned; the session keeps its state so the save can be retried.
    pub async fn save(&mut self) -> ClinicResult<MedicalRecord> {
        let filled_forms = self.compose(Utc::now());
        let appointment_id = self.appointment.id.clone();

        let result = match self.ctx.cfg.primary_save_mode() {
            PrimarySaveMode::ReplaceContent => {
                let payload =
                    RecordPayload::new(self.base_form.clone(), primary_content(&filled_forms)?);
                self.ctx
                    .gateway
                    .finish(&appointment_id, &payload)
                    .await
                    .map_err(|e| e.into_save(&appointment_id))
            }
            PrimarySaveMode::MergeSlices => {
                let mut owned = Map::new();
                owned.insert(
                    FilledForms::KEY.to_string(),
                    serde_json::to_value(&filled_forms).map_err(ClinicError::Serialization)?,
                );
                self.reconciler
                    .merge_write(&appointment_id, Some(self.base_form.clone()), owned)
                    .await
            }
        };

        match &result {
            Ok(_) => tracing::info!(
                appointment_id = %appointment_id,
                documents = filled_forms.len(),
                "attendance saved"
            ),
            Err(e) => tracing::error!(appointment_id = %appointment_id, "error saving attendance: {e}"),
        }
        result
    }

    /// Reverts the appointment to scheduled and ends the session.
    pub async fn cancel_attendance(self) -> ClinicResult<Appointment> {
        self.ctx.gateway.cancel(&self.appointment.id).await
    }
}
