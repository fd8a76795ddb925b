use crate::editor::EditorContext;
use crate::error::{ClinicError, ClinicResult};
use crate::models::{Meal, MealItem, MealItemField, MealPlan, MedicalRecord, Patient};
use crate::reconcile::Reconciler;
use clinica_uuid::ItemIdGenerator;

/// Editor for the `mealPlan` slice of a finished attendance.
pub struct MealPlanEditor {
    appointment_id: String,
    patient: Patient,
    plan: MealPlan,
    ids: ItemIdGenerator,
    reconciler: Reconciler,
}

impl MealPlanEditor {
    /// Loads the stored plan, or the default six-meal day if the record has none.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::RecordNotFound`] if the attendance has not been finished yet.
    /// - [`ClinicError::InvalidSlice`] if the stored plan cannot be read.
    pub async fn open(ctx: EditorContext, appointment_id: &str) -> ClinicResult<Self> {
        let loaded = ctx
            .gateway
            .get_record(appointment_id)
            .await
            .map_err(|e| e.into_fetch("record"))?;
        let record = loaded
            .record
            .ok_or_else(|| ClinicError::RecordNotFound(appointment_id.to_string()))?;

        let ids = ItemIdGenerator::new();
        let plan = match record.content.slice::<MealPlan>()? {
            Some(plan) => plan,
            None => MealPlan::default_day(&ids),
        };

        Ok(Self {
            appointment_id: appointment_id.to_string(),
            patient: loaded.patient,
            plan,
            ids,
            reconciler: Reconciler::new(ctx.gateway),
        })
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn plan(&self) -> &MealPlan {
        &self.plan
    }

    fn meal_mut(&mut self, meal: usize) -> ClinicResult<&mut Meal> {
        self.plan
            .0
            .get_mut(meal)
            .ok_or(ClinicError::MealOutOfRange(meal))
    }

    /// Appends a blank item to `meal` and returns its id.
    pub fn add_item(&mut self, meal: usize) -> ClinicResult<String> {
        let id = self.ids.next_id();
        self.meal_mut(meal)?.items.push(MealItem::blank(id.clone()));
        Ok(id)
    }

    pub fn remove_item(&mut self, meal: usize, item: usize) -> ClinicResult<MealItem> {
        let items = &mut self.meal_mut(meal)?.items;
        if item >= items.len() {
            return Err(ClinicError::MealItemOutOfRange { meal, item });
        }
        Ok(items.remove(item))
    }

    pub fn update_item(
        &mut self,
        meal: usize,
        item: usize,
        field: MealItemField,
        value: impl Into<String>,
    ) -> ClinicResult<()> {
        let entry = self
            .meal_mut(meal)?
            .items
            .get_mut(item)
            .ok_or(ClinicError::MealItemOutOfRange { meal, item })?;
        entry.set(field, value.into());
        Ok(())
    }

    pub fn set_meal_time(&mut self, meal: usize, time: Option<String>) -> ClinicResult<()> {
        self.meal_mut(meal)?.time = time;
        Ok(())
    }

    /// Writes the plan into the record, leaving base fields and other slices as stored.
    pub async fn save(&mut self) -> ClinicResult<MedicalRecord> {
        let result = self
            .reconciler
            .write_slice(&self.appointment_id, &self.plan)
            .await;
        match &result {
            Ok(_) => tracing::info!(
                appointment_id = %self.appointment_id,
                items = self.plan.item_count(),
                "meal plan saved"
            ),
            Err(e) => tracing::error!(
                appointment_id = %self.appointment_id,
                "error saving meal plan: {e}"
            ),
        }
        result
    }
}
