//! Read-merge-write cycle for editors that own one slice of a record's content.
//!
//! The finish endpoint replaces the whole content envelope, so an editor that owns a single
//! slice must fetch the current record, overwrite only its own keys, and submit the merged
//! envelope together with the record's existing base fields. Within one [`Reconciler`] the
//! fetch, merge and write run as one unit. Across processes there is no locking: the last
//! write wins.

use crate::client::AttendanceGateway;
use crate::error::{ClinicError, ClinicResult};
use crate::models::{BaseForm, ContentEnvelope, ContentSlice, MedicalRecord, RecordPayload};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct Reconciler {
    gateway: Arc<dyn AttendanceGateway>,
    lock: Mutex<()>,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn AttendanceGateway>) -> Self {
        Self {
            gateway,
            lock: Mutex::new(()),
        }
    }

    /// Overwrites the `owned` slices of the record for `appointment_id`, keeping every other
    /// slice as currently stored.
    ///
    /// Base fields come from `base_form` when given, otherwise from the current record.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::FetchFailure`] (or a not-found error) if the current record cannot be read.
    /// - [`ClinicError::RecordNotFound`] if no record exists and no `base_form` was given.
    /// - [`ClinicError::SaveFailure`] if the merged record cannot be submitted.
    pub async fn merge_write(
        &self,
        appointment_id: &str,
        base_form: Option<BaseForm>,
        owned: Map<String, Value>,
    ) -> ClinicResult<MedicalRecord> {
        let _guard = self.lock.lock().await;

        let current = self
            .gateway
            .get_record(appointment_id)
            .await
            .map_err(|e| e.into_fetch("record"))?;

        let (base, stored) = match (base_form, current.record) {
            (Some(base), record) => (base, record.map(|r| r.content).unwrap_or_default()),
            (None, Some(record)) => (record.base_form(), record.content),
            (None, None) => return Err(ClinicError::RecordNotFound(appointment_id.to_string())),
        };

        let merged: ContentEnvelope = stored.merged(&owned);
        tracing::debug!(
            appointment_id,
            slices = ?owned.keys().collect::<Vec<_>>(),
            "writing merged record content"
        );

        self.gateway
            .finish(appointment_id, &RecordPayload::new(base, merged))
            .await
            .map_err(|e| e.into_save(appointment_id))
    }

    /// [`Reconciler::merge_write`] for an editor that owns exactly one slice.
    pub async fn write_slice<S: ContentSlice>(
        &self,
        appointment_id: &str,
        slice: &S,
    ) -> ClinicResult<MedicalRecord> {
        let value = serde_json::to_value(slice).map_err(ClinicError::Serialization)?;
        let mut owned = Map::new();
        owned.insert(S::KEY.to_string(), value);
        self.merge_write(appointment_id, None, owned).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilledForms, MealPlan};
    use crate::test_support::{APPOINTMENT_ID, MemoryGateway, record_with};
    use clinica_uuid::ItemIdGenerator;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn stored(content: Value) -> MedicalRecord {
        record_with(RecordPayload {
            chief_complaint: "dor abdominal".into(),
            history: "há 2 dias".into(),
            procedures: Some("exame físico".into()),
            prescription: None,
            content: serde_json::from_value(content).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_write_slice_preserves_siblings_and_base_fields() {
        let gateway = Arc::new(MemoryGateway::new(Some(stored(json!({
            "filled_forms": [{"template_id": "a", "title": "A", "data": {"k": 1},
                              "filled_at": "2026-02-10T13:45:00Z"}],
            "vitals": {"pa": "12x8"}
        })))));
        let reconciler = Reconciler::new(gateway.clone());
        let plan = MealPlan::default_day(&ItemIdGenerator::new());

        reconciler.write_slice(APPOINTMENT_ID, &plan).await.unwrap();

        let saved = gateway.record().unwrap();
        assert_eq!(saved.chief_complaint, "dor abdominal");
        assert_eq!(saved.procedures.as_deref(), Some("exame físico"));
        assert_eq!(saved.content.slice::<MealPlan>().unwrap(), Some(plan));
        assert_eq!(saved.content.slice::<FilledForms>().unwrap().unwrap().len(), 1);
        assert_eq!(saved.content.raw("vitals"), Some(&json!({"pa": "12x8"})));
    }

    #[tokio::test]
    async fn test_merge_reads_latest_record_on_each_save() {
        let gateway = Arc::new(MemoryGateway::new(Some(stored(json!({})))));
        let reconciler = Reconciler::new(gateway.clone());
        reconciler
            .write_slice(APPOINTMENT_ID, &MealPlan::default())
            .await
            .unwrap();

        gateway.replace_record(stored(json!({"mealPlan": [], "notes": "added elsewhere"})));
        reconciler
            .write_slice(APPOINTMENT_ID, &FilledForms::default())
            .await
            .unwrap();

        let saved = gateway.record().unwrap();
        assert_eq!(saved.content.raw("notes"), Some(&json!("added elsewhere")));
        assert!(saved.content.contains("mealPlan"));
    }

    #[tokio::test]
    async fn test_missing_record_without_base_form_is_not_found() {
        let gateway = Arc::new(MemoryGateway::new(None));
        let reconciler = Reconciler::new(gateway.clone());

        let err = reconciler
            .write_slice(APPOINTMENT_ID, &MealPlan::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ClinicError::RecordNotFound(_)));
        assert_eq!(gateway.finishes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_record_with_base_form_is_created() {
        let gateway = Arc::new(MemoryGateway::new(None));
        let reconciler = Reconciler::new(gateway.clone());
        let mut owned = Map::new();
        owned.insert("filled_forms".into(), json!([]));

        let saved = reconciler
            .merge_write(
                APPOINTMENT_ID,
                Some(BaseForm {
                    chief_complaint: "febre".into(),
                    history: "1 dia".into(),
                    ..BaseForm::default()
                }),
                owned,
            )
            .await
            .unwrap();

        assert_eq!(saved.chief_complaint, "febre");
        assert_eq!(
            serde_json::to_value(&saved.content).unwrap(),
            json!({"filled_forms": []})
        );
    }

    #[tokio::test]
    async fn test_failures_are_classified() {
        let gateway = Arc::new(MemoryGateway::new(Some(stored(json!({})))));
        let reconciler = Reconciler::new(gateway.clone());

        gateway.fail_fetch.store(true, Ordering::SeqCst);
        let err = reconciler
            .write_slice(APPOINTMENT_ID, &MealPlan::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::FetchFailure { what: "record", .. }));

        gateway.fail_fetch.store(false, Ordering::SeqCst);
        gateway.fail_finish.store(true, Ordering::SeqCst);
        let err = reconciler
            .write_slice(APPOINTMENT_ID, &MealPlan::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClinicError::SaveFailure { .. }));
    }
}
