//! Collaborator seam between editor sessions and the records backend.
//!
//! Editors only talk to these traits. [`crate::http::HttpClinicClient`] implements them over the
//! REST API and [`crate::local::LocalClinic`] implements them in-process over the backend
//! services. Neither retries: a failed call surfaces once to the caller that initiated it.

use crate::error::ClinicResult;
use crate::models::{
    Appointment, AttendanceRecord, MedicalRecord, QueueEntry, RecordPayload, Template,
};
use async_trait::async_trait;

/// Source of the template catalog.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Every active template, in catalog order. No filtering parameters.
    async fn list_templates(&self) -> ClinicResult<Vec<Template>>;
}

/// Record retrieval and submission for the acting volunteer.
#[async_trait]
pub trait AttendanceGateway: Send + Sync {
    /// Appointment, patient and (if one exists) the record for `appointment_id`.
    async fn get_record(&self, appointment_id: &str) -> ClinicResult<AttendanceRecord>;

    /// Upserts the record: creates it if absent, otherwise replaces base fields and `content`.
    async fn finish(
        &self,
        appointment_id: &str,
        payload: &RecordPayload,
    ) -> ClinicResult<MedicalRecord>;

    /// The acting volunteer's queue, ordered by date then time.
    async fn my_appointments(&self) -> ClinicResult<Vec<QueueEntry>>;

    async fn start(&self, appointment_id: &str) -> ClinicResult<Appointment>;

    /// Reverts a started attendance to scheduled.
    async fn cancel(&self, appointment_id: &str) -> ClinicResult<Appointment>;

    /// All records of a patient, newest first.
    async fn patient_history(&self, patient_id: &str) -> ClinicResult<Vec<MedicalRecord>>;
}
