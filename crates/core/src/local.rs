//! In-process collaborators over the file-backed services.
//!
//! Lets the editors run against a local clinic data directory without the REST server, acting
//! as one fixed user.

use crate::client::{AttendanceGateway, TemplateCatalog};
use crate::config::CoreConfig;
use crate::error::ClinicResult;
use crate::models::{
    Appointment, AttendanceRecord, MedicalRecord, QueueEntry, RecordPayload, Template,
};
use crate::repositories::{AttendanceService, FormsService};
use crate::session::User;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct LocalClinic {
    forms: FormsService,
    attendance: AttendanceService,
    actor: User,
}

impl LocalClinic {
    pub fn new(cfg: Arc<CoreConfig>, actor: User) -> Self {
        Self {
            forms: FormsService::new(cfg.clone()),
            attendance: AttendanceService::new(cfg),
            actor,
        }
    }

    pub fn actor(&self) -> &User {
        &self.actor
    }
}

#[async_trait]
impl TemplateCatalog for LocalClinic {
    async fn list_templates(&self) -> ClinicResult<Vec<Template>> {
        Ok(self.forms.list_templates())
    }
}

#[async_trait]
impl AttendanceGateway for LocalClinic {
    async fn get_record(&self, appointment_id: &str) -> ClinicResult<AttendanceRecord> {
        self.attendance.get_record(appointment_id)
    }

    async fn finish(
        &self,
        appointment_id: &str,
        payload: &RecordPayload,
    ) -> ClinicResult<MedicalRecord> {
        self.attendance.finish(&self.actor, appointment_id, payload.clone())
    }

    async fn my_appointments(&self) -> ClinicResult<Vec<QueueEntry>> {
        self.attendance.my_appointments(&self.actor)
    }

    async fn start(&self, appointment_id: &str) -> ClinicResult<Appointment> {
        self.attendance.start(&self.actor, appointment_id)
    }

    async fn cancel(&self, appointment_id: &str) -> ClinicResult<Appointment> {
        self.attendance.cancel(&self.actor, appointment_id)
    }

    async fn patient_history(&self, patient_id: &str) -> ClinicResult<Vec<MedicalRecord>> {
        self.attendance.patient_history(patient_id)
    }
}
