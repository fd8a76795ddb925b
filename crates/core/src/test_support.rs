//! In-memory collaborators shared by the editor and reconciliation tests.

use crate::client::{AttendanceGateway, TemplateCatalog};
use crate::error::{ClinicError, ClinicResult};
use crate::models::{
    Appointment, AppointmentStatus, AttendanceRecord, MedicalRecord, Patient, QueueEntry,
    RecordPayload, Template,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub(crate) struct StaticCatalog(pub Vec<Template>);

#[async_trait]
impl TemplateCatalog for StaticCatalog {
    async fn list_templates(&self) -> ClinicResult<Vec<Template>> {
        Ok(self.0.clone())
    }
}

pub(crate) struct FailingCatalog;

#[async_trait]
impl TemplateCatalog for FailingCatalog {
    async fn list_templates(&self) -> ClinicResult<Vec<Template>> {
        Err(ClinicError::fetch("templates", "connection refused"))
    }
}

/// One appointment and its (optional) record, with switchable failures.
pub(crate) struct MemoryGateway {
    appointment: Mutex<Appointment>,
    patient: Patient,
    record: Mutex<Option<MedicalRecord>>,
    pub finishes: AtomicUsize,
    pub fail_fetch: AtomicBool,
    pub fail_finish: AtomicBool,
}

pub(crate) const APPOINTMENT_ID: &str = "appt-1";

impl MemoryGateway {
    pub fn new(record: Option<MedicalRecord>) -> Self {
        Self {
            appointment: Mutex::new(Appointment {
                id: APPOINTMENT_ID.into(),
                patient_id: "pat-1".into(),
                volunteer_id: "vol-1".into(),
                date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
                time: "09:00".into(),
                status: AppointmentStatus::InProgress,
            }),
            patient: Patient {
                id: "pat-1".into(),
                name: "Maria Souza".into(),
            },
            record: Mutex::new(record),
            finishes: AtomicUsize::new(0),
            fail_fetch: AtomicBool::new(false),
            fail_finish: AtomicBool::new(false),
        }
    }

    pub fn record(&self) -> Option<MedicalRecord> {
        self.record.lock().unwrap().clone()
    }

    /// Stands in for another editor writing the record out of band.
    pub fn replace_record(&self, record: MedicalRecord) {
        *self.record.lock().unwrap() = Some(record);
    }
}

pub(crate) fn record_with(payload: RecordPayload) -> MedicalRecord {
    let now = Utc::now();
    MedicalRecord {
        id: "rec-1".into(),
        appointment_id: APPOINTMENT_ID.into(),
        patient_id: "pat-1".into(),
        volunteer_id: "vol-1".into(),
        chief_complaint: payload.chief_complaint,
        history: payload.history,
        procedures: payload.procedures,
        prescription: payload.prescription,
        content: payload.content,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl AttendanceGateway for MemoryGateway {
    async fn get_record(&self, appointment_id: &str) -> ClinicResult<AttendanceRecord> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ClinicError::Http {
                status: 503,
                message: "unavailable".into(),
            });
        }
        let appointment = self.appointment.lock().unwrap().clone();
        if appointment.id != appointment_id {
            return Err(ClinicError::AppointmentNotFound(appointment_id.into()));
        }
        Ok(AttendanceRecord {
            appointment,
            patient: self.patient.clone(),
            record: self.record(),
        })
    }

    async fn finish(
        &self,
        appointment_id: &str,
        payload: &RecordPayload,
    ) -> ClinicResult<MedicalRecord> {
        if self.fail_finish.load(Ordering::SeqCst) {
            return Err(ClinicError::Http {
                status: 500,
                message: "boom".into(),
            });
        }
        if appointment_id != APPOINTMENT_ID {
            return Err(ClinicError::AppointmentNotFound(appointment_id.into()));
        }
        self.finishes.fetch_add(1, Ordering::SeqCst);

        let mut slot = self.record.lock().unwrap();
        let saved = match slot.take() {
            Some(mut existing) => {
                existing.apply_payload(payload.clone());
                existing.updated_at = Utc::now();
                existing
            }
            None => record_with(payload.clone()),
        };
        *slot = Some(saved.clone());
        self.appointment.lock().unwrap().status = AppointmentStatus::Finished;
        Ok(saved)
    }

    async fn my_appointments(&self) -> ClinicResult<Vec<QueueEntry>> {
        Ok(vec![QueueEntry {
            appointment: self.appointment.lock().unwrap().clone(),
            patient_name: self.patient.name.clone(),
        }])
    }

    async fn start(&self, _appointment_id: &str) -> ClinicResult<Appointment> {
        let mut appointment = self.appointment.lock().unwrap();
        appointment.status = AppointmentStatus::InProgress;
        Ok(appointment.clone())
    }

    async fn cancel(&self, _appointment_id: &str) -> ClinicResult<Appointment> {
        let mut appointment = self.appointment.lock().unwrap();
        appointment.status = AppointmentStatus::Scheduled;
        Ok(appointment.clone())
    }

    async fn patient_history(&self, _patient_id: &str) -> ClinicResult<Vec<MedicalRecord>> {
        Ok(self.record().into_iter().collect())
    }
}
