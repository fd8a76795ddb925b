//! Patients, appointments and medical records.
//!
//! ## Storage Layout
//!
//! ```text
//! clinic_data/
//!   patients/<patient_id>.json
//!   appointments/<appointment_id>.json
//!   records/<appointment_id>.json     # at most one record per appointment
//! ```
//!
//! Records are keyed by their appointment, which makes the finish upsert a single file
//! replacement. Concurrent finishes on the same appointment are last-write-wins.
//!
//! Operations that act on behalf of a volunteer take the acting [`User`] and enforce that the
//! appointment belongs to them.

use crate::config::CoreConfig;
use crate::error::{ClinicError, ClinicResult};
use crate::models::{
    Appointment, AppointmentStatus, AttendanceRecord, MedicalRecord, Patient, QueueEntry,
    RecordPayload,
};
use crate::repositories::shared::{list_json, read_json, validate_record_key, write_json_atomic};
use crate::session::User;
use chrono::{NaiveDate, NaiveTime, Utc};
use clinica_types::NonEmptyText;
use clinica_uuid::UuidService;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Request to book a patient with a volunteer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: String,
    pub volunteer_id: String,
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
}

// ============================================================================
// ATTENDANCE SERVICE
// ============================================================================

/// Service for the volunteer attendance workflow.
///
/// Stateless apart from configuration; every call reads the current files.
#[derive(Clone, Debug)]
pub struct AttendanceService {
    cfg: Arc<CoreConfig>,
}

impl AttendanceService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Registers a patient under a new id.
    pub fn register_patient(&self, name: NonEmptyText) -> ClinicResult<Patient> {
        let patient = Patient {
            id: UuidService::new().to_string(),
            name: name.into_inner(),
        };
        write_json_atomic(&self.cfg.patients_dir(), &patient.id, &patient)?;
        tracing::info!(patient_id = %patient.id, "patient registered");
        Ok(patient)
    }

    pub fn get_patient(&self, patient_id: &str) -> ClinicResult<Patient> {
        read_json(&self.cfg.patients_dir(), patient_id)?
            .ok_or_else(|| ClinicError::PatientNotFound(patient_id.to_string()))
    }

    pub fn list_patients(&self) -> Vec<Patient> {
        let mut patients: Vec<Patient> = list_json(&self.cfg.patients_dir());
        patients.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        patients
    }

    /// Books an appointment in [`AppointmentStatus::Scheduled`].
    ///
    /// # Errors
    ///
    /// Returns `ClinicError` if:
    /// - the patient does not exist,
    /// - `volunteer_id` is not a valid key,
    /// - `time` is not `HH:MM`,
    /// - the appointment file cannot be written.
    pub fn schedule(&self, new: NewAppointment) -> ClinicResult<Appointment> {
        self.get_patient(&new.patient_id)?;
        validate_record_key(&new.volunteer_id)?;
        let time = NaiveTime::parse_from_str(new.time.trim(), "%H:%M").map_err(|_| {
            ClinicError::InvalidInput(format!("time '{}' is not HH:MM", new.time))
        })?;

        let appointment = Appointment {
            id: UuidService::new().to_string(),
            patient_id: new.patient_id,
            volunteer_id: new.volunteer_id,
            date: new.date,
            time: time.format("%H:%M").to_string(),
            status: AppointmentStatus::Scheduled,
        };
        self.write_appointment(&appointment)?;
        tracing::info!(
            appointment_id = %appointment.id,
            volunteer_id = %appointment.volunteer_id,
            "appointment scheduled"
        );
        Ok(appointment)
    }

    pub fn get_appointment(&self, appointment_id: &str) -> ClinicResult<Appointment> {
        read_json(&self.cfg.appointments_dir(), appointment_id)?
            .ok_or_else(|| ClinicError::AppointmentNotFound(appointment_id.to_string()))
    }

    /// The volunteer's queue: every appointment except cancelled ones, by date then time.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Forbidden`] if `actor` is not a volunteer.
    pub fn my_appointments(&self, actor: &User) -> ClinicResult<Vec<QueueEntry>> {
        require_volunteer(actor)?;

        let mut appointments: Vec<Appointment> = list_json::<Appointment>(&self.cfg.appointments_dir())
            .into_iter()
            .filter(|a| a.volunteer_id == actor.id && a.status.is_queued())
            .collect();
        appointments.sort_by(|a, b| (a.date, &a.time, &a.id).cmp(&(b.date, &b.time, &b.id)));

        let patients: HashMap<String, String> = list_json::<Patient>(&self.cfg.patients_dir())
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        // Appointments whose patient file is gone are dropped, as an inner join would.
        Ok(appointments
            .into_iter()
            .filter_map(|appointment| {
                let patient_name = patients.get(&appointment.patient_id)?.clone();
                Some(QueueEntry {
                    appointment,
                    patient_name,
                })
            })
            .collect())
    }

    /// Marks the actor's appointment as in progress.
    pub fn start(&self, actor: &User, appointment_id: &str) -> ClinicResult<Appointment> {
        self.set_status(actor, appointment_id, AppointmentStatus::InProgress)
    }

    /// Reverts the actor's appointment to scheduled.
    pub fn cancel(&self, actor: &User, appointment_id: &str) -> ClinicResult<Appointment> {
        self.set_status(actor, appointment_id, AppointmentStatus::Scheduled)
    }

    /// Creates or replaces the record for the actor's appointment and marks it finished.
    ///
    /// An existing record keeps its id and `created_at`; base fields and the whole `content`
    /// envelope are replaced, and the actor becomes its `volunteer_id`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError` if:
    /// - `actor` is not the volunteer of the appointment ([`ClinicError::Forbidden`]),
    /// - the appointment does not exist,
    /// - the record or appointment file cannot be written.
    pub fn finish(
        &self,
        actor: &User,
        appointment_id: &str,
        payload: RecordPayload,
    ) -> ClinicResult<MedicalRecord> {
        let mut appointment = self.owned_appointment(actor, appointment_id)?;
        let now = Utc::now();

        let record = match self.find_record(appointment_id)? {
            Some(mut existing) => {
                existing.apply_payload(payload);
                existing.volunteer_id = actor.id.clone();
                existing.updated_at = now;
                existing
            }
            None => MedicalRecord {
                id: UuidService::new().to_string(),
                appointment_id: appointment_id.to_string(),
                patient_id: appointment.patient_id.clone(),
                volunteer_id: actor.id.clone(),
                chief_complaint: payload.chief_complaint,
                history: payload.history,
                procedures: payload.procedures,
                prescription: payload.prescription,
                content: payload.content,
                created_at: now,
                updated_at: now,
            },
        };

        write_json_atomic(&self.cfg.records_dir(), appointment_id, &record)?;
        appointment.status = AppointmentStatus::Finished;
        self.write_appointment(&appointment)?;

        tracing::info!(
            appointment_id,
            record_id = %record.id,
            slices = ?record.content.keys().collect::<Vec<_>>(),
            "attendance finished"
        );
        Ok(record)
    }

    /// Appointment, patient and record (if any) for one appointment. Open to every role.
    pub fn get_record(&self, appointment_id: &str) -> ClinicResult<AttendanceRecord> {
        let appointment = self.get_appointment(appointment_id)?;
        let patient = self.get_patient(&appointment.patient_id)?;
        let record = self.find_record(appointment_id)?;
        Ok(AttendanceRecord {
            appointment,
            patient,
            record,
        })
    }

    /// All records of a patient, newest first. An unknown patient has an empty history.
    pub fn patient_history(&self, patient_id: &str) -> ClinicResult<Vec<MedicalRecord>> {
        validate_record_key(patient_id)?;
        let mut records: Vec<MedicalRecord> = list_json::<MedicalRecord>(&self.cfg.records_dir())
            .into_iter()
            .filter(|r| r.patient_id == patient_id)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn find_record(&self, appointment_id: &str) -> ClinicResult<Option<MedicalRecord>> {
        read_json(&self.cfg.records_dir(), appointment_id)
    }

    fn write_appointment(&self, appointment: &Appointment) -> ClinicResult<()> {
        write_json_atomic(&self.cfg.appointments_dir(), &appointment.id, appointment)
    }

    fn owned_appointment(&self, actor: &User, appointment_id: &str) -> ClinicResult<Appointment> {
        require_volunteer(actor)?;
        let appointment = self.get_appointment(appointment_id)?;
        if appointment.volunteer_id != actor.id {
            return Err(ClinicError::Forbidden(
                "appointment belongs to another volunteer".into(),
            ));
        }
        Ok(appointment)
    }

    fn set_status(
        &self,
        actor: &User,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> ClinicResult<Appointment> {
        let mut appointment = self.owned_appointment(actor, appointment_id)?;
        appointment.status = status;
        self.write_appointment(&appointment)?;
        tracing::info!(appointment_id, status = ?status, "appointment status changed");
        Ok(appointment)
    }
}

fn require_volunteer(actor: &User) -> ClinicResult<()> {
    if actor.is_volunteer() {
        Ok(())
    } else {
        Err(ClinicError::Forbidden("volunteers only".into()))
    }
}
