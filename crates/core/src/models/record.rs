//! Patients, appointments and the medical records attached to them.

use crate::models::content::ContentEnvelope;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Patient {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AppointmentStatus {
    Scheduled,
    NotStarted,
    InProgress,
    Finished,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    /// Statuses that appear in a volunteer's attendance queue.
    pub fn is_queued(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub volunteer_id: String,
    pub date: NaiveDate,
    /// Local wall-clock slot, `HH:MM`.
    pub time: String,
    pub status: AppointmentStatus,
}

/// A queue row: an appointment with its patient's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QueueEntry {
    pub appointment: Appointment,
    pub patient_name: String,
}

/// The fixed clinical fields every record carries outside the content envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseForm {
    pub chief_complaint: String,
    pub history: String,
    pub procedures: Option<String>,
    pub prescription: Option<String>,
}

/// Body of a record-finish call: base form fields plus the content envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecordPayload {
    pub chief_complaint: String,
    pub history: String,
    #[serde(default)]
    pub procedures: Option<String>,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default)]
    pub content: ContentEnvelope,
}

impl RecordPayload {
    pub fn new(base: BaseForm, content: ContentEnvelope) -> Self {
        Self {
            chief_complaint: base.chief_complaint,
            history: base.history,
            procedures: base.procedures,
            prescription: base.prescription,
            content,
        }
    }

    pub fn base_form(&self) -> BaseForm {
        BaseForm {
            chief_complaint: self.chief_complaint.clone(),
            history: self.history.clone(),
            procedures: self.procedures.clone(),
            prescription: self.prescription.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MedicalRecord {
    pub id: String,
    pub appointment_id: String,
    pub patient_id: String,
    pub volunteer_id: String,
    pub chief_complaint: String,
    pub history: String,
    #[serde(default)]
    pub procedures: Option<String>,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default)]
    pub content: ContentEnvelope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicalRecord {
    pub fn base_form(&self) -> BaseForm {
        BaseForm {
            chief_complaint: self.chief_complaint.clone(),
            history: self.history.clone(),
            procedures: self.procedures.clone(),
            prescription: self.prescription.clone(),
        }
    }

    /// Replaces base fields and the whole content envelope with those of `payload`.
    pub fn apply_payload(&mut self, payload: RecordPayload) {
        self.chief_complaint = payload.chief_complaint;
        self.history = payload.history;
        self.procedures = payload.procedures;
        self.prescription = payload.prescription;
        self.content = payload.content;
    }

    /// This record as a finish payload carrying `content` instead of the stored envelope.
    pub fn to_payload_with(&self, content: ContentEnvelope) -> RecordPayload {
        RecordPayload::new(self.base_form(), content)
    }
}

/// Everything an editor loads for one appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttendanceRecord {
    pub appointment: Appointment,
    pub patient: Patient,
    pub record: Option<MedicalRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_serializes_flat_base_fields() {
        let payload = RecordPayload::new(
            BaseForm {
                chief_complaint: "dor".into(),
                history: "3 dias".into(),
                procedures: None,
                prescription: Some("repouso".into()),
            },
            ContentEnvelope::new(),
        );

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["chief_complaint"], "dor");
        assert_eq!(value["prescription"], "repouso");
        assert_eq!(value["content"], json!({}));
    }

    #[test]
    fn test_payload_accepts_missing_content() {
        let payload: RecordPayload =
            serde_json::from_value(json!({"chief_complaint": "a", "history": "b"})).unwrap();
        assert!(payload.content.is_empty());
        assert_eq!(payload.base_form().history, "b");
    }

    #[test]
    fn test_status_uses_snake_case() {
        let value = serde_json::to_value(AppointmentStatus::InProgress).unwrap();
        assert_eq!(value, "in_progress");
        assert!(!AppointmentStatus::Cancelled.is_queued());
        assert_eq!(AppointmentStatus::NotStarted.to_string(), "not_started");
    }
}
