#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to fetch {what}: {reason}")]
    FetchFailure { what: &'static str, reason: String },
    #[error("failed to save record for appointment {appointment_id}: {reason}")]
    SaveFailure {
        appointment_id: String,
        reason: String,
    },

    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("appointment not found: {0}")]
    AppointmentNotFound(String),
    #[error("patient not found: {0}")]
    PatientNotFound(String),
    #[error("no record exists for appointment {0}; finish the attendance first")]
    RecordNotFound(String),

    #[error("invalid data for template {template_id}: {violations}")]
    InvalidInstance {
        template_id: String,
        violations: String,
    },
    #[error("content slice '{slice}' is malformed: {source}")]
    InvalidSlice {
        slice: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("no meal at position {0}")]
    MealOutOfRange(usize),
    #[error("no item at position {item} in meal {meal}")]
    MealItemOutOfRange { meal: usize, item: usize },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete file: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize: {0}")]
    Deserialization(serde_json::Error),

    #[error("text error: {0}")]
    Text(#[from] clinica_types::TextError),
    #[error("uuid error: {0}")]
    Uuid(#[from] clinica_uuid::UuidError),
}

impl ClinicError {
    /// Wraps a lower-level error raised while reading from a collaborator.
    pub fn fetch(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::FetchFailure {
            what,
            reason: err.to_string(),
        }
    }

    /// Wraps a lower-level error raised while submitting a record.
    pub fn save(appointment_id: &str, err: impl std::fmt::Display) -> Self {
        Self::SaveFailure {
            appointment_id: appointment_id.to_string(),
            reason: err.to_string(),
        }
    }

    /// Like [`ClinicError::fetch`], but keeps errors that already say what went wrong.
    pub fn into_fetch(self, what: &'static str) -> Self {
        if self.is_not_found() || matches!(self, Self::FetchFailure { .. }) {
            self
        } else {
            Self::fetch(what, self)
        }
    }

    /// Like [`ClinicError::save`], but keeps errors that already carry save context.
    pub fn into_save(self, appointment_id: &str) -> Self {
        if matches!(self, Self::SaveFailure { .. } | Self::RecordNotFound(_)) {
            self
        } else {
            Self::save(appointment_id, self)
        }
    }

    /// True for "does not exist" errors, which the REST layer maps to 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound(_)
                | Self::AppointmentNotFound(_)
                | Self::PatientNotFound(_)
                | Self::RecordNotFound(_)
        )
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
