//! Authenticated session context.
//!
//! The session (bearer token plus the acting user's profile) is resolved once, loaded from disk
//! at startup or produced by a login, and then passed explicitly to the clients and editors that
//! need it.

use crate::error::{ClinicError, ClinicResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Role {
    #[serde(alias = "volunteer")]
    Volunteer,
    #[serde(alias = "admin")]
    Admin,
    #[serde(alias = "staff")]
    Staff,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volunteer => "VOLUNTEER",
            Self::Admin => "ADMIN",
            Self::Staff => "STAFF",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VOLUNTEER" => Ok(Self::Volunteer),
            "ADMIN" => Ok(Self::Admin),
            "STAFF" => Ok(Self::Staff),
            other => Err(ClinicError::InvalidInput(format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Free-text specialty, e.g. "Nutricionista". Only volunteers usually carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

impl User {
    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }

    pub fn is_volunteer(&self) -> bool {
        self.role == Role::Volunteer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// JSON file holding the current session between CLI invocations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, or `None` if nobody is logged in.
    pub fn load(&self) -> ClinicResult<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ClinicError::FileRead(e)),
        };
        let session = serde_json::from_str(&raw).map_err(ClinicError::Deserialization)?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> ClinicResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ClinicError::StorageDirCreation)?;
        }
        let raw = serde_json::to_string_pretty(session).map_err(ClinicError::Serialization)?;
        fs::write(&self.path, raw).map_err(ClinicError::FileWrite)?;
        tracing::debug!(path = %self.path.display(), user_id = %session.user.id, "session saved");
        Ok(())
    }

    /// Removes the stored session. Clearing an absent session is not an error.
    pub fn clear(&self) -> ClinicResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClinicError::FileDelete(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn nutritionist() -> Session {
        Session {
            token: "secret".into(),
            user: User {
                id: "vol-1".into(),
                name: "Ana".into(),
                role: Role::Volunteer,
                specialty: Some("Nutricionista".into()),
            },
        }
    }

    #[test]
    fn test_load_without_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));

        store.save(&nutritionist()).unwrap();
        assert_eq!(store.load().unwrap(), Some(nutritionist()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_role_accepts_either_case() {
        assert_eq!("volunteer".parse::<Role>().unwrap(), Role::Volunteer);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("doctor".parse::<Role>().is_err());

        let role: Role = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(role, Role::Staff);
        assert_eq!(serde_json::to_string(&Role::Volunteer).unwrap(), "\"VOLUNTEER\"");
    }
}
