//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling or inside editor sessions.

use crate::constants::{
    APPOINTMENTS_DIR_NAME, PATIENTS_DIR_NAME, RECORDS_DIR_NAME, TEMPLATES_DIR_NAME,
};
use crate::{ClinicError, ClinicResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the primary attendance editor writes the content envelope.
///
/// `ReplaceContent` submits `{ filled_forms }` as the whole envelope, dropping any sibling slice
/// (such as a meal plan) written by another editor. `MergeSlices` runs the primary save through
/// the reconciliation cycle so only `filled_forms` is overwritten.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimarySaveMode {
    #[default]
    ReplaceContent,
    MergeSlices,
}

impl FromStr for PrimarySaveMode {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" | "replace_content" => Ok(Self::ReplaceContent),
            "merge" | "merge_slices" => Ok(Self::MergeSlices),
            other => Err(ClinicError::InvalidInput(format!(
                "unknown primary save mode '{other}' (expected 'replace' or 'merge')"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    clinic_data_dir: PathBuf,
    primary_save_mode: PrimarySaveMode,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `clinic_data_dir` is empty.
    pub fn new(clinic_data_dir: PathBuf, primary_save_mode: PrimarySaveMode) -> ClinicResult<Self> {
        if clinic_data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "clinic_data_dir cannot be empty".into(),
            ));
        }

        Ok(Self {
            clinic_data_dir,
            primary_save_mode,
        })
    }

    pub fn clinic_data_dir(&self) -> &Path {
        &self.clinic_data_dir
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.clinic_data_dir.join(TEMPLATES_DIR_NAME)
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.clinic_data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn appointments_dir(&self) -> PathBuf {
        self.clinic_data_dir.join(APPOINTMENTS_DIR_NAME)
    }

    pub fn records_dir(&self) -> PathBuf {
        self.clinic_data_dir.join(RECORDS_DIR_NAME)
    }

    pub fn primary_save_mode(&self) -> PrimarySaveMode {
        self.primary_save_mode
    }
}

/// Parse the primary save mode from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`PrimarySaveMode::ReplaceContent`].
pub fn primary_save_mode_from_env_value(value: Option<String>) -> ClinicResult<PrimarySaveMode> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<PrimarySaveMode>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_mode_defaults_to_replace() {
        assert_eq!(
            primary_save_mode_from_env_value(None).unwrap(),
            PrimarySaveMode::ReplaceContent
        );
        assert_eq!(
            primary_save_mode_from_env_value(Some("  ".into())).unwrap(),
            PrimarySaveMode::ReplaceContent
        );
    }

    #[test]
    fn test_save_mode_parses_merge() {
        assert_eq!(
            primary_save_mode_from_env_value(Some("Merge".into())).unwrap(),
            PrimarySaveMode::MergeSlices
        );
    }

    #[test]
    fn test_save_mode_rejects_unknown_value() {
        let err = primary_save_mode_from_env_value(Some("append".into())).unwrap_err();
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn test_config_derives_storage_dirs() {
        let cfg = CoreConfig::new(PathBuf::from("/data"), PrimarySaveMode::default()).unwrap();
        assert_eq!(cfg.templates_dir(), PathBuf::from("/data/templates"));
        assert_eq!(cfg.records_dir(), PathBuf::from("/data/records"));
    }

    #[test]
    fn test_config_rejects_empty_dir() {
        assert!(CoreConfig::new(PathBuf::new(), PrimarySaveMode::default()).is_err());
    }
}
