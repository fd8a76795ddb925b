//! Shared storage utilities for the file-backed services.
//!
//! Every entity is one pretty-printed JSON file named `<id>.json` inside its kind's directory
//! under the clinic data directory. Writes go to a temporary sibling first and are renamed into
//! place, so a reader never observes a half-written file.

use crate::constants::MAX_ID_LEN;
use crate::error::{ClinicError, ClinicResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const JSON_EXTENSION: &str = "json";

/// Checks that `id` can be used as a file stem.
///
/// Ids are 1 to [`MAX_ID_LEN`] characters of ASCII letters, digits, `-` and `_`. Anything else
/// (path separators, `..`, whitespace) is rejected before it reaches the filesystem.
///
/// # Errors
///
/// Returns [`ClinicError::InvalidInput`] if the id is empty, too long or contains other
/// characters.
pub(crate) fn validate_record_key(id: &str) -> ClinicResult<()> {
    if id.is_empty() {
        return Err(ClinicError::InvalidInput("id cannot be empty".into()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(ClinicError::InvalidInput(format!(
            "id exceeds {MAX_ID_LEN} characters"
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ClinicError::InvalidInput(format!(
            "id '{id}' contains characters outside [A-Za-z0-9_-]"
        )));
    }
    Ok(())
}

/// Path of the JSON file for `id` in `dir`, after validating `id`.
pub(crate) fn record_path(dir: &Path, id: &str) -> ClinicResult<PathBuf> {
    validate_record_key(id)?;
    Ok(dir.join(format!("{id}.{JSON_EXTENSION}")))
}

/// Reads and parses the file for `id`. A missing file reads as `None`.
pub(crate) fn read_json<T: DeserializeOwned>(dir: &Path, id: &str) -> ClinicResult<Option<T>> {
    let path = record_path(dir, id)?;
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ClinicError::FileRead(e)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(ClinicError::Deserialization)
}

/// Writes `value` as the file for `id`, creating `dir` if needed.
///
/// # Errors
///
/// Returns `ClinicError` if:
/// - `id` is not a valid key,
/// - the directory cannot be created,
/// - serialisation fails,
/// - the temporary file cannot be written or renamed into place.
pub(crate) fn write_json_atomic<T: Serialize>(dir: &Path, id: &str, value: &T) -> ClinicResult<()> {
    let path = record_path(dir, id)?;
    fs::create_dir_all(dir).map_err(ClinicError::StorageDirCreation)?;

    let raw = serde_json::to_string_pretty(value).map_err(ClinicError::Serialization)?;
    let tmp = dir.join(format!(".{id}.{JSON_EXTENSION}.tmp"));
    fs::write(&tmp, raw).map_err(ClinicError::FileWrite)?;
    if let Err(e) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(ClinicError::FileWrite(e));
    }
    Ok(())
}

/// Deletes the file for `id`. Returns false if there was nothing to delete.
pub(crate) fn delete_json(dir: &Path, id: &str) -> ClinicResult<bool> {
    let path = record_path(dir, id)?;
    match fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ClinicError::FileDelete(e)),
    }
}

/// Parses every `*.json` file in `dir`.
///
/// A missing directory yields an empty list. Files that cannot be read or parsed are skipped
/// with a warning so one corrupt entity does not hide the rest.
pub(crate) fn list_json<T: DeserializeOwned>(dir: &Path) -> Vec<T> {
    let entries = match fs::read_dir(dir) {
        Ok(it) => it,
        Err(_) => return Vec::new(),
    };

    let mut items = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(JSON_EXTENSION) {
            continue;
        }

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("failed to read {}: {}", path.display(), e);
                continue;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", path.display(), e);
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        n: u32,
    }

    #[test]
    fn test_validate_record_key() {
        assert!(validate_record_key("abc-123_X").is_ok());
        for bad in ["", "../etc", "a/b", "a b", ".hidden", "é"] {
            assert!(validate_record_key(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(validate_record_key(&"a".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_write_read_delete() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("items");

        assert_eq!(read_json::<Item>(&sub, "one").unwrap(), None);
        write_json_atomic(&sub, "one", &Item { n: 1 }).unwrap();
        write_json_atomic(&sub, "one", &Item { n: 2 }).unwrap();

        assert_eq!(read_json::<Item>(&sub, "one").unwrap(), Some(Item { n: 2 }));
        assert!(!sub.join(".one.json.tmp").exists());
        assert!(delete_json(&sub, "one").unwrap());
        assert!(!delete_json(&sub, "one").unwrap());
    }

    #[test]
    fn test_list_skips_foreign_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        write_json_atomic(dir.path(), "a", &Item { n: 1 }).unwrap();
        write_json_atomic(dir.path(), "b", &Item { n: 2 }).unwrap();
        fs::write(dir.path().join("c.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "{}").unwrap();

        let mut items: Vec<Item> = list_json(dir.path());
        items.sort_by_key(|i| i.n);

        assert_eq!(items, vec![Item { n: 1 }, Item { n: 2 }]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(list_json::<Item>(&dir.path().join("nope")).is_empty());
    }
}
