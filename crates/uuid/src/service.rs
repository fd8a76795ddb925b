//! Internal implementation of the identifier services.

use crate::{UuidError, UuidResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to be in canonical form.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting an identifier string from *outside* the core (CLI input, API request, etc), or
/// - Allocating a new identifier for a stored entity.
///
/// # Construction
/// - [`UuidService::new`] generates a new canonical UUID.
/// - [`UuidService::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    /// Generates a new random (v4) UUID in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or uppercase).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(e.to_string()))
    }

    /// Returns the UUID as a `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical UUID form.
    ///
    /// Purely syntactic: exactly 32 bytes, all of them `0-9` or `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for UuidService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for UuidService {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UuidService::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for UuidService {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for UuidService {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UuidService::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Generator for editor list-item identifiers.
///
/// Ids have the form `<prefix>-<n>` where `prefix` is the first 12 hex characters of a v4 UUID
/// drawn when the generator is created and `n` increases by one on every call. Ids from one
/// generator are therefore unique and ordered; two generators collide only if their random
/// prefixes do.
#[derive(Debug)]
pub struct ItemIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl Default for ItemIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemIdGenerator {
    pub fn new() -> Self {
        let canonical = UuidService::new().to_string();
        Self {
            prefix: canonical[..12].to_string(),
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next identifier.
    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
