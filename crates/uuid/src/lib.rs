//! Identifier utilities.
//!
//! The clinic backend allocates identifiers for templates, patients, appointments and records
//! in a *canonical* UUID representation: **32 lowercase hexadecimal characters** (no hyphens).
//! Canonical form keeps identifiers safe to embed in storage paths and URLs without escaping.
//!
//! This crate provides:
//! - [`UuidService`], a wrapper that *guarantees* the canonical format once constructed.
//! - [`ItemIdGenerator`], the generator for list-item identities inside editors (for example
//!   meal-plan items). Those ids only need to be unique within a record; they carry no ordering.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`

mod service;

pub use service::{ItemIdGenerator, Uuid, UuidService};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
