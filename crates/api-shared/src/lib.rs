//! # API Shared
//!
//! Shared utilities and definitions for the clinic APIs.
//!
//! Contains:
//! - Response bodies shared by the server and its clients (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities: API key check and acting-user resolution
//!
//! Used by `api-rest` and the CLI.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{resolve_actor, validate_api_key, ActorHeaders, AuthError};
pub use dto::{DeleteRes, ErrorBody, HealthRes};
pub use health::HealthService;
