//! Request authentication.
//!
//! Callers present the shared API key as a bearer token and name the user they act for in
//! identity headers. Issuing tokens is out of scope: the key is configured once per deployment.

use clinica_core::{Role, User};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("missing {0} header")]
    MissingActor(&'static str),
    #[error("invalid actor: {0}")]
    InvalidActor(String),
}

/// Validates a raw `Authorization` header value against the configured API key.
///
/// # Errors
///
/// - [`AuthError::MissingToken`] if there is no `Bearer` token.
/// - [`AuthError::InvalidApiKey`] if the token does not match.
pub fn validate_api_key(authorization: Option<&str>, expected_key: &str) -> Result<(), AuthError> {
    let token = authorization
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    if token == expected_key {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}

/// Raw identity header values of one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorHeaders<'a> {
    pub id: Option<&'a str>,
    pub role: Option<&'a str>,
    pub specialty: Option<&'a str>,
}

/// Builds the acting user from identity headers.
///
/// The user's display name is not transmitted, so the id stands in for it.
pub fn resolve_actor(headers: ActorHeaders<'_>) -> Result<User, AuthError> {
    let id = headers
        .id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingActor("user id"))?;
    let role: Role = headers
        .role
        .ok_or(AuthError::MissingActor("user role"))?
        .parse()
        .map_err(|e: clinica_core::ClinicError| AuthError::InvalidActor(e.to_string()))?;
    let specialty = headers
        .specialty
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(User {
        id: id.to_string(),
        name: id.to_string(),
        role,
        specialty,
    })
}
