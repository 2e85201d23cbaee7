//! Bearer token gate (RFC 6750)
//!
//! Turns the raw `Authorization` header value of a request into an
//! authenticated identity. HTTP framework glue lives in the API crate; this
//! module only sees header strings.
//!
//! # Format
//!
//! ```text
//! Authorization: Bearer <token>
//! ```

use tracing::debug;

use crate::error::AuthError;
use crate::jwt::TokenCodec;
use crate::store::UserId;

/// Extract the token part of a `Bearer` authorization header
///
/// The scheme is matched case-insensitively. Missing header, other schemes
/// and empty tokens are all `MissingCredential`.
pub fn extract_bearer(auth_header: Option<&str>) -> Result<&str, AuthError> {
    let header = auth_header.ok_or(AuthError::MissingCredential)?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or(AuthError::MissingCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Authenticate a request from its `Authorization` header value
///
/// Every token validation failure collapses into `InvalidCredential`; the
/// precise reason is only logged.
pub fn authenticate(auth_header: Option<&str>, codec: &TokenCodec) -> Result<UserId, AuthError> {
    let token = extract_bearer(auth_header)?;

    let claims = codec.validate(token).map_err(|e| {
        debug!("Rejecting bearer token: {}", e);
        AuthError::InvalidCredential
    })?;

    Ok(claims.sub)
}
