//! Bearer token authentication middleware
//!
//! Protected routes run behind [`require_auth`]. It reads the
//! `Authorization: Bearer <token>` header, validates the token and makes the
//! caller's identity available to handlers via Axum's `Extension`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use blog_auth::{authenticate, TokenCodec, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;

/// Authenticated caller
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// Token validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub codec: Arc<TokenCodec>,
}

impl JwtState {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }
}

/// Reject the request unless it carries a valid bearer token
///
/// # Errors
/// Returns 401 Unauthorized with
/// - `MISSING_AUTH` when the header is absent, empty, or not a Bearer credential
/// - `INVALID_CREDENTIALS` for any token that fails validation
pub async fn require_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let user_id = authenticate(auth_header, &state.codec)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}
