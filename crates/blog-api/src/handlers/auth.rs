use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::models::*;
use crate::validation::{validate_login, validate_registration};
use crate::AppState;

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input or username/email taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    debug!("Registration attempt for username '{}'", req.username);
    validate_registration(&req)?;

    let user_id = state
        .auth
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: User {
                id: user_id.0,
                username: req.username,
                email: req.email,
            },
        }),
    ))
}

/// Exchange username and password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_login(&req)?;

    let session = state.auth.login(&req.username, &req.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: session.token,
        expires_at: session.expires_at,
        user: User {
            id: session.user_id.0,
            username: session.username,
            email: session.email,
        },
    }))
}
