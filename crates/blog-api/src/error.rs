//! HTTP error mapping

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use blog_auth::AuthError;
use sea_orm::DbErr;
use tracing::{error, warn};

use crate::models::ErrorResponse;

/// Error returned by handlers and the auth middleware
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, code: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                code: Some(code.to_string()),
            },
        }
    }

    pub fn bad_request(error: impl Into<String>, code: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, code)
    }

    pub fn not_found(error: impl Into<String>, code: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, code)
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, error, "FORBIDDEN")
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            "INTERNAL_ERROR",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.body.code.as_deref()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let unauthorized = self.status == StatusCode::UNAUTHORIZED;
        let mut response = (self.status, Json(self.body)).into_response();
        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.is_internal() {
            error!("Authentication backend failure: {}", err);
            return Self::internal();
        }

        match err {
            AuthError::MissingCredential => Self::new(
                StatusCode::UNAUTHORIZED,
                "Missing authentication token. Expected 'Authorization: Bearer <token>'",
                "MISSING_AUTH",
            ),
            AuthError::DuplicateCredential => {
                Self::bad_request("Username or email already exists", "USER_EXISTS")
            }
            AuthError::Denied => Self::forbidden("Permission denied"),
            // InvalidCredential and every non-internal token error
            other => {
                warn!("Rejected credential: {}", other);
                Self::new(
                    StatusCode::UNAUTHORIZED,
                    "Invalid credentials",
                    "INVALID_CREDENTIALS",
                )
            }
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        error!("Database error: {}", err);
        Self::internal()
    }
}
