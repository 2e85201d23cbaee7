//! Request body validation

use crate::error::ApiError;
use crate::models::{
    CreateCommentRequest, CreatePostRequest, LoginRequest, RegisterRequest, UpdatePostRequest,
};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;
const TITLE_MAX: usize = 200;

pub fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let username_len = req.username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
        return Err(ApiError::bad_request(
            format!(
                "Username must be between {} and {} characters",
                USERNAME_MIN, USERNAME_MAX
            ),
            "INVALID_USERNAME",
        ));
    }

    if !is_valid_email(&req.email) {
        return Err(ApiError::bad_request(
            "Invalid email format",
            "INVALID_EMAIL",
        ));
    }

    if req.password.chars().count() < PASSWORD_MIN {
        return Err(ApiError::bad_request(
            format!("Password must be at least {} characters", PASSWORD_MIN),
            "WEAK_PASSWORD",
        ));
    }

    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request(
            "Username and password are required",
            "INVALID_REQUEST",
        ));
    }
    Ok(())
}

pub fn validate_new_post(req: &CreatePostRequest) -> Result<(), ApiError> {
    validate_title(&req.title)?;
    validate_content(&req.content)
}

/// Empty fields are ignored by the update, so only a present title is bounded
pub fn validate_post_update(req: &UpdatePostRequest) -> Result<(), ApiError> {
    match req.title.as_deref() {
        Some(title) if !title.is_empty() => validate_title(title),
        _ => Ok(()),
    }
}

pub fn validate_new_comment(req: &CreateCommentRequest) -> Result<(), ApiError> {
    validate_content(&req.content)
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required", "INVALID_TITLE"));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(ApiError::bad_request(
            format!("Title must be at most {} characters", TITLE_MAX),
            "INVALID_TITLE",
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Content is required",
            "INVALID_CONTENT",
        ));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty() && !domain.starts_with('.'),
        None => false,
    }
}
