//! Authentication error taxonomy

use thiserror::Error;

use crate::jwt::TokenError;
use crate::password::PasswordError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable `Authorization: Bearer` header
    #[error("Missing authentication token")]
    MissingCredential,

    /// Unknown user, wrong password or unusable token. Deliberately carries
    /// no detail about which.
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Username or email already exists")]
    DuplicateCredential,

    /// The actor does not own the resource
    #[error("Permission denied")]
    Denied,

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Failures caused by the environment rather than the client
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Hashing(_)
                | AuthError::Store(_)
                | AuthError::Token(TokenError::Encoding(_))
                | AuthError::Token(TokenError::LifetimeOutOfRange)
        )
    }
}
