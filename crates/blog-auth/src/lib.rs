//! Authentication and authorization for the blog backend

pub mod error;
pub mod gate;
pub mod jwt;
pub mod ownership;
pub mod password;
pub mod service;
pub mod store;

pub use error::AuthError;
pub use gate::{authenticate, extract_bearer};
pub use jwt::{IssuedToken, SessionClaims, TokenCodec, TokenConfig, TokenError};
pub use ownership::{authorize, ensure_owner, Decision};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthService, Session};
pub use store::{
    Credential, CredentialStore, MemoryCredentialStore, NewCredential, ResourceRef, StoreError,
    UserId,
};
