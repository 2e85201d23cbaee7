//! Session token handling (HS256 JWT)
//!
//! Tokens are compact `header.claims.signature` strings signed with a
//! process-wide symmetric secret. Validation pins the algorithm, issuer and
//! audience; expiry is evaluated against an explicit clock so it can be
//! checked at any instant.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::UserId;

/// Signing algorithm for every session token
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims for an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (user ID, encoded as a decimal string)
    #[serde(with = "subject")]
    pub sub: UserId,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(
        user_id: UserId,
        issuer: String,
        audience: String,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, TokenError> {
        let exp = issued_at
            .checked_add_signed(validity)
            .ok_or(TokenError::LifetimeOutOfRange)?;

        Ok(Self {
            sub: user_id,
            iss: issuer,
            aud: audience,
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        })
    }

    /// A token stops being valid at the second its `exp` is reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

mod subject {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use crate::store::UserId;

    pub fn serialize<S: Serializer>(id: &UserId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UserId, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Token errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token issuer or audience mismatch")]
    ClaimMismatch,

    #[error("JWT encoding error: {0}")]
    Encoding(String),

    /// `iat + validity` does not fit in a timestamp
    #[error("Token lifetime out of range")]
    LifetimeOutOfRange,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::ClaimMismatch,
            // Includes InvalidAlgorithm: a header naming any algorithm other
            // than SESSION_ALGORITHM is structurally unacceptable.
            _ => TokenError::Malformed,
        }
    }
}

/// Signing configuration, loaded once at startup
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_ttl", &self.access_token_ttl)
            .finish()
    }
}

/// A freshly signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

/// Issues and validates session tokens
///
/// Read-only after construction; share it behind an `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        // Expiry is checked against the caller's clock in validate_at
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_token_ttl: config.access_token_ttl,
        }
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Issue an access token for `user_id` with the configured lifetime
    pub fn issue(&self, user_id: UserId) -> Result<IssuedToken, TokenError> {
        self.issue_at(user_id, Utc::now(), self.access_token_ttl)
    }

    pub fn issue_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        validity: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let claims = SessionClaims::new(
            user_id,
            self.issuer.clone(),
            self.audience.clone(),
            now,
            validity,
        )?;

        let token = encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Verify signature, algorithm, issuer and audience, then expiry at `now`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;

        if token_data.claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }
}
