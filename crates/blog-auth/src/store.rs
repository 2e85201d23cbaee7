//! Credential store contract and an in-memory implementation
//!
//! The store owns user identities and the ownership records of posts and
//! comments. Authentication code reaches it only through [`CredentialStore`].

use std::collections::HashMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Opaque numeric user identifier, assigned once by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(UserId)
    }
}

/// Stored user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
}

/// User record about to be persisted (no identity yet)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A mutable resource whose owner can be looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Post(i32),
    Comment(i32),
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Post(id) => write!(f, "post {}", id),
            ResourceRef::Comment(id) => write!(f, "comment {}", id),
        }
    }
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique username/email constraint rejected the write
    #[error("Credential already exists")]
    Conflict,

    #[error("Credential store error: {0}")]
    Backend(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user whose username or email matches either argument
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<Credential>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError>;

    /// Persist a new user and return its freshly assigned identity
    async fn create(&self, credential: NewCredential) -> Result<UserId, StoreError>;

    /// Owner of an existing resource, `None` if the resource does not exist
    async fn find_owner_of(&self, resource: ResourceRef) -> Result<Option<UserId>, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    next_id: i32,
    users: Vec<Credential>,
    owners: HashMap<ResourceRef, UserId>,
}

/// Process-local store, used by tests and throwaway setups
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: RwLock<MemoryState>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the creator of a resource; the first owner recorded wins
    pub async fn record_owner(&self, resource: ResourceRef, owner: UserId) {
        let mut state = self.state.write().await;
        state.owners.entry(resource).or_insert(owner);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<Credential>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create(&self, credential: NewCredential) -> Result<UserId, StoreError> {
        let mut state = self.state.write().await;

        if state
            .users
            .iter()
            .any(|u| u.username == credential.username || u.email == credential.email)
        {
            return Err(StoreError::Conflict);
        }

        state.next_id += 1;
        let id = UserId(state.next_id);
        state.users.push(Credential {
            id,
            username: credential.username,
            email: credential.email,
            password_hash: credential.password_hash,
        });

        Ok(id)
    }

    async fn find_owner_of(&self, resource: ResourceRef) -> Result<Option<UserId>, StoreError> {
        let state = self.state.read().await;
        Ok(state.owners.get(&resource).copied())
    }
}
