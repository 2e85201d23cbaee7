//! Registration and login

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::jwt::TokenCodec;
use crate::password::{hash_password, verify_password, PasswordError};
use crate::store::{CredentialStore, NewCredential, StoreError, UserId};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates the credential store, password hasher and token codec
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Create a user and return its identity
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthError> {
        if self
            .store
            .find_by_username_or_email(username, email)
            .await?
            .is_some()
        {
            debug!("Registration rejected, username or email taken");
            return Err(AuthError::DuplicateCredential);
        }

        let plaintext = password.to_string();
        let password_hash = run_blocking(move || hash_password(&plaintext)).await??;

        let user_id = self
            .store
            .create(NewCredential {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // Lost a race against a concurrent registration
                StoreError::Conflict => AuthError::DuplicateCredential,
                other => AuthError::Store(other),
            })?;

        info!("Registered user {} ({})", user_id, username);
        Ok(user_id)
    }

    /// Verify username/password and issue an access token
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let plaintext = password.to_string();
        let Some(credential) = self.store.find_by_username(username).await? else {
            // Burn the same hashing work as a real check
            run_blocking(move || verify_password(&plaintext, dummy_hash())).await?;
            warn!("Login failed for username '{}'", username);
            return Err(AuthError::InvalidCredential);
        };

        let stored_hash = credential.password_hash.clone();
        if !run_blocking(move || verify_password(&plaintext, &stored_hash)).await? {
            warn!("Login failed for username '{}'", username);
            return Err(AuthError::InvalidCredential);
        }

        let issued = self.codec.issue(credential.id)?;
        info!("User {} logged in", credential.id);

        Ok(Session {
            user_id: credential.id,
            username: credential.username,
            email: credential.email,
            expires_at: issued.claims.expires_at(),
            token: issued.token,
        })
    }
}

/// Run Argon2 work on tokio's blocking pool
async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::Hashing(PasswordError::HashingFailed(e.to_string())))
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("dummy-password").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::TokenConfig;
    use crate::ownership::{authorize, Decision};
    use crate::store::{Credential, MemoryCredentialStore, MockCredentialStore, ResourceRef};
    use chrono::Duration;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(&TokenConfig {
            secret: "service-secret".to_string(),
            issuer: "blog-api".to_string(),
            audience: "blog-clients".to_string(),
            access_token_ttl: Duration::hours(24),
        }))
    }

    fn memory_service() -> (AuthService, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        (AuthService::new(store.clone(), codec()), store)
    }

    #[tokio::test]
    async fn test_register_then_duplicate_username() {
        let (service, _) = memory_service();

        let id = service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();
        assert_ne!(id, UserId(0));

        let again = service.register("alice", "alice@x.com", "secret1").await;
        assert!(matches!(again, Err(AuthError::DuplicateCredential)));

        let same_email = service.register("alice2", "alice@x.com", "secret1").await;
        assert!(matches!(same_email, Err(AuthError::DuplicateCredential)));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let (service, store) = memory_service();
        service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();

        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_login_wrong_password_then_success() {
        let (service, _) = memory_service();
        let alice = service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();

        let wrong = service.login("alice", "wrongpass").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredential)));

        let session = service.login("alice", "secret1").await.unwrap();
        assert_eq!(session.user_id, alice);
        assert_eq!(session.username, "alice");
        assert_eq!(session.email, "alice@x.com");

        let claims = service.codec().validate(&session.token).unwrap();
        assert_eq!(claims.sub, alice);
        assert_eq!(claims.expires_at(), session.expires_at);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_fail_identically() {
        let (service, _) = memory_service();
        service
            .register("alice", "alice@x.com", "secret1")
            .await
            .unwrap();

        let unknown = service.login("mallory", "secret1").await.unwrap_err();
        let wrong = service.login("alice", "nope").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredential));
        assert!(matches!(wrong, AuthError::InvalidCredential));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_logins_all_succeed() {
        let (service, _) = memory_service();
        let mut ids = Vec::new();
        for i in 0..4 {
            let id = service
                .register(&format!("user{}", i), &format!("u{}@x.com", i), "secret1")
                .await
                .unwrap();
            ids.push(id);
        }

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move { service.login(&format!("user{}", i), "secret1").await })
            })
            .collect();

        for (handle, expected) in handles.into_iter().zip(ids) {
            let session = handle.await.unwrap().unwrap();
            assert_eq!(session.user_id, expected);
        }
    }

    #[tokio::test]
    async fn test_login_token_drives_ownership() {
        let (service, store) = memory_service();
        let owner = service.register("owner", "o@x.com", "secret1").await.unwrap();
        let other = service.register("other", "t@x.com", "secret2").await.unwrap();
        store.record_owner(ResourceRef::Post(1), owner).await;

        let recorded = store
            .find_owner_of(ResourceRef::Post(1))
            .await
            .unwrap()
            .unwrap();

        let other_session = service.login("other", "secret2").await.unwrap();
        let actor = service.codec().validate(&other_session.token).unwrap().sub;
        assert_eq!(actor, other);
        assert_eq!(authorize(actor, recorded), Decision::Denied);

        let owner_session = service.login("owner", "secret1").await.unwrap();
        let actor = service.codec().validate(&owner_session.token).unwrap().sub;
        assert_eq!(authorize(actor, recorded), Decision::Allowed);
    }

    #[tokio::test]
    async fn test_register_conflict_race_maps_to_duplicate() {
        let mut store = MockCredentialStore::new();
        store
            .expect_find_by_username_or_email()
            .returning(|_, _| Ok(None));
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(StoreError::Conflict));

        let service = AuthService::new(Arc::new(store), codec());
        let result = service.register("alice", "alice@x.com", "secret1").await;

        assert!(matches!(result, Err(AuthError::DuplicateCredential)));
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut store = MockCredentialStore::new();
        store
            .expect_find_by_username()
            .returning(|_| Err(StoreError::Backend("connection refused".to_string())));

        let service = AuthService::new(Arc::new(store), codec());
        let err = service.login("alice", "secret1").await.unwrap_err();

        assert!(matches!(err, AuthError::Store(_)));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_invalid_credential() {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_username().returning(|_| {
            Ok(Some(Credential {
                id: UserId(3),
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password_hash: "not-a-phc-string".to_string(),
            }))
        });

        let service = AuthService::new(Arc::new(store), codec());
        let result = service.login("alice", "secret1").await;

        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_duplicate_check_skips_hashing_and_create() {
        let mut store = MockCredentialStore::new();
        store.expect_find_by_username_or_email().returning(|_, _| {
            Ok(Some(Credential {
                id: UserId(1),
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password_hash: String::new(),
            }))
        });
        store.expect_create().never();

        let service = AuthService::new(Arc::new(store), codec());
        let result = service.register("alice", "new@x.com", "secret1").await;

        assert!(matches!(result, Err(AuthError::DuplicateCredential)));
    }
}
