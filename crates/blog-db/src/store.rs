//! SQL-backed credential store

use async_trait::async_trait;
use blog_auth::{Credential, CredentialStore, NewCredential, ResourceRef, StoreError, UserId};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set, SqlErr,
};
use tracing::error;

use crate::entities::{comment, post, user};

/// [`CredentialStore`] over the `users`, `posts` and `comments` tables
#[derive(Clone)]
pub struct DbCredentialStore {
    db: DatabaseConnection,
}

impl DbCredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn backend_error(err: DbErr) -> StoreError {
    error!("Credential store query failed: {}", err);
    StoreError::Backend(err.to_string())
}

fn to_credential(model: user::Model) -> Credential {
    Credential {
        id: UserId(model.id),
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
    }
}

#[async_trait]
impl CredentialStore for DbCredentialStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<Credential>, StoreError> {
        let found = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .one(&self.db)
            .await
            .map_err(backend_error)?;

        Ok(found.map(to_credential))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(backend_error)?;

        Ok(found.map(to_credential))
    }

    async fn create(&self, credential: NewCredential) -> Result<UserId, StoreError> {
        let now = Utc::now();
        let new_user = user::ActiveModel {
            username: Set(credential.username),
            email: Set(credential.email),
            password_hash: Set(credential.password_hash),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match new_user.insert(&self.db).await {
            Ok(model) => Ok(UserId(model.id)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StoreError::Conflict)
            }
            Err(err) => Err(backend_error(err)),
        }
    }

    async fn find_owner_of(&self, resource: ResourceRef) -> Result<Option<UserId>, StoreError> {
        let owner = match resource {
            ResourceRef::Post(id) => post::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(backend_error)?
                .map(|p| p.user_id),
            ResourceRef::Comment(id) => comment::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(backend_error)?
                .map(|c| c.user_id),
        };

        Ok(owner.map(UserId))
    }
}
