//! HTTP handlers

pub mod auth;
pub mod comments;
pub mod posts;
pub mod system;

pub use auth::{login, register};
pub use comments::{create_comment, delete_comment, list_post_comments};
pub use posts::{create_post, delete_post, get_post, list_posts, update_post};
pub use system::{health_check, openapi_json};

use blog_auth::{ensure_owner, AuthError, ResourceRef};
use blog_db::entities::{comment, post, user};
use tracing::warn;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{Author, Comment, Post};
use crate::AppState;

/// Existence lookup followed by the ownership check
///
/// 404 when the resource is gone, 403 when the caller does not own it.
pub(crate) async fn authorize_mutation(
    state: &AppState,
    caller: &AuthUser,
    resource: ResourceRef,
) -> Result<(), ApiError> {
    let owner = state
        .store
        .find_owner_of(resource)
        .await
        .map_err(AuthError::from)?
        .ok_or_else(|| not_found(resource))?;

    ensure_owner(caller.user_id, owner).map_err(|_| {
        warn!(
            "User {} denied mutation of {} owned by {}",
            caller.user_id, resource, owner
        );
        match resource {
            ResourceRef::Post(_) => ApiError::forbidden("You can only modify your own posts"),
            ResourceRef::Comment(_) => ApiError::forbidden("You can only modify your own comments"),
        }
    })
}

pub(crate) fn not_found(resource: ResourceRef) -> ApiError {
    match resource {
        ResourceRef::Post(_) => ApiError::not_found("Post not found", "POST_NOT_FOUND"),
        ResourceRef::Comment(_) => ApiError::not_found("Comment not found", "COMMENT_NOT_FOUND"),
    }
}

fn author_view(user: Option<user::Model>) -> Option<Author> {
    user.map(|u| Author {
        id: u.id,
        username: u.username,
    })
}

pub(crate) fn post_view(model: post::Model, author: Option<user::Model>) -> Post {
    Post {
        id: model.id,
        title: model.title,
        content: model.content,
        user_id: model.user_id,
        author: author_view(author),
        comments: None,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub(crate) fn comment_view(model: comment::Model, author: Option<user::Model>) -> Comment {
    Comment {
        id: model.id,
        content: model.content,
        user_id: model.user_id,
        post_id: model.post_id,
        author: author_view(author),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
