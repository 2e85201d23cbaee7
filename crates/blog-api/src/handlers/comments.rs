use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blog_auth::ResourceRef;
use blog_db::entities::{comment, post, user};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{debug, info};

use super::{authorize_mutation, comment_view, not_found};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::validation::validate_new_comment;
use crate::AppState;

/// List comments on a post, newest first
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "List of comments", body = CommentList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "comments"
)]
pub async fn list_post_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<CommentList>, ApiError> {
    debug!("Listing comments for post {}", id);

    let comments: Vec<Comment> = comment::Entity::find()
        .filter(comment::Column::PostId.eq(id))
        .find_also_related(user::Entity)
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(model, author)| comment_view(model, author))
        .collect();
    let total = comments.len();

    Ok(Json(CommentList { comments, total }))
}

/// Comment on an existing post
#[utoipa::path(
    post,
    path = "/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    validate_new_comment(&req)?;

    if post::Entity::find_by_id(req.post_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(not_found(ResourceRef::Post(req.post_id)));
    }

    let now = Utc::now();
    let created = comment::ActiveModel {
        content: Set(req.content),
        user_id: Set(caller.user_id.0),
        post_id: Set(req.post_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!(
        "User {} commented on post {} (comment {})",
        caller.user_id, created.post_id, created.id
    );

    let author = user::Entity::find_by_id(created.user_id)
        .one(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: "Comment created successfully".to_string(),
            comment: comment_view(created, author),
        }),
    ))
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(
        ("id" = i32, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize_mutation(&state, &caller, ResourceRef::Comment(id)).await?;

    comment::Entity::delete_by_id(id).exec(&state.db).await?;
    info!("User {} deleted comment {}", caller.user_id, id);

    Ok(Json(MessageResponse {
        message: "Comment deleted successfully".to_string(),
    }))
}
