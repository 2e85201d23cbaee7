use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blog_auth::ResourceRef;
use blog_db::entities::{comment, post, user};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::{authorize_mutation, comment_view, not_found, post_view};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::*;
use crate::validation::{validate_new_post, validate_post_update};
use crate::AppState;

/// List all posts, newest first
#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "List of posts", body = PostList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "posts"
)]
pub async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<PostList>, ApiError> {
    debug!("Listing posts");

    let rows = post::Entity::find()
        .find_also_related(user::Entity)
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .all(&state.db)
        .await?;

    let posts: Vec<Post> = rows
        .into_iter()
        .map(|(model, author)| post_view(model, author))
        .collect();
    let total = posts.len();

    Ok(Json(PostList { posts, total }))
}

/// Get a post with its author and comments
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post found", body = Post),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Post>, ApiError> {
    let (model, author) = post::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(ResourceRef::Post(id)))?;

    let comments = comment::Entity::find()
        .filter(comment::Column::PostId.eq(id))
        .find_also_related(user::Entity)
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(c, author)| comment_view(c, author))
        .collect();

    let mut post = post_view(model, author);
    post.comments = Some(comments);

    Ok(Json(post))
}

/// Create a post owned by the caller
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    validate_new_post(&req)?;

    let now = Utc::now();
    let created = post::ActiveModel {
        title: Set(req.title),
        content: Set(req.content),
        user_id: Set(caller.user_id.0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("User {} created post {}", caller.user_id, created.id);

    let author = user::Entity::find_by_id(created.user_id)
        .one(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Post created successfully".to_string(),
            post: post_view(created, author),
        }),
    ))
}

/// Update a post's title and/or content
///
/// Only the author may update. Absent or empty fields keep their value.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    authorize_mutation(&state, &caller, ResourceRef::Post(id)).await?;
    validate_post_update(&req)?;

    let existing = post::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(ResourceRef::Post(id)))?;

    let mut active: post::ActiveModel = existing.into();
    if let Some(title) = req.title.filter(|t| !t.is_empty()) {
        active.title = Set(title);
    }
    if let Some(content) = req.content.filter(|c| !c.is_empty()) {
        active.content = Set(content);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!("User {} updated post {}", caller.user_id, id);

    let author = user::Entity::find_by_id(updated.user_id)
        .one(&state.db)
        .await?;

    Ok(Json(PostResponse {
        message: "Post updated successfully".to_string(),
        post: post_view(updated, author),
    }))
}

/// Delete a post and its comments
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize_mutation(&state, &caller, ResourceRef::Post(id)).await?;

    let txn = state.db.begin().await?;
    let removed = comment::Entity::delete_many()
        .filter(comment::Column::PostId.eq(id))
        .exec(&txn)
        .await?;
    post::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "User {} deleted post {} ({} comments)",
        caller.user_id, id, removed.rows_affected
    );

    Ok(Json(MessageResponse {
        message: "Post deleted successfully".to_string(),
    }))
}
