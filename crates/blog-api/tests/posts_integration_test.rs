//! Integration tests for post and comment endpoints

mod common;

use axum::http::StatusCode;
use blog_auth::{TokenCodec, TokenConfig, UserId};
use serde_json::json;

use common::spawn_app;

#[tokio::test]
async fn test_protected_route_without_header() {
    let app = spawn_app().await;

    let response = app
        .request(
            "POST",
            "/posts",
            None,
            Some(json!({ "title": "Hello", "content": "World" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "MISSING_AUTH");
    assert_eq!(response.www_authenticate.as_deref(), Some("Bearer"));
}

#[tokio::test]
async fn test_protected_route_with_bad_tokens() {
    let app = spawn_app().await;
    app.register("alice", "secret1").await;

    let foreign = TokenCodec::new(&TokenConfig {
        secret: "some-other-secret".to_string(),
        issuer: "blog-api".to_string(),
        audience: "blog-clients".to_string(),
        access_token_ttl: chrono::Duration::hours(1),
    })
    .issue(UserId(1))
    .unwrap()
    .token;
    let expired = app
        .codec
        .issue_at(UserId(1), chrono::Utc::now(), chrono::Duration::seconds(-1))
        .unwrap()
        .token;

    for token in [foreign.as_str(), expired.as_str(), "garbage"] {
        let response = app.request("DELETE", "/posts/1", Some(token), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["code"], "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn test_create_list_and_get_post() {
    let app = spawn_app().await;
    let (alice, token) = app.user_with_token("alice").await;

    let first = app.create_post(&token, "First", "Hello").await;
    let second = app.create_post(&token, "Second", "Again").await;

    let list = app.request("GET", "/posts", None, None).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["total"], 2);
    assert_eq!(list.body["posts"][0]["id"].as_i64().unwrap(), second);
    assert_eq!(list.body["posts"][1]["id"].as_i64().unwrap(), first);
    assert_eq!(list.body["posts"][0]["author"]["username"], "alice");

    let post = app
        .request("GET", &format!("/posts/{}", first), None, None)
        .await;
    assert_eq!(post.status, StatusCode::OK);
    assert_eq!(post.body["title"], "First");
    assert_eq!(post.body["user_id"].as_i64().unwrap(), alice);
    assert_eq!(post.body["comments"], json!([]));
}

#[tokio::test]
async fn test_post_validation() {
    let app = spawn_app().await;
    let (_, token) = app.user_with_token("alice").await;

    let response = app
        .request(
            "POST",
            "/posts",
            Some(&token),
            Some(json!({ "title": "x".repeat(201), "content": "body" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_TITLE");

    let response = app
        .request(
            "POST",
            "/posts",
            Some(&token),
            Some(json!({ "title": "Title", "content": "" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_CONTENT");
}

#[tokio::test]
async fn test_get_missing_post() {
    let app = spawn_app().await;

    let response = app.request("GET", "/posts/999", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "POST_NOT_FOUND");

    let response = app.request("GET", "/posts/abc", None, None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_owner_can_update_post() {
    let app = spawn_app().await;
    let (_, owner_token) = app.user_with_token("owner").await;
    let (_, other_token) = app.user_with_token("other").await;

    let id = app.create_post(&owner_token, "Original", "Body").await;
    let uri = format!("/posts/{}", id);

    let denied = app
        .request(
            "PUT",
            &uri,
            Some(&other_token),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["code"], "FORBIDDEN");

    let allowed = app
        .request(
            "PUT",
            &uri,
            Some(&owner_token),
            Some(json!({ "title": "Edited", "content": "" })),
        )
        .await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["post"]["title"], "Edited");
    assert_eq!(allowed.body["post"]["content"], "Body");

    let missing = app
        .request(
            "PUT",
            "/posts/999",
            Some(&owner_token),
            Some(json!({ "title": "Nothing" })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_post_removes_comments() {
    let app = spawn_app().await;
    let (_, owner_token) = app.user_with_token("owner").await;
    let (_, reader_token) = app.user_with_token("reader").await;

    let id = app.create_post(&owner_token, "Doomed", "Soon gone").await;
    let comment = app
        .request(
            "POST",
            "/comments",
            Some(&reader_token),
            Some(json!({ "content": "First!", "post_id": id })),
        )
        .await;
    assert_eq!(comment.status, StatusCode::CREATED);

    let uri = format!("/posts/{}", id);
    let denied = app.request("DELETE", &uri, Some(&reader_token), None).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app.request("DELETE", &uri, Some(&owner_token), None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Post deleted successfully");

    let gone = app.request("GET", &uri, None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let comments = app
        .request("GET", &format!("/posts/{}/comments", id), None, None)
        .await;
    assert_eq!(comments.status, StatusCode::OK);
    assert_eq!(comments.body["total"], 0);

    let again = app.request("DELETE", &uri, Some(&owner_token), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = spawn_app().await;
    let (_, author_token) = app.user_with_token("author").await;
    let (reader, reader_token) = app.user_with_token("reader").await;

    let post_id = app.create_post(&author_token, "Post", "Body").await;

    let missing_post = app
        .request(
            "POST",
            "/comments",
            Some(&reader_token),
            Some(json!({ "content": "Hello?", "post_id": 999 })),
        )
        .await;
    assert_eq!(missing_post.status, StatusCode::NOT_FOUND);
    assert_eq!(missing_post.body["code"], "POST_NOT_FOUND");

    let created = app
        .request(
            "POST",
            "/comments",
            Some(&reader_token),
            Some(json!({ "content": "Nice post", "post_id": post_id })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["comment"]["user_id"].as_i64().unwrap(), reader);
    assert_eq!(created.body["comment"]["author"]["username"], "reader");
    let comment_id = created.body["comment"]["id"].as_i64().unwrap();

    let post = app
        .request("GET", &format!("/posts/{}", post_id), None, None)
        .await;
    assert_eq!(post.body["comments"][0]["content"], "Nice post");

    let comment_uri = format!("/comments/{}", comment_id);

    // The post's author does not own the reader's comment
    let denied = app
        .request("DELETE", &comment_uri, Some(&author_token), None)
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app
        .request("DELETE", &comment_uri, Some(&reader_token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let missing = app
        .request("DELETE", &comment_uri, Some(&reader_token), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["code"], "COMMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_list_comments_newest_first() {
    let app = spawn_app().await;
    let (_, token) = app.user_with_token("alice").await;
    let post_id = app.create_post(&token, "Post", "Body").await;

    for content in ["one", "two"] {
        let response = app
            .request(
                "POST",
                "/comments",
                Some(&token),
                Some(json!({ "content": content, "post_id": post_id })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let list = app
        .request("GET", &format!("/posts/{}/comments", post_id), None, None)
        .await;
    assert_eq!(list.body["total"], 2);
    assert_eq!(list.body["comments"][0]["content"], "two");
    assert_eq!(list.body["comments"][1]["content"], "one");
}
