//! Router-level checks driven in-process with `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::TestDb;
use recipes::{AppState, Config, build_router, services::storage::ImageStorage};
use tempfile::TempDir;
use tower::ServiceExt;

async fn router() -> (axum::Router, TestDb, TempDir) {
    let test_db = TestDb::new().await;
    let media = TempDir::new().unwrap();
    let state = AppState::new(test_db.pool.clone(), ImageStorage::new(media.path()), Config::default());
    (build_router(state), test_db, media)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_in_process() {
    let (app, _db, _media) = router().await;

    let response = app
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_request_id_propagated() {
    let (app, _db, _media) = router().await;

    let response = app
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_wrong_method_on_public_route() {
    let (app, _db, _media) = router().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(response).await["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _db, _media) = router().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/recipes")
                .header("Authorization", "Token abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn test_missing_media_file() {
    let (app, _db, _media) = router().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/uploads/recipe/missing.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
