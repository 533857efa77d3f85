//! `AppError` status mapping and body shape.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use pathway_api::error::AppError;
use pathway_core::model::PathError;
use services::{ChatRelayError, ProgressSyncError};
use storage::repository::StorageError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn storage_errors_hide_details() {
    let (status, body) = render(AppError::Storage(StorageError::Connection(
        "disk on fire".into(),
    )))
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn upstream_errors_pass_the_provider_body() {
    let err = ChatRelayError::Upstream {
        status: StatusCode::TOO_MANY_REQUESTS,
        body: "rate limited".into(),
    };
    let (status, body) = render(AppError::from(err)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Upstream error: rate limited");
}

#[tokio::test]
async fn duplicate_path_maps_to_conflict() {
    let err = ProgressSyncError::Path(PathError::DuplicatePath {
        category: "DevOps".into(),
    });
    let (status, body) = render(AppError::from(err)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("DevOps"));
}

#[tokio::test]
async fn storage_conflicts_map_to_409() {
    let (status, body) = render(AppError::Storage(StorageError::Conflict(
        "path id already stored".into(),
    )))
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "path id already stored");

    let err = ProgressSyncError::Storage(StorageError::Conflict("taken".into()));
    let (status, _) = render(AppError::from(err)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn client_errors_keep_their_message() {
    let (status, body) = render(AppError::BadRequest("bad input".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad input");

    let (status, _) = render(AppError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = render(AppError::Forbidden).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
