//! Authenticated progress sync over `/learning-paths`.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json, post_json_auth, post_raw_auth};
use serde_json::json;

fn web_dev_path(completed_first: bool) -> serde_json::Value {
    let completed_at = completed_first.then_some("2024-01-02T00:00:00Z");
    json!({
        "id": "web-development-1700000000000",
        "title": "Web Development",
        "category": "Web Development",
        "createdAt": "2024-01-01T00:00:00Z",
        "milestones": [
            { "title": "HTML & CSS Foundations", "completed": completed_first,
              "completedAt": completed_at,
              "skills": ["HTML", "CSS"] },
            { "title": "JavaScript & the DOM", "completed": false }
        ]
    })
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let response = get(common::build_test_app(), "/learning-paths?userId=u1").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = common::build_test_app();
    let request = axum::http::Request::builder()
        .uri("/learning-paths?userId=u1")
        .header("authorization", "Bearer not-a-jwt")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_without_token_is_unauthorized() {
    let body = json!({ "userId": "u1", "paths": [] });
    let response = post_json(common::build_test_app(), "/learning-paths", &body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mismatched_user_id_is_forbidden() {
    let response = get_auth(common::build_test_app(), "/learning-paths?userId=u2", "u1").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Forbidden");
}

#[tokio::test]
async fn missing_user_id_is_forbidden() {
    let app = common::build_test_app();
    let get_resp = get_auth(app.clone(), "/learning-paths", "u1").await;
    assert_eq!(get_resp.status(), StatusCode::FORBIDDEN);

    let body = json!({ "paths": [] });
    let post_resp = post_json_auth(app, "/learning-paths", "u1", &body).await;
    assert_eq!(post_resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_user_reads_empty_list() {
    let response = get_auth(common::build_test_app(), "/learning-paths?userId=u1", "u1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn replace_then_fetch_returns_derived_progress() {
    let app = common::build_test_app();
    let body = json!({ "userId": "u1", "paths": [web_dev_path(true)] });

    let saved = post_json_auth(app.clone(), "/learning-paths", "u1", &body).await;
    assert_eq!(saved.status(), StatusCode::OK);
    let saved = body_json(saved).await;
    assert_eq!(saved["success"], true);
    assert_eq!(saved["paths"][0]["progress"], 50.0);

    let fetched = get_auth(app, "/learning-paths?userId=u1", "u1").await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let paths = body_json(fetched).await;
    let path = &paths[0];
    assert_eq!(path["id"], "web-development-1700000000000");
    assert_eq!(path["createdAt"], "2024-01-01T00:00:00Z");
    assert_eq!(path["completed"], 1);
    assert_eq!(path["total"], 2);
    assert_eq!(path["progress"], 50.0);
    assert_eq!(path["milestones"][0]["completed"], true);
    assert_eq!(path["milestones"][0]["skills"], json!(["HTML", "CSS"]));
    assert_eq!(path["milestones"][1]["completed"], false);
}

#[tokio::test]
async fn second_replace_overwrites_first() {
    let app = common::build_test_app();
    let first = json!({ "userId": "u1", "paths": [web_dev_path(false)] });
    post_json_auth(app.clone(), "/learning-paths", "u1", &first).await;

    let second = json!({ "userId": "u1", "paths": [] });
    let response = post_json_auth(app.clone(), "/learning-paths", "u1", &second).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = get_auth(app, "/learning-paths?userId=u1", "u1").await;
    assert_eq!(body_json(fetched).await, json!([]));
}

#[tokio::test]
async fn users_do_not_see_each_other() {
    let app = common::build_test_app();
    let body = json!({ "userId": "u1", "paths": [web_dev_path(true)] });
    post_json_auth(app.clone(), "/learning-paths", "u1", &body).await;

    let other = get_auth(app, "/learning-paths?userId=u2", "u2").await;
    assert_eq!(body_json(other).await, json!([]));
}

#[tokio::test]
async fn duplicate_category_is_conflict_and_keeps_prior_state() {
    let app = common::build_test_app();
    let first = json!({ "userId": "u1", "paths": [web_dev_path(true)] });
    post_json_auth(app.clone(), "/learning-paths", "u1", &first).await;

    let mut twin = web_dev_path(false);
    twin["id"] = json!("web-development-2");
    let dup = json!({ "userId": "u1", "paths": [web_dev_path(false), twin] });
    let response = post_json_auth(app.clone(), "/learning-paths", "u1", &dup).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("Web Development"));

    let fetched = body_json(get_auth(app, "/learning-paths?userId=u1", "u1").await).await;
    assert_eq!(fetched[0]["completed"], 1);
}

fn bare_path(id: &str, category: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("{category} Path"),
        "category": category,
        "milestones": []
    })
}

#[tokio::test]
async fn shared_path_id_is_conflict_on_every_backend() {
    let paths = [bare_path("same", "A"), bare_path("same", "B")];
    let body = json!({ "userId": "u1", "paths": paths });

    let memory = common::build_test_app();
    let response = post_json_auth(memory.clone(), "/learning-paths", "u1", &body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_json(response).await["error"].as_str().unwrap().contains("same"));
    let fetched = get_auth(memory, "/learning-paths?userId=u1", "u1").await;
    assert_eq!(body_json(fetched).await, json!([]));

    let sqlite =
        common::build_sqlite_app("sqlite:file:api_shared_id?mode=memory&cache=shared").await;
    let response = post_json_auth(sqlite, "/learning-paths", "u1", &body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let response =
        post_raw_auth(common::build_test_app(), "/learning-paths", "u1", "{not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn blank_title_is_bad_request() {
    let mut path = web_dev_path(false);
    path["title"] = json!("   ");
    let body = json!({ "userId": "u1", "paths": [path] });
    let response = post_json_auth(common::build_test_app(), "/learning-paths", "u1", &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sqlite_backed_server_persists_across_routers() {
    let url = "sqlite:file:api_persist?mode=memory&cache=shared";
    let first = common::build_sqlite_app(url).await;
    let body = json!({ "userId": "u1", "paths": [web_dev_path(true)] });
    let response = post_json_auth(first.clone(), "/learning-paths", "u1", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let second = common::build_sqlite_app(url).await;
    let fetched = body_json(get_auth(second, "/learning-paths?userId=u1", "u1").await).await;
    assert_eq!(fetched[0]["category"], "Web Development");
    assert_eq!(fetched[0]["progress"], 50.0);
    drop(first);
}
