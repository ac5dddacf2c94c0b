mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use schedule_portal::api::router;
use schedule_portal::models::{Role, User};
use schedule_portal::services::auth::LoginMode;
use schedule_portal::session::{SessionContext, SessionStore};
use schedule_portal::state::AppState;

use common::{InMemoryDataApi, campus, memory_pool};

async fn app_with(api: Arc<InMemoryDataApi>, signed_in: Option<User>) -> Router {
    let pool = memory_pool().await;
    if let Some(user) = &signed_in {
        SessionStore::new(pool.clone()).save(user).await.unwrap();
    }
    let session = SessionContext::init(SessionStore::new(pool.clone())).await.unwrap();
    router(AppState::new(pool, api, session, LoginMode::Plaintext))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, location, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn instructor() -> Option<User> {
    Some(User { user_id: 7, role: Role::Instructor })
}

#[tokio::test]
async fn dashboards_redirect_without_a_session() {
    let app = app_with(Arc::new(campus()), None).await;

    let (status, location, body) = send(&app, get("/instructor")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/"));
    assert_eq!(body, Value::Null);

    let (status, location, _) = send(&app, get("/student")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/"));

    let (status, _, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "login");
}

#[tokio::test]
async fn wrong_role_is_sent_back_to_the_root() {
    let app = app_with(Arc::new(campus()), instructor()).await;

    let (status, location, _) = send(&app, get("/student")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/"));

    let (status, location, _) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/instructor"));
}

#[tokio::test]
async fn login_then_logout() {
    let app = app_with(Arc::new(campus()), None).await;

    let (status, _, body) = send(
        &app,
        post_json("/login", json!({ "username": "ada", "password": "engine" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "student");
    assert_eq!(body["redirect"], "/student");
    assert_eq!(body["notice"]["title"], "Login successful");

    let (status, _, body) = send(&app, get("/student")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student"]["name"], "Ada");
    assert_eq!(body["schedules"].as_array().unwrap().len(), 2);

    let (status, location, _) = send(&app, post_json("/logout", json!({}))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/"));

    let (status, _, _) = send(&app, get("/student")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn failed_login_stores_nothing() {
    let app = app_with(Arc::new(campus()), None).await;

    let (status, _, body) = send(
        &app,
        post_json("/login", json!({ "username": "ada", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["notice"]["title"], "Login failed");
    assert_eq!(body["notice"]["description"], "Invalid credentials");
    assert_eq!(body["user"], Value::Null);

    let (status, _, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "login");
}

#[tokio::test]
async fn instructor_creates_and_deletes_schedules() {
    let api = Arc::new(campus());
    let app = app_with(api.clone(), instructor()).await;

    let (status, _, body) = send(&app, get("/instructor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["instructor"]["name"], "Alan");
    assert_eq!(body["courses"], "CS101 - CS202");
    assert_eq!(body["schedules"].as_array().unwrap().len(), 2);
    assert_eq!(body["schedules"][0]["kind"], "Fixed");
    assert_eq!(body["programs"].as_array().unwrap().len(), 2);

    let (status, _, body) = send(
        &app,
        post_json("/instructor/schedules", json!({ "program_id": 4, "fixed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["notice"]["title"], "Please fill all the fields");
    assert_eq!(body["phase"], "incomplete");
    assert_eq!(body["form"]["program_id"], 4);
    assert_eq!(body["schedules"].as_array().unwrap().len(), 2);

    let (status, _, body) = send(
        &app,
        post_json(
            "/instructor/schedules",
            json!({ "program_id": 4, "date": "2099-03-11", "fixed": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notice"]["title"], "Schedule created");
    assert_eq!(body["phase"], "succeeded");
    assert_eq!(body["form"]["program_id"], Value::Null);
    let rows = body["schedules"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["weekday"], "Wednesday");
    assert_eq!(rows[2]["start_time"], "1:00:00 PM");
    assert_eq!(rows[2]["end_time"], "3:00:00 PM");
    assert_eq!(api.stored_schedules().len(), 5);

    let request = Request::builder()
        .method("DELETE")
        .uri("/instructor/schedules/1")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"]["title"], "Schedule Deleted");
    let ids: Vec<i64> = body["schedules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 5]);
}

#[tokio::test]
async fn pending_create_does_not_block_the_dashboard() {
    let api = Arc::new(campus());
    let app = app_with(api.clone(), instructor()).await;
    let (status, _, _) = send(&app, get("/instructor")).await;
    assert_eq!(status, StatusCode::OK);

    let gate = api.hold_creates();
    let pending = {
        let app = app.clone();
        tokio::spawn(async move {
            send(
                &app,
                post_json(
                    "/instructor/schedules",
                    json!({ "program_id": 4, "date": "2099-03-11", "fixed": false }),
                ),
            )
            .await
        })
    };
    while !api.calls().iter().any(|c| c == "create") {
        tokio::task::yield_now().await;
    }

    let (status, _, body) = tokio::time::timeout(Duration::from_secs(2), send(&app, get("/instructor")))
        .await
        .expect("dashboard answered while a create was in flight");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["schedules"].as_array().unwrap().len(), 2);

    gate.notify_one();
    let (status, _, body) = pending.await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["schedules"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn dashboard_failure_reports_the_stage_and_empties_the_list() {
    let api = Arc::new(campus());
    api.fail("instructor_courses");
    let app = app_with(api, instructor()).await;

    let (status, _, body) = send(&app, get("/instructor")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["notice"]["title"], "Error fetching data");
    assert!(
        body["notice"]["description"]
            .as_str()
            .unwrap()
            .starts_with("Failed to load instructor courses")
    );
    assert!(body["schedules"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_checks_the_session_database() {
    let app = app_with(Arc::new(InMemoryDataApi::default()), None).await;
    let (status, _, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}
