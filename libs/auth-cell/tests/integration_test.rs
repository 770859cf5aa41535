use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_partial_json, method, path};

use auth_cell::router::auth_routes;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::session::SessionStore;
use shared_utils::state::AppState;
use shared_utils::test_utils::{test_state, MockBackendResponses, TestUser};

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_token(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn mock_login(mock_server: &MockServer, user: &TestUser, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({ "email": user.email })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockBackendResponses::login_response(user, token)
        ))
        .mount(mock_server)
        .await;
}

fn patient_form() -> Value {
    json!({
        "role": "patient",
        "fullName": "Tolu Adeyemi",
        "email": "tolu@example.com",
        "phone": "+234 803 000 1111",
        "password": "a-long-password",
        "dateOfBirth": "1990-04-12",
        "gender": "female"
    })
}

#[tokio::test]
async fn test_register_forwards_valid_form() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_partial_json(json!({ "role": "patient", "dateOfBirth": "1990-04-12" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "user-1" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (state, _) = test_state(&mock_server.uri());
    let app = auth_routes(state);

    let response = app.oneshot(post_json("/register", patient_form())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json_response = read_json(response).await;
    assert_eq!(json_response["success"], true);
    assert_eq!(json_response["role"], "patient");
    assert_eq!(json_response["user"]["id"], "user-1");
}

#[tokio::test]
async fn test_register_reports_field_errors_without_calling_backend() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (state, _) = test_state(&mock_server.uri());
    let app = auth_routes(state);

    let mut form = patient_form();
    form["email"] = json!("tolu-at-example");
    form["gender"] = json!("");

    let response = app.oneshot(post_json("/register", form)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json_response = read_json(response).await;
    assert_eq!(json_response["success"], false);
    assert!(json_response["errors"]["email"].is_string());
    assert!(json_response["errors"]["gender"].is_string());
}

#[tokio::test]
async fn test_login_session_and_logout() {
    let mock_server = MockServer::start().await;
    let user = TestUser::doctor("doc@example.com");
    mock_login(&mock_server, &user, "token-abc").await;

    let (state, store) = test_state(&mock_server.uri());
    let app: Router = auth_routes(state);

    let response = app
        .clone()
        .oneshot(post_json("/login", json!({
            "email": "doc@example.com",
            "password": "secret-pass",
            "role": "doctor"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["token"], "token-abc");

    let stored = assert_ok!(store.load("token-abc").await);
    assert_eq!(stored.map(|s| s.user.role), Some(Role::Doctor));

    let response = app.clone().oneshot(with_token("GET", "/session", "token-abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json_response = read_json(response).await;
    assert_eq!(json_response["user"]["email"], "doc@example.com");

    let response = app.clone().oneshot(with_token("POST", "/logout", "token-abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["success"], true);

    let response = app.oneshot(with_token("GET", "/session", "token-abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_wrong_portal() {
    let mock_server = MockServer::start().await;
    let user = TestUser::patient("pat@example.com");
    mock_login(&mock_server, &user, "token-p").await;

    let (state, store) = test_state(&mock_server.uri());
    let app = auth_routes(state);

    let response = app
        .oneshot(post_json("/login", json!({
            "email": "pat@example.com",
            "password": "secret-pass",
            "role": "admin"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(assert_ok!(store.load("token-p").await), None);
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad password"))
        .mount(&mock_server)
        .await;

    let (state, _) = test_state(&mock_server.uri());
    let app = auth_routes(state);

    let response = app
        .oneshot(post_json("/login", json!({ "email": "x@example.com", "password": "nope-nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_file_sessions_survive_restart() {
    let mock_server = MockServer::start().await;
    let user = TestUser::admin("admin@example.com");
    mock_login(&mock_server, &user, "token-admin").await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::for_backend(mock_server.uri());
    config.session_file = Some(dir.path().join("sessions.json"));

    let first = auth_routes(Arc::new(AppState::new(config.clone())));
    let response = first
        .oneshot(post_json("/login", json!({ "email": "admin@example.com", "password": "secret-pass" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let restarted = auth_routes(Arc::new(AppState::new(config)));
    let response = restarted.oneshot(with_token("GET", "/session", "token-admin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["user"]["role"], "admin");
}
