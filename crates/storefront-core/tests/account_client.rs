//! End-to-end tests for `AccountClient` against an in-process backend.
//!
//! The backend answers from a fixed route table and records every request it
//! receives, so tests can assert request counts, encodings and headers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use serde_json::{json, Value};

use storefront_core::{
    AccountClient, ApiError, ApiErrorKind, MemorySessionStore, Notification, NotificationLevel,
    Notifier, ProfileResult, SessionStore, UserProfile,
};

// ============================================================================
// Test backend
// ============================================================================

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    content_type: Option<String>,
    authorization: Option<String>,
    body: String,
}

impl Recorded {
    fn json_body(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body should be JSON")
    }
}

#[derive(Clone)]
struct Backend {
    routes: Arc<HashMap<(Method, String), (StatusCode, String)>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Backend {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("requests lock").clone()
    }
}

async fn handle(
    State(backend): State<Backend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    backend.requests.lock().expect("requests lock").push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        content_type: header_value(header::CONTENT_TYPE),
        authorization: header_value(header::AUTHORIZATION),
        body,
    });

    let (status, body) = backend
        .routes
        .get(&(method, uri.path().to_string()))
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, r#"{"detail": "Not Found"}"#.to_string()));
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

/// Start a backend answering `routes`; unlisted routes get 404
async fn start_backend(routes: &[(Method, &str, StatusCode, &str)]) -> (String, Backend) {
    let backend = Backend {
        routes: Arc::new(
            routes
                .iter()
                .map(|(method, path, status, body)| {
                    ((method.clone(), path.to_string()), (*status, body.to_string()))
                })
                .collect(),
        ),
        requests: Arc::new(Mutex::new(Vec::new())),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test backend");
    let addr = listener.local_addr().expect("test backend address");
    let app = Router::new().fallback(handle).with_state(backend.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test backend failed");
    });

    (format!("http://{}", addr), backend)
}

#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn seen(&self) -> Vec<Notification> {
        self.seen.lock().expect("notifications lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().expect("notifications lock").push(notification);
    }
}

struct Harness {
    client: AccountClient,
    session: Arc<MemorySessionStore>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(base_url: &str) -> Harness {
    let session = Arc::new(MemorySessionStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let client = AccountClient::new(base_url, Duration::from_secs(5), session.clone())
        .expect("build client")
        .with_notifier(notifier.clone());
    Harness {
        client,
        session,
        notifier,
    }
}

fn logged_in(base_url: &str) -> Harness {
    let h = harness(base_url);
    h.session.set_token("tok-123");
    h.session.set_user_email("a@b.com");
    h
}

fn assert_single_error(notifier: &RecordingNotifier, expected: &str) {
    let seen = notifier.seen();
    assert_eq!(seen.len(), 1, "expected exactly one notification, got {:?}", seen);
    assert_eq!(seen[0].level, NotificationLevel::Error);
    assert_eq!(seen[0].message, expected);
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn test_create_account_sends_json() {
    let (url, backend) =
        start_backend(&[(Method::POST, "/signup", StatusCode::OK, r#"{"id": 7}"#)]).await;
    let h = harness(&url);

    h.client
        .create_account("a@b.com", "hunter2")
        .await
        .expect("signup should succeed");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/signup");
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(requests[0].authorization, None);
    assert_eq!(
        requests[0].json_body(),
        json!({"email": "a@b.com", "password": "hunter2"})
    );
    assert!(h.notifier.seen().is_empty());
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_create_account_empty_success_body() {
    let (url, _backend) = start_backend(&[(Method::POST, "/signup", StatusCode::CREATED, "")]).await;
    let h = harness(&url);

    assert!(h.client.create_account("a@b.com", "pw").await.is_ok());
}

#[tokio::test]
async fn test_create_account_rejection_uses_detail() {
    let (url, _backend) = start_backend(&[(
        Method::POST,
        "/signup",
        StatusCode::BAD_REQUEST,
        r#"{"detail": "Email already registered"}"#,
    )])
    .await;
    let h = harness(&url);

    let err = h.client.create_account("a@b.com", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::AccountCreation(ref msg) if msg == "Email already registered"));
    assert_single_error(&h.notifier, "Failed to sign up: Email already registered");
}

#[tokio::test]
async fn test_create_account_rejection_without_detail() {
    let (url, _backend) = start_backend(&[(
        Method::POST,
        "/signup",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
    )])
    .await;
    let h = harness(&url);

    let err = h.client.create_account("a@b.com", "pw").await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::AccountCreation);
    assert_eq!(err.to_string(), "Signup failed");
    assert_single_error(&h.notifier, "Failed to sign up: Signup failed");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_form_encoded_and_caches_email() {
    let (url, backend) = start_backend(&[(
        Method::POST,
        "/token",
        StatusCode::OK,
        r#"{"access_token": "tok-abc", "token_type": "bearer"}"#,
    )])
    .await;
    let h = harness(&url);

    let token = h.client.login("a@b.com", "pw").await.expect("login should succeed");
    assert_eq!(token.access_token, "tok-abc");
    assert_eq!(token.token_type, "bearer");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/token");
    assert_eq!(
        requests[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(requests[0].body, "username=a%40b.com&password=pw");

    assert_eq!(h.session.user_email().as_deref(), Some("a@b.com"));
    assert_eq!(h.session.token().as_deref(), Some("tok-abc"));
    assert!(h.session.is_authenticated());
    assert!(h.notifier.seen().is_empty());
}

#[tokio::test]
async fn test_login_rejected() {
    let (url, _backend) = start_backend(&[(
        Method::POST,
        "/token",
        StatusCode::UNAUTHORIZED,
        r#"{"detail": "Incorrect username or password"}"#,
    )])
    .await;
    let h = harness(&url);

    let err = h.client.login("a@b.com", "wrong").await.unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(err.to_string(), "Incorrect username or password");
    assert_eq!(h.session.user_email(), None);
    assert!(!h.session.is_authenticated());
    assert_single_error(&h.notifier, "Failed to log in: Incorrect username or password");
}

#[tokio::test]
async fn test_login_malformed_token_response() {
    let (url, _backend) =
        start_backend(&[(Method::POST, "/token", StatusCode::OK, r#"{"msg": "ok"}"#)]).await;
    let h = harness(&url);

    let err = h.client.login("a@b.com", "pw").await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::InvalidResponse);
    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.user_email(), None);
    assert_eq!(h.notifier.seen().len(), 1);
}

// ============================================================================
// Profile update
// ============================================================================

#[tokio::test]
async fn test_update_profile_without_token_makes_no_request() {
    let (url, backend) = start_backend(&[(
        Method::POST,
        "/profile",
        StatusCode::OK,
        r#"{"dob": "2000-01-01", "gender": "female"}"#,
    )])
    .await;
    let h = harness(&url);

    let err = h
        .client
        .update_profile("2000-01-01", "female")
        .await
        .unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(err.to_string(), "Authentication token not found");
    assert!(backend.requests().is_empty());
    assert_single_error(
        &h.notifier,
        "Failed to update profile: Authentication token not found",
    );
}

#[tokio::test]
async fn test_update_profile_uses_server_values() {
    let (url, backend) = start_backend(&[(
        Method::POST,
        "/profile",
        StatusCode::OK,
        r#"{"dob": "2000-01-01", "gender": "female"}"#,
    )])
    .await;
    let h = logged_in(&url);

    let profile = h
        .client
        .update_profile("2000-01-01", "female")
        .await
        .expect("update should succeed");
    assert_eq!(
        profile,
        ProfileResult {
            email: "a@b.com".to_string(),
            dob: "2000-01-01".to_string(),
            gender: "female".to_string(),
        }
    );

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok-123"));
    assert_eq!(
        requests[0].json_body(),
        json!({"dob": "2000-01-01", "gender": "female"})
    );
    assert_eq!(h.session.user_profile().dob, "2000-01-01");
}

#[tokio::test]
async fn test_update_profile_acknowledgement_falls_back_to_sent() {
    let (url, _backend) =
        start_backend(&[(Method::POST, "/profile", StatusCode::OK, r#"{"msg": "ok"}"#)]).await;
    let h = logged_in(&url);
    h.session.set_user_profile("1980-02-02", "male");

    let profile = h
        .client
        .update_profile("1995-03-04", "other")
        .await
        .expect("update should succeed");
    assert_eq!(profile.email, "a@b.com");
    assert_eq!(profile.dob, "1995-03-04");
    assert_eq!(profile.gender, "other");
    assert_eq!(
        h.session.user_profile(),
        UserProfile {
            dob: "1995-03-04".to_string(),
            gender: "other".to_string(),
        }
    );
}

#[tokio::test]
async fn test_update_profile_email_not_taken_from_response() {
    let (url, _backend) = start_backend(&[(
        Method::POST,
        "/profile",
        StatusCode::OK,
        r#"{"email": "someone@else.com", "dob": "2000-01-01", "gender": "female"}"#,
    )])
    .await;
    let h = logged_in(&url);

    let profile = h
        .client
        .update_profile("2000-01-01", "female")
        .await
        .expect("update should succeed");
    assert_eq!(profile.email, "a@b.com");
}

#[tokio::test]
async fn test_update_profile_rejected() {
    let (url, _backend) = start_backend(&[(
        Method::POST,
        "/profile",
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"detail": [{"loc": ["body", "dob"], "msg": "invalid date format"}]}"#,
    )])
    .await;
    let h = logged_in(&url);
    h.session.set_user_profile("1980-02-02", "male");

    let err = h
        .client
        .update_profile("yesterday", "female")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::ProfileUpdate);
    assert_eq!(err.to_string(), "invalid date format");
    assert_eq!(h.session.user_profile().dob, "1980-02-02");
    assert_single_error(&h.notifier, "Failed to update profile: invalid date format");
}

// ============================================================================
// Profile read
// ============================================================================

#[tokio::test]
async fn test_get_profile_without_token_makes_no_request() {
    let (url, backend) = start_backend(&[]).await;
    let h = harness(&url);

    let err = h.client.get_profile().await.unwrap_err();
    assert!(err.is_authentication());
    assert!(backend.requests().is_empty());
    assert_eq!(h.notifier.seen().len(), 1);
}

#[tokio::test]
async fn test_get_profile_primary_success() {
    let (url, backend) = start_backend(&[(
        Method::GET,
        "/profile",
        StatusCode::OK,
        r#"{"email": "a@b.com", "dob": "2000-01-01", "gender": "female"}"#,
    )])
    .await;
    let h = logged_in(&url);

    let profile = h.client.get_profile().await.expect("profile should load");
    assert_eq!(profile.dob, "2000-01-01");
    assert_eq!(profile.gender, "female");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok-123"));
    assert_eq!(requests[0].content_type, None);
    assert!(requests[0].body.is_empty());

    // Fresh server values refresh the cache
    assert_eq!(h.session.user_profile().gender, "female");
}

#[tokio::test]
async fn test_get_profile_acknowledgement_returns_cache() {
    let (url, _backend) =
        start_backend(&[(Method::GET, "/profile", StatusCode::OK, r#"{"msg": "ok"}"#)]).await;
    let h = logged_in(&url);
    h.session.set_user_profile("1990-05-17", "male");

    let profile = h.client.get_profile().await.expect("profile should load");
    assert_eq!(
        profile,
        ProfileResult {
            email: "a@b.com".to_string(),
            dob: "1990-05-17".to_string(),
            gender: "male".to_string(),
        }
    );
    assert!(h.notifier.seen().is_empty());
}

#[tokio::test]
async fn test_get_profile_empty_body_returns_cache() {
    let (url, _backend) = start_backend(&[(Method::GET, "/profile", StatusCode::OK, "")]).await;
    let h = logged_in(&url);
    h.session.set_user_profile("1990-05-17", "male");

    let profile = h.client.get_profile().await.expect("profile should load");
    assert_eq!(profile.dob, "1990-05-17");
    assert_eq!(profile.gender, "male");
}

#[tokio::test]
async fn test_get_profile_falls_back_to_post_once() {
    let (url, backend) = start_backend(&[
        (Method::GET, "/profile", StatusCode::NOT_FOUND, r#"{"detail": "Not Found"}"#),
        (
            Method::POST,
            "/profile",
            StatusCode::OK,
            r#"{"dob": "2001-02-03", "gender": "female"}"#,
        ),
    ])
    .await;
    let h = logged_in(&url);

    let profile = h.client.get_profile().await.expect("fallback should succeed");
    assert_eq!(profile.email, "a@b.com");
    assert_eq!(profile.dob, "2001-02-03");
    assert_eq!(profile.gender, "female");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[1].method, Method::POST);
    assert_eq!(requests[1].path, "/profile");
    assert_eq!(requests[1].content_type.as_deref(), Some("application/json"));
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer tok-123"));
    assert_eq!(requests[1].json_body(), json!({"dob": "", "gender": ""}));
    assert!(h.notifier.seen().is_empty());
}

#[tokio::test]
async fn test_get_profile_fallback_acknowledgement_returns_cache() {
    let (url, backend) = start_backend(&[
        (Method::GET, "/profile", StatusCode::METHOD_NOT_ALLOWED, ""),
        (Method::POST, "/profile", StatusCode::OK, r#"{"msg": "ok"}"#),
    ])
    .await;
    let h = logged_in(&url);
    h.session.set_user_profile("1990-05-17", "male");

    let profile = h.client.get_profile().await.expect("fallback should succeed");
    assert_eq!(profile.dob, "1990-05-17");
    assert_eq!(profile.gender, "male");
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_get_profile_both_attempts_fail() {
    let (url, backend) = start_backend(&[
        (Method::GET, "/profile", StatusCode::NOT_FOUND, r#"{"detail": "Not Found"}"#),
        (
            Method::POST,
            "/profile",
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "database unavailable"}"#,
        ),
    ])
    .await;
    let h = logged_in(&url);

    let err = h.client.get_profile().await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::ProfileFetch);
    assert_eq!(err.to_string(), "database unavailable");
    assert_eq!(backend.requests().len(), 2);
    assert_single_error(&h.notifier, "Failed to get profile: database unavailable");
}

#[tokio::test]
async fn test_get_profile_fallback_without_detail() {
    let (url, backend) = start_backend(&[
        (Method::GET, "/profile", StatusCode::NOT_FOUND, ""),
        (Method::POST, "/profile", StatusCode::INTERNAL_SERVER_ERROR, ""),
    ])
    .await;
    let h = logged_in(&url);

    let err = h.client.get_profile().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to get profile");
    assert_eq!(backend.requests().len(), 2);
    assert_single_error(&h.notifier, "Failed to get profile: Failed to get profile");
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway listener address");
    drop(listener);

    let h = harness(&format!("http://{}", addr));

    let err = h.client.create_account("a@b.com", "pw").await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::Transport);

    let seen = h.notifier.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].message.starts_with("Failed to sign up: Network error"));
}
