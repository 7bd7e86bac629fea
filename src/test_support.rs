use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{app::build_app, auth::jwt::JwtKeys, state::AppState};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        let router = build_app(state.clone());
        Self { state, router }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        JwtKeys::from_ref(&self.state).sign(user_id).unwrap()
    }

    /// Registers a user over HTTP and returns `(user_id, token)`.
    pub async fn register(&self, email: &str) -> (Uuid, String) {
        let body = serde_json::json!({
            "name": "Perk Owner",
            "email": email,
            "password": "P@ssw0rd-owner",
        });
        let (status, body) = send(&self.router, Method::POST, "/api/auth/register", Some(body), None).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        (id, body["token"].as_str().unwrap().to_string())
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let (status, _, value) = send_request(router, req).await;
    (status, value)
}

/// Sends a prebuilt request; returns status, `Content-Type` and parsed body.
pub async fn send_request(
    router: &Router,
    req: Request<Body>,
) -> (StatusCode, Option<String>, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, content_type, value)
}

/// Asserts a 400 carrying a JSON `{message}` body.
pub fn assert_json_bad_request(status: StatusCode, content_type: Option<&str>, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "unexpected body: {body}");
    assert_eq!(content_type, Some("application/json"));
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}
