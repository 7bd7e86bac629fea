use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, PublicUser, RegisterRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::NewUser,
    },
    error::{AppError, AppResult},
    extract::Json,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);

    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".into()));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token subject no longer exists");
        AppError::Unauthorized("User not found".into())
    })?;

    Ok(Json(MeResponse {
        user: PublicUser::from(user),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Claims;
    use crate::test_support::{assert_json_bad_request, send, send_request, TestApp};
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };
    use jsonwebtoken::{encode, Header};
    use serde_json::json;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email(""));
    }

    fn credentials() -> serde_json::Value {
        json!({
            "name": "Test Runner",
            "email": "  Test.Runner@Example.com ",
            "password": "P@ssw0rd-1a2b3c4d",
        })
    }

    #[tokio::test]
    async fn register_login_me_flow() {
        let app = TestApp::new();

        let (status, body) = send(&app.router, Method::POST, "/api/auth/register", Some(credentials()), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(body["user"]["email"], "test.runner@example.com");
        assert_eq!(body["user"]["name"], "Test Runner");
        assert!(body["user"].get("passwordHash").is_none());
        assert!(body["user"].get("password_hash").is_none());

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "TEST.RUNNER@example.com", "password": "P@ssw0rd-1a2b3c4d" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "test.runner@example.com");
        assert!(body["user"].get("passwordHash").is_none());
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app.router, Method::GET, "/api/auth/me", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "test.runner@example.com");
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let app = TestApp::new();
        let (status, _) = send(&app.router, Method::POST, "/api/auth/register", Some(credentials()), None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app.router, Method::POST, "/api/auth/register", Some(credentials()), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email already registered");
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = TestApp::new();
        let cases = [
            json!({ "name": "", "email": "a@b.co", "password": "longenough" }),
            json!({ "name": "A", "email": "not-an-email", "password": "longenough" }),
            json!({ "name": "A", "email": "a@b.co", "password": "short" }),
            json!({ "email": "a@b.co" }),
        ];
        for case in cases {
            let (status, body) = send(&app.router, Method::POST, "/api/auth/register", Some(case), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let app = TestApp::new();
        send(&app.router, Method::POST, "/api/auth/register", Some(credentials()), None).await;

        let (status, body) = send(
            &app.router,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "test.runner@example.com", "password": "wrong-password" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, _) = send(
            &app.router,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "whatever123" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app.router, Method::POST, "/api/auth/login", Some(json!({})), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_requires_valid_token() {
        let app = TestApp::new();

        let (status, _) = send(&app.router, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app.router, Method::GET, "/api/auth/me", None, Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Well-formed token whose subject was never registered.
        let orphan = app.token_for(uuid::Uuid::new_v4());
        let (status, body) = send(&app.router, Method::GET, "/api/auth/me", None, Some(&orphan)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "User not found");
    }

    async fn me_with_header(app: &TestApp, value: &str) -> StatusCode {
        let req = Request::builder()
            .uri("/api/auth/me")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap();
        send_request(&app.router, req).await.0
    }

    #[tokio::test]
    async fn me_rejects_wrong_scheme_empty_and_expired_tokens() {
        let app = TestApp::new();
        let (user_id, _) = app.register("scheme@example.com").await;

        assert_eq!(me_with_header(&app, "Basic abc").await, StatusCode::UNAUTHORIZED);
        assert_eq!(me_with_header(&app, "Bearer ").await, StatusCode::UNAUTHORIZED);

        let keys = JwtKeys::from_ref(&app.state);
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let stale = Claims {
            sub: user_id,
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
        };
        let expired = encode(&Header::default(), &stale, &keys.encoding).unwrap();
        let status = me_with_header(&app, &format!("Bearer {expired}")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unreadable_bodies_get_json_400() {
        let app = TestApp::new();
        let requests = [
            (Some("application/json"), r#"{not json"#.to_string()),
            (
                Some("application/json"),
                json!({ "name": "A", "email": "a@b.co", "password": 12345678 }).to_string(),
            ),
            (None, json!({ "name": "A", "email": "a@b.co", "password": "longenough" }).to_string()),
        ];
        for (content_type, raw) in requests {
            let mut req = Request::builder().method(Method::POST).uri("/api/auth/register");
            if let Some(ct) = content_type {
                req = req.header(header::CONTENT_TYPE, ct);
            }
            let (status, ct, body) =
                send_request(&app.router, req.body(Body::from(raw)).unwrap()).await;
            assert_json_bad_request(status, ct.as_deref(), &body);
        }
    }
}
