mod common;

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use common::{test_config, Fakes, TestApp, JWT_SECRET, PASSWORD};
use interview_backend::models::candidate::Role;
use interview_backend::utils::token::Claims;

#[tokio::test]
async fn health_endpoints_answer_without_auth() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let (status, _) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_returns_token_and_summary() {
    let app = TestApp::new();
    app.register("asha@example.com", Role::Candidate).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": "  ASHA@example.com ", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert_eq!(body["user"]["role"], "candidate");
    assert_eq!(body["user"]["currentStep"], "info");
}

#[tokio::test]
async fn login_failures_have_stable_kinds() {
    let app = TestApp::new();
    app.register("asha@example.com", Role::Candidate).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": "asha@example.com", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_credentials");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    let (status, body) = app
        .send(Method::POST, "/api/user/login", None, Some(json!({"email": "asha@example.com"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn bearer_gate_distinguishes_missing_invalid_and_expired() {
    let app = TestApp::new();
    let (candidate, _) = app.signed_in("asha@example.com").await;

    let (status, body) = app.send(Method::GET, "/api/user/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");

    let (status, body) = app
        .send(Method::GET, "/api/mcq/start", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let past = Utc::now().timestamp() - 3600;
    let expired = encode(
        &Header::default(),
        &Claims {
            sub: candidate.id.to_string(),
            email: candidate.email.clone(),
            role: "candidate".into(),
            iat: past - 60,
            exp: past,
        },
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    let (status, body) = app
        .send(Method::GET, "/api/user/me", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn me_never_exposes_password_hash() {
    let app = TestApp::new();
    let (candidate, token) = app.signed_in("asha@example.com").await;

    let (status, body) = app.send(Method::GET, "/api/user/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], candidate.id.to_string());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn hr_accounts_cannot_take_stages() {
    let app = TestApp::new();
    app.register("hr@example.com", Role::Hr).await;
    let (_, body) = app
        .send(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({"email": "hr@example.com", "password": PASSWORD})),
        )
        .await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.send(Method::GET, "/api/mcq/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn profile_save_moves_info_to_mcq_only_forward() {
    let app = TestApp::new();
    let (candidate, token) = app.signed_in("asha@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/user/profile",
            Some(&token),
            Some(json!({
                "phone": "+91 98765 43210",
                "appliedFor": "Backend Engineer",
                "skills": ["Rust", "SQL"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["currentStep"], "mcq");
    assert_eq!(body["user"]["appliedFor"], "Backend Engineer");
    assert_eq!(body["user"]["name"], candidate.name);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/user/profile",
            Some(&token),
            Some(json!({"resumeUrl": "not a url"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn user_routes_are_rate_limited() {
    let mut config = test_config();
    config.auth_rate_limit = 2;
    let app = TestApp::with(config, Fakes::default());

    for _ in 0..2 {
        let (status, _) = app
            .send(Method::POST, "/api/user/login", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, body) = app
        .send(Method::POST, "/api/user/login", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate_limited");

    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

fn login_from(peer: &str, forwarded_for: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from("{}"))
        .unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_limit() {
    let mut config = test_config();
    config.auth_rate_limit = 2;
    let app = TestApp::with(config, Fakes::default());

    let mut statuses = Vec::new();
    for i in 0..10 {
        let (status, _) = app
            .dispatch(login_from("198.51.100.4:40000", &format!("203.0.113.{}", i)))
            .await;
        statuses.push(status);
    }
    assert_eq!(&statuses[..2], &[StatusCode::BAD_REQUEST, StatusCode::BAD_REQUEST]);
    assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));

    let (status, _) = app
        .dispatch(login_from("198.51.100.5:40001", "203.0.113.0"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
