use super::*;

use std::time::Duration;

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn handle_login(Json(payload): Json<Value>) -> axum::response::Response {
    let email = payload["email"].as_str().unwrap_or_default();
    let password = payload["password"].as_str().unwrap_or_default();
    match (email, password) {
        ("a@b.com", "secret") => Json(json!({
            "_id": "u-1",
            "name": "Ada",
            "email": "a@b.com",
            "role": "member",
            "token": "tok1",
        }))
        .into_response(),
        ("numeric@b.com", _) => Json(json!({
            "id": 42,
            "_id": "mongo-42",
            "name": "Ada",
            "token": "tok1",
        }))
        .into_response(),
        ("numberonly@b.com", _) => {
            Json(json!({ "id": 42, "name": "Ada", "token": "tok1" })).into_response()
        }
        ("a@b.com", _) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid password" })),
        )
            .into_response(),
        ("blank@b.com", _) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "   " })),
        )
            .into_response(),
        ("garbled@b.com", _) => (StatusCode::OK, "not json").into_response(),
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn spawn_auth_server() -> Result<Url> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route("/api/users/login", post(handle_login));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{addr}/api"))?)
}

fn gateway_for(base: Url) -> HttpAuthGateway {
    let mut config = ClientConfig::new(base);
    config.request_timeout = Duration::from_secs(5);
    HttpAuthGateway::new(&config).expect("gateway")
}

#[tokio::test]
async fn numeric_id_still_yields_success() {
    let gateway = gateway_for(spawn_auth_server().await.expect("spawn server"));

    let result = gateway
        .login(&Credentials::new("numberonly@b.com", "secret"))
        .await;

    let SessionResult::Success { identity, token } = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(token, "tok1");
    assert_eq!(identity.id().as_deref(), Some("42"));
    assert_eq!(identity.display_name(), "Ada");
}

#[tokio::test]
async fn both_id_keys_still_yield_success() {
    let gateway = gateway_for(spawn_auth_server().await.expect("spawn server"));

    let result = gateway.login(&Credentials::new("numeric@b.com", "secret")).await;

    let SessionResult::Success { identity, .. } = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(identity.id().as_deref(), Some("mongo-42"));
    assert_eq!(identity.get("id"), Some(&json!(42)));
}

#[tokio::test]
async fn success_response_yields_identity_and_token() {
    let gateway = gateway_for(spawn_auth_server().await.expect("spawn server"));

    let result = gateway.login(&Credentials::new("a@b.com", "secret")).await;

    let SessionResult::Success { identity, token } = result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(token, "tok1");
    assert_eq!(identity.id().as_deref(), Some("u-1"));
    assert_eq!(identity.name(), Some("Ada"));
    assert_eq!(identity.get("role"), Some(&json!("member")));
    assert!(identity.get("token").is_none());
}

#[tokio::test]
async fn rejection_uses_server_message_and_status() {
    let gateway = gateway_for(spawn_auth_server().await.expect("spawn server"));

    let result = gateway.login(&Credentials::new("a@b.com", "wrong")).await;

    assert_eq!(
        result,
        SessionResult::Failure {
            message: "Invalid password".to_string(),
            status_code: Some(401),
        }
    );
}

#[tokio::test]
async fn rejection_without_message_falls_back() {
    let gateway = gateway_for(spawn_auth_server().await.expect("spawn server"));

    for email in ["nobody@b.com", "blank@b.com"] {
        let result = gateway.login(&Credentials::new(email, "pw")).await;
        let SessionResult::Failure { message, status_code } = result else {
            panic!("expected failure for {email}");
        };
        assert_eq!(message, "Login failed. Please try again.");
        assert!(status_code.is_some());
    }
}

#[tokio::test]
async fn undecodable_success_body_is_a_failure() {
    let gateway = gateway_for(spawn_auth_server().await.expect("spawn server"));

    let result = gateway.login(&Credentials::new("garbled@b.com", "pw")).await;

    assert_eq!(
        result,
        SessionResult::Failure {
            message: "Login failed. Please try again.".to_string(),
            status_code: None,
        }
    );
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_fallback_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gateway = gateway_for(Url::parse(&format!("http://{addr}/api")).expect("url"));
    let result = gateway.login(&Credentials::new("a@b.com", "secret")).await;

    assert_eq!(
        result,
        SessionResult::Failure {
            message: "Login failed. Please try again.".to_string(),
            status_code: None,
        }
    );
}

#[test]
fn gateway_resolves_login_url_from_config() {
    let gateway = gateway_for(Url::parse("http://localhost:9000/api").expect("url"));
    assert_eq!(
        gateway.login_url().as_str(),
        "http://localhost:9000/api/users/login"
    );
}
