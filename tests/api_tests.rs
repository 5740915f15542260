//! HTTP API integration tests
//! Runs the router on an ephemeral port and drives it with reqwest

use chrono::{Duration, Utc};
use ipe::api::{create_router, AppState, SharedState};
use ipe::auth::{CredentialStore, Identity, Role};
use ipe::config::Config;
use serde_json::{json, Value};
use std::sync::Arc;

const TEST_COST: u32 = 4;

/// Start a server on 127.0.0.1:0 and return its base URL and state
async fn start_test_server() -> (String, SharedState) {
    let store = CredentialStore::fixture(TEST_COST).expect("Failed to build fixture store");
    let state = Arc::new(AppState::new(Config::default(), store));
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), state)
}

async fn login(client: &reqwest::Client, base: &str, username: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/login", base))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login request failed")
}

async fn login_token(client: &reqwest::Client, base: &str, username: &str, password: &str) -> String {
    let response = login(client, base, username, password).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (base, _) = start_test_server().await;
    let response = reqwest::get(format!("{}/api/health", base)).await.unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_login_sets_cookie_and_returns_user() {
    let (base, state) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = login(&client, &base, "admin", "admin123").await;
    assert_eq!(response.status(), 200);

    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("ipe_session="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["display_name"], "Admin User");
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert_eq!(state.sessions.session_count().await, 1);
}

#[tokio::test]
async fn test_login_errors() {
    let (base, state) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = login(&client, &base, "", "admin123").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please enter both username and password");

    let response = login(&client, &base, "nobody", "x").await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid username");

    let response = login(&client, &base, "viewer", "admin123").await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid password");

    assert_eq!(state.sessions.session_count().await, 0);
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let (base, _) = start_test_server().await;
    let client = reqwest::Client::new();
    let token = login_token(&client, &base, "support", "support123").await;

    let response = client
        .post(format!("{}/api/login", base))
        .bearer_auth(&token)
        .json(&json!({ "username": "support", "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client
        .get(format!("{}/api/session", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_relogin_replaces_session_id() {
    let (base, state) = start_test_server().await;
    let client = reqwest::Client::new();
    let first = login_token(&client, &base, "viewer", "viewer123").await;

    let response = client
        .post(format!("{}/api/login", base))
        .header("Cookie", format!("ipe_session={}", first))
        .json(&json!({ "username": "admin", "password": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let second = body["data"]["token"].as_str().unwrap().to_string();

    assert_ne!(first, second);
    assert_eq!(state.sessions.session_count().await, 1);

    let response = client
        .get(format!("{}/api/session", base))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_session_endpoint_anonymous() {
    let (base, _) = start_test_server().await;
    let response = reqwest::get(format!("{}/api/session", base)).await.unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["authenticated"], false);
    assert_eq!(body["data"]["expired"], false);
}

#[tokio::test]
async fn test_session_endpoint_reports_expiry_once() {
    let (base, state) = start_test_server().await;
    let client = reqwest::Client::new();
    let identity = Identity {
        username: "admin".to_string(),
        display_name: "Admin User".to_string(),
        role: Role::Admin,
    };
    let token = state
        .sessions
        .start_session_at(identity, None, Utc::now() - Duration::hours(8) - Duration::minutes(1))
        .await;

    let response = client
        .get(format!("{}/api/session", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["expired"], true);
    assert_eq!(body["error"], "Session expired. Please login again.");

    let response = client
        .get(format!("{}/api/session", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["expired"], false);
}

#[tokio::test]
async fn test_logout_twice() {
    let (base, state) = start_test_server().await;
    let client = reqwest::Client::new();
    let token = login_token(&client, &base, "admin", "admin123").await;

    for _ in 0..2 {
        let response = client
            .post(format!("{}/api/logout", base))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
    assert_eq!(state.sessions.session_count().await, 0);

    let response = client
        .get(format!("{}/api/pages/dashboard", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_page_permissions_for_viewer() {
    let (base, _) = start_test_server().await;
    let client = reqwest::Client::new();
    let token = login_token(&client, &base, "viewer", "viewer123").await;

    for (slug, expected) in [
        ("dashboard", 200),
        ("chat-support", 403),
        ("automation", 403),
        ("knowledge-base", 200),
        ("settings", 404),
    ] {
        let response = client
            .get(format!("{}/api/pages/{}", base, slug))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "page {}", slug);
        if expected == 403 {
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["error"], "Insufficient permissions");
        }
    }
}

#[tokio::test]
async fn test_page_gate_with_cookie_for_support() {
    let (base, _) = start_test_server().await;
    let client = reqwest::Client::new();
    let token = login_token(&client, &base, "support", "support123").await;

    let response = client
        .get(format!("{}/api/pages/automation", base))
        .header("Cookie", format!("theme=dark; ipe_session={}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Automation");
    assert_eq!(body["data"]["required_role"], "support");
    assert_eq!(body["data"]["user"]["username"], "support");
}

#[tokio::test]
async fn test_expired_session_never_gets_page() {
    let (base, state) = start_test_server().await;
    let client = reqwest::Client::new();
    let identity = Identity {
        username: "admin".to_string(),
        display_name: "Admin User".to_string(),
        role: Role::Admin,
    };
    let token = state
        .sessions
        .start_session_at(identity, None, Utc::now() - Duration::hours(9))
        .await;

    let response = client
        .get(format!("{}/api/pages/dashboard", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Session expired. Please login again.");
}

#[tokio::test]
async fn test_navigation_list() {
    let (base, _) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/api/pages", base)).send().await.unwrap();
    assert_eq!(response.status(), 401);

    let token = login_token(&client, &base, "viewer", "viewer123").await;
    let response = client
        .get(format!("{}/api/pages", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    let accessible: Vec<_> = items
        .iter()
        .filter(|i| i["accessible"] == true)
        .map(|i| i["page"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(accessible, vec!["dashboard", "knowledge-base"]);
}

#[tokio::test]
async fn test_kb_search_requires_login() {
    let (base, _) = start_test_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/kb/search?q=cpu", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let token = login_token(&client, &base, "viewer", "viewer123").await;
    let response = client
        .get(format!("{}/api/kb/search?q=cpu", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["articles"][0]["id"], "KB001");
    assert_eq!(body["data"]["guides"][0]["id"], "TG001");
}

#[tokio::test]
async fn test_kb_recent_limit() {
    let (base, _) = start_test_server().await;
    let client = reqwest::Client::new();
    let token = login_token(&client, &base, "admin", "admin123").await;

    let response = client
        .get(format!("{}/api/kb/recent?limit=1", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["articles"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["articles"][0]["id"], "KB002");
    assert_eq!(body["data"]["top_posts"][0]["id"], "SO001");
}

#[tokio::test]
async fn test_malformed_login_body_is_enveloped() {
    let (base, state) = start_test_server().await;
    let client = reqwest::Client::new();

    for body in [r#"{"username":1,"password":"admin123"}"#, "not json"] {
        let response = client
            .post(format!("{}/api/login", base))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body {}", body);
        let json: Value = response.json().await.unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Please enter both username and password");
    }

    assert_eq!(state.sessions.session_count().await, 0);
}
