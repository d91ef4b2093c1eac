#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use trips_web_app::config::Settings;
use trips_web_app::services::{MemorySessionStore, SessionStore};
use trips_web_app::startup::build_router;
use trips_web_app::AppState;
use wiremock::MockServer;

pub const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

/// Router wired against a mock server standing in for every upstream.
pub struct TestApp {
    pub server: MockServer,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let settings = settings(&server.uri());
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let state = AppState::new(settings, sessions).expect("Failed to build app state");
        let router = build_router(state.clone());

        Self {
            server,
            state,
            router,
        }
    }

    /// Store a session for `ADDRESS` and return the matching `Cookie` header value.
    pub fn login(&self) -> String {
        let token = unsigned_jwt(&json!({
            "sub": "user-1",
            "ethereum_address": ADDRESS,
            "exp": 9999999999i64
        }));
        self.state
            .sessions
            .put("test-session", &token, std::time::Duration::from_secs(60));
        "session_id=test-session".to_string()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }
}

pub fn settings(base: &str) -> Settings {
    serde_json::from_value(json!({
        "server": {
            "host": "127.0.0.1",
            "port": 0,
            "secure_cookies": false,
            "static_dir": "static"
        },
        "logging": {"level": "debug", "json": false},
        "login": {
            "client_id": "client-1",
            "domain": "http://localhost",
            "auth_url": format!("{}/dex/generate_challenge", base),
            "submit_challenge_url": format!("{}/dex/submit_challenge", base),
            "login_url": "https://login.example.org"
        },
        "upstream": {
            "identity_api_url": format!("{}/identity/query", base),
            "telemetry_api_url": format!("{}/telemetry/query", base),
            "trips_api_base_url": format!("{}/trips/v1", base),
            "device_data_api_url": format!("{}/device-data/v1", base),
            "users_api_base_url": format!("{}/users/v1", base),
            "token_exchange_api_url": format!("{}/tokens/exchange", base),
            "timeout_seconds": 5
        },
        "privileges": {"nft_contract_address": "0xnft"}
    }))
    .expect("Failed to build test settings")
}

pub fn unsigned_jwt(claims: &Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
