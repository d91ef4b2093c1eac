use crate::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub login_url: String,
    pub client_id: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub code: u16,
    pub message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub client_id: String,
    pub login_url: String,
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    IndexTemplate {
        login_url: state.settings.login.login_url.clone(),
        client_id: state.settings.login.client_id.clone(),
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        code: 200,
        message: "server is up",
    })
}

/// Values the login front-end needs before a session exists.
pub async fn public_settings(State(state): State<AppState>) -> Json<PublicSettings> {
    Json(PublicSettings {
        client_id: state.settings.login.client_id.clone(),
        login_url: state.settings.login.login_url.clone(),
    })
}
