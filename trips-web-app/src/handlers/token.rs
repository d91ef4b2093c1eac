use super::vehicles::parse_token_id;
use crate::middleware::ApiSession;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use service_core::error::AppError;

#[derive(Serialize)]
pub struct GenerateTokenResponse {
    pub token: String,
}

/// Hand the caller a privilege token for one of their vehicles.
pub async fn generate_token(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(token_id): Path<String>,
) -> Result<Json<GenerateTokenResponse>, AppError> {
    let token_id = parse_token_id(&token_id)?;
    let token = state
        .privileges
        .get_privilege_token(&session.session_id, token_id)
        .await?;

    Ok(Json(GenerateTokenResponse {
        token: token.expose_secret().clone(),
    }))
}
