use crate::handlers::error::ViewError;
use crate::services::ServiceError;
use crate::utils::jwt::decode_unverified_claims;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;

pub const SESSION_COOKIE: &str = "session_id";

/// The signed-in user behind the `session_id` cookie.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub ethereum_address: String,
    pub auth_token: Secret<String>,
}

/// Resolve the session cookie against the session store.
///
/// Claims are only decoded once the session id is known to the store.
pub fn resolve_session(headers: &HeaderMap, state: &AppState) -> Result<SessionContext, ServiceError> {
    let jar = CookieJar::from_headers(headers);
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServiceError::Unauthenticated("No session".to_string()))?;

    let auth_token = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ServiceError::Unauthenticated("Session expired".to_string()))?;

    let claims = decode_unverified_claims(auth_token.expose_secret()).map_err(|e| {
        tracing::warn!(error = %e, "Stored session token is not a JWT");
        ServiceError::Unauthenticated("Invalid session".to_string())
    })?;

    if claims.is_expired_at(Utc::now()) {
        state.sessions.delete(&session_id);
        return Err(ServiceError::Unauthenticated("Session expired".to_string()));
    }

    let ethereum_address = claims
        .ethereum_address()
        .map_err(|e| ServiceError::Unauthenticated(e.to_string()))?
        .to_string();

    Ok(SessionContext {
        session_id,
        ethereum_address,
        auth_token,
    })
}

/// Session for JSON endpoints; rejects with 401 `{"error": ...}`.
pub struct ApiSession(pub SessionContext);

#[async_trait]
impl FromRequestParts<AppState> for ApiSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_session(&parts.headers, state)
            .map(ApiSession)
            .map_err(AppError::from)
    }
}

/// Session for HTML views; rejects with the session-expired page.
pub struct ViewSession(pub SessionContext);

#[async_trait]
impl FromRequestParts<AppState> for ViewSession {
    type Rejection = ViewError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_session(&parts.headers, state)
            .map(ViewSession)
            .map_err(ViewError::from)
    }
}
