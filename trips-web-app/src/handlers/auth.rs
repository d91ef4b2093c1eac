use crate::config::Settings;
use crate::middleware::SESSION_COOKIE;
use crate::services::{Challenge, ServiceError};
use crate::utils::{jwt::extract_ethereum_address, ValidatedPayload};
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateChallengeRequest {
    #[validate(length(equal = 42, message = "Address must be a 0x-prefixed 20-byte hex string"))]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitChallengeRequest {
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Signature is required"))]
    pub signature: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1, message = "JWT is required"))]
    pub jwt: String,
}

#[derive(Serialize)]
pub struct SubmitChallengeResponse {
    pub message: &'static str,
    pub id_token: String,
}

#[derive(Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
}

#[derive(Template)]
#[template(path = "login_jwt.html")]
pub struct LoginJwtTemplate {
    pub error: Option<String>,
}

/// `session_id` cookie carrying an opaque session key.
pub fn session_cookie(settings: &Settings, session_id: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.server.secure_cookies)
        .max_age(time::Duration::seconds(
            settings.session.ttl_seconds.min(i64::MAX as u64) as i64,
        ));

    if let Some(domain) = settings.server.cookie_domain.clone() {
        cookie = cookie.domain(domain);
    }

    cookie.build()
}

/// Store `token` under a fresh session id and return the cookie for it.
fn create_session(state: &AppState, token: &str) -> (String, Cookie<'static>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    state
        .sessions
        .put(&session_id, token, state.settings.session.ttl());
    let cookie = session_cookie(&state.settings, session_id.clone());
    (session_id, cookie)
}

pub async fn generate_challenge(
    State(state): State<AppState>,
    ValidatedPayload(payload): ValidatedPayload<GenerateChallengeRequest>,
) -> Result<Json<Challenge>, AppError> {
    let challenge = state
        .authenticator
        .generate_challenge(&payload.address)
        .await?;

    Ok(Json(challenge))
}

pub async fn submit_challenge(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedPayload(payload): ValidatedPayload<SubmitChallengeRequest>,
) -> Result<(CookieJar, Json<SubmitChallengeResponse>), AppError> {
    let token = state
        .authenticator
        .submit_challenge(&payload.state, &payload.signature)
        .await?;

    let address = extract_ethereum_address(&token).map_err(|e| {
        tracing::warn!(error = %e, "DEX token is unusable as a session token");
        ServiceError::upstream("dex", "token carries no ethereum address")
    })?;

    let (_, cookie) = create_session(&state, &token);
    tracing::info!(address = %address, "Session created from signed challenge");

    Ok((
        jar.add(cookie),
        Json(SubmitChallengeResponse {
            message: "Challenge submitted successfully",
            id_token: token,
        }),
    ))
}

/// Start a session from a JWT obtained elsewhere, e.g. the hosted login page.
pub async fn start_session(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedPayload(payload): ValidatedPayload<StartSessionRequest>,
) -> Result<(CookieJar, Json<StartSessionResponse>), AppError> {
    let address = extract_ethereum_address(&payload.jwt).map_err(AppError::BadRequest)?;

    let (session_id, cookie) = create_session(&state, &payload.jwt);
    tracing::info!(address = %address, "Session started from JWT");

    Ok((jar.add(cookie), Json(StartSessionResponse { session_id })))
}

pub async fn login_jwt_page() -> impl IntoResponse {
    LoginJwtTemplate { error: None }
}

/// Form variant of [`start_session`] that lands on the account page.
pub async fn login_jwt(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<StartSessionRequest>,
) -> Response {
    let address = match extract_ethereum_address(payload.jwt.trim()) {
        Ok(address) => address,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                LoginJwtTemplate {
                    error: Some(e.to_string()),
                },
            )
                .into_response();
        }
    };

    let (_, cookie) = create_session(&state, payload.jwt.trim());
    tracing::info!(address = %address, "Session started from JWT form");

    (jar.add(cookie), Redirect::to("/account")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(cookie_domain: Option<&str>) -> Settings {
        serde_json::from_value(serde_json::json!({
            "server": {"host": "127.0.0.1", "port": 0, "cookie_domain": cookie_domain},
            "session": {"ttl_seconds": 7200},
            "login": {
                "client_id": "c", "domain": "d", "auth_url": "a",
                "submit_challenge_url": "s", "login_url": "l"
            },
            "upstream": {
                "identity_api_url": "i", "telemetry_api_url": "t", "trips_api_base_url": "tr",
                "device_data_api_url": "dd", "users_api_base_url": "u",
                "token_exchange_api_url": "te"
            },
            "privileges": {"nft_contract_address": "0xnft"}
        }))
        .unwrap()
    }

    #[test]
    fn session_cookie_attributes_follow_settings() {
        let cookie = session_cookie(&settings(Some("example.org")), "abc".to_string());

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.org"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(2)));
    }

    #[test]
    fn cookie_is_host_only_without_domain() {
        let cookie = session_cookie(&settings(None), "abc".to_string());
        assert_eq!(cookie.domain(), None);
    }
}
