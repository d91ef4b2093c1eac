use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    app::{health_check, index, public_settings},
    auth::{generate_challenge, login_jwt, login_jwt_page, start_session, submit_challenge},
    metrics::metrics,
    token::generate_token,
    trips::{trip_map, vehicle_trips},
    vehicles::{
        account, give_feedback, my_vehicles, signal_history, streamr, vehicle_signals,
        vehicle_status,
    },
};
use crate::AppState;

/// Credentialed CORS for the configured front-end origins only.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.settings.server.static_dir.clone();
    let cors = cors_layer(&state.settings.server.allowed_origins);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/public/settings", get(public_settings))
        .route("/auth/web3/generate_challenge", post(generate_challenge))
        .route("/auth/web3/submit_challenge", post(submit_challenge))
        .route("/auth/start_session", post(start_session))
        .route("/login/jwt", get(login_jwt_page).post(login_jwt))
        .route("/account", get(account))
        .route("/vehicles/me", get(my_vehicles))
        .route("/streamr", get(streamr))
        .route("/vehicles/:tokenid/signals", get(vehicle_signals))
        .route("/vehicles/:tokenid/status", get(vehicle_status))
        .route("/vehicles/:tokenid/trips", get(vehicle_trips))
        .route("/vehicles/:tokenid/history", get(signal_history))
        .route("/api/trip/:tripID", get(trip_map))
        .route("/api/generate-token/:tokenID", post(generate_token))
        .route("/give-feedback", get(give_feedback))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
