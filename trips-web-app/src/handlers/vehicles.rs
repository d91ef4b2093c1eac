use super::error::ViewError;
use crate::middleware::{ApiSession, SessionContext, ViewSession};
use crate::models::{Aggregation, SignalEntry, Vehicle};
use crate::services::{telemetry::HISTORY_INTERVAL, ServiceError};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, SecondsFormat, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;

/// Days of history returned by the history endpoint.
const HISTORY_DAYS: i64 = 7;

#[derive(Template)]
#[template(path = "vehicles.html")]
pub struct VehiclesTemplate {
    pub ethereum_address: String,
    pub vehicles: Vec<Vehicle>,
    pub shared: bool,
}

#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub ethereum_address: String,
    pub vehicles: Vec<Vehicle>,
    pub privileges: Vec<(u32, &'static str)>,
}

#[derive(Template)]
#[template(path = "streamr.html")]
pub struct StreamrTemplate {
    pub ethereum_address: String,
    pub vehicles: Vec<Vehicle>,
    pub shared_vehicles: Vec<Vehicle>,
}

#[derive(Template)]
#[template(path = "vehicle_signals.html")]
pub struct VehicleSignalsTemplate {
    pub token_id: i64,
    pub available_signals: Vec<String>,
    pub entries: Vec<SignalEntry>,
}

#[derive(Template)]
#[template(path = "vehicle_status.html")]
pub struct VehicleStatusTemplate {
    pub token_id: i64,
    pub entries: Vec<SignalEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub signal_name: Option<String>,
    pub agg: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub trip_id: Option<String>,
}

/// Descriptions of the privilege ids the exchange can grant.
pub const PRIVILEGE_DESCRIPTIONS: [(u32, &str); 6] = [
    (1, "All-time, non-location data"),
    (2, "Commands"),
    (3, "Current location"),
    (4, "All-time location"),
    (5, "Verifiable credentials"),
    (6, "Streams"),
];

/// Description of each privilege id the exchange is configured to request.
fn requested_privileges(scopes: &[u32]) -> Vec<(u32, &'static str)> {
    scopes
        .iter()
        .map(|scope| {
            let description = PRIVILEGE_DESCRIPTIONS
                .iter()
                .find(|(id, _)| id == scope)
                .map(|(_, description)| *description)
                .unwrap_or("Unknown privilege");
            (*scope, description)
        })
        .collect()
}

pub(crate) fn parse_token_id(raw: &str) -> Result<i64, ServiceError> {
    raw.parse::<i64>()
        .map_err(|_| ServiceError::Validation("Invalid token ID".to_string()))
}

/// Owned vehicles, or the vehicles shared with the wallet when it owns none.
async fn list_vehicles(
    state: &AppState,
    address: &str,
) -> Result<(Vec<Vehicle>, bool), ServiceError> {
    let owned = state.identity.owned_vehicles(address).await?;
    if !owned.is_empty() {
        return Ok((owned, false));
    }

    let shared = state.identity.shared_vehicles(address).await?;
    Ok((shared, true))
}

/// Fill in latest trips and device status for one vehicle.
///
/// Both are best effort: failures are logged, the field stays empty and the
/// vehicle is flagged `partial`. Only an expired session aborts.
async fn attach_vehicle_details(
    state: &AppState,
    session: &SessionContext,
    vehicle: &mut Vehicle,
) -> Result<(), ServiceError> {
    let token_id = vehicle.token_id;
    let privilege_token = match state
        .privileges
        .get_privilege_token(&session.session_id, token_id)
        .await
    {
        Ok(token) => token,
        Err(ServiceError::Unauthenticated(reason)) => {
            return Err(ServiceError::Unauthenticated(reason))
        }
        Err(e) => {
            tracing::warn!(token_id, error = %e, "Skipping vehicle details without privilege token");
            vehicle.partial = true;
            return Ok(());
        }
    };

    match state
        .trips
        .latest_trips(token_id, privilege_token.expose_secret(), &state.trip_index)
        .await
    {
        Ok(trips) => vehicle.trips = trips,
        Err(e) => {
            tracing::warn!(token_id, error = %e, "Trips unavailable for vehicle");
            vehicle.partial = true;
        }
    }

    match state
        .device_data
        .device_status(token_id, privilege_token.expose_secret())
        .await
    {
        Ok(entries) => vehicle.status_entries = entries,
        Err(e) => {
            tracing::warn!(token_id, error = %e, "Device status unavailable for vehicle");
            vehicle.partial = true;
        }
    }

    Ok(())
}

pub async fn my_vehicles(
    State(state): State<AppState>,
    ViewSession(session): ViewSession,
) -> Result<VehiclesTemplate, ViewError> {
    let (mut vehicles, shared) = list_vehicles(&state, &session.ethereum_address).await?;

    for vehicle in vehicles.iter_mut() {
        attach_vehicle_details(&state, &session, vehicle).await?;
    }

    Ok(VehiclesTemplate {
        ethereum_address: session.ethereum_address,
        vehicles,
        shared,
    })
}

pub async fn account(
    State(state): State<AppState>,
    ViewSession(session): ViewSession,
) -> Result<AccountTemplate, ViewError> {
    let (vehicles, _) = list_vehicles(&state, &session.ethereum_address).await?;

    Ok(AccountTemplate {
        ethereum_address: session.ethereum_address,
        vehicles,
        privileges: requested_privileges(&state.settings.privileges.scopes),
    })
}

/// Live-stream picker over both owned and shared vehicles.
pub async fn streamr(
    State(state): State<AppState>,
    ViewSession(session): ViewSession,
) -> Result<StreamrTemplate, ViewError> {
    let vehicles = state
        .identity
        .owned_vehicles(&session.ethereum_address)
        .await?;
    let shared_vehicles = state
        .identity
        .shared_vehicles(&session.ethereum_address)
        .await?;

    Ok(StreamrTemplate {
        ethereum_address: session.ethereum_address,
        vehicles,
        shared_vehicles,
    })
}

pub async fn vehicle_signals(
    State(state): State<AppState>,
    ViewSession(session): ViewSession,
    Path(token_id): Path<String>,
) -> Result<VehicleSignalsTemplate, ViewError> {
    let token_id = parse_token_id(&token_id)?;
    let privilege_token = state
        .privileges
        .get_privilege_token(&session.session_id, token_id)
        .await?;

    let available_signals = state
        .telemetry
        .available_signals(token_id, privilege_token.expose_secret())
        .await?;
    let entries = state
        .telemetry
        .latest_signals(token_id, &available_signals, privilege_token.expose_secret())
        .await?;

    Ok(VehicleSignalsTemplate {
        token_id,
        available_signals,
        entries,
    })
}

pub async fn vehicle_status(
    State(state): State<AppState>,
    ViewSession(session): ViewSession,
    Path(token_id): Path<String>,
) -> Result<VehicleStatusTemplate, ViewError> {
    let token_id = parse_token_id(&token_id)?;
    let privilege_token = state
        .privileges
        .get_privilege_token(&session.session_id, token_id)
        .await?;

    let entries = state
        .device_data
        .device_status(token_id, privilege_token.expose_secret())
        .await?;

    Ok(VehicleStatusTemplate { token_id, entries })
}

/// Seven days of one signal at a 24h interval.
pub async fn signal_history(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(token_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SignalEntry>>, AppError> {
    let token_id = parse_token_id(&token_id)?;

    let signal_name = query
        .signal_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ServiceError::Validation("Signal name is required".to_string()))?;

    let aggregation = match query.agg.as_deref() {
        None | Some("") => Aggregation::default(),
        Some(raw) => raw
            .parse::<Aggregation>()
            .map_err(ServiceError::Validation)?,
    };

    let to = Utc::now();
    let from = to - Duration::days(HISTORY_DAYS);

    let privilege_token = state
        .privileges
        .get_privilege_token(&session.session_id, token_id)
        .await?;

    let entries = state
        .telemetry
        .historical_signal(
            token_id,
            &signal_name,
            aggregation,
            HISTORY_INTERVAL,
            &from.to_rfc3339_opts(SecondsFormat::Secs, true),
            &to.to_rfc3339_opts(SecondsFormat::Secs, true),
            privilege_token.expose_secret(),
        )
        .await?;

    Ok(Json(entries))
}

/// Redirect to the feedback form prefilled with who is asking about what.
pub async fn give_feedback(
    State(state): State<AppState>,
    ViewSession(session): ViewSession,
    Query(query): Query<FeedbackQuery>,
) -> Result<Response, ViewError> {
    let email = state
        .users
        .email(session.auth_token.expose_secret())
        .await?;

    let vehicles = state
        .identity
        .owned_vehicles(&session.ethereum_address)
        .await?;
    let device = vehicles
        .first()
        .and_then(Vehicle::device_label)
        .unwrap_or_default();

    let submitted = format!("sample-web-app {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
    let trip_id = query.trip_id.unwrap_or_default();

    let url = reqwest::Url::parse_with_params(
        &state.settings.feedback.form_url,
        &[
            ("field59", session.ethereum_address.as_str()),
            ("field55", email.as_str()),
            ("field56", submitted.as_str()),
            ("field57", device.as_str()),
            ("field73", trip_id.as_str()),
        ],
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Feedback form URL is invalid");
        ViewError::Failed {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Feedback form is not configured".to_string(),
        }
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
}
