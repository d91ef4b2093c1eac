use super::error::ViewError;
use super::vehicles::parse_token_id;
use crate::middleware::{ApiSession, ViewSession};
use crate::models::{speed_gradient, to_geojson, FeatureCollection, GeoJsonShape, LatLon, Trip, TripMeta};
use crate::services::ServiceError;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "vehicle_trips.html")]
pub struct VehicleTripsTemplate {
    pub token_id: i64,
    pub trips: Vec<Trip>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripMapQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub estimated_start: Option<String>,
    pub token_id: Option<String>,
    pub shape: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripMapResponse {
    pub geojson: FeatureCollection,
    pub speed_gradient: Vec<String>,
}

fn parse_time(name: &str, raw: Option<&str>) -> Result<String, ServiceError> {
    let raw = raw
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServiceError::Validation(format!("{} is required", name)))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|time| {
            time.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        })
        .map_err(|_| ServiceError::Validation(format!("{} must be an RFC 3339 timestamp", name)))
}

fn parse_estimated_start(raw: Option<&str>) -> Result<Option<LatLon>, ServiceError> {
    match raw.filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(raw) => serde_json::from_str::<LatLon>(raw)
            .map(Some)
            .map_err(|_| ServiceError::Validation("Invalid estimatedStart".to_string())),
    }
}

pub async fn vehicle_trips(
    State(state): State<AppState>,
    ViewSession(session): ViewSession,
    Path(token_id): Path<String>,
) -> Result<VehicleTripsTemplate, ViewError> {
    let token_id = parse_token_id(&token_id)?;
    let privilege_token = state
        .privileges
        .get_privilege_token(&session.session_id, token_id)
        .await?;

    let trips = state
        .trips
        .latest_trips(token_id, privilege_token.expose_secret(), &state.trip_index)
        .await?;

    Ok(VehicleTripsTemplate { token_id, trips })
}

/// Trip track as GeoJSON plus one speed colour per location.
///
/// The vehicle comes from `tokenId` when given, otherwise from trips listed
/// earlier in this process.
pub async fn trip_map(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(trip_id): Path<String>,
    Query(query): Query<TripMapQuery>,
) -> Result<Json<TripMapResponse>, AppError> {
    let start = parse_time("start", query.start.as_deref())?;
    let end = parse_time("end", query.end.as_deref())?;
    let estimated_start = parse_estimated_start(query.estimated_start.as_deref())?;
    let shape = match query.shape.as_deref() {
        None | Some("") => GeoJsonShape::default(),
        Some(raw) => raw.parse().map_err(ServiceError::Validation)?,
    };

    let token_id = match query.token_id.as_deref().filter(|value| !value.is_empty()) {
        Some(raw) => parse_token_id(raw)?,
        None => state.trip_index.lookup(&trip_id).ok_or_else(|| {
            tracing::warn!(trip_id = %trip_id, "Trip not found in index");
            ServiceError::NotFound("Trip not found".to_string())
        })?,
    };

    let privilege_token = state
        .privileges
        .get_privilege_token(&session.session_id, token_id)
        .await?;

    let locations = state
        .telemetry
        .trip_locations(token_id, &start, &end, privilege_token.expose_secret())
        .await?;

    let geojson = to_geojson(
        &locations,
        estimated_start,
        shape,
        TripMeta {
            trip_id: &trip_id,
            start: &start,
            end: &end,
        },
    );

    Ok(Json(TripMapResponse {
        geojson,
        speed_gradient: speed_gradient(&locations),
    }))
}
