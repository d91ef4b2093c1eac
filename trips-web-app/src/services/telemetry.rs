use super::error::ServiceError;
use super::upstream::UpstreamClient;
use crate::models::{
    flatten_signals, join_location_series, Aggregation, DynamicValue, LocationData, SignalEntry,
    TimedValue,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

const SERVICE: &str = "telemetry";

/// Bucket width of the trip track query.
pub const TRIP_TRACK_INTERVAL: &str = "30s";

/// Bucket width of the history query.
pub const HISTORY_INTERVAL: &str = "24h";

const LONGITUDE: &str = "currentLocationLongitude";
const LATITUDE: &str = "currentLocationLatitude";
const SPEED: &str = "speed";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailableSignalsData {
    #[serde(default)]
    available_signals: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestSignalsData {
    #[serde(default)]
    signals_latest: Option<BTreeMap<String, DynamicValue>>,
}

#[derive(Deserialize)]
struct SignalRowsData {
    #[serde(default)]
    signals: Option<Vec<BTreeMap<String, DynamicValue>>>,
}

/// Signal names end up inside the GraphQL selection set, so only plain
/// identifiers are accepted.
pub fn is_valid_signal_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn ensure_signal_name(name: &str) -> Result<(), ServiceError> {
    if is_valid_signal_name(name) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!("Invalid signal name: {}", name)))
    }
}

/// Telemetry API client. Every call needs a privilege token for the vehicle.
pub struct TelemetryClient {
    upstream: UpstreamClient,
    url: String,
}

impl TelemetryClient {
    pub fn new(upstream: UpstreamClient, url: String) -> Self {
        Self { upstream, url }
    }

    pub async fn available_signals(
        &self,
        token_id: i64,
        privilege_token: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let data: AvailableSignalsData = self
            .upstream
            .graphql(
                SERVICE,
                &self.url,
                "query AvailableSignals($tokenId: Int!) { availableSignals(tokenId: $tokenId) }",
                json!({ "tokenId": token_id }),
                Some(privilege_token),
            )
            .await?;

        Ok(data.available_signals.unwrap_or_default())
    }

    /// Latest value of each named signal, flattened and ordered by name.
    pub async fn latest_signals(
        &self,
        token_id: i64,
        signal_names: &[String],
        privilege_token: &str,
    ) -> Result<Vec<SignalEntry>, ServiceError> {
        let mut selection = String::new();
        for name in signal_names {
            if !is_valid_signal_name(name) {
                tracing::warn!(token_id, signal = %name, "Skipping signal with invalid name");
                continue;
            }
            selection.push_str(name);
            selection.push_str(" { timestamp value } ");
        }

        if selection.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "query LatestSignals($tokenId: Int!) {{ signalsLatest(tokenId: $tokenId) {{ {} }} }}",
            selection
        );

        let data: LatestSignalsData = self
            .upstream
            .graphql(
                SERVICE,
                &self.url,
                &query,
                json!({ "tokenId": token_id }),
                Some(privilege_token),
            )
            .await?;

        Ok(data
            .signals_latest
            .map(|raw| flatten_signals(&raw))
            .unwrap_or_default())
    }

    /// One aggregated value per interval of `[from, to]`, each entry carrying
    /// its row timestamp.
    #[allow(clippy::too_many_arguments)]
    pub async fn historical_signal(
        &self,
        token_id: i64,
        signal_name: &str,
        aggregation: Aggregation,
        interval: &str,
        from: &str,
        to: &str,
        privilege_token: &str,
    ) -> Result<Vec<SignalEntry>, ServiceError> {
        ensure_signal_name(signal_name)?;

        let query = format!(
            "query History($tokenId: Int!, $interval: String!, $from: Time!, $to: Time!) {{ \
             signals(tokenId: $tokenId, interval: $interval, from: $from, to: $to) {{ \
             timestamp {}(agg: {}) }} }}",
            signal_name,
            aggregation.as_graphql()
        );

        let rows = self
            .signal_rows(&query, token_id, interval, from, to, privilege_token)
            .await?;

        let entries = rows
            .iter()
            .filter_map(|row| {
                let value = row.get(signal_name).filter(|v| !v.is_null());
                if value.is_none() {
                    tracing::debug!(token_id, signal = %signal_name, "Row without signal value");
                }
                value.map(|value| SignalEntry {
                    signal_name: signal_name.to_string(),
                    value: value.to_string(),
                    timestamp: row.get("timestamp").map(ToString::to_string).unwrap_or_default(),
                    source: String::new(),
                })
            })
            .collect();

        Ok(entries)
    }

    /// Trip track between `from` and `to`: averaged position and maximum
    /// speed per 30s bucket, joined on timestamp.
    pub async fn trip_locations(
        &self,
        token_id: i64,
        from: &str,
        to: &str,
        privilege_token: &str,
    ) -> Result<Vec<LocationData>, ServiceError> {
        let query = format!(
            "query TripTrack($tokenId: Int!, $interval: String!, $from: Time!, $to: Time!) {{ \
             signals(tokenId: $tokenId, interval: $interval, from: $from, to: $to) {{ \
             timestamp {}(agg: {}) {}(agg: {}) {}(agg: {}) }} }}",
            SPEED,
            Aggregation::Max.as_graphql(),
            LATITUDE,
            Aggregation::Avg.as_graphql(),
            LONGITUDE,
            Aggregation::Avg.as_graphql(),
        );

        let rows = self
            .signal_rows(&query, token_id, TRIP_TRACK_INTERVAL, from, to, privilege_token)
            .await?;

        let (longitudes, latitudes, speeds) = split_series(&rows);
        let locations = join_location_series(&longitudes, &latitudes, &speeds);

        if locations.is_empty() {
            tracing::warn!(token_id, from = %from, to = %to, "No location data for trip window");
        }

        Ok(locations)
    }

    async fn signal_rows(
        &self,
        query: &str,
        token_id: i64,
        interval: &str,
        from: &str,
        to: &str,
        privilege_token: &str,
    ) -> Result<Vec<BTreeMap<String, DynamicValue>>, ServiceError> {
        let data: SignalRowsData = self
            .upstream
            .graphql(
                SERVICE,
                &self.url,
                query,
                json!({
                    "tokenId": token_id,
                    "interval": interval,
                    "from": from,
                    "to": to,
                }),
                Some(privilege_token),
            )
            .await?;

        Ok(data.signals.unwrap_or_default())
    }
}

fn split_series(
    rows: &[BTreeMap<String, DynamicValue>],
) -> (Vec<TimedValue>, Vec<TimedValue>, Vec<TimedValue>) {
    let mut longitudes = Vec::new();
    let mut latitudes = Vec::new();
    let mut speeds = Vec::new();

    for row in rows {
        let Some(timestamp) = row.get("timestamp").map(ToString::to_string) else {
            continue;
        };

        let push = |series: &mut Vec<TimedValue>, key: &str| {
            if let Some(value) = row.get(key).and_then(DynamicValue::as_f64) {
                series.push(TimedValue::new(timestamp.clone(), value));
            }
        };
        push(&mut longitudes, LONGITUDE);
        push(&mut latitudes, LATITUDE);
        push(&mut speeds, SPEED);
    }

    (longitudes, latitudes, speeds)
}
