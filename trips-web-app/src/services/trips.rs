use super::error::ServiceError;
use super::upstream::UpstreamClient;
use crate::models::{latest_trips, Trip, TripsResponse};
use dashmap::DashMap;

const SERVICE: &str = "trips";

/// Trip id to vehicle token id, filled in by trip listings.
///
/// Lets the trip map endpoint resolve a vehicle from a bare trip id. Entries
/// are never evicted; trip ids are stable and the map only grows with what
/// users have listed.
#[derive(Debug, Default)]
pub struct TripIndex {
    entries: DashMap<String, i64>,
}

impl TripIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, trip_id: &str, token_id: i64) {
        self.entries.insert(trip_id.to_string(), token_id);
    }

    pub fn lookup(&self, trip_id: &str) -> Option<i64> {
        self.entries.get(trip_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct TripsClient {
    upstream: UpstreamClient,
    base_url: String,
}

impl TripsClient {
    pub fn new(upstream: UpstreamClient, base_url: String) -> Self {
        Self {
            upstream,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The 20 most recent trips of a vehicle, newest first.
    ///
    /// Every returned trip is recorded in `index`.
    pub async fn latest_trips(
        &self,
        token_id: i64,
        privilege_token: &str,
        index: &TripIndex,
    ) -> Result<Vec<Trip>, ServiceError> {
        let url = format!("{}/vehicle/{}/trips", self.base_url, token_id);
        let response: TripsResponse = self
            .upstream
            .get_json(SERVICE, &url, Some(privilege_token))
            .await?;

        let trips = latest_trips(response.trips);
        for trip in &trips {
            index.record(&trip.id, token_id);
        }

        tracing::debug!(token_id, count = trips.len(), "Fetched trips");
        Ok(trips)
    }
}
