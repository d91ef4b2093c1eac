use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest trips shown per vehicle.
pub const MAX_LISTED_TRIPS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub start: TripPoint,
    pub end: TripPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPoint {
    pub time: String,
    #[serde(default)]
    pub location: Option<LatLon>,
    #[serde(default)]
    pub estimated_location: Option<LatLon>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    #[serde(alias = "Latitude")]
    pub latitude: f64,
    #[serde(alias = "Longitude")]
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct TripsResponse {
    #[serde(default)]
    pub trips: Vec<Trip>,
}

impl TripPoint {
    fn parsed_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

impl Trip {
    /// JSON for the `estimatedStart` query parameter of the trip map.
    pub fn estimated_start_param(&self) -> Option<String> {
        self.start
            .estimated_location
            .and_then(|loc| serde_json::to_string(&loc).ok())
    }
}

/// Most recent trips first, at most [`MAX_LISTED_TRIPS`].
///
/// End times are compared as instants when they parse as RFC 3339, so mixed
/// offsets order correctly; unparseable times sort last.
pub fn latest_trips(mut trips: Vec<Trip>) -> Vec<Trip> {
    trips.sort_by(|a, b| {
        let key_a = (a.end.parsed_time(), a.end.time.as_str());
        let key_b = (b.end.parsed_time(), b.end.time.as_str());
        key_b.cmp(&key_a)
    });
    trips.truncate(MAX_LISTED_TRIPS);
    trips
}
