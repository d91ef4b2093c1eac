use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One joined point of a trip track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub timestamp: String,
}

/// One sample of a single telemetry series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedValue {
    pub timestamp: String,
    pub value: f64,
}

impl TimedValue {
    pub fn new(timestamp: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// Join the three series on exact timestamp equality.
///
/// Only timestamps present in all of longitude, latitude and speed produce a
/// point. When a series repeats a timestamp the last sample wins. Output is
/// ordered by timestamp ascending.
pub fn join_location_series(
    longitudes: &[TimedValue],
    latitudes: &[TimedValue],
    speeds: &[TimedValue],
) -> Vec<LocationData> {
    let by_timestamp = |series: &[TimedValue]| -> BTreeMap<String, f64> {
        series
            .iter()
            .map(|sample| (sample.timestamp.clone(), sample.value))
            .collect()
    };

    let latitudes = by_timestamp(latitudes);
    let speeds = by_timestamp(speeds);

    by_timestamp(longitudes)
        .into_iter()
        .filter_map(|(timestamp, longitude)| {
            let latitude = *latitudes.get(&timestamp)?;
            let speed = *speeds.get(&timestamp)?;
            Some(LocationData {
                latitude,
                longitude,
                speed: Some(speed),
                timestamp,
            })
        })
        .collect()
}

/// Upper speed bound (inclusive) and the colour used up to it.
pub const SPEED_GRADIENT: [(f64, &str); 5] = [
    (10.0, "blue"),
    (30.0, "green"),
    (50.0, "yellow"),
    (70.0, "orange"),
    (90.0, "red"),
];

/// Colour for speeds above every threshold or without a reading.
pub const SPEED_SENTINEL_COLOR: &str = "black";

pub fn speed_color(speed: Option<f64>) -> &'static str {
    let Some(speed) = speed else {
        return SPEED_SENTINEL_COLOR;
    };

    SPEED_GRADIENT
        .iter()
        .find(|(limit, _)| speed <= *limit)
        .map(|(_, color)| *color)
        .unwrap_or(SPEED_SENTINEL_COLOR)
}

/// One colour per location, in input order.
pub fn speed_gradient(locations: &[LocationData]) -> Vec<String> {
    locations
        .iter()
        .map(|location| speed_color(location.speed).to_string())
        .collect()
}

/// Aggregation applied to a telemetry series per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    Avg,
    Med,
    #[default]
    Max,
    Min,
    Rand,
}

impl Aggregation {
    pub fn as_graphql(&self) -> &'static str {
        match self {
            Aggregation::Avg => "AVG",
            Aggregation::Med => "MED",
            Aggregation::Max => "MAX",
            Aggregation::Min => "MIN",
            Aggregation::Rand => "RAND",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_graphql())
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVG" => Ok(Aggregation::Avg),
            "MED" => Ok(Aggregation::Med),
            "MAX" => Ok(Aggregation::Max),
            "MIN" => Ok(Aggregation::Min),
            "RAND" => Ok(Aggregation::Rand),
            other => Err(format!("unknown aggregation '{}'", other)),
        }
    }
}
