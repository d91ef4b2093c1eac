use super::location::LocationData;
use super::trip::LatLon;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const PRIVACY_ZONE: u8 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

/// Coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_end: Option<String>,
    pub privacy_zone: u8,
    pub color: &'static str,
}

/// How a trip track is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoJsonShape {
    #[default]
    Points,
    Line,
}

impl FromStr for GeoJsonShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "points" => Ok(GeoJsonShape::Points),
            "line" => Ok(GeoJsonShape::Line),
            other => Err(format!("unknown shape '{}'", other)),
        }
    }
}

/// Trip identity carried into feature properties.
#[derive(Debug, Clone, Copy)]
pub struct TripMeta<'a> {
    pub trip_id: &'a str,
    pub start: &'a str,
    pub end: &'a str,
}

pub fn to_geojson(
    locations: &[LocationData],
    estimated_start: Option<LatLon>,
    shape: GeoJsonShape,
    trip: TripMeta<'_>,
) -> FeatureCollection {
    let features = match shape {
        GeoJsonShape::Points => point_features(locations, estimated_start, trip),
        GeoJsonShape::Line => vec![line_feature(locations, trip)],
    };

    FeatureCollection {
        kind: "FeatureCollection",
        features,
    }
}

fn point_features(
    locations: &[LocationData],
    estimated_start: Option<LatLon>,
    trip: TripMeta<'_>,
) -> Vec<Feature> {
    let mut features = Vec::with_capacity(locations.len() + 1);

    if let Some(start) = estimated_start {
        features.push(Feature {
            kind: "Feature",
            geometry: Geometry::Point([start.longitude, start.latitude]),
            properties: FeatureProperties {
                point_type: Some("estimated_start"),
                trip_id: Some(trip.trip_id.to_string()),
                privacy_zone: PRIVACY_ZONE,
                color: "black",
                ..Default::default()
            },
        });
    }

    let last = locations.len().saturating_sub(1);
    for (i, location) in locations.iter().enumerate() {
        let is_end = i == last;
        features.push(Feature {
            kind: "Feature",
            geometry: Geometry::Point([location.longitude, location.latitude]),
            properties: FeatureProperties {
                point_type: is_end.then_some("end"),
                speed: location.speed,
                timestamp: Some(location.timestamp.clone()),
                trip_id: Some(trip.trip_id.to_string()),
                privacy_zone: PRIVACY_ZONE,
                color: if is_end { "red" } else { "black" },
                ..Default::default()
            },
        });
    }

    features
}

fn line_feature(locations: &[LocationData], trip: TripMeta<'_>) -> Feature {
    Feature {
        kind: "Feature",
        geometry: Geometry::LineString(
            locations
                .iter()
                .map(|location| [location.longitude, location.latitude])
                .collect(),
        ),
        properties: FeatureProperties {
            trip_id: Some(trip.trip_id.to_string()),
            trip_start: Some(trip.start.to_string()),
            trip_end: Some(trip.end.to_string()),
            privacy_zone: PRIVACY_ZONE,
            color: "black",
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TRIP: TripMeta<'static> = TripMeta {
        trip_id: "trip-1",
        start: "2024-01-01T00:00:00Z",
        end: "2024-01-01T00:10:00Z",
    };

    fn track() -> Vec<LocationData> {
        vec![
            LocationData {
                latitude: 40.0,
                longitude: -73.0,
                speed: Some(12.0),
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            },
            LocationData {
                latitude: 40.1,
                longitude: -73.1,
                speed: Some(44.0),
                timestamp: "2024-01-01T00:00:30Z".to_string(),
            },
        ]
    }

    #[test]
    fn points_mark_last_location_as_end() {
        let collection = to_geojson(&track(), None, GeoJsonShape::Points, TRIP);
        let value = serde_json::to_value(&collection).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 2);

        let first = &value["features"][0];
        assert_eq!(first["geometry"], json!({"type": "Point", "coordinates": [-73.0, 40.0]}));
        assert_eq!(first["properties"]["color"], "black");
        assert_eq!(first["properties"]["speed"], 12.0);
        assert!(first["properties"].get("point_type").is_none());

        let last = &value["features"][1];
        assert_eq!(last["properties"]["point_type"], "end");
        assert_eq!(last["properties"]["color"], "red");
        assert_eq!(last["properties"]["trip_id"], "trip-1");
    }

    #[test]
    fn estimated_start_is_prepended() {
        let start = LatLon {
            latitude: 39.9,
            longitude: -72.9,
        };
        let collection = to_geojson(&track(), Some(start), GeoJsonShape::Points, TRIP);

        assert_eq!(collection.features.len(), 3);
        let first = &collection.features[0];
        assert_eq!(first.properties.point_type, Some("estimated_start"));
        assert_eq!(first.geometry, Geometry::Point([-72.9, 39.9]));
    }

    #[test]
    fn line_shape_emits_single_linestring() {
        let collection = to_geojson(&track(), None, GeoJsonShape::Line, TRIP);
        let value = serde_json::to_value(&collection).unwrap();

        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["type"], "LineString");
        assert_eq!(
            features[0]["geometry"]["coordinates"],
            json!([[-73.0, 40.0], [-73.1, 40.1]])
        );
        assert_eq!(features[0]["properties"]["trip_start"], TRIP.start);
        assert_eq!(features[0]["properties"]["trip_end"], TRIP.end);
    }

    #[test]
    fn empty_track_without_estimate_has_no_features() {
        let collection = to_geojson(&[], None, GeoJsonShape::Points, TRIP);
        assert!(collection.features.is_empty());
    }

    #[test]
    fn shape_parses_from_query_value() {
        assert_eq!("line".parse::<GeoJsonShape>(), Ok(GeoJsonShape::Line));
        assert_eq!("Points".parse::<GeoJsonShape>(), Ok(GeoJsonShape::Points));
        assert!("polygon".parse::<GeoJsonShape>().is_err());
    }
}
