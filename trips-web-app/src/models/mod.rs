pub mod dynamic;
pub mod geojson;
pub mod location;
pub mod signal;
pub mod trip;
pub mod vehicle;

pub use dynamic::DynamicValue;
pub use geojson::{to_geojson, FeatureCollection, GeoJsonShape, TripMeta};
pub use location::{
    join_location_series, speed_color, speed_gradient, Aggregation, LocationData, TimedValue,
};
pub use signal::{flatten_signals, SignalEntry};
pub use trip::{latest_trips, LatLon, Trip, TripPoint, TripsResponse};
pub use vehicle::Vehicle;
