mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

const WINDOW: &str = "start=2024-01-01T00:00:00Z&end=2024-01-01T01:00:00Z";

async fn mount_exchange(app: &TestApp, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/tokens/exchange"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "priv-7"})))
        .expect(expected_calls)
        .mount(&app.server)
        .await;
}

async fn mount_track(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/telemetry/query"))
        .and(header("authorization", "Bearer priv-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"signals": [
                {
                    "timestamp": "2024-01-01T00:00:00Z",
                    "speed": 12.0,
                    "currentLocationLatitude": 52.1,
                    "currentLocationLongitude": 4.3
                },
                {
                    "timestamp": "2024-01-01T00:00:30Z",
                    "speed": 48.0,
                    "currentLocationLatitude": 52.2,
                    "currentLocationLongitude": 4.4
                },
                {
                    "timestamp": "2024-01-01T00:01:00Z",
                    "speed": 30.0,
                    "currentLocationLatitude": 52.3
                }
            ]}
        })))
        .mount(&app.server)
        .await;
}

#[tokio::test]
async fn unknown_trip_without_token_id_is_not_found() {
    let app = TestApp::spawn().await;
    let cookie = app.login();

    let response = app
        .get(&format!("/api/trip/unknown?{}", WINDOW), Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trip_map_joins_track_and_reuses_privilege_token() {
    let app = TestApp::spawn().await;
    let cookie = app.login();
    mount_exchange(&app, 1).await;
    mount_track(&app).await;

    for _ in 0..2 {
        let response = app
            .get(&format!("/api/trip/trip-1?{}&tokenId=7", WINDOW), Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        // The third row has no longitude and is dropped by the join.
        assert_eq!(body["speedGradient"].as_array().unwrap().len(), 2);
        assert_eq!(body["geojson"]["type"], "FeatureCollection");
        assert!(!body["geojson"]["features"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn listed_trips_resolve_without_token_id() {
    let app = TestApp::spawn().await;
    let cookie = app.login();
    mount_exchange(&app, 1).await;
    mount_track(&app).await;
    Mock::given(method("GET"))
        .and(path("/trips/v1/vehicle/7/trips"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trips": [{
                "id": "trip-1",
                "start": {"time": "2024-01-01T00:00:00Z"},
                "end": {"time": "2024-01-01T01:00:00Z"}
            }]
        })))
        .mount(&app.server)
        .await;

    let response = app.get("/vehicles/7/trips", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/api/trip/trip-1?{}", WINDOW), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn trip_map_requires_a_time_window() {
    let app = TestApp::spawn().await;
    let cookie = app.login();

    let response = app
        .get("/api/trip/trip-1?tokenId=7&end=2024-01-01T01:00:00Z", Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_token_hands_out_privilege_token() {
    let app = TestApp::spawn().await;
    let cookie = app.login();
    mount_exchange(&app, 1).await;

    let response = app
        .post_json("/api/generate-token/7", json!({}), Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["token"], "priv-7");
}
