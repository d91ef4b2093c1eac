use super::error::ServiceError;
use super::upstream::UpstreamClient;
use crate::models::{flatten_signals, DynamicValue, SignalEntry};
use std::collections::BTreeMap;

const SERVICE: &str = "device-data";

pub struct DeviceDataClient {
    upstream: UpstreamClient,
    base_url: String,
}

impl DeviceDataClient {
    pub fn new(upstream: UpstreamClient, base_url: String) -> Self {
        Self {
            upstream,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Raw device status, flattened into one entry per reading.
    pub async fn device_status(
        &self,
        token_id: i64,
        privilege_token: &str,
    ) -> Result<Vec<SignalEntry>, ServiceError> {
        let url = format!("{}/vehicle/{}/status-raw", self.base_url, token_id);
        let raw: BTreeMap<String, DynamicValue> = self
            .upstream
            .get_json(SERVICE, &url, Some(privilege_token))
            .await?;

        Ok(flatten_signals(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn flattens_status_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vehicle/12/status-raw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "speed": {"value": 42, "timestamp": "t1", "source": "autopi"},
                "tires": {"value": {"frontLeft": 30}, "timestamp": "t2"},
                "deviceId": "abc"
            })))
            .mount(&server)
            .await;

        let client = DeviceDataClient::new(
            UpstreamClient::new(Duration::from_secs(5)).unwrap(),
            server.uri(),
        );
        let entries = client.device_status(12, "priv").await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.signal_name.as_str()).collect();
        assert_eq!(names, vec!["speed", "tires.frontLeft"]);
        assert_eq!(entries[0].source, "autopi");
    }
}
