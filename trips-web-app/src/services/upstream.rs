use super::error::ServiceError;
use metrics::{counter, histogram};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::observability::{TracedClientExt, TracedRequest};
use std::time::{Duration, Instant};

/// Shared HTTP client for every upstream API.
///
/// Each call is traced, timed and counted per service. There are no retries;
/// a failed call fails the operation that issued it.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<T, ServiceError> {
        let mut request = self.client.traced_get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = self.send(service, request).await?;
        read_json(service, ensure_success(service, response).await?).await
    }

    pub async fn post_json<B, T>(
        &self,
        service: &'static str,
        url: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.traced_post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = self.send(service, request).await?;
        read_json(service, ensure_success(service, response).await?).await
    }

    /// Form POST returning the raw response, for callers that map statuses
    /// themselves.
    pub async fn post_form<B: Serialize + ?Sized>(
        &self,
        service: &'static str,
        url: &str,
        form: &B,
    ) -> Result<Response, ServiceError> {
        self.send(service, self.client.traced_post(url).form(form))
            .await
    }

    /// POST a `{query, variables}` envelope and unwrap `data`.
    ///
    /// `errors` without `data` fail the call; `errors` next to `data` are
    /// logged and the data is used.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &str,
        variables: serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<T, ServiceError> {
        let envelope: GraphQlResponse<T> = self
            .post_json(service, url, &GraphQlRequest { query, variables }, bearer)
            .await?;

        let messages: Vec<&str> = envelope.errors.iter().map(|e| e.message.as_str()).collect();

        match envelope.data {
            Some(data) => {
                if !messages.is_empty() {
                    tracing::warn!(service, errors = ?messages, "GraphQL response carried errors");
                }
                Ok(data)
            }
            None if messages.is_empty() => {
                Err(ServiceError::upstream(service, "GraphQL response without data"))
            }
            None => Err(ServiceError::upstream(service, messages.join("; "))),
        }
    }

    async fn send(
        &self,
        service: &'static str,
        request: TracedRequest,
    ) -> Result<Response, ServiceError> {
        let start = Instant::now();
        let result = request.send().await;
        let elapsed = start.elapsed().as_secs_f64();

        let status = match &result {
            Ok(response) => response.status().as_u16().to_string(),
            Err(e) if e.is_timeout() => "timeout".to_string(),
            Err(_) => "error".to_string(),
        };
        counter!("upstream_requests_total", "service" => service, "status" => status).increment(1);
        histogram!("upstream_request_duration_seconds", "service" => service).record(elapsed);

        result.map_err(|e| {
            tracing::error!(service, error = %e, "Upstream request failed");
            ServiceError::upstream(service, e.to_string())
        })
    }
}

async fn ensure_success(service: &'static str, response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(service, status = status.as_u16(), body = %truncate(&body, 512), "Upstream returned an error status");
    Err(ServiceError::upstream_status(
        service,
        status.as_u16(),
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    ))
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, ServiceError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::upstream(service, format!("Invalid response body: {}", e)))
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
