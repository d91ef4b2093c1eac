use super::error::ServiceError;
use super::upstream::UpstreamClient;
use serde::Deserialize;

const SERVICE: &str = "users";

#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    email: Option<EmailAddress>,
}

#[derive(Deserialize)]
struct EmailAddress {
    #[serde(default)]
    address: Option<String>,
}

pub struct UsersClient {
    upstream: UpstreamClient,
    base_url: String,
}

impl UsersClient {
    pub fn new(upstream: UpstreamClient, base_url: String) -> Self {
        Self {
            upstream,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Email of the signed-in user; empty when the account has none.
    pub async fn email(&self, auth_token: &str) -> Result<String, ServiceError> {
        let url = format!("{}/user", self.base_url);
        let user: UserResponse = self
            .upstream
            .get_json(SERVICE, &url, Some(auth_token))
            .await?;

        Ok(user.email.and_then(|e| e.address).unwrap_or_default())
    }
}
