use super::error::ServiceError;
use super::upstream::{read_json, UpstreamClient};
use crate::config::LoginSettings;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "dex";

/// Challenge issued by DEX for a wallet address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub state: String,
    pub challenge: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Web3 challenge/response login against DEX.
pub struct ChallengeAuthenticator {
    upstream: UpstreamClient,
    settings: LoginSettings,
}

impl ChallengeAuthenticator {
    pub fn new(upstream: UpstreamClient, settings: LoginSettings) -> Self {
        Self { upstream, settings }
    }

    pub fn settings(&self) -> &LoginSettings {
        &self.settings
    }

    pub async fn generate_challenge(&self, address: &str) -> Result<Challenge, ServiceError> {
        let form = [
            ("client_id", self.settings.client_id.as_str()),
            ("domain", self.settings.domain.as_str()),
            ("scope", self.settings.scope.as_str()),
            ("response_type", self.settings.response_type.as_str()),
            ("address", address),
        ];

        let response = self
            .upstream
            .post_form(SERVICE, &self.settings.auth_url, &form)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::upstream_status(
                SERVICE,
                status.as_u16(),
                "challenge generation rejected",
            ));
        }

        let challenge: Challenge = read_json(SERVICE, response).await?;
        if challenge.state.is_empty() || challenge.challenge.is_empty() {
            return Err(ServiceError::upstream(
                SERVICE,
                "challenge response is missing state or challenge",
            ));
        }

        tracing::info!(address = %address, "Issued login challenge");
        Ok(challenge)
    }

    /// Exchange a signed challenge for the user's JWT.
    ///
    /// The token is read from `id_token`, falling back to `access_token`.
    pub async fn submit_challenge(
        &self,
        state: &str,
        signature: &str,
    ) -> Result<String, ServiceError> {
        let form = [
            ("client_id", self.settings.client_id.as_str()),
            ("domain", self.settings.domain.as_str()),
            ("grant_type", self.settings.grant_type.as_str()),
            ("state", state),
            ("signature", signature),
        ];

        let response = self
            .upstream
            .post_form(SERVICE, &self.settings.submit_challenge_url, &form)
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            tracing::warn!(status = status.as_u16(), "DEX rejected the signed challenge");
            return Err(ServiceError::ChallengeRejected {
                status: status.as_u16(),
            });
        }

        let tokens: TokenResponse = read_json(SERVICE, response).await?;
        tokens
            .id_token
            .filter(|t| !t.is_empty())
            .or(tokens.access_token.filter(|t| !t.is_empty()))
            .ok_or_else(|| ServiceError::upstream(SERVICE, "token response carried no token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> LoginSettings {
        LoginSettings {
            client_id: "client-1".to_string(),
            domain: "https://app.example".to_string(),
            scope: "openid email".to_string(),
            response_type: "code".to_string(),
            grant_type: "authorization_code".to_string(),
            auth_url: format!("{}/auth/web3/generate_challenge", server.uri()),
            submit_challenge_url: format!("{}/auth/web3/submit_challenge", server.uri()),
            login_url: "https://login.example".to_string(),
        }
    }

    fn authenticator(server: &MockServer) -> ChallengeAuthenticator {
        ChallengeAuthenticator::new(
            UpstreamClient::new(Duration::from_secs(5)).unwrap(),
            settings(server),
        )
    }

    #[tokio::test]
    async fn generate_challenge_posts_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/web3/generate_challenge"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains("address=0xabc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "s1", "challenge": "sign me"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let challenge = authenticator(&server)
            .generate_challenge("0xabc")
            .await
            .unwrap();

        assert_eq!(challenge.state, "s1");
        assert_eq!(challenge.challenge, "sign me");
    }

    #[tokio::test]
    async fn empty_challenge_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "s1", "challenge": ""})),
            )
            .mount(&server)
            .await;

        assert!(authenticator(&server)
            .generate_challenge("0xabc")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn submit_prefers_id_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/web3/submit_challenge"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("signature=0xsig"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"id_token": "id", "access_token": "access"}),
            ))
            .mount(&server)
            .await;

        let token = authenticator(&server)
            .submit_challenge("s1", "0xsig")
            .await
            .unwrap();
        assert_eq!(token, "id");
    }

    #[tokio::test]
    async fn submit_falls_back_to_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "access"})),
            )
            .mount(&server)
            .await;

        let token = authenticator(&server)
            .submit_challenge("s1", "0xsig")
            .await
            .unwrap();
        assert_eq!(token, "access");
    }

    #[tokio::test]
    async fn rejected_submission_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = authenticator(&server)
            .submit_challenge("s1", "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ChallengeRejected { status: 401 }));
    }

    #[tokio::test]
    async fn submission_without_any_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        assert!(authenticator(&server)
            .submit_challenge("s1", "0xsig")
            .await
            .is_err());
    }
}
