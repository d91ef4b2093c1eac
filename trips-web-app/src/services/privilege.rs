use super::error::ServiceError;
use super::session_store::{privilege_token_key, SessionStore};
use super::upstream::UpstreamClient;
use crate::config::PrivilegeSettings;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SERVICE: &str = "token-exchange";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeRequest<'a> {
    nft_contract_address: &'a str,
    privileges: &'a [u32],
    token_id: i64,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Trades a session's user JWT for a vehicle-scoped privilege token.
///
/// Tokens are cached in the session store per session and vehicle for a
/// short TTL, so repeated calls for one vehicle reuse the same token.
pub struct PrivilegeTokenBroker {
    upstream: UpstreamClient,
    sessions: Arc<dyn SessionStore>,
    exchange_url: String,
    settings: PrivilegeSettings,
    ttl: Duration,
}

impl PrivilegeTokenBroker {
    pub fn new(
        upstream: UpstreamClient,
        sessions: Arc<dyn SessionStore>,
        exchange_url: String,
        settings: PrivilegeSettings,
        ttl: Duration,
    ) -> Self {
        Self {
            upstream,
            sessions,
            exchange_url,
            settings,
            ttl,
        }
    }

    /// Privilege token for `token_id`, cached or freshly exchanged.
    ///
    /// The session must still be live even when a cached token exists.
    pub async fn get_privilege_token(
        &self,
        session_id: &str,
        token_id: i64,
    ) -> Result<Secret<String>, ServiceError> {
        let auth_token = self
            .sessions
            .get(session_id)
            .ok_or_else(|| ServiceError::Unauthenticated("Session expired".to_string()))?;

        let cache_key = privilege_token_key(session_id, token_id);

        if let Some(token) = self.sessions.get(&cache_key) {
            tracing::debug!(token_id, "Privilege token cache hit");
            return Ok(token);
        }

        let request = ExchangeRequest {
            nft_contract_address: &self.settings.nft_contract_address,
            privileges: &self.settings.scopes,
            token_id,
        };

        let response: ExchangeResponse = self
            .upstream
            .post_json(
                SERVICE,
                &self.exchange_url,
                &request,
                Some(auth_token.expose_secret()),
            )
            .await?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::upstream(SERVICE, "exchange response carried no token"))?;

        self.sessions.put(&cache_key, &token, self.ttl);
        tracing::info!(token_id, "Obtained privilege token");

        Ok(Secret::new(token))
    }
}
