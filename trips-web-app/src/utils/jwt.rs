use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Claims read from a session token.
#[derive(Debug, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub ethereum_address: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn ethereum_address(&self) -> Result<&str> {
        self.ethereum_address
            .as_deref()
            .filter(|address| !address.is_empty())
            .ok_or_else(|| anyhow::anyhow!("ethereum address not found in JWT"))
    }

    /// Tokens without an `exp` claim never expire here; the session TTL still applies.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.exp, Some(exp) if exp <= now.timestamp())
    }
}

/// Decode JWT claims without validation.
///
/// This does NOT check the signature. Tokens reach us either from the DEX
/// challenge exchange or from the SSO hand-off, and were validated by the
/// identity provider that minted them. The claims are only consulted after
/// the opaque session id has been found in the session store, so a caller
/// cannot get here with a token we did not store ourselves. Never use this
/// as a general-purpose token validator.
pub fn decode_unverified_claims(token: &str) -> Result<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: TokenClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}

/// Shorthand for the one claim the app needs.
pub fn extract_ethereum_address(token: &str) -> Result<String> {
    let claims = decode_unverified_claims(token)?;
    Ok(claims.ethereum_address()?.to_string())
}

#[cfg(test)]
pub(crate) fn unsigned_token(claims: &serde_json::Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
