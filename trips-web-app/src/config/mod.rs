use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub session: SessionSettings,
    pub login: LoginSettings,
    pub upstream: UpstreamSettings,
    pub privileges: PrivilegeSettings,
    #[serde(default)]
    pub feedback: FeedbackSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Domain attribute of the `session_id` cookie. Host-only when unset.
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// Mark the session cookie `Secure`. Keep on behind HTTPS.
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Origins allowed to call the JSON API with credentials.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub json: bool,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: true,
            otlp_endpoint: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_privilege_token_ttl")]
    pub privilege_token_ttl_seconds: u64,
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl(),
            privilege_token_ttl_seconds: default_privilege_token_ttl(),
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn privilege_token_ttl(&self) -> Duration {
        Duration::from_secs(self.privilege_token_ttl_seconds)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_seconds.max(1))
    }
}

/// Client parameters for the DEX web3 challenge flow.
#[derive(Debug, Deserialize, Clone)]
pub struct LoginSettings {
    pub client_id: String,
    /// Redirect domain registered for `client_id`.
    pub domain: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_response_type")]
    pub response_type: String,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
    /// DEX endpoint issuing challenges.
    pub auth_url: String,
    /// DEX endpoint accepting signed challenges.
    pub submit_challenge_url: String,
    /// Hosted login page handed to the front-end.
    pub login_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamSettings {
    pub identity_api_url: String,
    pub telemetry_api_url: String,
    pub trips_api_base_url: String,
    pub device_data_api_url: String,
    pub users_api_base_url: String,
    pub token_exchange_api_url: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrivilegeSettings {
    /// Vehicle NFT contract the privileges are granted on.
    pub nft_contract_address: String,
    /// Privilege ids requested on every exchange. 1: non-location data, 4: all-time location.
    #[serde(default = "default_privilege_scopes")]
    pub scopes: Vec<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackSettings {
    #[serde(default = "default_feedback_form_url")]
    pub form_url: String,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            form_url: default_feedback_form_url(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_static_dir() -> String {
    "trips-web-app/static".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl() -> u64 {
    2 * 60 * 60
}

fn default_privilege_token_ttl() -> u64 {
    30
}

fn default_purge_interval() -> u64 {
    10 * 60
}

fn default_scope() -> String {
    "openid email".to_string()
}

fn default_response_type() -> String {
    "code".to_string()
}

fn default_grant_type() -> String {
    "authorization_code".to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_privilege_scopes() -> Vec<u32> {
    vec![1, 4]
}

fn default_feedback_form_url() -> String {
    "https://formcrafts.com/a/74047".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to read current dir: {}", e)))?;

    // Allow running from the workspace root or from the crate directory
    let configuration_directory = if base_path.ends_with("trips-web-app") {
        base_path.join("config")
    } else {
        base_path.join("trips-web-app").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
