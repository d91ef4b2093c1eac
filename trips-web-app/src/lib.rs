pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use config::Settings;
use services::{
    ChallengeAuthenticator, DeviceDataClient, IdentityClient, PrivilegeTokenBroker,
    SessionStore, TelemetryClient, TripIndex, TripsClient, UpstreamClient, UsersClient,
};
use std::sync::Arc;

/// Shared application state: configuration, session state and upstream clients.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<dyn SessionStore>,
    pub trip_index: Arc<TripIndex>,
    pub authenticator: Arc<ChallengeAuthenticator>,
    pub privileges: Arc<PrivilegeTokenBroker>,
    pub identity: Arc<IdentityClient>,
    pub telemetry: Arc<TelemetryClient>,
    pub trips: Arc<TripsClient>,
    pub device_data: Arc<DeviceDataClient>,
    pub users: Arc<UsersClient>,
}

impl AppState {
    /// Wire every client from configuration around one session store.
    pub fn new(settings: Settings, sessions: Arc<dyn SessionStore>) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(settings.upstream.timeout())?;
        let urls = &settings.upstream;

        let privileges = PrivilegeTokenBroker::new(
            upstream.clone(),
            sessions.clone(),
            urls.token_exchange_api_url.clone(),
            settings.privileges.clone(),
            settings.session.privilege_token_ttl(),
        );

        Ok(Self {
            authenticator: Arc::new(ChallengeAuthenticator::new(
                upstream.clone(),
                settings.login.clone(),
            )),
            privileges: Arc::new(privileges),
            identity: Arc::new(IdentityClient::new(
                upstream.clone(),
                urls.identity_api_url.clone(),
            )),
            telemetry: Arc::new(TelemetryClient::new(
                upstream.clone(),
                urls.telemetry_api_url.clone(),
            )),
            trips: Arc::new(TripsClient::new(
                upstream.clone(),
                urls.trips_api_base_url.clone(),
            )),
            device_data: Arc::new(DeviceDataClient::new(
                upstream.clone(),
                urls.device_data_api_url.clone(),
            )),
            users: Arc::new(UsersClient::new(upstream, urls.users_api_base_url.clone())),
            trip_index: Arc::new(TripIndex::new()),
            sessions,
            settings: Arc::new(settings),
        })
    }
}
