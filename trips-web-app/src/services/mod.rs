//! Upstream clients and session-scoped state for the trips web app.

pub mod device_data;
pub mod dex;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod privilege;
pub mod session_store;
pub mod telemetry;
pub mod trips;
pub mod upstream;
pub mod users;

pub use device_data::DeviceDataClient;
pub use dex::{Challenge, ChallengeAuthenticator};
pub use error::ServiceError;
pub use identity::IdentityClient;
pub use privilege::PrivilegeTokenBroker;
pub use session_store::{spawn_janitor, MemorySessionStore, SessionStore};
pub use telemetry::TelemetryClient;
pub use trips::{TripIndex, TripsClient};
pub use upstream::UpstreamClient;
pub use users::UsersClient;
