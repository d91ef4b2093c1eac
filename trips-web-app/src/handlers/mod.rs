pub mod app;
pub mod auth;
pub mod error;
pub mod metrics;
pub mod token;
pub mod trips;
pub mod vehicles;
