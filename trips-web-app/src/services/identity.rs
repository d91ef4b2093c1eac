use super::error::ServiceError;
use super::upstream::UpstreamClient;
use crate::models::Vehicle;
use serde::Deserialize;
use serde_json::json;

const SERVICE: &str = "identity";

const VEHICLE_FIELDS: &str = "
    nodes {
        tokenId
        name
        earnings { totalTokens }
        definition { make model year }
        aftermarketDevice {
            address
            serial
            manufacturer { name }
        }
    }";

/// Which relation between the wallet and the vehicle to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleFilter {
    Owner,
    Privileged,
}

impl VehicleFilter {
    fn field(&self) -> &'static str {
        match self {
            VehicleFilter::Owner => "owner",
            VehicleFilter::Privileged => "privileged",
        }
    }
}

#[derive(Deserialize)]
struct VehiclesData {
    vehicles: VehicleConnection,
}

#[derive(Deserialize)]
struct VehicleConnection {
    #[serde(default)]
    nodes: Vec<Vehicle>,
}

/// Identity API client. The API is public, so no bearer is sent.
pub struct IdentityClient {
    upstream: UpstreamClient,
    url: String,
}

impl IdentityClient {
    pub fn new(upstream: UpstreamClient, url: String) -> Self {
        Self { upstream, url }
    }

    pub async fn owned_vehicles(&self, address: &str) -> Result<Vec<Vehicle>, ServiceError> {
        self.vehicles(address, VehicleFilter::Owner).await
    }

    pub async fn shared_vehicles(&self, address: &str) -> Result<Vec<Vehicle>, ServiceError> {
        self.vehicles(address, VehicleFilter::Privileged).await
    }

    /// First 50 vehicles matching the filter; no cursor pagination.
    pub async fn vehicles(
        &self,
        address: &str,
        filter: VehicleFilter,
    ) -> Result<Vec<Vehicle>, ServiceError> {
        let query = format!(
            "query Vehicles($address: Address!) {{ vehicles(first: 50, filterBy: {{ {}: $address }}) {{ {} }} }}",
            filter.field(),
            VEHICLE_FIELDS
        );

        let data: VehiclesData = self
            .upstream
            .graphql(SERVICE, &self.url, &query, json!({ "address": address }), None)
            .await?;

        tracing::debug!(count = data.vehicles.nodes.len(), filter = ?filter, "Fetched vehicles");
        Ok(data.vehicles.nodes)
    }
}
