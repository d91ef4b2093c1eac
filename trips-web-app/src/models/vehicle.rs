use super::dynamic::DynamicValue;
use super::signal::SignalEntry;
use super::trip::Trip;
use serde::{Deserialize, Serialize};

/// A vehicle node from the Identity API.
///
/// `trips` and `status_entries` are filled per request by the vehicle list
/// view and are never read from upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub token_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub earnings: Option<Earnings>,
    #[serde(default)]
    pub definition: Option<Definition>,
    #[serde(default)]
    pub aftermarket_device: Option<AftermarketDevice>,
    #[serde(skip_deserializing, default)]
    pub trips: Vec<Trip>,
    #[serde(skip_deserializing, default)]
    pub status_entries: Vec<SignalEntry>,
    /// Set when best-effort sub-data could not be fetched.
    #[serde(skip_deserializing, default)]
    pub partial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    /// Sent as a string by some API versions and as a number by others.
    #[serde(default)]
    pub total_tokens: DynamicValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AftermarketDevice {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<Manufacturer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manufacturer {
    #[serde(default)]
    pub name: Option<String>,
}

impl Vehicle {
    /// "2020 Ford Bronco", falling back to the vehicle name or its token id.
    pub fn display_name(&self) -> String {
        let from_definition = self.definition.as_ref().map(|d| {
            [
                d.year.map(|y| y.to_string()),
                d.make.clone(),
                d.model.clone(),
            ]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
        });

        match from_definition {
            Some(label) if !label.is_empty() => label,
            _ => self
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Vehicle #{}", self.token_id)),
        }
    }

    pub fn total_tokens(&self) -> String {
        self.earnings
            .as_ref()
            .map(|e| e.total_tokens.to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "0".to_string())
    }

    /// "Manufacturer: serial" when the paired device is fully described.
    pub fn device_label(&self) -> Option<String> {
        let device = self.aftermarket_device.as_ref()?;
        device.address.as_deref().filter(|s| !s.is_empty())?;
        let serial = device.serial.as_deref().filter(|s| !s.is_empty())?;
        let manufacturer = device
            .manufacturer
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|s| !s.is_empty())?;

        Some(format!("{}: {}", manufacturer, serial))
    }

    pub fn device_label_or_none(&self) -> String {
        self.device_label().unwrap_or_else(|| "No device paired".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_identity_api_node() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "tokenId": 17,
            "earnings": {"totalTokens": "125.5"},
            "definition": {"make": "Ford", "model": "Bronco", "year": 2022},
            "aftermarketDevice": {
                "address": "0xabc",
                "serial": "SN-1",
                "manufacturer": {"name": "AutoPi"}
            }
        }))
        .unwrap();

        assert_eq!(vehicle.token_id, 17);
        assert_eq!(vehicle.display_name(), "2022 Ford Bronco");
        assert_eq!(vehicle.total_tokens(), "125.5");
        assert_eq!(vehicle.device_label().as_deref(), Some("AutoPi: SN-1"));
        assert!(vehicle.trips.is_empty());
    }

    #[test]
    fn tolerates_null_sub_objects() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "tokenId": 3,
            "name": "daily driver",
            "earnings": null,
            "definition": null,
            "aftermarketDevice": null
        }))
        .unwrap();

        assert_eq!(vehicle.display_name(), "daily driver");
        assert_eq!(vehicle.total_tokens(), "0");
        assert_eq!(vehicle.device_label(), None);
    }

    #[test]
    fn numeric_earnings_render_as_sent() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "tokenId": 4,
            "earnings": {"totalTokens": 12}
        }))
        .unwrap();

        assert_eq!(vehicle.total_tokens(), "12");
        assert_eq!(vehicle.display_name(), "Vehicle #4");
    }
}
