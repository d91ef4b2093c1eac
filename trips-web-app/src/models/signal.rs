use super::dynamic::DynamicValue;
use serde::Serialize;
use std::collections::BTreeMap;

/// One flattened telemetry or device-status reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalEntry {
    pub signal_name: String,
    pub value: String,
    pub timestamp: String,
    pub source: String,
}

/// Flatten `{name: {value, timestamp, source}}` wrappers into entries.
///
/// - a scalar `value` yields one entry named `name`
/// - an object `value` yields one entry per inner key, named `name.inner`
/// - a wrapper without `value` yields an entry with an empty value
/// - top-level fields that are not objects are skipped
///
/// Entries come out ordered by signal name.
pub fn flatten_signals(raw: &BTreeMap<String, DynamicValue>) -> Vec<SignalEntry> {
    let mut entries = Vec::new();

    for (name, field) in raw {
        let Some(wrapper) = field.as_object() else {
            continue;
        };

        let timestamp = display_field(wrapper.get("timestamp"));
        let source = display_field(wrapper.get("source"));

        match wrapper.get("value") {
            Some(DynamicValue::Object(inner)) => {
                for (key, value) in inner {
                    entries.push(SignalEntry {
                        signal_name: format!("{}.{}", name, key),
                        value: value.to_string(),
                        timestamp: timestamp.clone(),
                        source: source.clone(),
                    });
                }
            }
            Some(value) => entries.push(SignalEntry {
                signal_name: name.clone(),
                value: value.to_string(),
                timestamp,
                source,
            }),
            None => entries.push(SignalEntry {
                signal_name: name.clone(),
                value: String::new(),
                timestamp,
                source,
            }),
        }
    }

    entries
}

fn display_field(value: Option<&DynamicValue>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}
