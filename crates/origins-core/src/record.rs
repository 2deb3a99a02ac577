//! Persisted and network forms of an [`OriginComponent`](crate::component::OriginComponent).
//!
//! [`ProfileRecord`] is the format-agnostic shape written to durable storage
//! and carried inside network payloads. Field names follow the historical tag
//! layout (`Origin`, `HadOriginBefore`, `Powers[{Type, Data}]`) so previously
//! saved data keeps loading. Every field has a default: a record missing its
//! origin resolves to the empty origin, a record missing its power list has no
//! powers.
//!
//! Identifiers are stored as raw strings rather than [`Identifier`](crate::identifier::Identifier)s
//! so that malformed or unregistered values survive parsing and are handled
//! by the component's recovery rules instead of failing the whole record.

use serde::{Deserialize, Serialize};

use crate::OriginsError;

/// One persisted power: its type identifier and opaque state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerRecord {
    #[serde(rename = "Type", default)]
    pub power_type: String,
    #[serde(rename = "Data", default)]
    pub data: serde_json::Value,
}

/// Complete persisted state of one component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(rename = "Origin", default)]
    pub origin: String,
    #[serde(rename = "HadOriginBefore", default)]
    pub had_origin_before: bool,
    #[serde(rename = "Powers", default)]
    pub powers: Vec<PowerRecord>,
}

impl ProfileRecord {
    /// Encode as a network payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, OriginsError> {
        serde_json::to_vec(self).map_err(|e| OriginsError::PayloadCodec {
            details: e.to_string(),
        })
    }

    /// Decode a network payload produced by [`to_payload`](Self::to_payload).
    pub fn from_payload(bytes: &[u8]) -> Result<Self, OriginsError> {
        serde_json::from_slice(bytes).map_err(|e| OriginsError::PayloadCodec {
            details: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uses_historical_field_names() {
        let record = ProfileRecord {
            origin: "origins:merling".to_owned(),
            had_origin_before: true,
            powers: vec![PowerRecord {
                power_type: "origins:water_breathing".to_owned(),
                data: json!({"air": 300}),
            }],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "Origin": "origins:merling",
                "HadOriginBefore": true,
                "Powers": [{"Type": "origins:water_breathing", "Data": {"air": 300}}]
            })
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let record: ProfileRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(record, ProfileRecord::default());

        let record: ProfileRecord =
            serde_json::from_value(json!({"Powers": [{"Type": "origins:x"}]})).unwrap();
        assert_eq!(record.powers[0].data, serde_json::Value::Null);
    }

    #[test]
    fn payload_decode_rejects_garbage() {
        let err = ProfileRecord::from_payload(b"\x00\x01not json").unwrap_err();
        assert!(matches!(err, OriginsError::PayloadCodec { .. }));
    }

    #[test]
    fn payload_roundtrip() {
        let record = ProfileRecord {
            origin: "origins:avian".to_owned(),
            had_origin_before: true,
            powers: Vec::new(),
        };
        let bytes = record.to_payload().unwrap();
        assert_eq!(ProfileRecord::from_payload(&bytes).unwrap(), record);
    }
}
