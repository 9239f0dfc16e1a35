//! Required credential fields
//!
//! Catalog entries have historically declared required fields in several
//! shapes. All of them are normalized here, once, into an ordered sequence of
//! `(id, label)` pairs so the validation path never branches on shape:
//!
//! - `["api_key", "region"]`: ids only, label = id
//! - `{"api_key": "API Key"}`: id -> label, in declaration order
//! - `{"0": "api_key", "1": "region"}`: contiguous zero-based keys, read as a list
//! - `"{\"api_key\": \"API Key\"}"`: any of the above, JSON-encoded into a string

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::Credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredField {
    pub id: String,
    pub label: String,
}

/// Ordered required-field declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredFields(Vec<RequiredField>);

impl RequiredFields {
    /// Build from `(id, label)` pairs in declaration order.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(id, label)| RequiredField {
                    id: id.into(),
                    label: label.into(),
                })
                .collect(),
        )
    }

    /// Build from bare ids; each label is the id itself.
    pub fn from_ids<I, K>(ids: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::new(ids.into_iter().map(|id| {
            let id = id.into();
            (id.clone(), id)
        }))
    }

    /// Normalize any supported declaration shape.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => {
                let ids = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_owned)
                            .ok_or_else(|| format!("required field id must be a string, got {item}"))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::from_ids(ids))
            }
            Value::Object(map) => {
                let as_list = map
                    .keys()
                    .enumerate()
                    .all(|(index, key)| key.parse::<usize>() == Ok(index));
                if as_list && !map.is_empty() {
                    let items: Vec<Value> = map.values().cloned().collect();
                    return Self::from_json(&Value::Array(items));
                }
                let pairs = map
                    .iter()
                    .map(|(id, label)| match label {
                        Value::String(label) => Ok((id.clone(), label.clone())),
                        other => Err(format!("label for `{id}` must be a string, got {other}")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::new(pairs))
            }
            Value::String(encoded) => {
                let decoded: Value = serde_json::from_str(encoded)
                    .map_err(|e| format!("required_fields string is not valid JSON: {e}"))?;
                if decoded.is_string() {
                    return Err("required_fields string must encode a list or object".into());
                }
                Self::from_json(&decoded)
            }
            Value::Null => Ok(Self::default()),
            other => Err(format!("unsupported required_fields shape: {other}")),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequiredField> {
        self.0.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|field| field.id.as_str())
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|field| field.id == id)
            .map(|field| field.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields that are absent or empty in `credentials`, in declaration order.
    pub fn missing(&self, credentials: &Credentials) -> Vec<&RequiredField> {
        self.0
            .iter()
            .filter(|field| !credentials.is_present(&field.id))
            .collect()
    }
}

/// Serializes as the ordered `{id: label}` object the front-end renders.
impl Serialize for RequiredFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in &self.0 {
            map.serialize_entry(&field.id, &field.label)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RequiredFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RequiredFields::from_json(&value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(fields: &RequiredFields) -> Vec<(String, String)> {
        fields
            .iter()
            .map(|f| (f.id.clone(), f.label.clone()))
            .collect()
    }

    #[test]
    fn label_map_keeps_declaration_order() {
        let fields = RequiredFields::from_json(&json!({
            "access_key_id": "AWS Access Key ID",
            "secret_access_key": "AWS Secret Access Key",
            "region": "AWS Region (e.g., us-east-1)",
        }))
        .unwrap();
        assert_eq!(
            fields.ids().collect::<Vec<_>>(),
            ["access_key_id", "secret_access_key", "region"]
        );
        assert_eq!(fields.label("region"), Some("AWS Region (e.g., us-east-1)"));
    }

    #[test]
    fn plain_list_uses_id_as_label() {
        let fields = RequiredFields::from_json(&json!(["client_id", "client_secret"])).unwrap();
        assert_eq!(
            pairs(&fields),
            [
                ("client_id".to_string(), "client_id".to_string()),
                ("client_secret".to_string(), "client_secret".to_string()),
            ]
        );
    }

    #[test]
    fn contiguous_integer_keys_read_as_list() {
        let fields = RequiredFields::from_json(&json!({"0": "api_key", "1": "org_id"})).unwrap();
        assert_eq!(fields.ids().collect::<Vec<_>>(), ["api_key", "org_id"]);
        assert_eq!(fields.label("api_key"), Some("api_key"));
    }

    #[test]
    fn non_contiguous_integer_keys_are_ids() {
        let fields = RequiredFields::from_json(&json!({"1": "First", "2": "Second"})).unwrap();
        assert_eq!(fields.ids().collect::<Vec<_>>(), ["1", "2"]);
    }

    #[test]
    fn json_encoded_string_is_decoded() {
        let fields = RequiredFields::from_json(&json!("{\"api_key\":\"API Key\"}")).unwrap();
        assert_eq!(pairs(&fields), [("api_key".to_string(), "API Key".to_string())]);
    }

    #[test]
    fn rejects_unsupported_shapes() {
        assert!(RequiredFields::from_json(&json!(42)).is_err());
        assert!(RequiredFields::from_json(&json!([1, 2])).is_err());
        assert!(RequiredFields::from_json(&json!({"api_key": 1})).is_err());
        assert!(RequiredFields::from_json(&json!("\"nested\"")).is_err());
    }

    #[test]
    fn missing_reports_declared_order() {
        let fields = RequiredFields::new([("client_id", "Client ID"), ("client_secret", "Client Secret")]);
        let credentials: Credentials = [("client_secret", ""), ("unrelated", "x")].into_iter().collect();
        let missing: Vec<_> = fields.missing(&credentials).iter().map(|f| f.label.as_str()).collect();
        assert_eq!(missing, ["Client ID", "Client Secret"]);
    }

    #[test]
    fn serde_round_trips_through_label_map() {
        let fields = RequiredFields::new([("client_id", "Client ID"), ("client_secret", "Client Secret")]);
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"client_id":"Client ID","client_secret":"Client Secret"}"#);
        let back: RequiredFields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
    }
}
