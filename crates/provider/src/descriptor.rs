//! Static provider descriptor (catalog entry)

use serde::{Deserialize, Serialize};

use crate::fields::RequiredFields;

/// Identity and configuration of one provider, loaded once at startup.
///
/// `slug` is the external addressing key and must stay stable once published.
/// `implementation` names the probe in the closed registry; it is not exposed
/// to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub slug: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_keys_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    pub required_fields: RequiredFields,
    #[serde(skip_serializing)]
    pub implementation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_catalog_entry_and_hides_implementation() {
        let descriptor: ProviderDescriptor = serde_json::from_value(json!({
            "slug": "polar",
            "name": "Polar",
            "category": "payment",
            "description": "Online payment processing platform for internet businesses",
            "website_url": "https://polar.sh",
            "required_fields": {"api_key": "API Key"},
            "implementation": "polar",
        }))
        .unwrap();
        assert_eq!(descriptor.required_fields.label("api_key"), Some("API Key"));
        assert!(descriptor.base_url.is_none());

        let json = serde_json::to_value(&descriptor).unwrap();
        assert!(json.get("implementation").is_none());
        assert!(json.get("base_url").is_none());
        assert_eq!(json["required_fields"]["api_key"], "API Key");
    }
}
