//! Wire types exchanged with the Placard asset store.
//!
//! The store exposes a public snapshot endpoint (`GET /api/ui-config`) and an
//! admin surface (`/admin/ui-assets`). Both the client in the `placard` crate
//! and any server implementation share these shapes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Flattened key → value mapping served by `GET /api/ui-config`.
///
/// `None` values are keys the store knows about but has no value for.
pub type UiConfigMap = BTreeMap<String, Option<String>>;

/// Presentation kind of an asset as stored by the admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[default]
    Text,
    Image,
}

impl AssetType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Text => "text",
            AssetType::Image => "image",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One editable UI asset with its grouping metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub key: String,
    pub section: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    #[serde(default)]
    pub value: Option<String>,
}

/// A single key/value write. An empty `value` clears the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdate {
    pub key: String,
    pub value: String,
}

impl AssetUpdate {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Body of `PUT /admin/ui-assets/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueUpdateRequest {
    pub value: String,
}

/// Body of `PUT /admin/ui-assets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpdateRequest {
    pub updates: Vec<AssetUpdate>,
}

/// JSON envelope returned by write endpoints.
///
/// Every field is optional; stores that answer with an empty 2xx body are
/// treated as successful.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub updated: Option<usize>,
}

/// Body of the CSRF token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_reads_type_field_and_optional_columns() {
        let asset: Asset = serde_json::from_str(
            r#"{"key":"logo_url","section":"Header","label":"Logo","type":"image"}"#,
        )
        .expect("asset parses");

        assert_eq!(asset.asset_type, AssetType::Image);
        assert_eq!(asset.description, None);
        assert_eq!(asset.value, None);
    }

    #[test]
    fn ui_config_map_keeps_null_values() {
        let map: UiConfigMap =
            serde_json::from_str(r#"{"greeting":"Hi","banner_title":null}"#).expect("map parses");

        assert_eq!(map.get("greeting"), Some(&Some("Hi".to_string())));
        assert_eq!(map.get("banner_title"), Some(&None));
    }

    #[test]
    fn save_response_tolerates_sparse_bodies() {
        let response: SaveResponse = serde_json::from_str("{}").expect("empty envelope parses");
        assert!(response.success.is_none());

        let response: SaveResponse =
            serde_json::from_str(r#"{"success":false,"message":"Unknown key"}"#)
                .expect("failure envelope parses");
        assert_eq!(response.success, Some(false));
        assert_eq!(response.message.as_deref(), Some("Unknown key"));
    }
}
