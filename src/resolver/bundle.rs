//! Resolved configuration returned to clients

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One source file's contribution to a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"name": "billing-prod.yml", "rank": 0, "source": {"a": "2"}}))]
pub struct ConfigLayer {
    /// Repository path of the file
    pub name: String,
    /// 0 = application+profile, 1 = application, 2 = profile, 3 = default
    pub rank: u8,
    /// Flattened properties in document order
    #[schema(value_type = std::collections::HashMap<String, String>)]
    pub source: IndexMap<String, String>,
}

/// Ordered layers for one request, highest precedence first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigBundle {
    #[schema(example = "billing")]
    pub name: String,
    #[schema(example = json!(["prod"]))]
    pub profiles: Vec<String>,
    #[schema(example = "main")]
    pub label: String,
    /// Commit id the label resolved to
    pub version: Option<String>,
    /// Served from the last good snapshot because the source failed
    pub stale: bool,
    pub property_sources: Vec<ConfigLayer>,
}

impl ConfigBundle {
    /// Effective value of `key`: the first layer that has it wins
    pub fn get(&self, key: &str) -> Option<&str> {
        self.property_sources
            .iter()
            .find_map(|layer| layer.source.get(key))
            .map(String::as_str)
    }

    /// All effective properties. Keys appear in the order of the layer that
    /// supplies them, highest precedence layer first.
    pub fn merged(&self) -> IndexMap<String, String> {
        let mut merged = IndexMap::new();
        for layer in &self.property_sources {
            for (key, value) in &layer.source {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }
}
