// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapping rules from controller UUIDs to metric identities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name used when an item does not declare one.
pub const DEFAULT_FIELD: &str = "value";

/// Tag set attached to a metric point.
pub type Tags = BTreeMap<String, String>;

/// A single mapping rule: which controller UUID is recorded where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Destination bucket. Emitted as the `bucket` tag when non-empty.
    #[serde(rename = "bucket", default)]
    pub destination: String,

    /// Measurement name.
    #[serde(rename = "measurement")]
    pub metric_name: String,

    /// Controller UUID of the value to record.
    #[serde(rename = "uuid")]
    pub source_id: String,

    /// Field name. Empty means [`DEFAULT_FIELD`].
    #[serde(rename = "field", default, skip_serializing_if = "String::is_empty")]
    pub field_name: String,

    /// Additional tags.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,

    /// Carried over from the mapping document, not acted on.
    #[serde(skip)]
    pub critical: bool,
}

impl Item {
    /// Create an item with no field name and no tags.
    pub fn new(
        destination: impl Into<String>,
        metric_name: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            metric_name: metric_name.into(),
            source_id: source_id.into(),
            field_name: String::new(),
            tags: Tags::new(),
            critical: false,
        }
    }

    /// Set the field name.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Field name with the default applied.
    pub fn effective_field(&self) -> &str {
        if self.field_name.is_empty() {
            DEFAULT_FIELD
        } else {
            &self.field_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_builder() {
        let item = Item::new("home", "temp", "abc")
            .field("celsius")
            .tag("room", "kitchen");

        assert_eq!(item.destination, "home");
        assert_eq!(item.metric_name, "temp");
        assert_eq!(item.source_id, "abc");
        assert_eq!(item.field_name, "celsius");
        assert_eq!(item.tags.get("room").map(String::as_str), Some("kitchen"));
        assert!(!item.critical);
    }

    #[test]
    fn test_effective_field_defaults_to_value() {
        let item = Item::new("home", "temp", "abc");
        assert_eq!(item.effective_field(), "value");
        assert!(item.field_name.is_empty());

        let item = item.field("power");
        assert_eq!(item.effective_field(), "power");
    }

    #[test]
    fn test_item_deserialize_config_keys() {
        let item: Item = toml::from_str(
            r#"
bucket = "loxone"
measurement = "energy"
uuid = "122c6fd0-0056-abde-ffff796b564594c0"

[tags]
room = "garage"
"#,
        )
        .expect("parse item");

        assert_eq!(item.destination, "loxone");
        assert_eq!(item.metric_name, "energy");
        assert_eq!(item.source_id, "122c6fd0-0056-abde-ffff796b564594c0");
        assert!(item.field_name.is_empty());
        assert_eq!(item.tags.len(), 1);
    }
}
