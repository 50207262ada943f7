// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge configuration.
//!
//! ```toml
//! url = "192.168.1.253"
//! user = "user"
//! key = "pass"
//! jsonconfig = "/etc/loxone/mappings.json"
//!
//! [[item]]
//! bucket = "loxone"
//! measurement = "measurement"
//! uuid = "122c6fd0-0056-abde-ffff796b564594c0"
//!
//! [item.tags]
//! room = "roomname"
//! ```

use crate::item::Item;
use crate::source::ConnectOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Miniserver address.
    #[serde(rename = "url")]
    pub host: String,

    /// User name.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(rename = "key", default)]
    pub secret: String,

    /// Optional JSON point-mapping document.
    #[serde(rename = "jsonconfig", default, skip_serializing_if = "Option::is_none")]
    pub mapping_path: Option<PathBuf>,

    /// Collector interval used by the CLI (seconds).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Session keep-alive interval (seconds).
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// How long `stop` waits for the bridge task (seconds).
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// Directly declared items. Checked before mapping-document items.
    #[serde(rename = "item", default)]
    pub items: Vec<Item>,
}

fn default_interval() -> u64 {
    10
}

fn default_keep_alive() -> u64 {
    30
}

fn default_stop_timeout() -> u64 {
    5
}

impl BridgeConfig {
    /// Create a configuration with defaults and no items.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: String::new(),
            secret: String::new(),
            mapping_path: None,
            interval_secs: default_interval(),
            keep_alive_secs: default_keep_alive(),
            stop_timeout_secs: default_stop_timeout(),
            items: Vec::new(),
        }
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Example configuration written by `gen-config`.
    pub fn sample() -> Self {
        Self {
            user: "user".into(),
            secret: "pass".into(),
            mapping_path: Some(PathBuf::from("mappings.json")),
            items: vec![Item::new(
                "loxone",
                "measurement",
                "122c6fd0-0056-abde-ffff796b564594c0",
            )
            .tag("room", "roomname")],
            ..Self::new("192.168.1.253")
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("url must not be empty".into()));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be positive".into()));
        }

        for (i, item) in self.items.iter().enumerate() {
            if item.source_id.is_empty() {
                return Err(ConfigError::Invalid(format!("Item {} has empty uuid", i)));
            }
            if item.metric_name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Item {} ({}) has empty measurement",
                    i, item.source_id
                )));
            }
        }

        Ok(())
    }

    /// Session options for the event source.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions::new(&self.host, &self.user, &self.secret)
            .keep_alive(Duration::from_secs(self.keep_alive_secs))
    }

    /// Collector interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Bound on the wait for the bridge task during `stop`.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
url = "192.168.1.253"
"#;

    const FULL_TOML: &str = r#"
url = "192.168.1.253"
user = "admin"
key = "secret"
jsonconfig = "/etc/loxone/mappings.json"
interval_secs = 5
keep_alive_secs = 15

[[item]]
bucket = "loxone"
measurement = "temperature"
uuid = "122c6fd0-0056-abde-ffff796b564594c0"

[item.tags]
room = "kitchen"

[[item]]
bucket = "loxone"
measurement = "energy"
uuid = "0f1e2d3c-0000-1111-ffff000000000000"
field = "watts"
"#;

    #[test]
    fn test_config_parse_minimal() {
        let config = BridgeConfig::from_toml(MINIMAL_TOML).expect("parse minimal toml");

        assert_eq!(config.host, "192.168.1.253");
        assert!(config.user.is_empty());
        assert!(config.secret.is_empty());
        assert!(config.mapping_path.is_none());
        assert!(config.items.is_empty());
        assert_eq!(config.interval_secs, 10);
        assert_eq!(config.keep_alive_secs, 30);
        assert_eq!(config.stop_timeout_secs, 5);
    }

    #[test]
    fn test_config_parse_all_fields() {
        let config = BridgeConfig::from_toml(FULL_TOML).expect("parse full toml");

        assert_eq!(config.user, "admin");
        assert_eq!(config.secret, "secret");
        assert_eq!(
            config.mapping_path,
            Some(PathBuf::from("/etc/loxone/mappings.json"))
        );
        assert_eq!(config.interval(), Duration::from_secs(5));

        assert_eq!(config.items.len(), 2);
        assert_eq!(config.items[0].metric_name, "temperature");
        assert_eq!(
            config.items[0].tags.get("room").map(String::as_str),
            Some("kitchen")
        );
        assert!(config.items[0].field_name.is_empty());
        assert_eq!(config.items[1].field_name, "watts");

        let opts = config.connect_options();
        assert_eq!(opts.host, "192.168.1.253");
        assert_eq!(opts.user, "admin");
        assert_eq!(opts.keep_alive, Duration::from_secs(15));
        assert!(opts.auto_reconnect);
        assert!(opts.register_events);
    }

    #[test]
    fn test_config_validation() {
        assert!(BridgeConfig::from_toml(r#"url = """#).is_err());

        let mut config = BridgeConfig::new("host");
        assert!(config.validate().is_ok());

        config.items.push(Item::new("b", "m", ""));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.items[0] = Item::new("b", "", "uuid");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.items[0] = Item::new("b", "m", "uuid");
        config.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_missing_url() {
        let result = BridgeConfig::from_toml("user = \"admin\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_sample_roundtrips() {
        let toml_str = BridgeConfig::sample().to_toml().expect("serialize");
        assert!(toml_str.contains("url = \"192.168.1.253\""));
        assert!(toml_str.contains("[[item]]"));

        let parsed = BridgeConfig::from_toml(&toml_str).expect("parse sample");
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].tags.len(), 1);
        assert_eq!(parsed.mapping_path, Some(PathBuf::from("mappings.json")));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, FULL_TOML).expect("write");

        let config = BridgeConfig::from_file(&path).expect("load");
        assert_eq!(config.items.len(), 2);

        assert!(matches!(
            BridgeConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
