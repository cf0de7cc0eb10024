//! Graph Configuration
//!
//! Feature toggles for the evaluation graph are passed in explicitly rather
//! than read from process-wide state.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for an [`EvaluationGraph`](crate::EvaluationGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Whether the graph schedules evaluations at all.
    ///
    /// A disabled graph never builds: marks and flushes do nothing and no
    /// sorted order is available, so the owner uses its own ordering.
    pub enabled: bool,

    /// Log the sorted graph as JSON after every rebuild.
    pub debug_dump: bool,
}

impl GraphConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A configuration with the graph switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug_dump: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_enabled_without_dump() {
        let config = GraphConfig::default();
        assert!(config.enabled);
        assert!(!config.debug_dump);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = GraphConfig::from_json(r#"{ "debug_dump": true }"#).unwrap();
        assert!(config.enabled);
        assert!(config.debug_dump);

        let config = GraphConfig::from_json("{}").unwrap();
        assert_eq!(config, GraphConfig::default());
    }

    #[test]
    fn disabled_config() {
        let config = GraphConfig::from_json(r#"{ "enabled": false }"#).unwrap();
        assert_eq!(config, GraphConfig::disabled());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = GraphConfig::from_json(r#"{ "enabled": "yes" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid graph configuration"));
    }
}
