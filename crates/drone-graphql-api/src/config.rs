//! # API Configuration
//!
//! Environment-based configuration for the GraphQL API service.
//!
//! Malformed values never abort startup: the default is used and a warning
//! is recorded in [`Config::warnings`] for the caller to log once tracing
//! is up.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use drone_dispatch::{DispatchConfig, SelectionPolicy, config::DEFAULT_EVENT_CAPACITY};

const DEFAULT_PORT: u16 = 8080;

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Enable GraphQL Playground
    pub enable_playground: bool,

    /// Maximum query depth
    pub max_query_depth: usize,

    /// Maximum query complexity
    pub max_query_complexity: usize,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,

    /// Drone ranking used by automatic dispatch
    pub selection_policy: SelectionPolicy,

    /// Fleet event buffer per subscriber
    pub event_capacity: usize,

    /// Problems found while reading the environment
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut warnings = Vec::new();

        let server_addr = parse_or(&lookup, "SERVER_ADDR", &mut warnings)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        Self {
            server_addr,

            enable_playground: lookup("ENABLE_PLAYGROUND").is_none_or(|v| v == "true" || v == "1"),

            max_query_depth: parse_or(&lookup, "MAX_QUERY_DEPTH", &mut warnings).unwrap_or(10),

            max_query_complexity: parse_or(&lookup, "MAX_QUERY_COMPLEXITY", &mut warnings)
                .unwrap_or(1000),

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            selection_policy: parse_or(&lookup, "SELECTION_POLICY", &mut warnings)
                .unwrap_or_default(),

            event_capacity: parse_or(&lookup, "EVENT_CHANNEL_CAPACITY", &mut warnings)
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_EVENT_CAPACITY),

            warnings,
        }
    }

    /// Engine settings derived from this configuration
    #[must_use]
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            policy: self.selection_policy,
            event_capacity: self.event_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warnings.push(format!("ignoring invalid {key}={raw:?}, using default"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_addr.to_string(), "0.0.0.0:8080");
        assert!(config.enable_playground);
        assert_eq!(config.max_query_depth, 10);
        assert_eq!(config.selection_policy, SelectionPolicy::MinDeliveryTime);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("ENABLE_PLAYGROUND", "false"),
            ("SELECTION_POLICY", "efficiency_score"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ]));
        assert_eq!(config.server_addr.port(), 9000);
        assert!(!config.enable_playground);
        assert_eq!(config.dispatch_config().policy, SelectionPolicy::EfficiencyScore);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_invalid_values_fall_back_with_warning() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_ADDR", "not-an-addr"),
            ("SELECTION_POLICY", "fastest"),
            ("MAX_QUERY_DEPTH", "-3"),
        ]));
        assert_eq!(config.server_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.selection_policy, SelectionPolicy::default());
        assert_eq!(config.max_query_depth, 10);
        assert_eq!(config.warnings.len(), 3);
    }
}
