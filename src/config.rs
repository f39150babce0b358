//! Loader configuration.
//!
//! This module provides the user-facing [`LoaderConfig`] (deserialized from
//! JSON with camelCase keys, so it can be passed straight from JavaScript) and
//! the [`LoaderSettings`] it resolves into once host capabilities are known.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HIDDEN_CLASS, DEFAULT_LOW_RES_CLASS, DEFAULT_THROTTLE_DELAY_MS};
use crate::visibility::VisibilityRule;

/// Log level setting for the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Recognized loader options. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Minimum spacing between visibility re-checks
    #[serde(default = "default_throttle_delay_ms")]
    pub throttle_delay_ms: u64,

    /// Install a click interceptor on swapped containers when the host
    /// cannot suppress pointer events through CSS
    #[serde(default = "default_suppress_clicks")]
    pub suppress_clicks_without_pointer_events: bool,

    /// Class marking low-resolution placeholders
    #[serde(default = "default_low_res_class")]
    pub low_res_class: String,

    /// Class given to a placeholder once superseded
    #[serde(default = "default_hidden_class")]
    pub hidden_class: String,

    /// Predicate used to decide whether a candidate is in view
    #[serde(default)]
    pub visibility: VisibilityRule,

    /// Extra distance around the viewport that still counts as visible
    #[serde(default)]
    pub preload_margin: f64,

    /// Also re-check when the viewport is resized
    #[serde(default = "default_check_on_resize")]
    pub check_on_resize: bool,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_throttle_delay_ms() -> u64 {
    DEFAULT_THROTTLE_DELAY_MS
}

fn default_suppress_clicks() -> bool {
    true
}

fn default_low_res_class() -> String {
    DEFAULT_LOW_RES_CLASS.to_string()
}

fn default_hidden_class() -> String {
    DEFAULT_HIDDEN_CLASS.to_string()
}

fn default_check_on_resize() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            throttle_delay_ms: default_throttle_delay_ms(),
            suppress_clicks_without_pointer_events: default_suppress_clicks(),
            low_res_class: default_low_res_class(),
            hidden_class: default_hidden_class(),
            visibility: VisibilityRule::default(),
            preload_margin: 0.0,
            check_on_resize: default_check_on_resize(),
            log_level: LogLevel::default(),
        }
    }
}

impl LoaderConfig {
    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.preload_margin.is_finite() || self.preload_margin < 0.0 {
            return Err(ConfigError::InvalidMargin(self.preload_margin));
        }
        Ok(())
    }

    /// Throttle delay as a Duration.
    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_delay_ms)
    }
}

/// Host capabilities, detected once when the loader is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The host can disable clicks on the placeholder via `pointer-events`
    pub pointer_events: bool,
}

/// Configuration resolved against detected capabilities.
///
/// Nothing here is re-checked after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSettings {
    /// Delay between a scroll event and the check it schedules
    pub throttle_delay: Duration,
    /// Whether swapped containers get a click interceptor
    pub install_click_shim: bool,
    /// Visibility predicate
    pub visibility: VisibilityRule,
    /// Margin added to both ends of the viewport window
    pub preload_margin: f64,
    /// Class marking low-resolution placeholders
    pub low_res_class: String,
    /// Class given to a placeholder once superseded
    pub hidden_class: String,
}

impl LoaderSettings {
    /// Resolve a config against the capabilities of the current host.
    pub fn resolve(config: &LoaderConfig, capabilities: Capabilities) -> Self {
        Self {
            throttle_delay: config.throttle_delay(),
            install_click_shim: config.suppress_clicks_without_pointer_events
                && !capabilities.pointer_events,
            visibility: config.visibility,
            // Invalid margins are rejected by `validate`; clamp for configs built in code
            preload_margin: if config.preload_margin.is_finite() {
                config.preload_margin.max(0.0)
            } else {
                0.0
            },
            low_res_class: config.low_res_class.clone(),
            hidden_class: config.hidden_class.clone(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Margin must be a finite, non-negative distance
    #[error("Invalid preload margin {0}: must be finite and non-negative")]
    InvalidMargin(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.throttle_delay_ms, 300);
        assert!(config.suppress_clicks_without_pointer_events);
        assert_eq!(config.low_res_class, "lazy--low");
        assert_eq!(config.hidden_class, "lazy--hide");
        assert_eq!(config.visibility, VisibilityRule::Endpoint);
        assert_eq!(config.preload_margin, 0.0);
        assert!(config.check_on_resize);
        assert_eq!(config.throttle_delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = LoaderConfig::from_json("{}").unwrap();
        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn test_camel_case_keys() {
        let json = r#"{
            "throttleDelayMs": 50,
            "suppressClicksWithoutPointerEvents": false,
            "visibility": "overlap",
            "preloadMargin": 200.0,
            "logLevel": "debug"
        }"#;
        let config = LoaderConfig::from_json(json).unwrap();
        assert_eq!(config.throttle_delay_ms, 50);
        assert!(!config.suppress_clicks_without_pointer_events);
        assert_eq!(config.visibility, VisibilityRule::Overlap);
        assert_eq!(config.preload_margin, 200.0);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.low_res_class, "lazy--low");
    }

    #[test]
    fn test_json_roundtrip_preserves_values() {
        let config = LoaderConfig {
            throttle_delay_ms: 120,
            hidden_class: "faded".to_string(),
            ..LoaderConfig::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"hiddenClass\""));
        assert_eq!(LoaderConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_negative_margin_rejected() {
        let result = LoaderConfig::from_json(r#"{"preloadMargin": -5}"#);
        assert!(matches!(result, Err(ConfigError::InvalidMargin(m)) if m == -5.0));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            LoaderConfig::from_json("{ throttle"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_click_shim_resolution() {
        let config = LoaderConfig::default();
        let without = Capabilities {
            pointer_events: false,
        };
        let with = Capabilities {
            pointer_events: true,
        };

        assert!(LoaderSettings::resolve(&config, without).install_click_shim);
        assert!(!LoaderSettings::resolve(&config, with).install_click_shim);

        let disabled = LoaderConfig {
            suppress_clicks_without_pointer_events: false,
            ..LoaderConfig::default()
        };
        assert!(!LoaderSettings::resolve(&disabled, without).install_click_shim);
    }

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
