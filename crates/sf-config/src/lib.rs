//! Engine configuration.
//!
//! Every option has a default, so a partial JSON object or an empty
//! environment yields a usable config. Call `validate()` before handing the
//! config to the engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_THRESHOLD: f64 = 100.0;
pub const DEFAULT_WHEEL_SENSITIVITY: f64 = 1.0;
pub const DEFAULT_DIRECTION_EPSILON: f64 = 3.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{name} has invalid value {value:?}")]
    Env { name: &'static str, value: String },
    #[error("threshold must be a finite, non-negative number (got {0})")]
    Threshold(f64),
    #[error("wheelSensitivity must be a finite, positive number (got {0})")]
    WheelSensitivity(f64),
    #[error("directionEpsilon must be a finite, non-negative number (got {0})")]
    DirectionEpsilon(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Pixels scrolled before hiding the header is considered.
    pub threshold: f64,
    /// Multiplier applied to wheel deltas in fallback mode.
    pub wheel_sensitivity: f64,
    pub use_wheel_fallback: bool,
    /// Record and log samples from both signal sources.
    pub debug: bool,
    /// Deltas within this band are treated as jitter.
    pub direction_epsilon: f64,
    pub mutation_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            wheel_sensitivity: DEFAULT_WHEEL_SENSITIVITY,
            use_wheel_fallback: false,
            debug: false,
            direction_epsilon: DEFAULT_DIRECTION_EPSILON,
            mutation_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `SF_*` variables from the process environment over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, with the variable source injected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("SF_THRESHOLD") {
            config.threshold = parse_env("SF_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("SF_WHEEL_SENSITIVITY") {
            config.wheel_sensitivity = parse_env("SF_WHEEL_SENSITIVITY", &value)?;
        }
        if let Some(value) = lookup("SF_USE_WHEEL_FALLBACK") {
            config.use_wheel_fallback = parse_flag("SF_USE_WHEEL_FALLBACK", &value)?;
        }
        if let Some(value) = lookup("SF_DEBUG") {
            config.debug = parse_flag("SF_DEBUG", &value)?;
        }
        if let Some(value) = lookup("SF_DIRECTION_EPSILON") {
            config.direction_epsilon = parse_env("SF_DIRECTION_EPSILON", &value)?;
        }
        if let Some(value) = lookup("SF_MUTATION_TIMEOUT_MS") {
            config.mutation_timeout_ms = Some(parse_env("SF_MUTATION_TIMEOUT_MS", &value)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if !self.wheel_sensitivity.is_finite() || self.wheel_sensitivity <= 0.0 {
            return Err(ConfigError::WheelSensitivity(self.wheel_sensitivity));
        }
        if !self.direction_epsilon.is_finite() || self.direction_epsilon < 0.0 {
            return Err(ConfigError::DirectionEpsilon(self.direction_epsilon));
        }
        Ok(())
    }

    pub fn mutation_timeout(&self) -> Option<Duration> {
        self.mutation_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::Env {
        name,
        value: value.to_owned(),
    })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Env {
            name,
            value: value.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"threshold": 20, "useWheelFallback": true}"#).unwrap();
        assert_eq!(config.threshold, 20.0);
        assert!(config.use_wheel_fallback);
        assert_eq!(config.wheel_sensitivity, DEFAULT_WHEEL_SENSITIVITY);
        assert_eq!(config.direction_epsilon, DEFAULT_DIRECTION_EPSILON);
        assert!(!config.debug);
        assert_eq!(config.mutation_timeout(), None);
    }

    #[test]
    fn json_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"wheelSensitivity": 0}"#),
            Err(ConfigError::WheelSensitivity(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"threshold": -1}"#),
            Err(ConfigError::Threshold(_))
        ));
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SF_THRESHOLD", "64"),
            ("SF_WHEEL_SENSITIVITY", "0.5"),
            ("SF_USE_WHEEL_FALLBACK", "yes"),
            ("SF_DEBUG", "1"),
            ("SF_MUTATION_TIMEOUT_MS", "2500"),
        ]);
        let config = EngineConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();

        assert_eq!(config.threshold, 64.0);
        assert_eq!(config.wheel_sensitivity, 0.5);
        assert!(config.use_wheel_fallback);
        assert!(config.debug);
        assert_eq!(config.mutation_timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn env_reports_the_offending_variable() {
        let err = EngineConfig::from_lookup(|name| (name == "SF_DEBUG").then(|| "maybe".to_owned()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: "SF_DEBUG", .. }));
    }
}
