//! Agent configuration
//!
//! Configuration is an explicit object constructed once at process start and
//! passed to dependents. Nothing here is global, and nothing else in the
//! crate reads the environment.

use thiserror::Error;

/// Default model when `MODEL_NAME` is unset
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default cap on model/tool round-trips per turn
pub const DEFAULT_MAX_ROUNDS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "ANTHROPIC_API_KEY not found. Set it in your .env file or environment variables."
    )]
    MissingApiKey,

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Validated settings for the agent
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the model service
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum model/tool round-trips before `respond` gives up
    pub max_rounds: usize,
    /// Whether to log at debug level by default
    pub verbose: bool,
}

impl Config {
    /// Build a configuration from the process environment
    ///
    /// Fails fast with a descriptive error when the credential is absent or
    /// a numeric setting is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = get("ANTHROPIC_API_KEY")
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let model = get("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = match get("TEMPERATURE") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "TEMPERATURE",
                value: raw,
            })?,
            None => DEFAULT_TEMPERATURE,
        };

        let max_rounds = match get("MAX_ROUNDS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "MAX_ROUNDS",
                value: raw,
            })?,
            None => DEFAULT_MAX_ROUNDS,
        };

        let verbose = match get("VERBOSE") {
            Some(raw) => raw.eq_ignore_ascii_case("true"),
            None => true,
        };

        Ok(Self {
            api_key,
            model,
            temperature,
            max_rounds,
            verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.max_rounds, DEFAULT_MAX_ROUNDS);
        assert!(config.verbose);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("MODEL_NAME", "claude-haiku-4"),
            ("TEMPERATURE", "0.2"),
            ("MAX_ROUNDS", "3"),
            ("VERBOSE", "false"),
        ]))
        .unwrap();
        assert_eq!(config.model, "claude-haiku-4");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_rounds, 3);
        assert!(!config.verbose);
    }

    #[test]
    fn test_malformed_numeric_is_an_error() {
        let err = Config::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("MAX_ROUNDS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_ROUNDS", .. }));
    }
}
