//! Parser configuration.
//!
//! Both switches default to off. The CLI reads overrides from environment
//! variables prefixed with `SPECFILE_`; the library never reads the
//! environment on its own.

use std::env;

/// Enables multi-line steps.
pub const ALLOW_MULTILINE_STEP_ENV: &str = "SPECFILE_ALLOW_MULTILINE_STEP";
/// Enables scenario level data tables.
pub const ALLOW_SCENARIO_DATATABLE_ENV: &str = "SPECFILE_ALLOW_SCENARIO_DATATABLE";

/// Error produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}, expected 'true' or 'false'")]
    InvalidBool { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    /// A plain line directly below a step continues the step.
    pub allow_multiline_step: bool,
    /// A table inside a scenario (not following a step) becomes the
    /// scenario's own data table.
    pub allow_scenario_datatable: bool,
}

impl ParserConfig {
    /// Read overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to something other than a
    /// boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read overrides through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is not a boolean.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            allow_multiline_step: parse_bool(
                ALLOW_MULTILINE_STEP_ENV,
                lookup(ALLOW_MULTILINE_STEP_ENV),
                defaults.allow_multiline_step,
            )?,
            allow_scenario_datatable: parse_bool(
                ALLOW_SCENARIO_DATATABLE_ENV,
                lookup(ALLOW_SCENARIO_DATATABLE_ENV),
                defaults.allow_scenario_datatable,
            )?,
        })
    }
}

fn parse_bool(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value }),
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
    fn defaults_when_unset() {
        let config = ParserConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn reads_both_switches() {
        let config = ParserConfig::from_lookup(lookup(&[
            (ALLOW_MULTILINE_STEP_ENV, "TRUE"),
            (ALLOW_SCENARIO_DATATABLE_ENV, "true"),
        ]))
        .unwrap();
        assert!(config.allow_multiline_step);
        assert!(config.allow_scenario_datatable);
    }

    #[test]
    fn rejects_non_boolean() {
        let err = ParserConfig::from_lookup(lookup(&[(ALLOW_MULTILINE_STEP_ENV, "yes")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'yes' for SPECFILE_ALLOW_MULTILINE_STEP, expected 'true' or 'false'"
        );
    }
}
