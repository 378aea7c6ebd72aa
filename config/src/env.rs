//! Typed access to environment variables.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use crate::ConfigError;

/// Where variable values come from.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Accessor for tunables read from the environment.
///
/// The `get_*` methods fall back to the default when a variable is unset or
/// empty; a value that does not parse also falls back, with a warning. The
/// `require_*` methods fail instead.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig<S = ProcessEnv> {
    source: S,
}

impl EnvConfig<ProcessEnv> {
    #[must_use]
    pub fn from_process() -> Self {
        Self::default()
    }
}

impl<S: EnvSource> EnvConfig<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.source.var(name).filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn get_env_var(&self, name: &str, default: &str) -> String {
        self.lookup(name).unwrap_or_else(|| default.to_string())
    }

    #[must_use]
    pub fn get_env_int_var(&self, name: &str, default: i64) -> i64 {
        self.parsed(name, default, "an integer")
    }

    #[must_use]
    pub fn get_env_float_var(&self, name: &str, default: f64) -> f64 {
        self.parsed(name, default, "a number")
    }

    pub fn require_env_var(&self, name: &str) -> Result<String, ConfigError> {
        self.lookup(name).ok_or_else(|| ConfigError::MissingEnvVar {
            name: name.to_string(),
        })
    }

    pub fn require_env_int_var(&self, name: &str) -> Result<i64, ConfigError> {
        let value = self.require_env_var(name)?;
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: name.to_string(),
                value,
                expected: "an integer",
            })
    }

    /// [`EnvConfig::require_env_int_var`] with unset reported as `Ok(None)`.
    pub fn optional_env_int_var(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        match self.require_env_int_var(name) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::MissingEnvVar { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    fn parsed<T: FromStr>(&self, name: &str, default: T, expected: &str) -> T {
        let Some(value) = self.lookup(name) else {
            return default;
        };
        match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(name, value = %value, "environment variable is not {expected}; using default");
                default
            }
        }
    }
}
