//! Task configuration
//!
//! The phase name and logging verbosity come from a TOML document and can be
//! overridden from the environment, the way streaming task launchers pass
//! settings to a worker process.

use crate::error::{ErrorCode, TaskError};
use crate::phase::{resolve_phase, Phase};
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`TaskConfig::phase`]
pub const PHASE_ENV: &str = "SPINDLE_PHASE";
/// Environment variable overriding [`TaskConfig::verbose`]
pub const VERBOSE_ENV: &str = "SPINDLE_VERBOSE";

/// Task configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskConfig {
    /// Phase name, resolved with [`resolve_phase`]
    pub phase: Option<String>,
    /// Verbosity level for logging
    pub verbose: u8,
}

impl TaskConfig {
    /// Create a configuration for the given phase name
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: Some(phase.into()),
            verbose: 0,
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, TaskError> {
        toml::from_str(text).map_err(|e| {
            TaskError::config_with_code(ErrorCode::CONFIG_PARSE_ERROR, "Invalid task configuration")
                .with_source(e)
        })
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self, TaskError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, TaskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(phase) = lookup(PHASE_ENV) {
            self.phase = Some(phase);
        }
        if let Some(verbose) = lookup(VERBOSE_ENV) {
            self.verbose = verbose.trim().parse().map_err(|e| {
                TaskError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("{} must be a small integer, got '{}'", VERBOSE_ENV, verbose),
                )
                .with_source(e)
            })?;
        }
        Ok(self)
    }

    /// Set the verbosity level
    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve the configured phase. An absent phase is a missing phase.
    pub fn phase(&self) -> Result<Phase, TaskError> {
        resolve_phase(self.phase.as_deref().unwrap_or(""))
    }

    /// Get the log filter based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
