//! Arena configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ArenaError, ArenaResult};
use crate::generator::FanOutConfig;
use crate::sandbox::SandboxConfig;

/// Top-level configuration for an orchestrator.
///
/// Every field has a default, so a config file only needs the fields it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Rounds per run (at least 1).
    pub max_rounds: u32,
    /// Per-call generator timeout (milliseconds).
    pub generator_timeout_ms: u64,
    pub max_concurrent_generators: usize,
    /// Per-call challenger timeout (milliseconds).
    pub challenger_timeout_ms: u64,
    pub sandbox: SandboxConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            generator_timeout_ms: 60_000,
            max_concurrent_generators: 4,
            challenger_timeout_ms: 60_000,
            sandbox: SandboxConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: &Path) -> ArenaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ArenaResult<()> {
        if self.max_rounds == 0 {
            return Err(ArenaError::InvalidConfig(
                "max_rounds must be at least 1".into(),
            ));
        }
        if self.generator_timeout_ms == 0 {
            return Err(ArenaError::InvalidConfig(
                "generator_timeout_ms must be positive".into(),
            ));
        }
        if self.challenger_timeout_ms == 0 {
            return Err(ArenaError::InvalidConfig(
                "challenger_timeout_ms must be positive".into(),
            ));
        }
        if self.max_concurrent_generators == 0 {
            return Err(ArenaError::InvalidConfig(
                "max_concurrent_generators must be at least 1".into(),
            ));
        }
        self.sandbox
            .validate()
            .map_err(|e| ArenaError::InvalidConfig(e.to_string()))
    }

    pub fn fan_out(&self) -> FanOutConfig {
        FanOutConfig {
            max_concurrent: self.max_concurrent_generators,
            timeout: Duration::from_millis(self.generator_timeout_ms),
        }
    }

    pub fn challenger_timeout(&self) -> Duration {
        Duration::from_millis(self.challenger_timeout_ms)
    }
}
