use std::sync::Arc;

use sator_core::clock::{system_clock, Clock};
use sator_core::errors::SatorError;
use sator_core::SatorConfig;

/// Options for building a [`crate::SatorEngine`].
#[derive(Default, Clone)]
pub struct EngineOptions {
    /// TOML configuration. Takes precedence over `config`.
    pub config_toml: Option<String>,
    pub config: Option<SatorConfig>,
    /// Wall clock shared by every subsystem. Defaults to the system clock.
    pub clock: Option<Arc<dyn Clock>>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toml(mut self, toml: impl Into<String>) -> Self {
        self.config_toml = Some(toml.into());
        self
    }

    pub fn with_config(mut self, config: SatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Resolve the effective configuration, validating it either way.
    pub(crate) fn resolve_config(&self) -> Result<SatorConfig, SatorError> {
        match (&self.config_toml, &self.config) {
            (Some(toml), _) => Ok(SatorConfig::from_toml(toml)?),
            (None, Some(config)) => {
                config.validate()?;
                Ok(config.clone())
            }
            (None, None) => Ok(SatorConfig::default()),
        }
    }

    pub(crate) fn resolve_clock(&self) -> Arc<dyn Clock> {
        self.clock.clone().unwrap_or_else(system_clock)
    }
}
