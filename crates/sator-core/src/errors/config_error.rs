use super::error_code::{self, SatorErrorCode};

/// Configuration loading and validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {message}")]
    Parse { message: String },

    #[error("invalid config value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("failed to snapshot config: {message}")]
    Snapshot { message: String },
}

impl SatorErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
