//! Tracing setup: structured logging, span definitions and event helpers.

pub mod events;
pub mod spans;

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sator_core::config::ObservabilityConfig;

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "SATOR_LOG";

static INIT: Once = Once::new();

/// Initialize the subscriber with JSON output and the default filter.
///
/// Reads `SATOR_LOG`, e.g. `SATOR_LOG=sator_decision=debug,sator_anchor=warn`.
/// Idempotent: only the first call in a process installs a subscriber.
pub fn init_tracing() {
    init_tracing_with_config(&ObservabilityConfig::default());
}

/// Initialize from the `[observability]` config section. `SATOR_LOG` still
/// takes precedence over `log_filter`.
pub fn init_tracing_with_config(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
        let registry = tracing_subscriber::registry().with(filter);
        let installed = if config.json {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .try_init()
        };
        if installed.is_err() {
            tracing::debug!("global subscriber already set; keeping it");
        }
    });
}

/// Initialize with an explicit filter string, ignoring `SATOR_LOG`.
/// For tests and embedding hosts; a no-op once any subscriber is installed.
pub fn init_tracing_with_filter(filter: &str) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_target(true)
            .with_test_writer()
            .try_init();
    });
}
