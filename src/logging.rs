//! Structured logging setup.
//!
//! walletmux emits `tracing` events; embedding hosts usually install their own
//! subscriber. Hosts without one (CLIs, tests, demos) can call
//! [`init_logging`] once at startup.
//!
//! # Fields
//!
//! - `request_id`: add-flow correlation id
//! - `method`: dispatched call name
//! - `code`: wire error code of a failed call

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGING_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level filter (trace, debug, info, warn, error); `RUST_LOG` overrides it
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Installs the global subscriber.
///
/// Only the first call has an effect. The result of that first call is
/// cached and returned on every call: `true` if this function installed the
/// subscriber, `false` if the host had already installed one.
pub fn init_logging(config: &LogConfig) -> bool {
    *LOGGING_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));

        let installed = match config.format {
            LogFormat::Pretty => fmt().with_env_filter(filter).with_target(false).try_init(),
            LogFormat::Json => fmt().json().with_env_filter(filter).try_init(),
        };
        installed.is_ok()
    })
}
