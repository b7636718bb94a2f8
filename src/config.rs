//! Configuration types for backend initialization.

use crate::{Result, WalletError};
use std::collections::HashMap;
use std::time::Duration;

/// Request code used to correlate the Google Wallet save activity result.
pub const DEFAULT_SAVE_REQUEST_CODE: i32 = 1001;

/// Platform wallet identifier.
///
/// Each variant corresponds to a specific wallet backend implementation.
/// Backends must be enabled via Cargo feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformType {
    /// In-memory wallet for tests and demos
    Mock,
    /// Apple Wallet through PassKit
    PassKit,
    /// Google Wallet through the Google Pay services client
    GoogleWallet,
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mock => write!(f, "mock"),
            Self::PassKit => write!(f, "passkit"),
            Self::GoogleWallet => write!(f, "google"),
        }
    }
}

impl std::str::FromStr for PlatformType {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "passkit" | "ios" | "apple" => Ok(Self::PassKit),
            "google" | "googlewallet" | "android" => Ok(Self::GoogleWallet),
            _ => Err(WalletError::InvalidArgument(format!(
                "unknown platform: {} (valid options: mock, passkit, google)",
                s
            ))),
        }
    }
}

/// Google Wallet API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GoogleEnvironment {
    /// Live wallet
    #[default]
    Production,
    /// Sandbox wallet for issuer testing
    Test,
}

impl std::fmt::Display for GoogleEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Configuration for creating a backend.
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use walletmux::{Config, PlatformType, GoogleEnvironment};
/// use std::time::Duration;
///
/// let config = Config::new(PlatformType::GoogleWallet)
///     .with_google_environment(GoogleEnvironment::Test)
///     .with_download_timeout(Duration::from_secs(10))
///     .with_option("issuer_id", "3388000000012345678");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Wallet platform
    pub platform: PlatformType,

    /// Timeout for a single pass download (default: 30 seconds)
    pub download_timeout: Duration,

    /// User agent sent when downloading passes
    pub user_agent: String,

    /// Google-specific: API environment (default: production)
    pub google_environment: GoogleEnvironment,

    /// Google-specific: request code of the save activity
    pub request_code: i32,

    /// Backend-specific options
    pub options: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: PlatformType::Mock,
            download_timeout: Duration::from_secs(30),
            user_agent: concat!("walletmux/", env!("CARGO_PKG_VERSION")).to_string(),
            google_environment: GoogleEnvironment::default(),
            request_code: DEFAULT_SAVE_REQUEST_CODE,
            options: HashMap::new(),
        }
    }
}

impl Config {
    /// Creates a new configuration for the specified platform.
    ///
    /// # Example
    ///
    /// ```
    /// use walletmux::{Config, PlatformType};
    ///
    /// let config = Config::new(PlatformType::PassKit);
    /// assert_eq!(config.platform, PlatformType::PassKit);
    /// ```
    pub fn new(platform: PlatformType) -> Self {
        Self {
            platform,
            ..Default::default()
        }
    }

    /// Builds a configuration from `WALLETMUX_*` environment variables.
    ///
    /// - `WALLETMUX_PLATFORM`: `mock`, `passkit`/`ios`, `google`/`android` (default: mock)
    /// - `WALLETMUX_DOWNLOAD_TIMEOUT_SECS`: download timeout in seconds
    /// - `WALLETMUX_GOOGLE_ENVIRONMENT`: `production` or `test`
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidArgument`] for unparseable values.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let platform = match lookup("WALLETMUX_PLATFORM") {
            Some(value) => value.parse()?,
            None => PlatformType::Mock,
        };
        let mut config = Config::new(platform);

        if let Some(secs) = lookup("WALLETMUX_DOWNLOAD_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                WalletError::InvalidArgument(format!(
                    "WALLETMUX_DOWNLOAD_TIMEOUT_SECS must be a whole number of seconds, got {}",
                    secs
                ))
            })?;
            config = config.with_download_timeout(Duration::from_secs(secs));
        }

        if let Some(env) = lookup("WALLETMUX_GOOGLE_ENVIRONMENT") {
            let env = match env.to_lowercase().as_str() {
                "production" | "prod" => GoogleEnvironment::Production,
                "test" | "sandbox" => GoogleEnvironment::Test,
                other => {
                    return Err(WalletError::InvalidArgument(format!(
                        "unknown Google Wallet environment: {}",
                        other
                    )))
                }
            };
            config = config.with_google_environment(env);
        }

        Ok(config)
    }

    /// Sets the timeout applied to a single pass download.
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Sets the user agent sent with pass downloads.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the Google Wallet environment (Google backend only).
    pub fn with_google_environment(mut self, environment: GoogleEnvironment) -> Self {
        self.google_environment = environment;
        self
    }

    /// Sets the request code used for the save activity (Google backend only).
    ///
    /// Activity results carrying any other request code are ignored.
    pub fn with_request_code(mut self, request_code: i32) -> Self {
        self.request_code = request_code;
        self
    }

    /// Adds a backend-specific option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Gets a backend-specific option value.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = Config::new(PlatformType::GoogleWallet)
            .with_google_environment(GoogleEnvironment::Test)
            .with_request_code(42)
            .with_option("issuer_id", "3388")
            .with_download_timeout(Duration::from_secs(5));

        assert_eq!(config.platform, PlatformType::GoogleWallet);
        assert_eq!(config.google_environment, GoogleEnvironment::Test);
        assert_eq!(config.request_code, 42);
        assert_eq!(config.get_option("issuer_id"), Some(&"3388".to_string()));
        assert_eq!(config.download_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_platform_type_display() {
        assert_eq!(PlatformType::Mock.to_string(), "mock");
        assert_eq!(PlatformType::PassKit.to_string(), "passkit");
        assert_eq!(PlatformType::GoogleWallet.to_string(), "google");
    }

    #[test]
    fn test_platform_type_parse() {
        assert_eq!("iOS".parse::<PlatformType>().unwrap(), PlatformType::PassKit);
        assert_eq!(
            "android".parse::<PlatformType>().unwrap(),
            PlatformType::GoogleWallet
        );
        assert!("symbian".parse::<PlatformType>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.platform, PlatformType::Mock);
        assert_eq!(config.download_timeout, Duration::from_secs(30));
        assert_eq!(config.request_code, DEFAULT_SAVE_REQUEST_CODE);
        assert!(config.user_agent.starts_with("walletmux/"));
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(|key| match key {
            "WALLETMUX_PLATFORM" => Some("google".to_string()),
            "WALLETMUX_DOWNLOAD_TIMEOUT_SECS" => Some("12".to_string()),
            "WALLETMUX_GOOGLE_ENVIRONMENT" => Some("TEST".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.platform, PlatformType::GoogleWallet);
        assert_eq!(config.download_timeout, Duration::from_secs(12));
        assert_eq!(config.google_environment, GoogleEnvironment::Test);
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let result = Config::from_lookup(|key| match key {
            "WALLETMUX_DOWNLOAD_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert!(matches!(result, Err(WalletError::InvalidArgument(_))));
    }
}
