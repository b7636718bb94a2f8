//! Backend factory and registration system.

use crate::{Config, Result, WalletBackend, WalletError};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// Factory function type for creating backends.
///
/// Factories are closures so bridge-backed platforms can capture the host's
/// bridge object at registration time.
pub type BackendFactory = Arc<dyn Fn(Config) -> Result<Box<dyn WalletBackend>> + Send + Sync>;

static BACKEND_REGISTRY: OnceLock<RwLock<HashMap<String, BackendFactory>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, BackendFactory>> {
    BACKEND_REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a backend factory function.
///
/// Registering the same name twice replaces the earlier factory.
///
/// # Example
///
/// ```no_run
/// use walletmux::factory::register_backend;
/// use walletmux::{Config, Result, WalletBackend};
///
/// fn my_backend_factory(config: Config) -> Result<Box<dyn WalletBackend>> {
///     // Create and return backend instance
///     # unimplemented!()
/// }
///
/// pub fn register() {
///     register_backend("mywallet", my_backend_factory);
/// }
/// ```
pub fn register_backend<F>(platform: &str, factory: F)
where
    F: Fn(Config) -> Result<Box<dyn WalletBackend>> + Send + Sync + 'static,
{
    let mut reg = registry()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    reg.insert(platform.to_string(), Arc::new(factory));
}

/// Creates a new backend from configuration.
///
/// The factory is looked up by `config.platform`. Bridge-backed platforms
/// (PassKit, Google Wallet) are registered by the host with their bridge.
///
/// # Errors
///
/// Returns an error if:
/// - The platform is not registered (missing feature flag or `register()` call)
/// - The factory fails
///
/// # Example
///
/// ```
/// use walletmux::{Config, PlatformType, factory};
///
/// walletmux::init();
/// let backend = factory::new_backend(Config::new(PlatformType::Mock)).unwrap();
/// assert_eq!(backend.name(), "mock");
/// ```
pub fn new_backend(config: Config) -> Result<Box<dyn WalletBackend>> {
    let platform = config.platform.to_string();

    let factory = {
        let reg = registry()
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        reg.get(&platform).cloned().ok_or_else(|| {
            WalletError::Other(anyhow::anyhow!(
                "unknown backend: {} (did you enable the '{}' feature flag and register its bridge?)",
                platform,
                platform
            ))
        })?
    };

    factory(config)
}
