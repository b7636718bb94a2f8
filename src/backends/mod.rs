//! Backend implementations.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "passkit")]
pub mod passkit;

#[cfg(feature = "google")]
pub mod google;

/// Registers all self-contained backends with the factory.
///
/// PassKit and Google Wallet need a host bridge and are registered through
/// their own `register(bridge)` functions.
pub fn register_all() {
    #[cfg(feature = "mock")]
    mock::register();
}
