//! Google Wallet backend.
//!
//! The Google Pay services client lives in the host application, so this
//! backend talks to it through a [`GoogleWalletBridge`]. Passes are Google
//! Wallet save requests: a signed JWT or the JSON claims/payload it would carry.
//!
//! # Behavior
//!
//! - Availability is `isReadyToPay` in the configured environment
//! - The save activity is started with the configured request code; its
//!   result reaches the backend through
//!   [`WalletBackend::on_platform_result`](crate::WalletBackend::on_platform_result)
//!   and answers the add-flow explicitly (`RESULT_OK` means added)
//! - Google Wallet has no pass listing API; hosts that track saved objects
//!   (usually through their issuer service) report them via the bridge
//! - View URLs are save links (`https://pay.google.com/gp/v/save/<objectId>`)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use walletmux::backends::google::{self, GoogleWalletBridge};
//! use walletmux::{factory, Config, GoogleEnvironment, PlatformType};
//!
//! fn setup(bridge: Arc<dyn GoogleWalletBridge>) -> walletmux::Result<()> {
//!     google::register(bridge);
//!     let config = Config::new(PlatformType::GoogleWallet)
//!         .with_google_environment(GoogleEnvironment::Test);
//!     let backend = factory::new_backend(config)?;
//!     assert_eq!(backend.name(), "google");
//!     Ok(())
//! }
//! ```

mod backend;
mod bridge;
pub mod payload;

pub use backend::GoogleWalletBackend;
pub use bridge::GoogleWalletBridge;
pub use payload::{save_link, SavePayload};

use std::sync::Arc;

/// Android `Activity.RESULT_OK`.
pub const RESULT_OK: i32 = -1;

/// Android `Activity.RESULT_CANCELED`.
pub const RESULT_CANCELED: i32 = 0;

/// Registers the Google Wallet backend with the factory.
pub fn register(bridge: Arc<dyn GoogleWalletBridge>) {
    crate::factory::register_backend("google", move |cfg| {
        Ok(Box::new(GoogleWalletBackend::new(cfg, bridge.clone())))
    });
}
