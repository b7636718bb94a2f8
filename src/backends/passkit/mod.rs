//! Apple Wallet (PassKit) backend.
//!
//! PassKit lives in the host application, so this backend talks to it through
//! a [`PassKitBridge`] the host implements on top of `PKPassLibrary`,
//! `PKPass(data:)` and `PKAddPassesViewController`.
//!
//! # Behavior
//!
//! - The add controller only reports that it was dismissed, so add-flows are
//!   decided by comparing library pass counts before and after
//! - Passes carry their `passURL` as view URL when the library has one
//! - Pass signing and validation stay inside PassKit
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use walletmux::backends::passkit::{self, PassKitBridge};
//! use walletmux::{factory, Config, PlatformType};
//!
//! fn setup(bridge: Arc<dyn PassKitBridge>) -> walletmux::Result<()> {
//!     passkit::register(bridge);
//!     let backend = factory::new_backend(Config::new(PlatformType::PassKit))?;
//!     assert_eq!(backend.name(), "passkit");
//!     Ok(())
//! }
//! ```

mod backend;
mod bridge;

pub use backend::PassKitBackend;
pub use bridge::PassKitBridge;

use std::sync::Arc;

/// Registers the PassKit backend with the factory.
pub fn register(bridge: Arc<dyn PassKitBridge>) {
    crate::factory::register_backend("passkit", move |_cfg| {
        Ok(Box::new(PassKitBackend::new(bridge.clone())))
    });
}
