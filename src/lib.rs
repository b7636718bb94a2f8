//! Walletmux - Unified interface for platform wallet passes.
//!
//! Walletmux provides a single API for adding and inspecting passes in the
//! platform wallet. Write your host glue once and support Apple Wallet
//! (PassKit) and Google Wallet with the same calls.
//!
//! # Features
//!
//! - **Unified API**: One [`WalletBackend`] trait for every platform
//! - **Async/Await**: Built on tokio for non-blocking I/O
//! - **Add-flow correlation**: Decides whether the user really added a pass,
//!   even on platforms that only report "dialog dismissed"
//! - **Single flight**: A second add while one is on screen is rejected, not
//!   silently swallowed
//! - **Typed dispatch**: Untyped host argument maps are validated into typed
//!   requests before anything runs
//! - **Error codes**: Every failure carries a stable wire code
//!
//! # Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use walletmux::dispatcher::Dispatcher;
//! use walletmux::{Config, PlatformType};
//!
//! #[tokio::main]
//! async fn main() -> walletmux::Result<()> {
//!     let dispatcher = Dispatcher::from_config(Config::new(PlatformType::Mock))?;
//!
//!     if dispatcher.handle("isWalletAvailable", &json!({})).await == Ok(json!(true)) {
//!         let added = dispatcher
//!             .handle("addWalletCard", &json!({"path": "/tmp/boarding.pkpass"}))
//!             .await;
//!         println!("added: {:?}", added);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Supported Backends
//!
//! | Backend | Feature Flag | Host bridge | Add-flow answer |
//! |---------|-------------|-------------|-----------------|
//! | Mock | `mock` | None | Count diff or explicit (configurable) |
//! | PassKit | `passkit` | [`PassKitBridge`](backends::passkit::PassKitBridge) | Count diff |
//! | Google Wallet | `google` | [`GoogleWalletBridge`](backends::google::GoogleWalletBridge) | Activity result |

pub mod backend;
pub mod pass;
pub mod error;
pub mod config;
pub mod factory;
pub mod validation;
pub mod loader;
pub mod correlator;
pub mod dispatcher;
pub mod logging;
pub mod backends;

pub use backend::{CompletionSender, CompletionSignal, UiOutcome, WalletBackend};
pub use pass::{PassArtifact, PassHandle, PassOrigin};
pub use error::{ErrorPayload, Result, WalletError};
pub use config::{Config, GoogleEnvironment, PlatformType};

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the walletmux library.
///
/// This registers all self-contained backends with the factory. It's called
/// by [`Dispatcher::from_config`](dispatcher::Dispatcher::from_config), but can
/// be called explicitly if needed (it's idempotent).
pub fn init() {
    INIT.call_once(backends::register_all);
}
