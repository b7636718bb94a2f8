//! Mock backend for testing.
//!
//! This backend provides an in-memory wallet store with error injection and a
//! scripted "user" answering the add-pass UI, for testing code that uses
//! walletmux without a device.

use crate::backend::{CompletionSender, CompletionSignal, UiOutcome, WalletBackend};
use crate::*;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

/// How the scripted user answers the add-pass UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserResponse {
    /// Tap "Add": every presented pass not yet stored is added
    Accept,
    /// Tap "Cancel": nothing changes
    Cancel,
}

/// Pass file content understood by the mock (the fields of a `pass.json`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MockPassFile {
    serial_number: String,
    #[serde(default)]
    organization_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    pass_type_identifier: String,
}

struct PendingPresentation {
    passes: Vec<PassHandle>,
    sender: CompletionSender,
}

/// Mock wallet for testing.
///
/// Pass files are JSON documents shaped like a PassKit `pass.json`
/// (`serialNumber`, `organizationName`, `description`, `passTypeIdentifier`).
///
/// # Example
///
/// ```
/// use walletmux::backends::mock::{MockWallet, UserResponse};
/// use walletmux::{PassHandle, WalletBackend, WalletError};
///
/// #[tokio::main]
/// async fn main() -> walletmux::Result<()> {
///     let mut wallet = MockWallet::new();
///
///     // Pre-populate with test data
///     wallet.set_pass(PassHandle::new("ABC123", "Acme", "Ticket", "pass.acme")).await;
///     assert_eq!(wallet.list_passes().await?.len(), 1);
///
///     // Test error conditions
///     wallet.list_error = Some(WalletError::Other(anyhow::anyhow!("store locked")));
///     assert!(wallet.list_passes().await.is_err());
///
///     Ok(())
/// }
/// ```
pub struct MockWallet {
    passes: Arc<RwLock<Vec<PassHandle>>>,
    pending: Arc<Mutex<Option<PendingPresentation>>>,
    presented: Arc<Mutex<Vec<Vec<String>>>>,
    opened: Arc<Mutex<Vec<String>>>,

    /// Value returned from `is_available()`
    pub available: bool,
    /// Simulated SDK failure inside `is_available()`
    pub availability_error: Option<WalletError>,
    /// Scripted user answer; `None` keeps the UI open until [`respond`](Self::respond)
    pub response: Option<UserResponse>,
    /// Report an explicit added/not-added answer instead of a bare dismissal
    pub explicit_signal: bool,
    /// Hand out view URLs for stored passes
    pub view_urls: bool,
    /// Error to return from `list_passes()` and `contains_pass()`
    pub list_error: Option<WalletError>,
    /// Error to return from `present_add_ui()`
    pub present_error: Option<WalletError>,
}

impl MockWallet {
    /// Creates a new mock wallet with an empty store.
    pub fn new() -> Self {
        Self {
            passes: Arc::new(RwLock::new(Vec::new())),
            pending: Arc::new(Mutex::new(None)),
            presented: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(Mutex::new(Vec::new())),
            available: true,
            availability_error: None,
            response: None,
            explicit_signal: false,
            view_urls: true,
            list_error: None,
            present_error: None,
        }
    }

    /// Pre-populates the store with a pass.
    ///
    /// Also usable mid-test to simulate another app changing the wallet.
    pub async fn set_pass(&self, pass: PassHandle) {
        let mut passes = self.passes.write().await;
        passes.retain(|p| p.serial_number != pass.serial_number);
        passes.push(pass);
    }

    /// Removes a pass from the store, as if the user deleted it elsewhere.
    pub async fn remove_pass(&self, serial_number: &str) {
        let mut passes = self.passes.write().await;
        passes.retain(|p| p.serial_number != serial_number);
    }

    /// Returns the serial numbers of every batch shown in the add UI.
    pub fn presented(&self) -> Vec<Vec<String>> {
        self.presented
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Returns every URL passed to `open_url()`.
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Checks whether the add UI is on screen waiting for an answer.
    pub fn has_pending_presentation(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.is_some())
            .unwrap_or(false)
    }

    /// Answers the add UI currently on screen.
    ///
    /// Returns `false` if no UI was waiting.
    pub async fn respond(&self, response: UserResponse) -> bool {
        let pending = self.pending.lock().ok().and_then(|mut p| p.take());
        match pending {
            Some(pending) => {
                self.finish(pending.passes, pending.sender, response).await;
                true
            }
            None => false,
        }
    }

    /// Makes the add UI currently on screen fail.
    pub fn fail_pending(&self, err: WalletError) -> bool {
        let pending = self.pending.lock().ok().and_then(|mut p| p.take());
        match pending {
            Some(pending) => {
                pending.sender.fail(err);
                true
            }
            None => false,
        }
    }

    async fn finish(&self, passes: Vec<PassHandle>, sender: CompletionSender, response: UserResponse) {
        if response == UserResponse::Accept {
            for pass in passes {
                self.set_pass(pass).await;
            }
        }

        let outcome = if self.explicit_signal {
            UiOutcome::confirmed(response == UserResponse::Accept)
        } else {
            UiOutcome::dismissed()
        };
        sender.complete(outcome);
    }
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletBackend for MockWallet {
    fn name(&self) -> &str {
        "mock"
    }

    async fn platform_version(&self) -> String {
        "mock 1.0".to_string()
    }

    async fn close(&self) -> Result<()> {
        self.fail_pending(WalletError::Cancelled);
        Ok(())
    }

    async fn is_available(&self) -> bool {
        if let Some(ref err) = self.availability_error {
            tracing::debug!(error = %err, "mock availability check failed");
            return false;
        }
        self.available
    }

    async fn parse_pass(&self, bytes: &[u8]) -> Result<PassHandle> {
        let file: MockPassFile = serde_json::from_slice(bytes)
            .map_err(|e| WalletError::InvalidPassFormat(e.to_string()))?;

        Ok(PassHandle::new(
            file.serial_number,
            file.organization_name,
            file.description,
            file.pass_type_identifier,
        )
        .with_data(bytes))
    }

    async fn contains_pass(&self, pass: &PassHandle) -> Result<bool> {
        if let Some(ref err) = self.list_error {
            return Err(WalletError::Other(anyhow::anyhow!("{}", err)));
        }

        let passes = self.passes.read().await;
        Ok(passes.iter().any(|p| p.serial_number == pass.serial_number))
    }

    async fn list_passes(&self) -> Result<Vec<PassHandle>> {
        if let Some(ref err) = self.list_error {
            return Err(WalletError::Other(anyhow::anyhow!("{}", err)));
        }

        let passes = self.passes.read().await;
        Ok(passes.clone())
    }

    async fn present_add_ui(&self, passes: &[PassHandle]) -> Result<CompletionSignal> {
        if let Some(ref err) = self.present_error {
            return Err(WalletError::CannotPresent(err.to_string()));
        }
        if passes.is_empty() {
            return Err(WalletError::CannotPresent("no passes to add".to_string()));
        }

        let mut new_passes = Vec::new();
        for pass in passes {
            if !self.contains_pass(pass).await? {
                new_passes.push(pass.clone());
            }
        }
        if new_passes.is_empty() {
            return Err(WalletError::CannotPresent(
                "all passes are already in the wallet".to_string(),
            ));
        }

        if let Ok(mut presented) = self.presented.lock() {
            presented.push(passes.iter().map(|p| p.serial_number.clone()).collect());
        }

        let (sender, signal) = CompletionSignal::channel();
        match self.response {
            Some(response) => self.finish(new_passes, sender, response).await,
            None => {
                let replaced = self.pending.lock().ok().and_then(|mut pending| {
                    pending.replace(PendingPresentation {
                        passes: new_passes,
                        sender,
                    })
                });
                if let Some(previous) = replaced {
                    previous.sender.fail(WalletError::Cancelled);
                }
            }
        }

        Ok(signal)
    }

    fn resolve_view_url(&self, pass: &PassHandle) -> Option<String> {
        if !self.view_urls {
            return None;
        }
        pass.view_url
            .clone()
            .or_else(|| Some(format!("mock://wallet/{}", pass.serial_number)))
    }

    async fn open_url(&self, url: &str) -> Result<bool> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(url.to_string());
        }
        Ok(true)
    }
}

/// Registers the mock backend with the factory.
pub fn register() {
    crate::factory::register_backend("mock", |_cfg| Ok(Box::new(MockWallet::new())));
}
