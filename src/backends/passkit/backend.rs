//! PassKit backend implementation.

use crate::backend::{CompletionSignal, WalletBackend};
use crate::backends::passkit::PassKitBridge;
use crate::{PassHandle, Result, WalletError};
use async_trait::async_trait;
use std::sync::Arc;

const NAME: &str = "passkit";

/// Apple Wallet backend.
pub struct PassKitBackend {
    bridge: Arc<dyn PassKitBridge>,
}

impl PassKitBackend {
    /// Creates a new PassKit backend over the host bridge.
    pub fn new(bridge: Arc<dyn PassKitBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl WalletBackend for PassKitBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn platform_version(&self) -> String {
        format!("iOS {}", self.bridge.system_version())
    }

    async fn is_available(&self) -> bool {
        match self.bridge.can_add_passes().await {
            Ok(available) => available,
            Err(e) => {
                tracing::debug!(error = %e, "PassKit availability check failed");
                false
            }
        }
    }

    async fn parse_pass(&self, bytes: &[u8]) -> Result<PassHandle> {
        let pass = self
            .bridge
            .pass_from_data(bytes)
            .await
            .map_err(|e| WalletError::InvalidPassFormat(e.to_string()))?;

        Ok(pass.with_data(bytes))
    }

    async fn contains_pass(&self, pass: &PassHandle) -> Result<bool> {
        self.bridge.library_contains(pass).await.map_err(|e| {
            WalletError::backend_op(NAME, "contains", &pass.serial_number, WalletError::Other(e))
        })
    }

    async fn list_passes(&self) -> Result<Vec<PassHandle>> {
        self.bridge
            .library_passes()
            .await
            .map_err(|e| WalletError::backend_op(NAME, "list", "library", WalletError::Other(e)))
    }

    async fn present_add_ui(&self, passes: &[PassHandle]) -> Result<CompletionSignal> {
        if passes.is_empty() {
            return Err(WalletError::CannotPresent("no passes to add".to_string()));
        }

        let (on_dismiss, signal) = CompletionSignal::channel();
        match self.bridge.present_add_passes(passes, on_dismiss).await {
            Ok(true) => Ok(signal),
            Ok(false) => Err(WalletError::CannotPresent(
                "PassKit declined to build the add-passes controller".to_string(),
            )),
            Err(e) => Err(WalletError::CannotPresent(e.to_string())),
        }
    }

    fn resolve_view_url(&self, pass: &PassHandle) -> Option<String> {
        pass.view_url.clone()
    }

    async fn open_url(&self, url: &str) -> Result<bool> {
        self.bridge
            .open_url(url)
            .await
            .map_err(|e| WalletError::backend_op(NAME, "open", url, WalletError::Other(e)))
    }
}
