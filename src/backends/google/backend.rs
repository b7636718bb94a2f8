//! Google Wallet backend implementation.

use crate::backend::{CompletionSender, CompletionSignal, UiOutcome, WalletBackend};
use crate::backends::google::{save_link, GoogleWalletBridge, SavePayload, RESULT_OK};
use crate::{Config, GoogleEnvironment, PassHandle, Result, WalletError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

const NAME: &str = "google";

/// Google Wallet backend.
///
/// Holds the completion of the save activity in flight until the host routes
/// the matching activity result back through `on_platform_result`.
pub struct GoogleWalletBackend {
    bridge: Arc<dyn GoogleWalletBridge>,
    environment: GoogleEnvironment,
    request_code: i32,
    pending: Mutex<Option<CompletionSender>>,
}

impl GoogleWalletBackend {
    /// Creates a new Google Wallet backend over the host bridge.
    pub fn new(config: Config, bridge: Arc<dyn GoogleWalletBridge>) -> Self {
        Self {
            bridge,
            environment: config.google_environment,
            request_code: config.request_code,
            pending: Mutex::new(None),
        }
    }

    fn take_pending(&self) -> Option<CompletionSender> {
        self.pending.lock().ok().and_then(|mut pending| pending.take())
    }

    fn save_request(passes: &[PassHandle]) -> Result<SavePayload> {
        let mut requests = passes
            .iter()
            .map(|pass| {
                let data = pass.data.as_deref().ok_or_else(|| {
                    WalletError::CannotPresent(format!(
                        "pass {} carries no save request",
                        pass.serial_number
                    ))
                })?;
                SavePayload::parse(data)
            })
            .collect::<Result<Vec<_>>>()?;

        match requests.len() {
            0 => Err(WalletError::CannotPresent("no passes to add".to_string())),
            1 => Ok(requests.remove(0)),
            _ => SavePayload::merge(&requests),
        }
    }
}

#[async_trait]
impl WalletBackend for GoogleWalletBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn platform_version(&self) -> String {
        format!("Android {}", self.bridge.android_version())
    }

    async fn close(&self) -> Result<()> {
        if let Some(sender) = self.take_pending() {
            sender.fail(WalletError::Cancelled);
        }
        Ok(())
    }

    async fn is_available(&self) -> bool {
        match self.bridge.is_ready_to_pay(self.environment).await {
            Ok(ready) => ready,
            Err(e) => {
                tracing::debug!(error = %e, environment = %self.environment, "isReadyToPay failed");
                false
            }
        }
    }

    async fn parse_pass(&self, bytes: &[u8]) -> Result<PassHandle> {
        let pass = SavePayload::parse(bytes)?.describe()?;
        Ok(pass.with_data(bytes))
    }

    async fn contains_pass(&self, pass: &PassHandle) -> Result<bool> {
        let saved = self.list_passes().await?;
        Ok(saved.iter().any(|p| p.serial_number == pass.serial_number))
    }

    async fn list_passes(&self) -> Result<Vec<PassHandle>> {
        self.bridge
            .saved_passes()
            .await
            .map_err(|e| WalletError::backend_op(NAME, "list", "saved passes", WalletError::Other(e)))
    }

    async fn present_add_ui(&self, passes: &[PassHandle]) -> Result<CompletionSignal> {
        let request = Self::save_request(passes)?;

        let (sender, signal) = CompletionSignal::channel();
        let previous = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.replace(sender));
        if let Some(previous) = previous {
            previous.fail(WalletError::Cancelled);
        }

        let started = self
            .bridge
            .start_save_activity(self.request_code, &request)
            .await;
        match started {
            Ok(true) => {
                tracing::debug!(request_code = self.request_code, "save activity started");
                Ok(signal)
            }
            Ok(false) => {
                self.take_pending();
                Err(WalletError::CannotPresent(
                    "no activity attached to start the save flow".to_string(),
                ))
            }
            Err(e) => {
                self.take_pending();
                Err(WalletError::CannotPresent(e.to_string()))
            }
        }
    }

    fn resolve_view_url(&self, pass: &PassHandle) -> Option<String> {
        Some(save_link(&pass.serial_number))
    }

    async fn open_url(&self, url: &str) -> Result<bool> {
        self.bridge
            .open_url(url)
            .await
            .map_err(|e| WalletError::backend_op(NAME, "open", url, WalletError::Other(e)))
    }

    fn on_platform_result(&self, request_code: i32, result_code: i32) -> bool {
        if request_code != self.request_code {
            return false;
        }

        match self.take_pending() {
            Some(sender) => {
                tracing::debug!(result_code, "save activity returned");
                sender.complete(UiOutcome::confirmed(result_code == RESULT_OK));
            }
            None => tracing::warn!(result_code, "save activity result with no pending add"),
        }
        true
    }
}
