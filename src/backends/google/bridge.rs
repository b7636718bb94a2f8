//! Host-side Google Wallet surface.

use crate::backends::google::SavePayload;
use crate::{GoogleEnvironment, PassHandle};
use async_trait::async_trait;

/// The Google Pay services calls the host exposes to the backend.
#[async_trait]
pub trait GoogleWalletBridge: Send + Sync {
    /// `PaymentsClient.isReadyToPay` for the given environment.
    async fn is_ready_to_pay(&self, environment: GoogleEnvironment) -> anyhow::Result<bool>;

    /// Starts the save-to-wallet activity with `startActivityForResult`.
    ///
    /// Returns `Ok(false)` when no activity is attached to launch from.
    async fn start_save_activity(
        &self,
        request_code: i32,
        payload: &SavePayload,
    ) -> anyhow::Result<bool>;

    /// Passes the host knows to be saved in the user's wallet.
    ///
    /// Google Wallet exposes no listing call, so the default is an empty wallet.
    async fn saved_passes(&self) -> anyhow::Result<Vec<PassHandle>> {
        Ok(Vec::new())
    }

    /// Starts an `ACTION_VIEW` intent; `false` when nothing resolves it.
    async fn open_url(&self, url: &str) -> anyhow::Result<bool>;

    /// `Build.VERSION.RELEASE`.
    fn android_version(&self) -> String;
}
