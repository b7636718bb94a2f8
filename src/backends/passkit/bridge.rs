//! Host-side PassKit surface.

use crate::backend::CompletionSender;
use crate::PassHandle;
use async_trait::async_trait;

/// The PassKit calls the host exposes to the backend.
///
/// Errors are opaque platform failures; the backend decides how each one
/// surfaces (availability swallows them, parsing reports an invalid pass).
#[async_trait]
pub trait PassKitBridge: Send + Sync {
    /// `PKAddPassesViewController.canAddPasses()`.
    async fn can_add_passes(&self) -> anyhow::Result<bool>;

    /// `PKPass(data:)`, mapped to a handle.
    async fn pass_from_data(&self, data: &[u8]) -> anyhow::Result<PassHandle>;

    /// `PKPassLibrary().passes()`.
    async fn library_passes(&self) -> anyhow::Result<Vec<PassHandle>>;

    /// `PKPassLibrary().containsPass(_:)`.
    async fn library_contains(&self, pass: &PassHandle) -> anyhow::Result<bool>;

    /// Builds and shows `PKAddPassesViewController(passes:)`.
    ///
    /// Returns `Ok(false)` when the controller could not be built. Otherwise
    /// the host calls `on_dismiss.complete(UiOutcome::dismissed())` from
    /// `addPassesViewControllerDidFinish`.
    async fn present_add_passes(
        &self,
        passes: &[PassHandle],
        on_dismiss: CompletionSender,
    ) -> anyhow::Result<bool>;

    /// `UIApplication.shared.open(_:)`.
    async fn open_url(&self, url: &str) -> anyhow::Result<bool>;

    /// `UIDevice.current.systemVersion`.
    fn system_version(&self) -> String;
}
