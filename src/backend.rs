//! Backend trait definition for platform wallet integrations.
//!
//! This module defines the core [`WalletBackend`] trait that every platform
//! implementation must satisfy, plus the one-shot completion signal a backend
//! hands back when it presents the add-pass UI.

use crate::{PassHandle, Result, WalletError};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// WalletBackend represents one platform wallet.
///
/// All implementations must be `Send + Sync` to support concurrent access
/// across async tasks.
///
/// # Implementations
///
/// - **PassKit**: Apple Wallet, through a host-supplied bridge
/// - **Google Wallet**: Google Pay services, through a host-supplied bridge
/// - **Testing**: Mock backend with error injection and scripted users
#[async_trait]
pub trait WalletBackend: Send + Sync {
    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns the backend name (e.g., "passkit", "google").
    fn name(&self) -> &str;

    /// Returns the platform version string (e.g., "iOS 17.4").
    async fn platform_version(&self) -> String;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Releases backend resources.
    ///
    /// Backends that keep the completion of an on-screen presentation (Google
    /// Wallet, mock) fail it with [`WalletError::Cancelled`]. The default does
    /// nothing: the completion is owned by the host (PassKit), and the waiting
    /// caller is released by [`AddFlowCorrelator::cancel_pending`](crate::correlator::AddFlowCorrelator::cancel_pending).
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    // ========================================================================
    // Capabilities
    // ========================================================================

    /// Checks whether passes can be added on this device.
    ///
    /// Never fails: platform errors are reported as `false`.
    async fn is_available(&self) -> bool;

    /// Parses pass content into a handle the platform can present.
    ///
    /// # Errors
    ///
    /// - [`WalletError::InvalidPassFormat`]: the platform rejected the content
    async fn parse_pass(&self, bytes: &[u8]) -> Result<PassHandle>;

    /// Checks whether the wallet currently stores the pass.
    ///
    /// Always queries the live store; the store can change outside this process.
    async fn contains_pass(&self, pass: &PassHandle) -> Result<bool>;

    /// Lists the passes currently stored in the wallet.
    async fn list_passes(&self) -> Result<Vec<PassHandle>>;

    /// Presents the platform add-pass UI.
    ///
    /// Returns once the UI is on screen. The returned signal fires exactly once,
    /// when the user accepts or cancels, or the platform fails mid-flow.
    ///
    /// # Errors
    ///
    /// - [`WalletError::CannotPresent`]: the platform declined to build the UI
    ///   (for example, every pass is already in the wallet)
    async fn present_add_ui(&self, passes: &[PassHandle]) -> Result<CompletionSignal>;

    /// Returns the URL that opens a stored pass, if the platform has one.
    fn resolve_view_url(&self, pass: &PassHandle) -> Option<String>;

    /// Opens a view URL in the wallet.
    ///
    /// Returns `false` when nothing on the device can handle the URL.
    async fn open_url(&self, url: &str) -> Result<bool>;

    /// Routes a platform result callback (e.g. an Android activity result) to
    /// the presentation waiting on it.
    ///
    /// Returns `true` when the callback belonged to this backend.
    fn on_platform_result(&self, _request_code: i32, _result_code: i32) -> bool {
        false
    }
}

/// What the platform reported when the add-pass UI went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOutcome {
    /// Explicit "pass was added" answer, when the platform gives one.
    ///
    /// `None` means the platform only reports that the UI was dismissed.
    pub added: Option<bool>,
}

impl UiOutcome {
    /// The UI was dismissed without saying whether anything was added.
    pub fn dismissed() -> Self {
        Self { added: None }
    }

    /// The platform reported explicitly whether the pass was added.
    pub fn confirmed(added: bool) -> Self {
        Self { added: Some(added) }
    }
}

/// Sending half of a [`CompletionSignal`], held by whoever observes the UI.
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<Result<UiOutcome>>,
}

impl CompletionSender {
    /// Reports that the UI finished.
    pub fn complete(self, outcome: UiOutcome) {
        let _ = self.tx.send(Ok(outcome));
    }

    /// Reports that the UI failed after it was shown.
    pub fn fail(self, err: WalletError) {
        let _ = self.tx.send(Err(err));
    }
}

/// Fires once when the add-pass UI finishes.
///
/// Resolves to [`WalletError::Cancelled`] if the sender is dropped without
/// reporting.
#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<Result<UiOutcome>>,
}

impl CompletionSignal {
    /// Creates a connected sender/signal pair.
    pub fn channel() -> (CompletionSender, CompletionSignal) {
        let (tx, rx) = oneshot::channel();
        (CompletionSender { tx }, CompletionSignal { rx })
    }

    /// A signal that has already fired.
    pub fn ready(outcome: UiOutcome) -> Self {
        let (tx, signal) = Self::channel();
        tx.complete(outcome);
        signal
    }
}

impl Future for CompletionSignal {
    type Output = Result<UiOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(WalletError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_delivers_outcome() {
        let (tx, signal) = CompletionSignal::channel();
        tx.complete(UiOutcome::confirmed(true));
        assert_eq!(signal.await.unwrap(), UiOutcome::confirmed(true));
    }

    #[tokio::test]
    async fn test_dropped_sender_cancels() {
        let (tx, signal) = CompletionSignal::channel();
        drop(tx);
        assert!(matches!(signal.await, Err(WalletError::Cancelled)));
    }

    #[tokio::test]
    async fn test_failure_is_forwarded() {
        let (tx, signal) = CompletionSignal::channel();
        tx.fail(WalletError::CannotPresent("window gone".to_string()));
        assert!(matches!(signal.await, Err(WalletError::CannotPresent(_))));
    }

    #[tokio::test]
    async fn test_ready_signal() {
        let outcome = CompletionSignal::ready(UiOutcome::dismissed()).await.unwrap();
        assert_eq!(outcome.added, None);
    }
}
