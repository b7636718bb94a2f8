//! Add-flow result correlation.
//!
//! Platforms do not reliably say whether the user actually added a pass: the
//! PassKit controller only reports that it was dismissed. The correlator counts
//! the wallet's passes right before the UI is shown and again once it goes
//! away, and reports success when the count grew. A platform that does give an
//! explicit answer (Google Wallet's activity result) overrides the count in
//! both directions: an explicit "not added" is reported as `false` even if the
//! count grew meanwhile, since another app may have changed the wallet.
//!
//! Only one add-flow may be in flight per correlator. A second request is
//! rejected with [`WalletError::AddInProgress`]; the first caller is untouched.

use crate::backend::{UiOutcome, WalletBackend};
use crate::{PassHandle, Result, WalletError};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Observable phase of the correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    /// No add-flow in flight
    Idle,
    /// Request accepted; snapshotting the wallet and building the UI
    Reserved,
    /// UI is on screen, waiting for the user
    Presenting,
    /// UI finished; re-querying the wallet to decide the outcome
    Resolving,
}

/// The caller waiting on the in-flight add-flow.
#[derive(Debug)]
struct PendingAddRequest {
    request_id: Uuid,
    caller: oneshot::Sender<Result<bool>>,
    pass_count_before: usize,
    started_at: DateTime<Utc>,
}

impl PendingAddRequest {
    fn fulfill(self, result: Result<bool>) {
        let _ = self.caller.send(result);
    }
}

#[derive(Debug)]
enum FlowState {
    Idle,
    Reserved(PendingAddRequest),
    Presenting(PendingAddRequest),
    Resolving(Uuid),
}

impl FlowState {
    fn request_id(&self) -> Option<Uuid> {
        match self {
            Self::Idle => None,
            Self::Reserved(pending) | Self::Presenting(pending) => Some(pending.request_id),
            Self::Resolving(id) => Some(*id),
        }
    }
}

/// Correlates one add-pass UI interaction with the caller that started it.
///
/// # Example
///
/// ```
/// use walletmux::backends::mock::{MockWallet, UserResponse};
/// use walletmux::correlator::AddFlowCorrelator;
/// use walletmux::{PassHandle, WalletBackend};
///
/// #[tokio::main]
/// async fn main() -> walletmux::Result<()> {
///     let mut wallet = MockWallet::new();
///     wallet.response = Some(UserResponse::Accept);
///
///     let correlator = AddFlowCorrelator::new();
///     let pass = PassHandle::new("ABC123", "Acme", "Ticket", "pass.com.acme");
///
///     let added = correlator.run(&wallet, &[pass]).await?;
///     assert!(added);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct AddFlowCorrelator {
    state: Mutex<FlowState>,
}

impl Default for AddFlowCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl AddFlowCorrelator {
    /// Creates an idle correlator.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FlowState::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlowState> {
        // The state is replaced wholesale under the lock, so a poisoned guard
        // still holds a consistent value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the current phase.
    pub fn phase(&self) -> FlowPhase {
        match &*self.lock() {
            FlowState::Idle => FlowPhase::Idle,
            FlowState::Reserved(_) => FlowPhase::Reserved,
            FlowState::Presenting(_) => FlowPhase::Presenting,
            FlowState::Resolving(_) => FlowPhase::Resolving,
        }
    }

    /// Returns when the in-flight add-flow started, if there is one.
    pub fn pending_since(&self) -> Option<DateTime<Utc>> {
        match &*self.lock() {
            FlowState::Reserved(pending) | FlowState::Presenting(pending) => {
                Some(pending.started_at)
            }
            _ => None,
        }
    }

    /// Runs one add-flow: snapshot, present, wait, re-count, answer.
    ///
    /// Returns `Ok(true)` when the pass ended up in the wallet and `Ok(false)`
    /// when the user backed out.
    ///
    /// # Errors
    ///
    /// - [`WalletError::AddInProgress`]: another add-flow is in flight
    /// - [`WalletError::CannotPresent`]: the platform declined to show the UI
    /// - [`WalletError::Cancelled`]: [`cancel_pending`](Self::cancel_pending)
    ///   was called before the user answered
    pub async fn run(&self, backend: &dyn WalletBackend, passes: &[PassHandle]) -> Result<bool> {
        let (caller, mut fulfilled) = oneshot::channel();
        let request_id = self.reserve(caller)?;
        let _reservation = Reservation {
            correlator: self,
            request_id,
        };

        let before = backend.list_passes().await?.len();
        if !self.record_snapshot(request_id, before) {
            return Err(WalletError::Cancelled);
        }

        let signal = backend.present_add_ui(passes).await.map_err(|err| {
            tracing::debug!(%request_id, error = %err, "add-pass UI was not presented");
            err
        })?;

        if !self.promote(request_id) {
            return Err(WalletError::Cancelled);
        }
        tracing::debug!(%request_id, pass_count_before = before, "add-pass UI presented");

        let outcome = tokio::select! {
            outcome = signal => outcome,
            early = &mut fulfilled => return early.unwrap_or(Err(WalletError::Cancelled)),
        };
        self.resolve(backend, request_id, outcome).await;

        fulfilled.await.unwrap_or(Err(WalletError::Cancelled))
    }

    /// Fulfills the in-flight caller with [`WalletError::Cancelled`].
    ///
    /// Called on teardown so a caller waiting on a UI that will never report
    /// back does not hang. Returns `true` if a caller was cancelled. A flow
    /// that is already resolving is left to finish.
    pub fn cancel_pending(&self) -> bool {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, FlowState::Idle) {
            FlowState::Reserved(pending) | FlowState::Presenting(pending) => {
                tracing::info!(request_id = %pending.request_id, "cancelling pending add-pass flow");
                pending.fulfill(Err(WalletError::Cancelled));
                true
            }
            other => {
                *state = other;
                false
            }
        }
    }

    fn reserve(&self, caller: oneshot::Sender<Result<bool>>) -> Result<Uuid> {
        let mut state = self.lock();
        if let Some(active) = state.request_id() {
            tracing::warn!(active_request = %active, "rejecting add-pass request while another is in flight");
            return Err(WalletError::AddInProgress);
        }

        let request_id = Uuid::new_v4();
        *state = FlowState::Reserved(PendingAddRequest {
            request_id,
            caller,
            pass_count_before: 0,
            started_at: Utc::now(),
        });
        Ok(request_id)
    }

    fn record_snapshot(&self, request_id: Uuid, count: usize) -> bool {
        match &mut *self.lock() {
            FlowState::Reserved(pending) if pending.request_id == request_id => {
                pending.pass_count_before = count;
                true
            }
            _ => false,
        }
    }

    fn promote(&self, request_id: Uuid) -> bool {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, FlowState::Idle) {
            FlowState::Reserved(pending) if pending.request_id == request_id => {
                *state = FlowState::Presenting(pending);
                true
            }
            other => {
                *state = other;
                false
            }
        }
    }

    async fn resolve(
        &self,
        backend: &dyn WalletBackend,
        request_id: Uuid,
        outcome: Result<UiOutcome>,
    ) {
        let pending = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, FlowState::Resolving(request_id)) {
                FlowState::Presenting(pending) if pending.request_id == request_id => pending,
                other => {
                    *state = other;
                    return;
                }
            }
        };

        let result = match outcome {
            Ok(outcome) => decide(backend, pending.pass_count_before, outcome).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(added) => tracing::info!(%request_id, added, "add-pass flow finished"),
            Err(err) => tracing::warn!(%request_id, error = %err, "add-pass flow failed"),
        }

        pending.fulfill(result);
        self.release(request_id);
    }

    fn release(&self, request_id: Uuid) {
        let mut state = self.lock();
        if state.request_id() == Some(request_id) {
            *state = FlowState::Idle;
        }
    }
}

/// Decides whether a pass was added once the UI is gone.
///
/// The after-count is always taken, even when the platform answered
/// explicitly, so both paths observe the store after the UI finished.
async fn decide(backend: &dyn WalletBackend, before: usize, outcome: UiOutcome) -> Result<bool> {
    let after = backend.list_passes().await.map(|passes| passes.len());
    match (outcome.added, after) {
        (Some(added), _) => Ok(added),
        (None, Ok(after)) => {
            tracing::debug!(before, after, "comparing wallet pass counts");
            Ok(after > before)
        }
        (None, Err(err)) => Err(err),
    }
}

/// Returns the correlator to Idle if the owning `run` future goes away early.
struct Reservation<'a> {
    correlator: &'a AddFlowCorrelator,
    request_id: Uuid,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.correlator.release(self.request_id);
    }
}
