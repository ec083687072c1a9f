//! Wait-group style coordination for asynchronous field validations.
//!
//! Form fields trigger revalidation on every edit as fire-and-forget tasks.
//! Before submitting, the form asks the coordinator to wait until everything
//! currently in flight has settled, bounded by a timeout.
//!
//! # Contract
//!
//! - [`ValidationCoordinator::add`] must not be called while a wait is in
//!   progress.
//! - Waits must not overlap.
//! - Neither may be used after [`ValidationCoordinator::close`].
//!
//! Breaking the contract is a caller bug and is reported as a
//! [`ContractViolation`]. Running out of time is not a failure: it is
//! reported as [`WaitOutcome::TimedOut`], and callers are expected to
//! proceed and let the server validate.
//!
//! # Reuse after a timeout
//!
//! A timed-out wait leaves unfinished tasks in the live set. The next wait
//! covers those tasks plus anything added since.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//!
//! use quizzical::coordinator::{ValidationCoordinator, WaitOutcome};
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = ValidationCoordinator::try_current().unwrap();
//!
//!     coordinator.add(async { /* check a field */ }).unwrap();
//!     coordinator.add(async { /* check another */ }).unwrap();
//!
//!     let outcome = coordinator.wait(Duration::from_secs(1)).await.unwrap();
//!     assert_eq!(outcome, WaitOutcome::Drained);
//!     assert_eq!(coordinator.pending(), 0);
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use static_assertions::assert_impl_all;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// Default delay between two checks of the live set while waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

// =============================================================================
// Error and Outcome Types
// =============================================================================

/// Misuse of the coordinator by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// `add` was called while a `wait` was in progress.
    #[error("validation task added while the coordinator is waiting")]
    AddWhileWaiting,

    /// `wait` was called while another `wait` was in progress.
    #[error("wait called while another wait is in progress")]
    NestedWait,

    /// The coordinator was used after it was closed.
    #[error("coordinator used after it was closed")]
    Closed,

    /// No tokio runtime was available to run validation tasks.
    #[error("no tokio runtime available for validation tasks")]
    NoRuntime,
}

/// How a wait ended.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every task settled before the deadline.
    Drained,
    /// The deadline passed with tasks still running.
    TimedOut,
}

impl WaitOutcome {
    /// Returns `true` for [`WaitOutcome::Drained`].
    #[must_use]
    pub const fn is_drained(self) -> bool {
        matches!(self, Self::Drained)
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// Live tasks by id. The abort handle is filled in right after spawning.
type LiveSet = HashMap<u64, Option<AbortHandle>>;

struct Shared {
    waiting: AtomicBool,
    closed: AtomicBool,
    next_identifier: AtomicU64,
    live: Mutex<LiveSet>,
}

/// Removes its task from the live set when the task's future is dropped,
/// whether it completed, panicked or was aborted.
struct Completion {
    identifier: u64,
    shared: Arc<Shared>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.shared.live.lock().remove(&self.identifier);
    }
}

/// Clears the waiting flag on every exit path of a wait, including when
/// the wait future is dropped.
struct WaitingFlag<'a>(&'a AtomicBool);

impl Drop for WaitingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// ValidationCoordinator
// =============================================================================

/// Schedules validation tasks and waits for them to drain.
///
/// One coordinator belongs to one form-editing session. Dropping it aborts
/// every pending task on a best-effort basis.
pub struct ValidationCoordinator {
    shared: Arc<Shared>,
    runtime: Handle,
    poll_interval: Duration,
}

assert_impl_all!(ValidationCoordinator: Send, Sync);

impl fmt::Debug for ValidationCoordinator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ValidationCoordinator")
            .field("pending", &self.pending())
            .field("waiting", &self.is_waiting())
            .field("closed", &self.is_closed())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ValidationCoordinator {
    /// Creates a coordinator that spawns tasks on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                waiting: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                next_identifier: AtomicU64::new(0),
                live: Mutex::new(HashMap::new()),
            }),
            runtime,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Creates a coordinator on the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::NoRuntime`] outside a tokio runtime.
    pub fn try_current() -> Result<Self, ContractViolation> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| ContractViolation::NoRuntime)
    }

    /// Sets the delay between two checks of the live set while waiting.
    ///
    /// Each check always yields to the scheduler first; a zero interval
    /// only yields.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Returns the number of tasks that have not settled yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.live.lock().len()
    }

    /// Returns `true` while a wait is in progress.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.shared.waiting.load(Ordering::SeqCst)
    }

    /// Returns `true` once the coordinator has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Schedules `task` to run concurrently with the caller.
    ///
    /// The task is registered in the live set before it can start and is
    /// removed once its future is dropped, on whichever worker finished it.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::AddWhileWaiting`] during a wait and
    /// [`ContractViolation::Closed`] after [`close`](Self::close).
    pub fn add<F>(&self, task: F) -> Result<(), ContractViolation>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let identifier = {
            let mut live = self.shared.live.lock();
            if self.shared.closed.load(Ordering::SeqCst) {
                return Err(ContractViolation::Closed);
            }
            if self.shared.waiting.load(Ordering::SeqCst) {
                return Err(ContractViolation::AddWhileWaiting);
            }
            let identifier = self.shared.next_identifier.fetch_add(1, Ordering::Relaxed);
            live.insert(identifier, None);
            identifier
        };

        let completion = Completion {
            identifier,
            shared: Arc::clone(&self.shared),
        };
        let handle = self.runtime.spawn(async move {
            let _completion = completion;
            if AssertUnwindSafe(task).catch_unwind().await.is_err() {
                tracing::warn!(task = identifier, "Validation task panicked");
            }
        });

        if let Some(slot) = self.shared.live.lock().get_mut(&identifier) {
            *slot = Some(handle.abort_handle());
        }
        tracing::trace!(task = identifier, "Validation task scheduled");
        Ok(())
    }

    /// Waits until every scheduled task has settled or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::NestedWait`] if another wait is in
    /// progress and [`ContractViolation::Closed`] after
    /// [`close`](Self::close).
    pub async fn wait(&self, timeout: Duration) -> Result<WaitOutcome, ContractViolation> {
        self.wait_for(Some(timeout)).await
    }

    /// Waits with no deadline until every scheduled task has settled.
    ///
    /// # Errors
    ///
    /// Same as [`wait`](Self::wait).
    pub async fn wait_until_drained(&self) -> Result<(), ContractViolation> {
        self.wait_for(None).await.map(|_| ())
    }

    async fn wait_for(&self, timeout: Option<Duration>) -> Result<WaitOutcome, ContractViolation> {
        if self.is_closed() {
            return Err(ContractViolation::Closed);
        }
        self.shared
            .waiting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ContractViolation::NestedWait)?;
        let _waiting = WaitingFlag(&self.shared.waiting);

        let Some(limit) = timeout else {
            self.drain().await;
            return Ok(WaitOutcome::Drained);
        };

        if tokio::time::timeout(limit, self.drain()).await.is_ok() {
            Ok(WaitOutcome::Drained)
        } else {
            tracing::info!(
                pending = self.pending(),
                timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                "Validation wait timed out"
            );
            Ok(WaitOutcome::TimedOut)
        }
    }

    /// Polls the live set until it is empty.
    async fn drain(&self) {
        loop {
            let drained = self.shared.live.lock().is_empty();
            if drained {
                return;
            }
            tokio::task::yield_now().await;
            if !self.poll_interval.is_zero() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    /// Aborts every pending task and rejects further use.
    ///
    /// Cancellation is best effort: a task that is already running finishes
    /// its current poll.
    pub fn close(&self) {
        let handles: Vec<AbortHandle> = {
            let mut live = self.shared.live.lock();
            self.shared.closed.store(true, Ordering::SeqCst);
            live.drain().filter_map(|(_, handle)| handle).collect()
        };
        if !handles.is_empty() {
            tracing::debug!(aborted = handles.len(), "Abandoning pending validation tasks");
        }
        for handle in handles {
            handle.abort();
        }
    }
}

impl Drop for ValidationCoordinator {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Tests
// =============================================================================
