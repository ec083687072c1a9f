//! Local-then-network reconciliation shared by every resource family.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::auth::AuthenticationEvents;
use crate::outcome::{FailureReason, FieldErrors, NoFieldErrors, Outcome};
use crate::remote::{RemoteCall, RemoteOutcome};
use crate::store::{CacheRow, LocalStore, StoreResult};

/// A lazy sequence of read outcomes: the cached value first, if any, then
/// the network value.
///
/// Nothing runs until the stream is polled. Each call that returns an
/// `Observation` starts the algorithm from scratch; the stream itself cannot
/// be restarted. Dropping it while the network call is in flight cancels the
/// call and skips the write-through.
pub type Observation<T> = BoxStream<'static, Outcome<T>>;

/// Where a read sequence is.
enum Phase<F> {
    Local(F),
    Remote { fetch: F, had_local: bool },
    Done,
}

/// Maps network outcomes, raises the re-authentication signal, and runs the
/// two-phase read algorithm against a local store.
#[derive(Clone)]
pub struct Reconciler {
    auth: AuthenticationEvents,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Reconciler")
            .field("auth", &self.auth)
            .finish()
    }
}

impl Reconciler {
    /// Creates a reconciler that reports rejected sessions to `auth`.
    #[must_use]
    pub const fn new(auth: AuthenticationEvents) -> Self {
        Self { auth }
    }

    /// Returns the authentication channel.
    #[must_use]
    pub const fn auth(&self) -> &AuthenticationEvents {
        &self.auth
    }

    /// Maps a network outcome that must carry a body.
    pub fn settle<T, E: FieldErrors>(&self, remote: RemoteOutcome<T>) -> Outcome<T, E> {
        let outcome = remote.into_outcome();
        self.notice(&outcome);
        outcome
    }

    /// Maps a network outcome whose body is ignored.
    pub fn settle_unit<T, E: FieldErrors>(&self, remote: RemoteOutcome<T>) -> Outcome<(), E> {
        let outcome = remote.into_unit_outcome();
        self.notice(&outcome);
        outcome
    }

    fn notice<T, E>(&self, outcome: &Outcome<T, E>) {
        if outcome.failure_reason() == Some(FailureReason::Unauthorized) {
            self.auth.require_reauthentication();
        }
    }

    /// Settles a single round-trip mutation and mirrors a confirmed value
    /// into the local store.
    ///
    /// `mirror` runs only on `Success`; nothing is written speculatively.
    pub async fn mutate<T, E, F, Fut>(&self, call: RemoteCall<T>, mirror: F) -> Outcome<T, E>
    where
        T: Clone,
        E: FieldErrors,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = StoreResult<()>>,
    {
        let outcome = self.settle(call.await);
        if let Outcome::Success(value) = &outcome {
            if let Err(error) = mirror(value.clone()).await {
                tracing::warn!("Local cache update after mutation failed: {}", error);
            }
        }
        outcome
    }

    /// Like [`mutate`](Self::mutate) for endpoints whose body is ignored.
    pub async fn mutate_unit<T, E, F, Fut>(&self, call: RemoteCall<T>, mirror: F) -> Outcome<(), E>
    where
        E: FieldErrors,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<()>>,
    {
        let outcome = self.settle_unit(call.await);
        if outcome.is_success() {
            if let Err(error) = mirror().await {
                tracing::warn!("Local cache update after mutation failed: {}", error);
            }
        }
        outcome
    }

    /// Reads one row by key: cached row first, then the network row.
    ///
    /// A network `NotFound` removes the cached row that was just emitted.
    pub fn observe_one<R, S, F>(&self, store: Arc<S>, key: String, fetch: F) -> Observation<R>
    where
        R: CacheRow,
        S: LocalStore<R> + ?Sized + 'static,
        F: FnOnce() -> RemoteCall<R> + Send + 'static,
    {
        let reconciler = self.clone();
        stream::unfold(Phase::Local(fetch), move |phase| {
            let reconciler = reconciler.clone();
            let store = Arc::clone(&store);
            let key = key.clone();
            async move {
                match phase {
                    Phase::Local(fetch) => match read_cached_row(&*store, &key).await {
                        Some(row) => Some((
                            Outcome::Success(row),
                            Phase::Remote {
                                fetch,
                                had_local: true,
                            },
                        )),
                        None => {
                            let outcome = reconciler.refresh_one(&*store, &key, fetch, false).await;
                            Some((outcome, Phase::Done))
                        }
                    },
                    Phase::Remote { fetch, had_local } => {
                        let outcome = reconciler.refresh_one(&*store, &key, fetch, had_local).await;
                        Some((outcome, Phase::Done))
                    }
                    Phase::Done => None,
                }
            }
        })
        .boxed()
    }

    /// Reads every row of one owner: cached rows first, then the network rows.
    ///
    /// An empty cached list emits nothing. A successful network list
    /// replaces every cached row of the owner; an empty network list
    /// therefore purges them.
    pub fn observe_many<R, S, F>(&self, store: Arc<S>, owner: String, fetch: F) -> Observation<Vec<R>>
    where
        R: CacheRow,
        S: LocalStore<R> + ?Sized + 'static,
        F: FnOnce() -> RemoteCall<Vec<R>> + Send + 'static,
    {
        let reconciler = self.clone();
        stream::unfold(Phase::Local(fetch), move |phase| {
            let reconciler = reconciler.clone();
            let store = Arc::clone(&store);
            let owner = owner.clone();
            async move {
                match phase {
                    Phase::Local(fetch) => {
                        let rows = read_cached_rows(&*store, &owner).await;
                        if rows.is_empty() {
                            let outcome = reconciler.refresh_many(&*store, &owner, fetch).await;
                            Some((outcome, Phase::Done))
                        } else {
                            Some((
                                Outcome::Success(rows),
                                Phase::Remote {
                                    fetch,
                                    had_local: true,
                                },
                            ))
                        }
                    }
                    Phase::Remote { fetch, .. } => {
                        let outcome = reconciler.refresh_many(&*store, &owner, fetch).await;
                        Some((outcome, Phase::Done))
                    }
                    Phase::Done => None,
                }
            }
        })
        .boxed()
    }

    async fn refresh_one<R, S, F>(&self, store: &S, key: &str, fetch: F, had_local: bool) -> Outcome<R>
    where
        R: CacheRow,
        S: LocalStore<R> + ?Sized,
        F: FnOnce() -> RemoteCall<R>,
    {
        let outcome: Outcome<R, NoFieldErrors> = self.settle(fetch().await);
        match &outcome {
            Outcome::Success(row) => {
                log_store_failure("cache row", key, store.upsert_all(vec![row.clone()]).await);
            }
            Outcome::Failure(FailureReason::NotFound) if had_local => {
                tracing::debug!(key, "Server no longer has cached row, removing it");
                log_store_failure("remove stale row", key, store.delete_by_key(key).await);
            }
            Outcome::ValidationFailure(_) | Outcome::Failure(_) => {}
        }
        outcome
    }

    async fn refresh_many<R, S, F>(&self, store: &S, owner: &str, fetch: F) -> Outcome<Vec<R>>
    where
        R: CacheRow,
        S: LocalStore<R> + ?Sized,
        F: FnOnce() -> RemoteCall<Vec<R>>,
    {
        let outcome: Outcome<Vec<R>, NoFieldErrors> = self.settle(fetch().await);
        if let Outcome::Success(rows) = &outcome {
            if rows.is_empty() {
                tracing::debug!(owner, "Server reported no rows for owner, purging cache");
                log_store_failure("purge owner rows", owner, store.delete_all_by_owner(owner).await);
            } else {
                let replaced = store.replace_all_by_owner(owner, rows.clone()).await;
                log_store_failure("cache owner rows", owner, replaced);
            }
        }
        outcome
    }
}

async fn read_cached_row<R, S>(store: &S, key: &str) -> Option<R>
where
    R: CacheRow,
    S: LocalStore<R> + ?Sized,
{
    match store.get_by_key(key).await {
        Ok(row) => row,
        Err(error) => {
            tracing::warn!(key, "Failed to read cached row: {}", error);
            None
        }
    }
}

async fn read_cached_rows<R, S>(store: &S, owner: &str) -> Vec<R>
where
    R: CacheRow,
    S: LocalStore<R> + ?Sized,
{
    match store.get_all_by_owner(owner).await {
        Ok(rows) => rows,
        Err(error) => {
            tracing::warn!(owner, "Failed to read cached rows: {}", error);
            Vec::new()
        }
    }
}

/// Logs a failed cache write. The cache is advisory, so the caller carries on.
pub(crate) fn log_store_failure(operation: &str, subject: &str, result: StoreResult<()>) {
    if let Err(error) = result {
        tracing::warn!(operation, subject, "Local cache update failed: {}", error);
    }
}
