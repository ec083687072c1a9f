//! Scripted network responses for repository tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::FutureExt;
use parking_lot::Mutex;

use crate::remote::{RemoteCall, RemoteOutcome};

/// Replays queued outcomes, one per call. Runs dry as `Unreachable`.
pub(crate) struct Script<T> {
    responses: Mutex<VecDeque<RemoteOutcome<T>>>,
    calls: AtomicUsize,
}

impl<T: Send + 'static> Script<T> {
    pub(crate) fn new(responses: impl IntoIterator<Item = RemoteOutcome<T>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn call(&self) -> RemoteCall<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| RemoteOutcome::unreachable("no scripted response"));
        async move { outcome }.boxed()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<T: Send + 'static> Default for Script<T> {
    fn default() -> Self {
        Self::new([])
    }
}
