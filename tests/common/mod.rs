//! Scripted network fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::{self, FutureExt};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use quizzical::auth::{AuthenticationEvents, InMemoryCredentialStore};
use quizzical::model::{
    Credentials, ProfileUpdate, QuizDraft, QuizListing, QuizResponse, QuizResultListing, Session,
    SignupRequest, UserProfile,
};
use quizzical::remote::{QuizRemote, QuizResultRemote, RemoteCall, RemoteOutcome, UserRemote};

// =============================================================================
// Replies
// =============================================================================

enum Reply<T> {
    Ready(RemoteOutcome<T>),
    Gated(oneshot::Receiver<RemoteOutcome<T>>),
    Never,
}

/// Queue of replies for one endpoint, consumed one per call.
pub struct Replies<T> {
    queue: Mutex<VecDeque<Reply<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Replies<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T: Send + 'static> Replies<T> {
    /// Answers the next call with `outcome`.
    pub fn ready(&self, outcome: RemoteOutcome<T>) -> &Self {
        self.queue.lock().push_back(Reply::Ready(outcome));
        self
    }

    /// Holds the next call until the returned sender fires.
    pub fn gated(&self) -> oneshot::Sender<RemoteOutcome<T>> {
        let (sender, receiver) = oneshot::channel();
        self.queue.lock().push_back(Reply::Gated(receiver));
        sender
    }

    /// Never answers the next call.
    pub fn never(&self) -> &Self {
        self.queue.lock().push_back(Reply::Never);
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> RemoteCall<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.queue.lock().pop_front() {
            Some(Reply::Ready(outcome)) => future::ready(outcome).boxed(),
            Some(Reply::Gated(receiver)) => async move {
                receiver
                    .await
                    .unwrap_or_else(|_| RemoteOutcome::unreachable("gate dropped"))
            }
            .boxed(),
            Some(Reply::Never) => future::pending().boxed(),
            None => future::ready(RemoteOutcome::unreachable("no reply scripted")).boxed(),
        }
    }
}

// =============================================================================
// Servers
// =============================================================================

/// Fake account endpoints.
#[derive(Default)]
pub struct UserServer {
    pub login: Replies<Session>,
    pub signup: Replies<Session>,
    pub fetch: Replies<UserProfile>,
    pub update: Replies<UserProfile>,
    pub delete: Replies<()>,
}

impl UserRemote for UserServer {
    fn login(&self, _: Credentials) -> RemoteCall<Session> {
        self.login.next()
    }

    fn signup(&self, _: SignupRequest) -> RemoteCall<Session> {
        self.signup.next()
    }

    fn fetch_profile(&self, _: &str) -> RemoteCall<UserProfile> {
        self.fetch.next()
    }

    fn update_profile(&self, _: &str, _: ProfileUpdate) -> RemoteCall<UserProfile> {
        self.update.next()
    }

    fn delete_account(&self, _: &str) -> RemoteCall<()> {
        self.delete.next()
    }
}

/// Fake quiz endpoints.
#[derive(Default)]
pub struct QuizServer {
    pub fetch: Replies<QuizListing>,
    pub list: Replies<Vec<QuizListing>>,
    pub create: Replies<QuizListing>,
    pub delete: Replies<()>,
}

impl QuizRemote for QuizServer {
    fn fetch_quiz(&self, _: &str) -> RemoteCall<QuizListing> {
        self.fetch.next()
    }

    fn fetch_quizzes_by_owner(&self, _: &str) -> RemoteCall<Vec<QuizListing>> {
        self.list.next()
    }

    fn create_quiz(&self, _: QuizDraft) -> RemoteCall<QuizListing> {
        self.create.next()
    }

    fn delete_quiz(&self, _: &str) -> RemoteCall<()> {
        self.delete.next()
    }
}

/// Fake result endpoints.
#[derive(Default)]
pub struct ResultServer {
    pub fetch: Replies<QuizResultListing>,
    pub list: Replies<Vec<QuizResultListing>>,
    pub submit: Replies<QuizResultListing>,
}

impl QuizResultRemote for ResultServer {
    fn fetch_result(&self, _: &str) -> RemoteCall<QuizResultListing> {
        self.fetch.next()
    }

    fn fetch_results_by_taker(&self, _: &str) -> RemoteCall<Vec<QuizResultListing>> {
        self.list.next()
    }

    fn submit_response(&self, _: QuizResponse) -> RemoteCall<QuizResultListing> {
        self.submit.next()
    }
}

/// A signed-in authentication channel and its credential store.
pub fn signed_in() -> (Arc<InMemoryCredentialStore>, AuthenticationEvents) {
    let credentials = Arc::new(InMemoryCredentialStore::with_token("token"));
    let events = AuthenticationEvents::new(credentials.clone());
    (credentials, events)
}
