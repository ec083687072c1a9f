//! Offline-first repositories.
//!
//! Every read returns an [`Observation`]: a lazy stream that emits the cached
//! value first, when one exists, and then the network value. Successful
//! network values are written to the local store before they are emitted;
//! failures never touch the cache. Writes go to the network first and mirror
//! the confirmed result locally.
//!
//! A `401` from any call forgets the stored token and publishes
//! [`AuthEvent::ReauthenticationRequired`](crate::auth::AuthEvent) through
//! the shared [`AuthenticationEvents`](crate::auth::AuthenticationEvents)
//! handle, in addition to returning `Unauthorized` to the caller.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use futures::future::FutureExt;
//! use quizzical::auth::{AuthenticationEvents, InMemoryCredentialStore};
//! use quizzical::model::{QuizDraft, QuizListing};
//! use quizzical::outcome::Outcome;
//! use quizzical::remote::{QuizRemote, RemoteCall, RemoteOutcome};
//! use quizzical::repository::QuizRepository;
//! use quizzical::store::InMemoryStore;
//!
//! struct Server;
//!
//! impl QuizRemote for Server {
//!     fn fetch_quiz(&self, quiz_id: &str) -> RemoteCall<QuizListing> {
//!         let quiz = QuizListing::new(quiz_id, "u1", "Capitals (updated)");
//!         async move { RemoteOutcome::delivered(quiz) }.boxed()
//!     }
//!     fn fetch_quizzes_by_owner(&self, _: &str) -> RemoteCall<Vec<QuizListing>> {
//!         async { RemoteOutcome::delivered(Vec::new()) }.boxed()
//!     }
//!     fn create_quiz(&self, _: QuizDraft) -> RemoteCall<QuizListing> {
//!         async { RemoteOutcome::status(500) }.boxed()
//!     }
//!     fn delete_quiz(&self, _: &str) -> RemoteCall<()> {
//!         async { RemoteOutcome::Delivered(None) }.boxed()
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(InMemoryStore::with_rows(vec![QuizListing::new("q1", "u1", "Capitals")]));
//! let auth = AuthenticationEvents::new(Arc::new(InMemoryCredentialStore::new()));
//! let repository = QuizRepository::new(store, Arc::new(Server), auth);
//!
//! let titles: Vec<String> = repository
//!     .observe_quiz("q1")
//!     .filter_map(|outcome| async move { outcome.success() })
//!     .map(|quiz| quiz.title)
//!     .collect()
//!     .await;
//!
//! assert_eq!(titles, ["Capitals", "Capitals (updated)"]);
//! # });
//! ```

mod quiz;
mod reconciler;
mod result;
#[cfg(test)]
mod script;
mod user;

pub use quiz::QuizRepository;
pub use reconciler::{Observation, Reconciler};
pub use result::QuizResultRepository;
pub use user::UserRepository;

pub(crate) use reconciler::log_store_failure;
