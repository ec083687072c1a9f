//! # quizzical
//!
//! Client core for a quiz-taking service: offline-first repositories over a
//! local cache, and coordinated client-side form validation.
//!
//! ## Overview
//!
//! - **Outcomes**: every boundary call settles into a closed [`Outcome`]
//!   taxonomy; HTTP-like statuses are mapped once, in [`remote`].
//! - **Repositories**: reads emit the cached value first and the network
//!   value second, writing through to the local store in between. Writes
//!   mirror only confirmed results.
//! - **Validation coordination**: field checks run as fire-and-forget tasks
//!   on a [`ValidationCoordinator`]; submission waits for them with a
//!   timeout.
//! - **Authentication events**: a `401` anywhere clears the session and is
//!   broadcast to whoever routes the UI.
//!
//! ## Feature Flags
//!
//! - `file-store`: [`JsonFileStore`](store::JsonFileStore), a JSON file
//!   backed cache (default)
//! - `telemetry`: [`telemetry::init`] for installing a `tracing` subscriber
//!   (default)
//!
//! ## Example
//!
//! ```rust
//! use quizzical::prelude::*;
//!
//! let outcome: Outcome<(), LoginErrors> = RemoteOutcome::<()>::status(403).into_outcome();
//! assert_eq!(outcome.failure_reason(), Some(FailureReason::Forbidden));
//! ```
//!
//! [`Outcome`]: outcome::Outcome
//! [`ValidationCoordinator`]: coordinator::ValidationCoordinator

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// ```rust
/// use quizzical::prelude::*;
/// ```
pub mod prelude {
    pub use crate::auth::{AuthEvent, AuthenticationEvents, CredentialStore, InMemoryCredentialStore};
    pub use crate::config::ClientConfig;
    pub use crate::coordinator::{ContractViolation, ValidationCoordinator, WaitOutcome};
    pub use crate::form::{Form, FormController};
    pub use crate::model::*;
    pub use crate::outcome::{ErrorPayload, FailureReason, FieldErrors, NoFieldErrors, Outcome};
    pub use crate::remote::{QuizRemote, QuizResultRemote, RemoteCall, RemoteOutcome, UserRemote};
    pub use crate::repository::{Observation, QuizRepository, QuizResultRepository, UserRepository};
    pub use crate::store::{CacheRow, InMemoryStore, LocalStore};
}

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod form;
pub mod model;
pub mod outcome;
pub mod remote;
pub mod repository;
pub mod store;

#[cfg(feature = "telemetry")]
pub mod telemetry;
