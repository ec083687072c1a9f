//! Authentication events and bearer-token storage.
//!
//! Repositories publish on an [`AuthenticationEvents`] handle passed in at
//! construction; a top-level router subscribes to it instead of polling
//! shared state.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use quizzical::auth::{AuthEvent, AuthenticationEvents, CredentialStore, InMemoryCredentialStore};
//!
//! let credentials = Arc::new(InMemoryCredentialStore::with_token("abc"));
//! let events = AuthenticationEvents::new(credentials.clone());
//! let mut receiver = events.subscribe();
//!
//! events.require_reauthentication();
//!
//! assert_eq!(credentials.token(), None);
//! assert_eq!(receiver.try_recv().unwrap(), AuthEvent::ReauthenticationRequired);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Number of events a slow subscriber may lag behind before missing some.
const EVENT_CAPACITY: usize = 16;

// =============================================================================
// CredentialStore
// =============================================================================

/// Storage for the bearer token attached to outbound requests.
pub trait CredentialStore: Send + Sync + 'static {
    /// Returns the current token.
    fn token(&self) -> Option<String>;

    /// Replaces the current token.
    fn set_token(&self, token: String);

    /// Forgets the current token.
    fn clear(&self);
}

/// A credential store that keeps the token in memory.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InMemoryCredentialStore")
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_token(&self, token: String) {
        *self.token.write() = Some(token);
    }

    fn clear(&self) {
        *self.token.write() = None;
    }
}

// =============================================================================
// AuthenticationEvents
// =============================================================================

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A user logged in or signed up.
    SignedIn {
        /// The signed-in user.
        user_id: String,
    },
    /// The user logged out.
    SignedOut,
    /// The server rejected the session; the user must log in again.
    ReauthenticationRequired,
}

/// Process-wide authentication signal.
///
/// Cloning the handle shares the same channel and credential store.
#[derive(Clone)]
pub struct AuthenticationEvents {
    sender: broadcast::Sender<AuthEvent>,
    credentials: Arc<dyn CredentialStore>,
}

impl fmt::Debug for AuthenticationEvents {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthenticationEvents")
            .field("subscribers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

impl AuthenticationEvents {
    /// Creates a channel backed by `credentials`.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sender,
            credentials,
        }
    }

    /// Subscribes to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Returns the credential store.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Returns `true` while a bearer token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.token().is_some()
    }

    /// Stores `token` and announces the signed-in user.
    pub fn signed_in(&self, token: String, user_id: &str) {
        self.credentials.set_token(token);
        tracing::info!(user_id, "User signed in");
        self.publish(AuthEvent::SignedIn {
            user_id: user_id.to_owned(),
        });
    }

    /// Forgets the token and announces the sign-out.
    pub fn signed_out(&self) {
        self.credentials.clear();
        tracing::info!("User signed out");
        self.publish(AuthEvent::SignedOut);
    }

    /// Forgets the token and asks the router to show the login screen.
    pub fn require_reauthentication(&self) {
        self.credentials.clear();
        tracing::info!("Session rejected by server, re-authentication required");
        self.publish(AuthEvent::ReauthenticationRequired);
    }

    fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("No subscribers for authentication event");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
