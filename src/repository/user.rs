use std::fmt;
use std::sync::Arc;

use crate::auth::AuthenticationEvents;
use crate::model::{
    Credentials, LoginErrors, ProfileErrors, ProfileUpdate, Session, SignupErrors, SignupRequest,
    UserProfile,
};
use crate::outcome::{FieldErrors, Outcome};
use crate::remote::UserRemote;
use crate::store::LocalStore;

use super::{Observation, Reconciler, log_store_failure};

/// Accounts and profiles.
///
/// Login and signup store the session token and announce the user through
/// [`AuthenticationEvents`]; logout and account deletion forget it.
pub struct UserRepository<S: ?Sized, N: ?Sized> {
    store: Arc<S>,
    remote: Arc<N>,
    reconciler: Reconciler,
}

impl<S: ?Sized, N: ?Sized> Clone for UserRepository<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            remote: Arc::clone(&self.remote),
            reconciler: self.reconciler.clone(),
        }
    }
}

impl<S: ?Sized, N: ?Sized> fmt::Debug for UserRepository<S, N> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UserRepository")
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl<S, N> UserRepository<S, N>
where
    S: LocalStore<UserProfile> + ?Sized + 'static,
    N: UserRemote + ?Sized,
{
    /// Creates a repository over `store` and `remote`.
    #[must_use]
    pub const fn new(store: Arc<S>, remote: Arc<N>, auth: AuthenticationEvents) -> Self {
        Self {
            store,
            remote,
            reconciler: Reconciler::new(auth),
        }
    }

    /// Observes the profile of `user_id`.
    pub fn observe_profile(&self, user_id: &str) -> Observation<UserProfile> {
        let remote = Arc::clone(&self.remote);
        let id = user_id.to_owned();
        self.reconciler.observe_one(Arc::clone(&self.store), user_id.to_owned(), move || {
            remote.fetch_profile(&id)
        })
    }

    /// Logs in and returns the signed-in profile.
    pub async fn login(&self, credentials: Credentials) -> Outcome<UserProfile, LoginErrors> {
        let outcome = self.reconciler.settle(self.remote.login(credentials).await);
        self.start_session(outcome).await
    }

    /// Registers an account and returns the signed-in profile.
    pub async fn signup(&self, request: SignupRequest) -> Outcome<UserProfile, SignupErrors> {
        let outcome = self.reconciler.settle(self.remote.signup(request).await);
        self.start_session(outcome).await
    }

    async fn start_session<E: FieldErrors>(&self, outcome: Outcome<Session, E>) -> Outcome<UserProfile, E> {
        match outcome {
            Outcome::Success(Session { token, user }) => {
                self.reconciler.auth().signed_in(token, &user.id);
                let cached = self.store.upsert_all(vec![user.clone()]).await;
                log_store_failure("cache signed-in user", &user.id, cached);
                Outcome::Success(user)
            }
            other => other.map(|session| session.user),
        }
    }

    /// Replaces the editable profile fields and caches the saved profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Outcome<UserProfile, ProfileErrors> {
        self.reconciler
            .mutate(self.remote.update_profile(user_id, update), |profile| {
                self.store.upsert_all(vec![profile])
            })
            .await
    }

    /// Deletes the account, its cached profile, and the session.
    pub async fn delete_account(&self, user_id: &str) -> Outcome<()> {
        let outcome = self
            .reconciler
            .mutate_unit(self.remote.delete_account(user_id), || self.store.delete_by_key(user_id))
            .await;
        if outcome.is_success() {
            self.reconciler.auth().signed_out();
        }
        outcome
    }

    /// Ends the session locally.
    ///
    /// Forgets the token and clears every cached profile. No request is sent.
    pub async fn logout(&self) {
        log_store_failure("clear profiles", "*", self.store.delete_all().await);
        self.reconciler.auth().signed_out();
    }
}

// =============================================================================
// Tests
// =============================================================================
