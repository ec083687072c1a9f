use std::fmt;
use std::sync::Arc;

use crate::auth::AuthenticationEvents;
use crate::model::{QuizDraft, QuizErrors, QuizListing};
use crate::outcome::Outcome;
use crate::remote::QuizRemote;
use crate::store::LocalStore;

use super::{Observation, Reconciler};

/// Quiz listings, cached per quiz and per author.
pub struct QuizRepository<S: ?Sized, N: ?Sized> {
    store: Arc<S>,
    remote: Arc<N>,
    reconciler: Reconciler,
}

impl<S: ?Sized, N: ?Sized> Clone for QuizRepository<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            remote: Arc::clone(&self.remote),
            reconciler: self.reconciler.clone(),
        }
    }
}

impl<S: ?Sized, N: ?Sized> fmt::Debug for QuizRepository<S, N> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QuizRepository")
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl<S, N> QuizRepository<S, N>
where
    S: LocalStore<QuizListing> + ?Sized + 'static,
    N: QuizRemote + ?Sized,
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

    /// Observes one quiz.
    pub fn observe_quiz(&self, quiz_id: &str) -> Observation<QuizListing> {
        let remote = Arc::clone(&self.remote);
        let id = quiz_id.to_owned();
        self.reconciler.observe_one(Arc::clone(&self.store), quiz_id.to_owned(), move || {
            remote.fetch_quiz(&id)
        })
    }

    /// Observes every quiz authored by `owner_id`.
    pub fn observe_quizzes_by_owner(&self, owner_id: &str) -> Observation<Vec<QuizListing>> {
        let remote = Arc::clone(&self.remote);
        let owner = owner_id.to_owned();
        self.reconciler.observe_many(Arc::clone(&self.store), owner_id.to_owned(), move || {
            remote.fetch_quizzes_by_owner(&owner)
        })
    }

    /// Creates a quiz and caches the listing the server returns.
    pub async fn create_quiz(&self, draft: QuizDraft) -> Outcome<QuizListing, QuizErrors> {
        self.reconciler
            .mutate(self.remote.create_quiz(draft), |quiz| self.store.upsert_all(vec![quiz]))
            .await
    }

    /// Deletes a quiz and drops its cached listing.
    pub async fn delete_quiz(&self, quiz_id: &str) -> Outcome<()> {
        self.reconciler
            .mutate_unit(self.remote.delete_quiz(quiz_id), || self.store.delete_by_key(quiz_id))
            .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthEvent, InMemoryCredentialStore};
    use crate::outcome::{ErrorPayload, FailureReason};
    use crate::remote::{RemoteCall, RemoteOutcome};
    use crate::repository::script::Script;
    use crate::store::InMemoryStore;
    use futures::StreamExt;
    use rstest::{fixture, rstest};

    #[derive(Default)]
    struct FakeQuizRemote {
        fetch: Script<QuizListing>,
        list: Script<Vec<QuizListing>>,
        create: Script<QuizListing>,
        delete: Script<()>,
    }

    impl QuizRemote for FakeQuizRemote {
        fn fetch_quiz(&self, _: &str) -> RemoteCall<QuizListing> {
            self.fetch.call()
        }

        fn fetch_quizzes_by_owner(&self, _: &str) -> RemoteCall<Vec<QuizListing>> {
            self.list.call()
        }

        fn create_quiz(&self, _: QuizDraft) -> RemoteCall<QuizListing> {
            self.create.call()
        }

        fn delete_quiz(&self, _: &str) -> RemoteCall<()> {
            self.delete.call()
        }
    }

    type Repository = QuizRepository<InMemoryStore<QuizListing>, FakeQuizRemote>;

    #[fixture]
    fn auth() -> AuthenticationEvents {
        AuthenticationEvents::new(Arc::new(InMemoryCredentialStore::with_token("token")))
    }

    fn repository(
        rows: Vec<QuizListing>,
        remote: FakeQuizRemote,
        auth: AuthenticationEvents,
    ) -> (Arc<InMemoryStore<QuizListing>>, Arc<FakeQuizRemote>, Repository) {
        let store = Arc::new(InMemoryStore::with_rows(rows));
        let remote = Arc::new(remote);
        let repository = QuizRepository::new(Arc::clone(&store), Arc::clone(&remote), auth);
        (store, remote, repository)
    }

    #[rstest]
    #[tokio::test]
    async fn cached_quiz_is_emitted_before_network_quiz(auth: AuthenticationEvents) {
        let cached = QuizListing::new("q1", "u1", "Capitals");
        let fresh = QuizListing::new("q1", "u1", "World capitals");
        let remote = FakeQuizRemote {
            fetch: Script::new([RemoteOutcome::delivered(fresh.clone())]),
            ..FakeQuizRemote::default()
        };
        let (store, _, repository) = repository(vec![cached.clone()], remote, auth);

        let emitted: Vec<_> = repository.observe_quiz("q1").collect().await;

        assert_eq!(emitted, vec![Outcome::Success(cached), Outcome::Success(fresh.clone())]);
        assert_eq!(store.rows(), vec![fresh]);
    }

    #[rstest]
    #[tokio::test]
    async fn observation_is_lazy(auth: AuthenticationEvents) {
        let (_, remote, repository) = repository(Vec::new(), FakeQuizRemote::default(), auth);

        let observation = repository.observe_quiz("q1");
        assert_eq!(remote.fetch.calls(), 0);

        drop(observation);
        assert_eq!(remote.fetch.calls(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn not_found_removes_stale_row(auth: AuthenticationEvents) {
        let remote = FakeQuizRemote {
            fetch: Script::new([RemoteOutcome::status(404)]),
            ..FakeQuizRemote::default()
        };
        let (store, _, repository) =
            repository(vec![QuizListing::new("q1", "u1", "Capitals")], remote, auth);

        let emitted: Vec<_> = repository.observe_quiz("q1").collect().await;

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[1], Outcome::Failure(FailureReason::NotFound));
        assert!(store.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn network_failure_keeps_cached_list(auth: AuthenticationEvents) {
        let rows = vec![QuizListing::new("q1", "u1", "Capitals")];
        let remote = FakeQuizRemote {
            list: Script::new([RemoteOutcome::unreachable("offline")]),
            ..FakeQuizRemote::default()
        };
        let (store, _, repository) = repository(rows.clone(), remote, auth);

        let emitted: Vec<_> = repository.observe_quizzes_by_owner("u1").collect().await;

        assert_eq!(
            emitted,
            vec![Outcome::Success(rows.clone()), Outcome::Failure(FailureReason::NetworkError)]
        );
        assert_eq!(store.rows(), rows);
    }

    #[rstest]
    #[tokio::test]
    async fn network_list_replaces_owner_rows(auth: AuthenticationEvents) {
        let remote = FakeQuizRemote {
            list: Script::new([RemoteOutcome::delivered(vec![QuizListing::new("q2", "u1", "Rivers")])]),
            ..FakeQuizRemote::default()
        };
        let (store, _, repository) = repository(
            vec![
                QuizListing::new("q1", "u1", "Capitals"),
                QuizListing::new("q9", "u2", "Someone else's"),
            ],
            remote,
            auth,
        );

        let emitted: Vec<_> = repository.observe_quizzes_by_owner("u1").collect().await;

        assert_eq!(emitted.len(), 2);
        let keys: Vec<String> = store.rows().into_iter().map(|quiz| quiz.id).collect();
        assert_eq!(keys, ["q2", "q9"]);
    }

    #[rstest]
    #[tokio::test]
    async fn create_quiz_caches_created_listing(auth: AuthenticationEvents) {
        let created = QuizListing::new("q7", "u1", "Rivers");
        let remote = FakeQuizRemote {
            create: Script::new([RemoteOutcome::delivered(created.clone())]),
            ..FakeQuizRemote::default()
        };
        let (store, _, repository) = repository(Vec::new(), remote, auth);

        let outcome = repository.create_quiz(QuizDraft::default()).await;

        assert_eq!(outcome, Outcome::Success(created.clone()));
        assert_eq!(store.rows(), vec![created]);
    }

    #[rstest]
    #[tokio::test]
    async fn create_quiz_reports_field_errors(auth: AuthenticationEvents) {
        let payload = ErrorPayload::new().with("title", "This field may not be blank.");
        let remote = FakeQuizRemote {
            create: Script::new([RemoteOutcome::rejected(400, payload)]),
            ..FakeQuizRemote::default()
        };
        let (store, _, repository) = repository(Vec::new(), remote, auth);

        let outcome = repository.create_quiz(QuizDraft::default()).await;

        let errors: &QuizErrors = outcome.field_errors().unwrap();
        assert_eq!(errors.title.as_deref(), Some("This field may not be blank."));
        assert!(store.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn delete_quiz_removes_row_only_on_success(auth: AuthenticationEvents) {
        let remote = FakeQuizRemote {
            delete: Script::new([RemoteOutcome::status(403), RemoteOutcome::Delivered(None)]),
            ..FakeQuizRemote::default()
        };
        let (store, _, repository) =
            repository(vec![QuizListing::new("q1", "u1", "Capitals")], remote, auth);

        assert_eq!(
            repository.delete_quiz("q1").await,
            Outcome::Failure(FailureReason::Forbidden)
        );
        assert_eq!(store.len(), 1);

        assert_eq!(repository.delete_quiz("q1").await, Outcome::Success(()));
        assert!(store.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn unauthorized_requests_reauthentication(auth: AuthenticationEvents) {
        let mut receiver = auth.subscribe();
        let remote = FakeQuizRemote {
            fetch: Script::new([RemoteOutcome::status(401)]),
            ..FakeQuizRemote::default()
        };
        let (_, _, repository) = repository(Vec::new(), remote, auth.clone());

        let emitted: Vec<_> = repository.observe_quiz("q1").collect().await;

        assert_eq!(emitted, vec![Outcome::Failure(FailureReason::Unauthorized)]);
        assert_eq!(receiver.try_recv().unwrap(), AuthEvent::ReauthenticationRequired);
        assert!(!auth.is_authenticated());
    }
}
