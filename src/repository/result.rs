use std::fmt;
use std::sync::Arc;

use crate::auth::AuthenticationEvents;
use crate::model::{QuizResponse, QuizResponseErrors, QuizResultListing};
use crate::outcome::Outcome;
use crate::remote::QuizResultRemote;
use crate::store::LocalStore;

use super::{Observation, Reconciler};

/// Graded quiz results, cached per result and per taker.
pub struct QuizResultRepository<S: ?Sized, N: ?Sized> {
    store: Arc<S>,
    remote: Arc<N>,
    reconciler: Reconciler,
}

impl<S: ?Sized, N: ?Sized> Clone for QuizResultRepository<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            remote: Arc::clone(&self.remote),
            reconciler: self.reconciler.clone(),
        }
    }
}

impl<S: ?Sized, N: ?Sized> fmt::Debug for QuizResultRepository<S, N> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QuizResultRepository")
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl<S, N> QuizResultRepository<S, N>
where
    S: LocalStore<QuizResultListing> + ?Sized + 'static,
    N: QuizResultRemote + ?Sized,
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

    /// Observes one result.
    pub fn observe_result(&self, result_id: &str) -> Observation<QuizResultListing> {
        let remote = Arc::clone(&self.remote);
        let id = result_id.to_owned();
        self.reconciler.observe_one(Arc::clone(&self.store), result_id.to_owned(), move || {
            remote.fetch_result(&id)
        })
    }

    /// Observes every result of quizzes taken by `taker_id`.
    pub fn observe_results_by_taker(&self, taker_id: &str) -> Observation<Vec<QuizResultListing>> {
        let remote = Arc::clone(&self.remote);
        let taker = taker_id.to_owned();
        self.reconciler.observe_many(Arc::clone(&self.store), taker_id.to_owned(), move || {
            remote.fetch_results_by_taker(&taker)
        })
    }

    /// Submits answers and caches the graded result.
    ///
    /// A quiz past its deadline settles as
    /// [`FailureReason::Expired`](crate::outcome::FailureReason::Expired).
    pub async fn submit_response(
        &self,
        response: QuizResponse,
    ) -> Outcome<QuizResultListing, QuizResponseErrors> {
        let quiz_id = response.quiz_id.clone();
        let outcome = self
            .reconciler
            .mutate(self.remote.submit_response(response), |result| {
                self.store.upsert_all(vec![result])
            })
            .await;
        if let Some(reason) = outcome.failure_reason() {
            tracing::debug!(quiz_id = %quiz_id, %reason, "Quiz response was not accepted");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ErrorPayload, FailureReason};
    use crate::remote::{EXPIRATION_FIELD, RemoteCall, RemoteOutcome};
    use crate::repository::script::Script;
    use crate::auth::InMemoryCredentialStore;
    use crate::store::InMemoryStore;
    use futures::StreamExt;
    use rstest::rstest;

    #[derive(Default)]
    struct FakeResultRemote {
        fetch: Script<QuizResultListing>,
        list: Script<Vec<QuizResultListing>>,
        submit: Script<QuizResultListing>,
    }

    impl QuizResultRemote for FakeResultRemote {
        fn fetch_result(&self, _: &str) -> RemoteCall<QuizResultListing> {
            self.fetch.call()
        }

        fn fetch_results_by_taker(&self, _: &str) -> RemoteCall<Vec<QuizResultListing>> {
            self.list.call()
        }

        fn submit_response(&self, _: QuizResponse) -> RemoteCall<QuizResultListing> {
            self.submit.call()
        }
    }

    fn repository(
        rows: Vec<QuizResultListing>,
        remote: FakeResultRemote,
    ) -> (
        Arc<InMemoryStore<QuizResultListing>>,
        QuizResultRepository<InMemoryStore<QuizResultListing>, FakeResultRemote>,
    ) {
        let store = Arc::new(InMemoryStore::with_rows(rows));
        let auth = AuthenticationEvents::new(Arc::new(InMemoryCredentialStore::new()));
        let repository = QuizResultRepository::new(Arc::clone(&store), Arc::new(remote), auth);
        (store, repository)
    }

    fn response() -> QuizResponse {
        QuizResponse {
            quiz_id: "q1".to_string(),
            answers: Vec::new(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn missing_cache_emits_only_network_result() {
        let graded = QuizResultListing::new("r1", "q1", "u2").with_score(4, 5);
        let remote = FakeResultRemote {
            fetch: Script::new([RemoteOutcome::delivered(graded.clone())]),
            ..FakeResultRemote::default()
        };
        let (store, repository) = repository(Vec::new(), remote);

        let emitted: Vec<_> = repository.observe_result("r1").collect().await;

        assert_eq!(emitted, vec![Outcome::Success(graded.clone())]);
        assert_eq!(store.rows(), vec![graded]);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_network_list_purges_taker_rows() {
        let remote = FakeResultRemote {
            list: Script::new([RemoteOutcome::delivered(Vec::new())]),
            ..FakeResultRemote::default()
        };
        let (store, repository) = repository(
            vec![
                QuizResultListing::new("r1", "q1", "u2"),
                QuizResultListing::new("r2", "q1", "u3"),
            ],
            remote,
        );

        let emitted: Vec<_> = repository.observe_results_by_taker("u2").collect().await;

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[1], Outcome::Success(Vec::new()));
        assert_eq!(store.rows(), vec![QuizResultListing::new("r2", "q1", "u3")]);
    }

    #[rstest]
    #[tokio::test]
    async fn submit_response_caches_graded_result() {
        let graded = QuizResultListing::new("r9", "q1", "u2").with_score(2, 3);
        let remote = FakeResultRemote {
            submit: Script::new([RemoteOutcome::delivered(graded.clone())]),
            ..FakeResultRemote::default()
        };
        let (store, repository) = repository(Vec::new(), remote);

        assert_eq!(repository.submit_response(response()).await, Outcome::Success(graded.clone()));
        assert_eq!(store.rows(), vec![graded]);
    }

    #[rstest]
    #[tokio::test]
    async fn submit_after_deadline_is_expired() {
        let payload = ErrorPayload::new().with(EXPIRATION_FIELD, "This quiz has expired.");
        let remote = FakeResultRemote {
            submit: Script::new([RemoteOutcome::rejected(403, payload)]),
            ..FakeResultRemote::default()
        };
        let (store, repository) = repository(Vec::new(), remote);

        assert_eq!(
            repository.submit_response(response()).await,
            Outcome::Failure(FailureReason::Expired)
        );
        assert!(store.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn submit_with_invalid_answers_reports_field_errors() {
        let payload = ErrorPayload::new().with("answers", "Every question needs an answer.");
        let remote = FakeResultRemote {
            submit: Script::new([RemoteOutcome::rejected(400, payload)]),
            ..FakeResultRemote::default()
        };
        let (_, repository) = repository(Vec::new(), remote);

        let outcome = repository.submit_response(response()).await;

        assert_eq!(
            outcome.field_errors().and_then(|errors| errors.answers.as_deref()),
            Some("Every question needs an answer.")
        );
    }
}
