//! Network collaborators.
//!
//! Each resource family has a remote trait with one method per endpoint.
//! Methods never fail: every call settles into a [`RemoteOutcome`], which the
//! repositories map onto the outcome taxonomy.
//!
//! The outbound request layer (HTTP client, token attachment) lives outside
//! this crate; it implements these traits and can build outcomes from raw
//! responses with [`RemoteOutcome::from_http`] and
//! [`RemoteOutcome::from_io_error`].

mod outcome;

pub use outcome::{EXPIRATION_FIELD, RemoteOutcome, map_rejection};

use futures::future::BoxFuture;

use crate::model::{
    Credentials, ProfileUpdate, QuizDraft, QuizListing, QuizResponse, QuizResultListing, Session,
    SignupRequest, UserProfile,
};

/// A pending network call.
pub type RemoteCall<T> = BoxFuture<'static, RemoteOutcome<T>>;

/// Endpoints for accounts and user profiles.
pub trait UserRemote: Send + Sync + 'static {
    /// Exchanges credentials for a session.
    fn login(&self, credentials: Credentials) -> RemoteCall<Session>;

    /// Registers a new account and signs it in.
    fn signup(&self, request: SignupRequest) -> RemoteCall<Session>;

    /// Fetches the profile of `user_id`.
    fn fetch_profile(&self, user_id: &str) -> RemoteCall<UserProfile>;

    /// Replaces the editable profile fields of `user_id`.
    fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> RemoteCall<UserProfile>;

    /// Deletes the account of `user_id`.
    fn delete_account(&self, user_id: &str) -> RemoteCall<()>;
}

/// Endpoints for quiz listings.
pub trait QuizRemote: Send + Sync + 'static {
    /// Fetches one quiz.
    fn fetch_quiz(&self, quiz_id: &str) -> RemoteCall<QuizListing>;

    /// Fetches every quiz authored by `owner_id`.
    fn fetch_quizzes_by_owner(&self, owner_id: &str) -> RemoteCall<Vec<QuizListing>>;

    /// Creates a quiz.
    fn create_quiz(&self, draft: QuizDraft) -> RemoteCall<QuizListing>;

    /// Deletes a quiz.
    fn delete_quiz(&self, quiz_id: &str) -> RemoteCall<()>;
}

/// Endpoints for graded quiz results.
pub trait QuizResultRemote: Send + Sync + 'static {
    /// Fetches one result.
    fn fetch_result(&self, result_id: &str) -> RemoteCall<QuizResultListing>;

    /// Fetches every result of quizzes taken by `taker_id`.
    fn fetch_results_by_taker(&self, taker_id: &str) -> RemoteCall<Vec<QuizResultListing>>;

    /// Submits answers for grading.
    fn submit_response(&self, response: QuizResponse) -> RemoteCall<QuizResultListing>;
}
