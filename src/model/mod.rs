//! Records exchanged with the quiz service and cached locally.
//!
//! These are opaque serializable records: the core only relies on their
//! keys and owners (see [`CacheRow`]).

mod errors;

pub use errors::{LoginErrors, ProfileErrors, QuizErrors, QuizResponseErrors, SignupErrors};

use serde::{Deserialize, Serialize};

use crate::store::CacheRow;

// =============================================================================
// UserProfile
// =============================================================================

/// The profile of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable user identifier.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
}

impl UserProfile {
    /// Creates a profile with empty names.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }
}

impl CacheRow for UserProfile {
    fn key(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// QuizListing
// =============================================================================

/// A quiz as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizListing {
    /// Stable quiz identifier.
    pub id: String,
    /// Identifier of the user who authored the quiz.
    pub owner_id: String,
    /// Display title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Deadline after which responses are rejected, as sent by the server.
    #[serde(default)]
    pub due_date: Option<String>,
}

impl QuizListing {
    /// Creates a listing with no description or deadline.
    #[must_use]
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            title: title.into(),
            description: String::new(),
            due_date: None,
        }
    }
}

impl CacheRow for QuizListing {
    fn key(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.owner_id
    }
}

// =============================================================================
// QuizResultListing
// =============================================================================

/// A graded response to a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResultListing {
    /// Stable result identifier.
    pub id: String,
    /// The quiz that was answered.
    pub quiz_id: String,
    /// The user who answered it.
    pub taker_id: String,
    /// Title of the quiz at submission time.
    #[serde(default)]
    pub quiz_title: String,
    /// Points awarded, once graded.
    #[serde(default)]
    pub score: Option<u32>,
    /// Points available.
    #[serde(default)]
    pub max_score: Option<u32>,
}

impl QuizResultListing {
    /// Creates an ungraded result.
    #[must_use]
    pub fn new(id: impl Into<String>, quiz_id: impl Into<String>, taker_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            quiz_id: quiz_id.into(),
            taker_id: taker_id.into(),
            quiz_title: String::new(),
            score: None,
            max_score: None,
        }
    }

    /// Sets the score.
    #[must_use]
    pub const fn with_score(mut self, score: u32, max_score: u32) -> Self {
        self.score = Some(score);
        self.max_score = Some(max_score);
        self
    }
}

impl CacheRow for QuizResultListing {
    fn key(&self) -> &str {
        &self.id
    }

    fn owner(&self) -> &str {
        &self.taker_id
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Login request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

/// Signup request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Desired login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Profile edit request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New login name.
    pub username: String,
    /// New contact address.
    pub email: String,
    /// New given name.
    pub first_name: String,
    /// New family name.
    pub last_name: String,
}

/// A question inside a [`QuizDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    /// The question text.
    pub prompt: String,
    /// Possible answers.
    pub choices: Vec<String>,
    /// Index into `choices` of the correct answer.
    pub answer: usize,
}

/// A quiz to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Optional deadline.
    pub due_date: Option<String>,
    /// The questions.
    pub questions: Vec<QuestionDraft>,
}

/// One chosen answer in a [`QuizResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The question being answered.
    pub question_id: String,
    /// Index of the chosen answer.
    pub choice: usize,
}

/// A set of answers submitted for grading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResponse {
    /// The quiz being answered.
    pub quiz_id: String,
    /// The chosen answers.
    pub answers: Vec<Answer>,
}

/// A successful login or signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The signed-in user.
    pub user: UserProfile,
}
