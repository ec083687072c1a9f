//! Closed outcome taxonomy shared by every boundary call.
//!
//! Repository calls, form submissions and remote mappings all settle into
//! an [`Outcome`]. The variant set is closed so UI state machines can match
//! exhaustively without a fallback arm.
//!
//! # Examples
//!
//! ```rust
//! use quizzical::outcome::{FailureReason, NoFieldErrors, Outcome};
//!
//! let outcome: Outcome<u32> = Outcome::Failure(FailureReason::NotFound);
//! assert_eq!(outcome.failure_reason(), Some(FailureReason::NotFound));
//!
//! let doubled = Outcome::<u32, NoFieldErrors>::Success(21).map(|value| value * 2);
//! assert_eq!(doubled.success(), Some(42));
//! ```

mod field_errors;

pub use field_errors::{ErrorPayload, FieldErrors, NoFieldErrors, payload_value};
pub(crate) use field_errors::decode_record;

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// FailureReason
// =============================================================================

/// Categorized failure reasons derived from HTTP-status-like codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// The session is no longer valid (401). Triggers re-authentication.
    Unauthorized,
    /// The caller may not perform this operation (403).
    Forbidden,
    /// The resource does not exist on the server (404).
    NotFound,
    /// The quiz can no longer be answered (403 with an `expiration` field error).
    Expired,
    /// The request never reached the server or the response never came back.
    NetworkError,
    /// Anything the mapping table does not name.
    Unknown,
}

impl FailureReason {
    /// Every failure reason, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::Expired,
        Self::NetworkError,
        Self::Unknown,
    ];

    /// Returns the user-facing message for this category.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Unauthorized => "Your session has ended. Please log in again.",
            Self::Forbidden => "You do not have permission to do that.",
            Self::NotFound => "We could not find what you were looking for.",
            Self::Expired => "This quiz has expired and no longer accepts responses.",
            Self::NetworkError => "Could not reach the server. Check your connection and try again.",
            Self::Unknown => "Something went wrong. Please try again later.",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::Expired => "expired",
            Self::NetworkError => "network error",
            Self::Unknown => "unknown",
        };
        formatter.write_str(name)
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// The result of a repository call, form submission or validation.
///
/// `E` is the per-operation field-error record. Operations without field
/// level validation use [`NoFieldErrors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E = NoFieldErrors> {
    /// The operation succeeded with a value.
    Success(T),
    /// Field-level validation rejected the input.
    ValidationFailure(E),
    /// The operation failed for a categorized reason.
    Failure(FailureReason),
}

impl<T, E> Outcome<T, E> {
    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the success value, discarding any failure.
    #[must_use]
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::ValidationFailure(_) | Self::Failure(_) => None,
        }
    }

    /// Returns the categorized failure reason, if any.
    #[must_use]
    pub const fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Failure(reason) => Some(*reason),
            Self::Success(_) | Self::ValidationFailure(_) => None,
        }
    }

    /// Returns the field errors of a validation failure, if any.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&E> {
        match self {
            Self::ValidationFailure(errors) => Some(errors),
            Self::Success(_) | Self::Failure(_) => None,
        }
    }

    /// Borrows the success value.
    #[must_use]
    pub const fn as_success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::ValidationFailure(_) | Self::Failure(_) => None,
        }
    }

    /// Transforms the success value.
    pub fn map<U, F>(self, function: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success(value) => Outcome::Success(function(value)),
            Self::ValidationFailure(errors) => Outcome::ValidationFailure(errors),
            Self::Failure(reason) => Outcome::Failure(reason),
        }
    }

    /// Transforms the field-error record.
    pub fn map_errors<G, F>(self, function: F) -> Outcome<T, G>
    where
        F: FnOnce(E) -> G,
    {
        match self {
            Self::Success(value) => Outcome::Success(value),
            Self::ValidationFailure(errors) => Outcome::ValidationFailure(function(errors)),
            Self::Failure(reason) => Outcome::Failure(reason),
        }
    }

    /// Returns the message to show for a non-field failure.
    ///
    /// Validation failures surface inline per field, so they have no
    /// outcome-level message.
    #[must_use]
    pub const fn failure_message(&self) -> Option<&'static str> {
        match self {
            Self::Failure(reason) => Some(reason.message()),
            Self::Success(_) | Self::ValidationFailure(_) => None,
        }
    }
}

impl<T, E> From<FailureReason> for Outcome<T, E> {
    fn from(reason: FailureReason) -> Self {
        Self::Failure(reason)
    }
}

// =============================================================================
// Tests
// =============================================================================
