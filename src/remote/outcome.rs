//! The three-way network outcome and its mapping onto [`Outcome`].

use std::fmt;

use serde::de::DeserializeOwned;

use crate::outcome::{ErrorPayload, FailureReason, FieldErrors, Outcome};

/// Field name the server uses to report that a quiz no longer accepts responses.
pub const EXPIRATION_FIELD: &str = "expiration";

// =============================================================================
// RemoteOutcome
// =============================================================================

/// What came back from one network call.
#[derive(Clone, PartialEq, Eq)]
pub enum RemoteOutcome<T> {
    /// Transport success with a 2xx status and the decoded body, if any.
    Delivered(Option<T>),
    /// Transport success with an application-level error payload.
    Rejected {
        /// Numeric HTTP status.
        status: u16,
        /// Field errors sent by the server.
        errors: ErrorPayload,
    },
    /// The request failed at the transport level.
    Unreachable(String),
}

impl<T> fmt::Debug for RemoteOutcome<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered(body) => formatter
                .debug_tuple("Delivered")
                .field(&body.as_ref().map(|_| ".."))
                .finish(),
            Self::Rejected { status, errors } => formatter
                .debug_struct("Rejected")
                .field("status", status)
                .field("errors", errors)
                .finish(),
            Self::Unreachable(message) => {
                formatter.debug_tuple("Unreachable").field(message).finish()
            }
        }
    }
}

impl<T> RemoteOutcome<T> {
    /// A 2xx response carrying `value`.
    #[must_use]
    pub const fn delivered(value: T) -> Self {
        Self::Delivered(Some(value))
    }

    /// A response rejected with `status` and a field-error payload.
    #[must_use]
    pub const fn rejected(status: u16, errors: ErrorPayload) -> Self {
        Self::Rejected { status, errors }
    }

    /// A response rejected with `status` and no payload.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self::rejected(status, ErrorPayload::new())
    }

    /// A transport failure.
    #[must_use]
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable(message.into())
    }

    /// Wraps an I/O error raised by the transport.
    #[must_use]
    pub fn from_io_error(error: &std::io::Error) -> Self {
        Self::Unreachable(error.to_string())
    }

    /// Transforms the delivered body.
    pub fn map<U, F>(self, function: F) -> RemoteOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Delivered(body) => RemoteOutcome::Delivered(body.map(function)),
            Self::Rejected { status, errors } => RemoteOutcome::Rejected { status, errors },
            Self::Unreachable(message) => RemoteOutcome::Unreachable(message),
        }
    }

    /// Maps to an [`Outcome`], requiring a delivered body.
    ///
    /// A 2xx response without a body is API contract drift and maps to
    /// [`FailureReason::Unknown`].
    pub fn into_outcome<E: FieldErrors>(self) -> Outcome<T, E> {
        match self {
            Self::Delivered(Some(value)) => Outcome::Success(value),
            Self::Delivered(None) => {
                tracing::warn!("Response body missing where one was required");
                Outcome::Failure(FailureReason::Unknown)
            }
            Self::Rejected { status, errors } => map_rejection(status, &errors),
            Self::Unreachable(message) => {
                tracing::debug!("Request failed at transport level: {}", message);
                Outcome::Failure(FailureReason::NetworkError)
            }
        }
    }

    /// Maps to an [`Outcome`] for endpoints whose body is ignored.
    pub fn into_unit_outcome<E: FieldErrors>(self) -> Outcome<(), E> {
        match self {
            Self::Delivered(_) => Outcome::Success(()),
            other => other.map(|_| ()).into_outcome(),
        }
    }
}

impl<T: DeserializeOwned> RemoteOutcome<T> {
    /// Decodes a raw HTTP response with a JSON body.
    ///
    /// A 2xx body that does not decode becomes `Delivered(None)`, which the
    /// mapping reports as contract drift. Any other status is a rejection
    /// whose payload is decoded leniently.
    #[must_use]
    pub fn from_http(status: u16, body: &[u8]) -> Self {
        if (200..300).contains(&status) {
            if body.iter().all(u8::is_ascii_whitespace) {
                return Self::Delivered(None);
            }
            return match serde_json::from_slice(body) {
                Ok(value) => Self::Delivered(Some(value)),
                Err(error) => {
                    tracing::warn!(status, "Failed to decode response body: {}", error);
                    Self::Delivered(None)
                }
            };
        }

        let errors = serde_json::from_slice(body).unwrap_or_default();
        Self::Rejected { status, errors }
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// Maps a rejected response onto the outcome taxonomy.
///
/// | status | outcome |
/// |---|---|
/// | 400 with a payload | `ValidationFailure` |
/// | 401 | `Unauthorized` |
/// | 403 naming `expiration` | `Expired` |
/// | 403 | `Forbidden` |
/// | 404 | `NotFound` |
/// | anything else | `Unknown` |
pub fn map_rejection<T, E: FieldErrors>(status: u16, errors: &ErrorPayload) -> Outcome<T, E> {
    match status {
        400 if !errors.is_empty() => Outcome::ValidationFailure(E::from_payload(errors)),
        401 => Outcome::Failure(FailureReason::Unauthorized),
        403 if errors.contains(EXPIRATION_FIELD) => Outcome::Failure(FailureReason::Expired),
        403 => Outcome::Failure(FailureReason::Forbidden),
        404 => Outcome::Failure(FailureReason::NotFound),
        _ => Outcome::Failure(FailureReason::Unknown),
    }
}

// =============================================================================
// Tests
// =============================================================================
