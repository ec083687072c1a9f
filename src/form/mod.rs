//! Form state, client-side validation, and submission.
//!
//! A [`FormController`] owns one form. Every edit schedules an asynchronous
//! check of the edited field on a [`ValidationCoordinator`]; submitting
//! waits (bounded) for those checks, refuses to call the server while a
//! client-side error is recorded, and stores the server's field errors when
//! it rejects the submission.
//!
//! [`ValidationCoordinator`]: crate::coordinator::ValidationCoordinator

mod account;
mod controller;
mod response;
pub mod rules;

pub use account::{LoginField, LoginForm, ProfileField, ProfileForm, SignupField, SignupForm};
pub use controller::{FormController, FormState};
pub use response::{QuizResponseField, QuizResponseForm};

use std::fmt;
use std::hash::Hash;

use futures::future::BoxFuture;

use crate::outcome::FieldErrors;

/// An editable form.
pub trait Form: Clone + Send + Sync + 'static {
    /// Identifies one input.
    type Field: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Per-field error record shared with the server's validation.
    type Errors: FieldErrors + fmt::Debug;

    /// Every input, in display order.
    fn fields(&self) -> Vec<Self::Field>;

    /// Replaces the raw value of `field`.
    fn set(&mut self, field: Self::Field, value: String);

    /// Checks `field` against the client-side rules.
    ///
    /// The returned future owns what it needs, so later edits do not affect
    /// a check already in flight.
    fn check(&self, field: Self::Field) -> BoxFuture<'static, Option<String>>;

    /// Returns the field whose error `field`'s check writes.
    ///
    /// A new check supersedes any in-flight check of the same slot. Forms
    /// whose checks report into one shared field override this.
    fn error_slot(field: Self::Field) -> Self::Field {
        field
    }

    /// Stores `message` as the error of `field`, clearing it on `None`.
    fn record_error(errors: &mut Self::Errors, field: Self::Field, message: Option<String>);
}
