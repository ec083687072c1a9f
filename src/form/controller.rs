use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::coordinator::{ContractViolation, ValidationCoordinator, WaitOutcome};
use crate::outcome::{FieldErrors, Outcome};

use super::Form;

/// The current values of a form and the errors recorded against them.
#[derive(Debug, Clone)]
pub struct FormState<F: Form> {
    /// The form values.
    pub form: F,
    /// The latest error per field, from client checks or the server.
    pub errors: F::Errors,
}

/// Controller-side bookkeeping behind the public [`FormState`].
struct Inner<F: Form> {
    state: FormState<F>,
    /// Results of client-side checks only. Submission is gated on these.
    client_errors: F::Errors,
    /// Latest scheduled check per error slot. Older checks are discarded.
    generations: HashMap<F::Field, u64>,
}

/// Drives one form: edits, validation scheduling, and submission.
///
/// Each edit supersedes the checks still in flight for the same error slot,
/// so a slow check of an old value never overwrites the result for the
/// current one. Errors returned by the server are shown alongside the
/// client-side ones but never block the next submission.
pub struct FormController<F: Form> {
    inner: Arc<Mutex<Inner<F>>>,
    coordinator: ValidationCoordinator,
    validation_timeout: Duration,
}

impl<F: Form + fmt::Debug> fmt::Debug for FormController<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FormController")
            .field("state", &self.inner.lock().state)
            .field("coordinator", &self.coordinator)
            .field("validation_timeout", &self.validation_timeout)
            .finish()
    }
}

impl<F: Form> FormController<F> {
    /// Creates a controller for `form` with no recorded errors.
    #[must_use]
    pub fn new(form: F, coordinator: ValidationCoordinator, validation_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: FormState {
                    form,
                    errors: F::Errors::default(),
                },
                client_errors: F::Errors::default(),
                generations: HashMap::new(),
            })),
            coordinator,
            validation_timeout,
        }
    }

    /// Sets `field` and schedules its validation.
    ///
    /// # Errors
    ///
    /// Fails when called during [`submit`](Self::submit)'s wait or after the
    /// coordinator was closed. The value is still applied.
    pub fn update(&self, field: F::Field, value: impl Into<String>) -> Result<(), ContractViolation> {
        self.inner.lock().state.form.set(field, value.into());
        self.schedule(field)
    }

    /// Schedules validation of every field.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub fn revalidate_all(&self) -> Result<(), ContractViolation> {
        let fields = self.inner.lock().state.form.fields();
        fields.into_iter().try_for_each(|field| self.schedule(field))
    }

    fn schedule(&self, field: F::Field) -> Result<(), ContractViolation> {
        let slot = F::error_slot(field);
        let (check, generation) = {
            let mut inner = self.inner.lock();
            let generation = inner.generations.get(&slot).map_or(1, |current| current + 1);
            inner.generations.insert(slot, generation);
            (inner.state.form.check(field), generation)
        };

        let inner = Arc::clone(&self.inner);
        self.coordinator
            .add(async move {
                let message = check.await;
                let mut inner = inner.lock();
                if inner.generations.get(&slot) != Some(&generation) {
                    tracing::trace!(?field, "Discarding result of a superseded check");
                    return;
                }
                F::record_error(&mut inner.client_errors, field, message.clone());
                F::record_error(&mut inner.state.errors, field, message);
            })
            .inspect_err(|violation| {
                tracing::error!(?field, "Could not schedule field validation: {}", violation);
            })
    }

    /// Waits for pending validations, then submits through `action`.
    ///
    /// A validation that does not settle within the configured timeout is
    /// abandoned and the submission proceeds; the server validates anyway.
    /// If a client-side check reported an error, `action` is not called and
    /// those errors are returned as a `ValidationFailure`. Errors returned by
    /// the server are shown until the next submission or the next check of
    /// the same field; they never block a resubmission.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractViolation`] if another submission is already
    /// waiting or the coordinator was closed.
    pub async fn submit<T, A, Fut>(&self, action: A) -> Result<Outcome<T, F::Errors>, ContractViolation>
    where
        A: FnOnce(F) -> Fut,
        Fut: Future<Output = Outcome<T, F::Errors>>,
    {
        let waited = self
            .coordinator
            .wait(self.validation_timeout)
            .await
            .inspect_err(|violation| tracing::error!("Could not wait for validations: {}", violation))?;
        if waited == WaitOutcome::TimedOut {
            tracing::info!(
                pending = self.coordinator.pending(),
                "Submitting before client-side validation finished"
            );
        }

        let (form, client_errors) = {
            let mut inner = self.inner.lock();
            inner.state.errors = inner.client_errors.clone();
            (inner.state.form.clone(), inner.client_errors.clone())
        };
        if !client_errors.is_empty() {
            tracing::debug!("Submission blocked by client-side errors");
            return Ok(Outcome::ValidationFailure(client_errors));
        }

        let outcome = action(form).await;
        if let Outcome::ValidationFailure(errors) = &outcome {
            self.inner.lock().state.errors = errors.clone();
        }
        Ok(outcome)
    }

    /// Returns the recorded errors.
    #[must_use]
    pub fn errors(&self) -> F::Errors {
        self.inner.lock().state.errors.clone()
    }

    /// Returns a copy of the values and errors.
    #[must_use]
    pub fn snapshot(&self) -> FormState<F> {
        self.inner.lock().state.clone()
    }

    /// Returns the coordinator running this form's validations.
    #[must_use]
    pub const fn coordinator(&self) -> &ValidationCoordinator {
        &self.coordinator
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{LoginField, LoginForm};
    use crate::model::LoginErrors;
    use crate::outcome::{ErrorPayload, FailureReason};
    use rstest::rstest;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn controller() -> FormController<LoginForm> {
        let coordinator = ValidationCoordinator::try_current().unwrap();
        FormController::new(LoginForm::default(), coordinator, Duration::from_secs(1))
    }

    #[rstest]
    #[tokio::test]
    async fn update_records_client_error_once_drained() {
        let controller = controller();

        controller.update(LoginField::Username, "").unwrap();
        controller.coordinator().wait_until_drained().await.unwrap();

        assert!(controller.errors().username.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn correcting_a_field_clears_its_error() {
        let controller = controller();

        controller.update(LoginField::Username, "").unwrap();
        controller.coordinator().wait_until_drained().await.unwrap();
        controller.update(LoginField::Username, "alice").unwrap();
        controller.coordinator().wait_until_drained().await.unwrap();

        assert_eq!(controller.errors().username, None);
    }

    #[rstest]
    #[tokio::test]
    async fn client_errors_block_the_action() {
        let controller = controller();
        let called = AtomicBool::new(false);
        controller.revalidate_all().unwrap();

        let outcome = controller
            .submit(|_| async {
                called.store(true, Ordering::SeqCst);
                Outcome::<(), LoginErrors>::Success(())
            })
            .await
            .unwrap();

        assert!(!called.load(Ordering::SeqCst));
        let errors = outcome.field_errors().unwrap();
        assert!(errors.username.is_some());
        assert!(errors.password.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn valid_form_reaches_the_action() {
        let controller = controller();
        controller.update(LoginField::Username, "alice").unwrap();
        controller.update(LoginField::Password, "correct horse").unwrap();

        let outcome = controller
            .submit(|form| async move { Outcome::<String, LoginErrors>::Success(form.username) })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Success("alice".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn server_field_errors_are_stored() {
        let controller = controller();
        controller.update(LoginField::Username, "alice").unwrap();
        controller.update(LoginField::Password, "wrong password").unwrap();
        let payload = ErrorPayload::new().with("password", "Incorrect password.");

        let outcome = controller
            .submit(|_| async move { Outcome::<(), _>::ValidationFailure(LoginErrors::from_payload(&payload)) })
            .await
            .unwrap();

        assert!(outcome.field_errors().is_some());
        assert_eq!(controller.errors().password.as_deref(), Some("Incorrect password."));
    }

    #[rstest]
    #[tokio::test]
    async fn server_errors_do_not_gate_the_next_submission() {
        let controller = controller();
        controller.update(LoginField::Username, "alice").unwrap();
        controller.update(LoginField::Password, "wrong password").unwrap();
        let payload = ErrorPayload::new().with("non_field_errors", "Unable to log in.");
        controller
            .submit(|_| async move { Outcome::<(), _>::ValidationFailure(LoginErrors::from_payload(&payload)) })
            .await
            .unwrap();
        let called = AtomicBool::new(false);

        let outcome = controller
            .submit(|_| async {
                called.store(true, Ordering::SeqCst);
                Outcome::<(), LoginErrors>::Success(())
            })
            .await
            .unwrap();

        assert!(called.load(Ordering::SeqCst));
        assert_eq!(outcome, Outcome::Success(()));
        assert_eq!(controller.errors().non_field, None);
    }

    #[rstest]
    #[tokio::test]
    async fn failures_pass_through_untouched() {
        let controller = controller();
        controller.update(LoginField::Username, "alice").unwrap();
        controller.update(LoginField::Password, "correct horse").unwrap();

        let outcome = controller
            .submit(|_| async { Outcome::<(), LoginErrors>::Failure(FailureReason::NetworkError) })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Failure(FailureReason::NetworkError));
        assert!(controller.errors().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn closed_coordinator_rejects_updates_but_keeps_value() {
        let controller = controller();
        controller.coordinator().close();

        assert_eq!(
            controller.update(LoginField::Username, "alice"),
            Err(ContractViolation::Closed)
        );
        assert_eq!(controller.snapshot().form.username, "alice");
    }
}
