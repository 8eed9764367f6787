//! Step transition controller. Each operation checks the step, validates its
//! input, issues at most one auth service call, and applies the result to the
//! injected [`FlowHandle`].
//!
//! Flow Overview: `submit_email` pins the address and moves to `Otp`;
//! `submit_code` moves to `Final`; `resend_code` stays on `Otp`;
//! `submit_registration` or `submit_password_reset` moves to `Done`. A
//! [`FlowController::reset`] during a call makes that call's result stale.

use super::{
    error::FlowError,
    state::{FlowHandle, FlowKind, FlowState, Step},
    validate::{self, FieldError},
};
use crate::auth::{AuthService, FinalFields, Operation, ServiceError};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

/// Fields typed on the last step of a registration.
#[derive(Debug)]
pub struct RegistrationInput {
    pub full_name: String,
    pub phone: String,
    pub password: SecretString,
}

/// Fields typed on the last step of a password reset.
#[derive(Debug)]
pub struct PasswordResetInput {
    pub password: SecretString,
    pub confirmation: SecretString,
}

/// Bookkeeping for one in-flight call.
struct Ticket {
    epoch: u64,
    step: Step,
    email: Option<String>,
}

#[derive(Debug)]
pub struct FlowController<S> {
    kind: FlowKind,
    service: S,
    handle: FlowHandle,
}

impl<S: AuthService> FlowController<S> {
    /// Builds a controller over an existing state handle. The handle is
    /// reset so the flow always starts at `Email`.
    pub fn new(kind: FlowKind, service: S, handle: FlowHandle) -> Self {
        handle.reset();
        Self {
            kind,
            service,
            handle,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FlowKind {
        self.kind
    }

    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub const fn handle(&self) -> &FlowHandle {
        &self.handle
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.handle.snapshot()
    }

    /// Starts over from `Email`. Results of calls still in flight are dropped
    /// and the service is told a new flow begins.
    pub fn reset(&self) {
        debug!(kind = %self.kind, "flow reset");
        self.handle.reset();
        self.service.restart();
    }

    /// # Errors
    /// Fails on invalid email, wrong step, a call already in flight, or a
    /// service failure. The state carries the matching message.
    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn submit_email(&self, input: &str) -> Result<(), FlowError> {
        self.precheck(Step::Email)?;
        let email = self.validated(validate::email(input))?;

        let ticket = self.begin(Step::Email)?;
        let result = self.service.initiate(self.kind, &email).await;
        let outcome = self.complete(&ticket, Operation::Initiate, result, |state, initiated| {
            if initiated.email != email {
                debug!(service_email = %initiated.email, "service echoed a different email");
            }
            state.pinned_email = Some(email.clone());
        });
        self.log_outcome(Operation::Initiate, &outcome);
        outcome
    }

    /// # Errors
    /// Fails on a missing or malformed code, wrong step, a call already in
    /// flight, or a service failure.
    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn submit_code(&self, input: &str) -> Result<(), FlowError> {
        self.precheck(Step::Otp)?;
        let code = self.validated(validate::code(input))?;

        let ticket = self.begin(Step::Otp)?;
        let email = self.pinned(&ticket)?;
        let result = self.service.verify(self.kind, &email, &code).await;
        let outcome = self.complete(&ticket, Operation::Verify, result, |_, ()| {});
        self.log_outcome(Operation::Verify, &outcome);
        outcome
    }

    /// Asks the service to send a fresh code. Never changes the step.
    ///
    /// # Errors
    /// Fails on wrong step, a call already in flight, or a service failure.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn resend_code(&self) -> Result<(), FlowError> {
        self.precheck(Step::Otp)?;

        let ticket = self.begin(Step::Otp)?;
        let email = self.pinned(&ticket)?;
        let result = self.service.resend(self.kind, &email).await;
        let outcome = self.complete(&ticket, Operation::Resend, result, |_, ()| {});
        self.log_outcome(Operation::Resend, &outcome);
        outcome
    }

    /// # Errors
    /// Fails for a reset flow, on invalid fields, wrong step, a call already
    /// in flight, or a service failure.
    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn submit_registration(&self, input: RegistrationInput) -> Result<(), FlowError> {
        self.ensure_kind(FlowKind::Register)?;
        self.precheck(Step::Final)?;

        let full_name = self.validated(validate::full_name(&input.full_name))?;
        let phone = self.validated(validate::phone(&input.phone))?;
        self.validated(validate::password(input.password.expose_secret()))?;

        let fields = FinalFields::Registration {
            full_name,
            phone,
            password: input.password,
        };
        self.finalize(fields).await
    }

    /// # Errors
    /// Fails for a registration flow, on a short or mismatched password,
    /// wrong step, a call already in flight, or a service failure.
    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn submit_password_reset(&self, input: PasswordResetInput) -> Result<(), FlowError> {
        self.ensure_kind(FlowKind::Reset)?;
        self.precheck(Step::Final)?;

        self.validated(validate::password(input.password.expose_secret()))?;
        self.validated(validate::confirmation(
            input.password.expose_secret(),
            input.confirmation.expose_secret(),
        ))?;

        let fields = FinalFields::PasswordReset {
            password: input.password,
        };
        self.finalize(fields).await
    }

    async fn finalize(&self, fields: FinalFields) -> Result<(), FlowError> {
        let ticket = self.begin(Step::Final)?;
        let email = self.pinned(&ticket)?;
        let result = self.service.finalize(self.kind, &email, &fields).await;
        let outcome = self.complete(&ticket, Operation::Finalize, result, |_, ()| {});
        self.log_outcome(Operation::Finalize, &outcome);
        outcome
    }

    fn ensure_kind(&self, expected: FlowKind) -> Result<(), FlowError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(FlowError::WrongKind {
                expected,
                actual: self.kind,
            })
        }
    }

    /// Read-only gate run before validation so a misplaced call leaves the
    /// state untouched.
    fn precheck(&self, expected: Step) -> Result<(), FlowError> {
        let state = self.handle.snapshot();
        check_ready(&state, expected)
    }

    /// Stores a validation message; `loading` is left alone.
    fn validated<T>(&self, result: Result<T, FieldError>) -> Result<T, FlowError> {
        result.map_err(|err| {
            debug!(field = %err.field, "input rejected");
            self.handle
                .update(|state| state.error = Some(err.message.clone()));
            FlowError::Validation(err)
        })
    }

    /// Marks the flow as loading and clears the previous error.
    fn begin(&self, expected: Step) -> Result<Ticket, FlowError> {
        self.handle.update(|state| -> Result<Ticket, FlowError> {
            check_ready(state, expected)?;
            state.loading = true;
            state.error = None;
            Ok(Ticket {
                epoch: state.epoch(),
                step: state.step,
                email: state.pinned_email.clone(),
            })
        })
    }

    /// The pinned email for steps after `Email`. Missing means the state was
    /// tampered with; the loading flag taken by `begin` is released.
    fn pinned(&self, ticket: &Ticket) -> Result<String, FlowError> {
        if let Some(email) = &ticket.email {
            return Ok(email.clone());
        }
        self.handle.update(|state| -> Result<String, FlowError> {
            if state.epoch() == ticket.epoch {
                state.loading = false;
            }
            Err(FlowError::WrongStep {
                expected: Step::Email,
                actual: state.step,
            })
        })
    }

    /// Applies a service result if the flow was not reset in the meantime.
    /// Every operation but resend moves exactly one step forward from where
    /// the call started.
    fn complete<T>(
        &self,
        ticket: &Ticket,
        operation: Operation,
        result: Result<T, ServiceError>,
        on_success: impl FnOnce(&mut FlowState, T),
    ) -> Result<(), FlowError> {
        let kind = self.kind;
        self.handle.update(|state| {
            if state.epoch() != ticket.epoch {
                return Err(FlowError::Superseded);
            }
            state.loading = false;
            match result {
                Ok(value) => {
                    state.error = None;
                    on_success(state, value);
                    if operation != Operation::Resend {
                        state.step = ticket.step.next();
                    }
                    Ok(())
                }
                Err(source) => {
                    let err = FlowError::Service {
                        kind,
                        operation,
                        source,
                    };
                    state.error = Some(err.user_message());
                    Err(err)
                }
            }
        })
    }

    fn log_outcome(&self, operation: Operation, outcome: &Result<(), FlowError>) {
        match outcome {
            Ok(()) => info!(
                kind = %self.kind,
                operation = %operation,
                step = %self.handle.snapshot().step,
                "flow step completed"
            ),
            Err(FlowError::Superseded) => {
                debug!(kind = %self.kind, operation = %operation, "stale result dropped");
            }
            Err(FlowError::Service { source, .. }) => warn!(
                kind = %self.kind,
                operation = %operation,
                status = ?source.status(),
                "{source}"
            ),
            Err(err) => warn!(kind = %self.kind, operation = %operation, "{err}"),
        }
    }
}

fn check_ready(state: &FlowState, expected: Step) -> Result<(), FlowError> {
    if state.step != expected {
        return Err(FlowError::WrongStep {
            expected,
            actual: state.step,
        });
    }
    if state.loading {
        return Err(FlowError::Busy);
    }
    Ok(())
}
