use super::{
    state::{FlowKind, Step},
    validate::FieldError,
};
use crate::auth::{Operation, ServiceError};
use std::fmt;

/// Generic text for failures the customer can only retry.
const TRY_AGAIN: &str = "Unable to reach the server. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// Input failed a local check; no request was issued.
    Validation(FieldError),
    /// The auth service refused the request or could not be reached.
    Service {
        kind: FlowKind,
        operation: Operation,
        source: ServiceError,
    },
    /// The operation does not belong to the current step.
    WrongStep { expected: Step, actual: Step },
    /// The operation belongs to the other flow kind.
    WrongKind { expected: FlowKind, actual: FlowKind },
    /// A request for this flow is already in flight.
    Busy,
    /// The flow was reset while the request was in flight; its result was
    /// dropped.
    Superseded,
}

impl FlowError {
    /// Single human-readable line stored in `FlowState::error`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.message.clone(),
            Self::Service {
                kind,
                operation,
                source,
            } => service_message(*kind, *operation, source),
            Self::WrongStep { .. } | Self::WrongKind { .. } => {
                "This action is not available right now.".to_string()
            }
            Self::Busy => "Please wait for the current request to finish.".to_string(),
            Self::Superseded => "The request was cancelled.".to_string(),
        }
    }
}

fn service_message(kind: FlowKind, operation: Operation, source: &ServiceError) -> String {
    match source {
        ServiceError::Rejected { status, message } => match status {
            Some(409) => "An account with this email already exists.".to_string(),
            Some(404) if kind == FlowKind::Reset => {
                "No account is registered with this email.".to_string()
            }
            Some(429) => "Too many attempts. Please wait and try again.".to_string(),
            Some(410) => expired_message(),
            _ if message.to_lowercase().contains("expired") => expired_message(),
            Some(400 | 401 | 422) if operation == Operation::Verify => {
                "The code is incorrect.".to_string()
            }
            _ => message.clone(),
        },
        ServiceError::Transport(_) | ServiceError::Timeout => TRY_AGAIN.to_string(),
        ServiceError::Decode(_) => {
            "Unexpected response from the server. Please try again.".to_string()
        }
    }
}

fn expired_message() -> String {
    "This code has expired. Request a new one.".to_string()
}

impl fmt::Display for FlowError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(formatter, "Invalid input: {err}"),
            Self::Service {
                kind,
                operation,
                source,
            } => write!(formatter, "{kind} {operation} failed: {source}"),
            Self::WrongStep { expected, actual } => {
                write!(formatter, "Expected step {expected}, flow is at {actual}")
            }
            Self::WrongKind { expected, actual } => {
                write!(formatter, "Expected a {expected} flow, this is a {actual} flow")
            }
            Self::Busy => formatter.write_str("A request is already in flight"),
            Self::Superseded => formatter.write_str("Flow was reset during the request"),
        }
    }
}

impl std::error::Error for FlowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Service { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FieldError> for FlowError {
    fn from(err: FieldError) -> Self {
        Self::Validation(err)
    }
}
