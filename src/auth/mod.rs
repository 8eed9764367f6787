//! Contract with the remote authentication service.
//!
//! The flow controller only sees [`AuthService`]; [`client::HttpAuthService`]
//! is the production implementation and tests provide in-memory doubles.
//! Code validity, expiry and delivery are owned by the service. Payloads carry
//! codes and passwords, so implementations must never log them.

pub mod client;
pub mod config;
pub mod types;

pub use client::HttpAuthService;
pub use config::ApiConfig;

use crate::flow::FlowKind;
use secrecy::SecretString;
use std::{fmt, future::Future, sync::Arc};

/// The four calls a flow can make.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Initiate,
    Verify,
    Resend,
    Finalize,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initiate => "initiate",
            Self::Verify => "verify",
            Self::Resend => "resend",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of a successful `initiate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Initiated {
    /// The address the service bound the flow to.
    pub email: String,
}

/// Already validated fields for the last step.
#[derive(Debug)]
pub enum FinalFields {
    Registration {
        full_name: String,
        phone: String,
        password: SecretString,
    },
    PasswordReset {
        password: SecretString,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceError {
    /// The service answered and refused the request.
    Rejected {
        status: Option<u16>,
        message: String,
    },
    /// The request could not be completed.
    Transport(String),
    Timeout,
    /// The service answered with something we could not read.
    Decode(String),
}

impl ServiceError {
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status: Some(status),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => *status,
            Self::Transport(_) | Self::Timeout | Self::Decode(_) => None,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected {
                status: Some(status),
                message,
            } => write!(formatter, "Request failed ({status}): {message}"),
            Self::Rejected {
                status: None,
                message,
            } => write!(formatter, "Request failed: {message}"),
            Self::Transport(message) => write!(formatter, "Network error: {message}"),
            Self::Timeout => formatter.write_str("Request timed out"),
            Self::Decode(message) => write!(formatter, "Response error: {message}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Remote authentication service as seen by the flow.
pub trait AuthService: Send + Sync {
    /// Starts a flow and triggers delivery of a code to `email`.
    fn initiate(
        &self,
        kind: FlowKind,
        email: &str,
    ) -> impl Future<Output = Result<Initiated, ServiceError>> + Send;

    /// Checks the code previously sent to `email`.
    fn verify(
        &self,
        kind: FlowKind,
        email: &str,
        code: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Sends a fresh code for an already started flow.
    fn resend(
        &self,
        kind: FlowKind,
        email: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Creates the account or stores the new password.
    fn finalize(
        &self,
        kind: FlowKind,
        email: &str,
        fields: &FinalFields,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Called when the flow starts over from `Email`, so per-flow request
    /// correlation can begin again.
    fn restart(&self) {}
}

impl<S: AuthService> AuthService for Arc<S> {
    fn restart(&self) {
        (**self).restart();
    }

    fn initiate(
        &self,
        kind: FlowKind,
        email: &str,
    ) -> impl Future<Output = Result<Initiated, ServiceError>> + Send {
        (**self).initiate(kind, email)
    }

    fn verify(
        &self,
        kind: FlowKind,
        email: &str,
        code: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        (**self).verify(kind, email, code)
    }

    fn resend(
        &self,
        kind: FlowKind,
        email: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        (**self).resend(kind, email)
    }

    fn finalize(
        &self,
        kind: FlowKind,
        email: &str,
        fields: &FinalFields,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send {
        (**self).finalize(kind, email, fields)
    }
}
