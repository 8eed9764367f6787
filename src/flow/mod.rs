//! Account step-flow: state, transitions and client-side validation shared by
//! registration and password reset. The flow only talks to the outside world
//! through [`crate::auth::AuthService`] and only keeps state in the
//! [`FlowHandle`] it was given.

pub mod controller;
pub mod error;
pub mod state;
pub mod validate;

pub use controller::{FlowController, PasswordResetInput, RegistrationInput};
pub use error::FlowError;
pub use state::{FlowHandle, FlowKind, FlowState, Step};
pub use validate::{Field, FieldError};
