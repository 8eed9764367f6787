//! # bonsai-account
//!
//! Account step-flow for the bonsai storefront: customer registration and
//! password reset, both driven by the same four-step state machine against a
//! remote authentication service.
//!
//! ## Flow
//!
//! ```text
//! Email --initiate--> Otp --verify--> Final --finalize--> Done
//!                      ^ |
//!                      +-+ resend
//! ```
//!
//! 1. **Email:** the customer submits an address. On success it becomes the
//!    pinned email for every later call.
//! 2. **Otp:** the service mails a 6 character code; the customer submits it or
//!    asks for a new one.
//! 3. **Final:** registration asks for name, phone and password; password reset
//!    asks for the new password twice.
//! 4. **Done:** terminal until the flow is reset.
//!
//! Inputs are validated locally before any request leaves the process. Every
//! failure is recovered at the flow level: the customer stays on the current
//! step and may resubmit. Nothing is persisted; the remote service owns code
//! validity.
//!
//! ## Layout
//!
//! - [`flow`] holds the state, the transition controller and the validators.
//! - [`auth`] defines the [`auth::AuthService`] contract and its HTTP client.
//! - [`cli`] is the terminal front end used by the `bonsai-account` binary.

pub mod auth;
pub mod cli;
pub mod flow;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
