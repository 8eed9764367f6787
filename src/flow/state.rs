//! Step-flow state and the shared handle the controller and views use to read
//! and write it. The state is plain data; every transition goes through
//! [`crate::flow::FlowController`].

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Which account flow a controller drives. Fixed for the controller lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Register,
    Reset,
}

impl FlowKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Reset => "password-reset",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Stages of a flow, in the only order they may be visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    #[default]
    Email,
    Otp,
    Final,
    Done,
}

impl Step {
    /// The step a successful submission moves to. `Done` stays `Done`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Email => Self::Otp,
            Self::Otp => Self::Final,
            Self::Final | Self::Done => Self::Done,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Otp => "otp",
            Self::Final => "final",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlowState {
    pub step: Step,
    /// Set once the email step succeeds; cleared only by a reset.
    pub pinned_email: Option<String>,
    /// True while a request to the auth service is in flight.
    pub loading: bool,
    /// Last user-facing error message.
    pub error: Option<String>,
    epoch: u64,
}

impl FlowState {
    #[must_use]
    pub fn initialize() -> Self {
        Self::default()
    }

    /// Returns every public field to its initial value. The epoch moves
    /// forward so results of requests issued before the reset are dropped.
    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch.wrapping_add(1),
            ..Self::default()
        };
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Read/write handle to one flow's state slice.
///
/// Clones share the same state. The lock is never held across an `.await`.
#[derive(Clone, Debug, Default)]
pub struct FlowHandle {
    inner: Arc<RwLock<FlowState>>,
}

impl FlowHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> FlowState {
        self.read().clone()
    }

    /// Applies `mutate` under the write lock and returns its result.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut FlowState) -> R) -> R {
        mutate(&mut self.write())
    }

    pub fn reset(&self) {
        self.write().reset();
    }

    fn read(&self) -> RwLockReadGuard<'_, FlowState> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FlowState> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
