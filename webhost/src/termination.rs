//! Single-assignment termination channel.
//!
//! Every source that can end a service (OS signal, listener failure, window
//! closed, a controller giving up) holds a clone of the same [`Terminator`]
//! and races to [`publish`](Terminator::publish) a [`TerminationCause`].
//! The first publication wins; later ones are discarded without blocking.
//! The single consumer awaits [`wait`](Terminator::wait) and drives teardown.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Reason a service moved from running to terminating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationCause {
    /// The operator interrupted the process (SIGINT, SIGTERM, Ctrl+C).
    OperatorInterrupt,
    /// The HTTP listener stopped serving, including an administrative close.
    ListenerFailure(String),
    /// The native window was closed.
    ExternalUiClosed,
    /// A registered sub-component reported an unrecoverable error.
    ControllerFatal(String),
}

impl TerminationCause {
    /// Whether this cause represents a failure rather than a requested stop.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::ListenerFailure(_) | Self::ControllerFatal(_))
    }

    /// Process exit code for this cause.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.is_failure() { 1 } else { 0 }
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorInterrupt => f.write_str("interrupted"),
            Self::ListenerFailure(detail) => write!(f, "listener failure: {detail}"),
            Self::ExternalUiClosed => f.write_str("UI closed"),
            Self::ControllerFatal(detail) => write!(f, "controller fatal: {detail}"),
        }
    }
}

/// Lifecycle state of a service. The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No termination cause has been published yet.
    Running,
    /// A cause was published; teardown is due or in progress.
    Terminating,
}

#[derive(Debug, Default)]
struct Slot {
    cause: OnceLock<TerminationCause>,
    published: CancellationToken,
}

/// Cloneable handle to a service's termination channel.
#[derive(Debug, Clone, Default)]
pub struct Terminator {
    slot: Arc<Slot>,
}

impl Terminator {
    /// Creates a channel in the [`LifecycleState::Running`] state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `cause` if no cause has been published yet.
    ///
    /// Never blocks on a consumer. Returns `true` when this call won the race.
    pub fn publish(&self, cause: TerminationCause) -> bool {
        match self.slot.cause.set(cause) {
            Ok(()) => {
                self.slot.published.cancel();
                true
            }
            Err(discarded) => {
                tracing::debug!(cause = %discarded, "termination already published, discarding");
                false
            }
        }
    }

    /// Waits until a cause is published and returns it.
    ///
    /// May be awaited any number of times; every caller sees the same cause.
    pub async fn wait(&self) -> TerminationCause {
        loop {
            if let Some(cause) = self.slot.cause.get() {
                return cause.clone();
            }
            self.slot.published.cancelled().await;
        }
    }

    /// The published cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<TerminationCause> {
        self.slot.cause.get().cloned()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        if self.slot.cause.get().is_some() {
            LifecycleState::Terminating
        } else {
            LifecycleState::Running
        }
    }
}
