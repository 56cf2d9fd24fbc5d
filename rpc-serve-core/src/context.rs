//! The per-call context threaded through every handler invocation.
//!
//! A [`CallContext`] carries a cancellation token shared by all of its clones and an
//! optional deadline. Transports create one per inbound call, the dispatcher races
//! the handler against it, and long-running handlers can poll [`CallContext::check()`]
//! or await [`CallContext::cancelled()`] at their own suspension points.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::HandlerError;

/// Cancellation and deadline state for one call.
///
/// Cloning is cheap, and every clone observes the same cancellation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Create a context that is neither cancelled nor bounded by a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a context sharing this one's cancellation, with a deadline at `deadline`
    /// or the current deadline, whichever comes first.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(self.deadline.map_or(deadline, |current| current.min(deadline))),
        }
    }

    /// Like [`with_deadline()`](Self::with_deadline), with the deadline `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Return a context that is cancelled along with this one, but whose own
    /// [`cancel()`](Self::cancel) leaves this one untouched. The deadline is inherited.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// The instant after which the call should be abandoned, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Signal cancellation to every clone of this context.
    ///
    /// Cancellation is permanent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Return `true` if [`cancel()`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Return `true` if the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolve once the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// A cancellation point: fail if the call was cancelled or ran past its deadline.
    pub fn check(&self) -> Result<(), HandlerError> {
        if self.is_cancelled() {
            Err(HandlerError::Cancelled)
        } else if self.is_expired() {
            Err(HandlerError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}
