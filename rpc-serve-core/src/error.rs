//! The error type handlers return for infrastructure failures.

use crate::pdu::status;

/// A failure that prevented a handler from producing a response at all.
///
/// Protocol-level failures such as "access denied" are *not* errors: they travel
/// inside a normal response through its status field. This type is reserved for
/// conditions outside the protocol's semantics.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The handler does not implement this operation.
    #[error("operation is not implemented")]
    NotImplemented,
    /// The call context was cancelled before the handler finished.
    #[error("call was cancelled")]
    Cancelled,
    /// The call ran past its deadline.
    #[error("call deadline exceeded")]
    DeadlineExceeded,
    /// The handler ran out of a resource it needs to service the call.
    #[error("resources exhausted: {0}")]
    ResourceExhausted(String),
    /// An unexpected failure inside the handler.
    #[error("internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl HandlerError {
    /// Wrap an arbitrary error as an internal failure.
    pub fn internal(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        HandlerError::Internal(err.into())
    }

    /// Return `true` if the failure came from the call context rather than the handler.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, HandlerError::Cancelled | HandlerError::DeadlineExceeded)
    }

    /// The fault status reported to the peer for this failure.
    pub fn fault_status(&self) -> u32 {
        match self {
            HandlerError::NotImplemented => status::RPC_S_CANNOT_SUPPORT,
            HandlerError::Cancelled | HandlerError::DeadlineExceeded => status::NCA_S_FAULT_CANCEL,
            HandlerError::ResourceExhausted(_) => status::NCA_S_FAULT_REMOTE_NO_MEMORY,
            HandlerError::Internal(_) => status::NCA_S_FAULT_UNSPEC,
        }
    }
}
