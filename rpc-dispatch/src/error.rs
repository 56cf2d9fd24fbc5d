//! Error types for dispatch operations

use rpc_serve_core::{ndr, pdu::status, HandlerError, SyntaxId};

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable high-level error classification for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call could not be routed to a handler: unknown or reserved opnum,
    /// unbound presentation context or unknown interface.
    Routing,
    /// The request stub was malformed or did not fit the operation's request shape.
    Decode,
    /// The handler could not complete the call for reasons outside the protocol.
    Infrastructure,
    /// The handler's response could not be encoded.
    Encode,
}

impl ErrorKind {
    /// Returns true if the handler was never invoked for errors of this kind.
    pub fn is_pre_invocation(self) -> bool {
        matches!(self, ErrorKind::Routing | ErrorKind::Decode)
    }
}

/// Errors surfaced to the transport when a call cannot produce a response.
///
/// Logical failures reported by handlers through a response's status field are
/// never represented here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The opnum is not part of the interface
    #[error("operation {opnum} is not defined by interface {interface}")]
    UnknownOperation { interface: &'static str, opnum: u16 },

    /// The opnum is a reserved slot that is never used on the wire
    #[error("operation {opnum} ({name}) of interface {interface} is not used on the wire")]
    ReservedOperation {
        interface: &'static str,
        opnum: u16,
        name: &'static str,
    },

    /// The request stub could not be decoded
    #[error("malformed request stub for {operation}")]
    Decode {
        operation: &'static str,
        #[source]
        source: ndr::Error,
    },

    /// The request stub exceeds the configured limit
    #[error("request stub for {operation} is {len} bytes, exceeding the limit of {limit}")]
    StubTooLarge {
        operation: &'static str,
        len: usize,
        limit: usize,
    },

    /// The handler failed to produce a response
    #[error("{operation} failed")]
    Handler {
        operation: &'static str,
        #[source]
        source: HandlerError,
    },

    /// The handler's response could not be encoded
    #[error("failed to encode the response of {operation}")]
    Encode {
        operation: &'static str,
        #[source]
        source: ndr::Error,
    },

    /// The presentation context was never bound on this association
    #[error("presentation context {0} is not bound")]
    UnknownContext(u16),

    /// No registered interface serves the requested syntax
    #[error("interface {0} is not registered")]
    UnknownInterface(SyntaxId),
}

impl Error {
    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownOperation { .. }
            | Error::ReservedOperation { .. }
            | Error::UnknownContext(_)
            | Error::UnknownInterface(_) => ErrorKind::Routing,
            Error::Decode { .. } | Error::StubTooLarge { .. } => ErrorKind::Decode,
            Error::Handler { .. } => ErrorKind::Infrastructure,
            Error::Encode { .. } => ErrorKind::Encode,
        }
    }

    /// The handler error, if the handler was invoked and failed.
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            Error::Handler { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The fault status the transport should report for this error.
    pub fn fault_status(&self) -> u32 {
        match self {
            Error::UnknownOperation { .. } | Error::ReservedOperation { .. } => status::NCA_S_OP_RNG_ERROR,
            Error::UnknownInterface(_) => status::NCA_S_UNK_IF,
            Error::UnknownContext(_) => status::NCA_S_PROTO_ERROR,
            Error::Decode { .. } | Error::StubTooLarge { .. } | Error::Encode { .. } => status::NCA_S_FAULT_NDR,
            Error::Handler { source, .. } => source.fault_status(),
        }
    }
}

/// Errors raised while assembling operation tables, dispatchers and servers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Two entries of one interface claim the same opnum
    #[error("interface {interface} declares opnum {opnum} twice ({first} and {second})")]
    DuplicateOperation {
        interface: &'static str,
        opnum: u16,
        first: &'static str,
        second: &'static str,
    },

    /// Two registered handles share the same syntax
    #[error("interface {0} is registered twice")]
    DuplicateInterface(SyntaxId),

    /// The server options are inconsistent
    #[error("invalid server options: {0}")]
    InvalidOptions(&'static str),
}
