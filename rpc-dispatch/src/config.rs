//! Configuration management for dispatchers

use std::time::Duration;

use crate::BuildError;

/// Default upper bound on the size of a request stub, 4 MiB.
pub const DEFAULT_MAX_STUB_SIZE: usize = 4 * 1024 * 1024;

/// Configuration options shared by the dispatchers of a server
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServerOptions {
    /// Deadline applied to calls whose context doesn't carry one
    pub call_timeout: Option<Duration>,

    /// Largest request stub accepted before decoding, in bytes
    pub max_stub_size: usize,

    /// Treat bytes left over after decoding a request as malformed input
    pub reject_trailing_bytes: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            call_timeout: None,
            max_stub_size: DEFAULT_MAX_STUB_SIZE,
            reject_trailing_bytes: false,
        }
    }
}

impl ServerOptions {
    /// Create new server options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline applied to calls without one
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Set the largest accepted request stub
    pub fn with_max_stub_size(mut self, max: usize) -> Self {
        self.max_stub_size = max;
        self
    }

    /// Enable or disable rejection of trailing request bytes
    pub fn with_reject_trailing_bytes(mut self, reject: bool) -> Self {
        self.reject_trailing_bytes = reject;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.max_stub_size == 0 {
            return Err(BuildError::InvalidOptions("max_stub_size must be non-zero"));
        }
        if self.call_timeout == Some(Duration::ZERO) {
            return Err(BuildError::InvalidOptions("call_timeout must be non-zero"));
        }
        Ok(())
    }
}
