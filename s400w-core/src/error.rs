//! Error types for s400w-core

use crate::phase::ScanPhase;

/// Result type alias for s400w-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Response is too short to carry the expected fields
    #[error("Response too short: expected at least {expected} bytes, got {actual} bytes")]
    ResponseTooShort {
        expected: usize,
        actual: usize,
    },

    /// Scan sequencer attempted a transition the protocol does not allow
    #[error("Invalid scan transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ScanPhase,
        to: ScanPhase,
    },

    /// Scan sequencer is already in a terminal phase
    #[error("Scan already finished in phase {0:?}")]
    ScanFinished(ScanPhase),
}

impl Error {
    /// Check if error is recoverable (retry of the whole operation might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ResponseTooShort { .. })
    }
}
