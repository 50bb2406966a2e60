//! High-level error types

use std::io;

use s400w_core::{Response, Signature};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] s400w_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] s400w_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] s400w_types::Error),

    #[error("No response within timeout")]
    Timeout,

    #[error("Connection closed by scanner")]
    Closed,

    #[error("Unexpected response from scanner: {0}")]
    UnexpectedResponse(Response),

    #[error("Sink stopped the transfer: {0}")]
    SinkAborted(#[source] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Turn a received sentinel or token into an error
    pub fn from_response(response: Response) -> Self {
        match response {
            Response::Timeout => Self::Timeout,
            Response::EndOfStream => Self::Closed,
            other => Self::UnexpectedResponse(other),
        }
    }

    /// Response value reported to callers of the protocol operations
    ///
    /// Timeouts stay distinguishable; connection, sink and internal
    /// failures all end the operation as [`Response::EndOfStream`].
    pub fn into_response(self) -> Response {
        match self {
            Self::Timeout => Response::Timeout,
            Self::UnexpectedResponse(response) => response,
            _ => Response::EndOfStream,
        }
    }

    /// Check if repeating the whole operation might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Closed => true,
            Self::Transport(e) => matches!(
                e,
                s400w_transport::Error::ConnectionTimeout | s400w_transport::Error::Io(_)
            ),
            Self::Core(e) => e.is_recoverable(),
            Self::UnexpectedResponse(response) => response.is(Signature::DeviceBusy),
            _ => false,
        }
    }
}
