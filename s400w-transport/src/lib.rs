//! Transport layer for S400W scanners
//!
//! The scanner speaks over a plain TCP stream. Every read is bounded by a
//! caller-supplied wait and reports one of three outcomes: data, timeout,
//! or a closed stream.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod tcp;

pub use error::{Error, Result};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockTransport, Step};
pub use s400w_core::Received;
pub use tcp::TcpTransport;

use std::time::Duration;

use async_trait::async_trait;
use bitflags::bitflags;
use tokio::time::Instant;

bitflags! {
    /// Socket readiness reported by [`Transport::poll`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Readiness: u8 {
        /// Data (or end of stream) can be read
        const READABLE = 0b0000_0001;
        /// Socket reported an error condition
        const ERROR    = 0b0000_0010;
    }
}

/// How long a read may wait for data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Give up after the duration
    Bounded(Duration),
    /// Block until something happens
    Forever,
}

impl Wait {
    /// Absolute deadline for this wait, starting now
    pub fn deadline(self) -> Option<Instant> {
        match self {
            Self::Bounded(duration) => Some(Instant::now() + duration),
            Self::Forever => None,
        }
    }

    /// Wait that remains until `deadline`
    pub fn until(deadline: Option<Instant>) -> Self {
        match deadline {
            Some(at) => Self::Bounded(at.saturating_duration_since(Instant::now())),
            None => Self::Forever,
        }
    }
}

impl From<Duration> for Wait {
    fn from(duration: Duration) -> Self {
        Self::Bounded(duration)
    }
}

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send {
    /// Connect to device
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from device
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes; fewer bytes written than given is an error
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Wait until the stream becomes readable
    ///
    /// Returns an empty set when `wait` expires first.
    async fn poll(&mut self, wait: Wait) -> Result<Readiness>;

    /// Read once into `buf`
    ///
    /// Waits at most `wait` for data, then performs a single read. A read
    /// of zero bytes or a socket failure is reported as
    /// [`Received::Closed`].
    async fn receive(&mut self, buf: &mut [u8], wait: Wait) -> Result<Received>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}
