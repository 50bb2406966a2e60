//! # s400w
//!
//! Client for Mustek S400W (iScanAir) network document scanners.
//!
//! The scanner speaks a small reverse-engineered protocol over TCP: 4-byte
//! commands, short ASCII answers, and bulk preview/JPEG data.
//!
//! ## Features
//!
//! - Async/await API using Tokio
//! - Status, version, battery, resolution, cleaning and calibration
//! - Streaming scans into caller-supplied sinks
//! - Raw commands and command-space probing for protocol exploration
//!
//! ## Quick Start
//!
//! ```no_run
//! use s400w::{Response, Scanner, Signature};
//!
//! #[tokio::main]
//! async fn main() -> s400w::Result<()> {
//!     let mut scanner = Scanner::from_env()?;
//!
//!     if scanner.status().await != Response::from(Signature::ScanReady) {
//!         println!("Insert a page first");
//!         return Ok(());
//!     }
//!
//!     let mut jpeg: Vec<u8> = Vec::new();
//!     let response = scanner.scan(Some(600), None, Some(&mut jpeg)).await;
//!     println!("{}: {} bytes", response, jpeg.len());
//!
//!     Ok(())
//! }
//! ```

pub mod diagnostics;
pub mod error;
pub mod scan;
pub mod scanner;
mod session;
pub mod settings;
pub mod sink;

// Re-exports
pub use diagnostics::{KNOWN_COMMANDS, ProbeHit, probe_space};
pub use error::{Error, Result};
pub use scanner::Scanner;
pub use settings::{Pacing, Settings, Timeouts};
pub use sink::{ScanSink, WriteSink};

// Re-export protocol types
pub use s400w_core::{Command, Response, ScanPhase, Signature};
pub use s400w_transport::Wait;
pub use s400w_types::{BatteryState, FirmwareVersion};
