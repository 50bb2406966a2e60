//! # s400w-core
//!
//! Core protocol implementation for S400W network scanners.
//!
//! This crate provides the low-level protocol primitives:
//! - Command definitions and encoding
//! - Response classification
//! - Streaming extraction of marker-terminated payloads
//! - Scan phase tracking
//! - Protocol constants

pub mod command;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod phase;
pub mod response;

pub use command::Command;
pub use error::{Error, Result};
pub use extractor::{Extraction, PayloadExtractor};
pub use phase::{ScanPhase, ScanState};
pub use response::{Received, Response, Signature};
