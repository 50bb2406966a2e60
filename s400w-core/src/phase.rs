//! Scan sequencing state
//!
//! A scan walks through these phases:
//!
//! ```text
//! Idle → StatusChecked → [ResolutionSet] → ScanStarted → [PreviewStreaming]
//!      → [JpegSizeKnown → JpegStreaming] → Done
//! ```
//!
//! Any non-terminal phase may fall into `Aborted`.

use tracing::trace;

use crate::error::{Error, Result};

/// Scan phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Connected, nothing sent yet
    Idle,

    /// Device reported it is ready to scan
    StatusChecked,

    /// Requested resolution was acknowledged
    ResolutionSet,

    /// Device acknowledged the scan start
    ScanStarted,

    /// Preview data is being received
    PreviewStreaming,

    /// JPEG size was announced
    JpegSizeKnown,

    /// JPEG data is being received
    JpegStreaming,

    /// Scan finished successfully
    Done,

    /// Scan was aborted
    Aborted,
}

impl ScanPhase {
    /// Check if no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Check if the protocol allows moving from `self` to `next`
    pub fn can_advance_to(self, next: ScanPhase) -> bool {
        use ScanPhase::*;

        match (self, next) {
            (from, Aborted) => !from.is_terminal(),
            (Idle, StatusChecked) => true,
            (StatusChecked, ResolutionSet | ScanStarted) => true,
            (ResolutionSet, ScanStarted) => true,
            (ScanStarted, PreviewStreaming | JpegSizeKnown | Done) => true,
            (PreviewStreaming, JpegSizeKnown | Done) => true,
            (JpegSizeKnown, JpegStreaming) => true,
            (JpegStreaming, Done) => true,
            _ => false,
        }
    }
}

/// Tracks the phase of one scan and the bytes moved so far
#[derive(Debug, Clone)]
pub struct ScanState {
    phase: ScanPhase,
    preview_bytes: usize,
    jpeg_size: Option<u32>,
    jpeg_bytes: usize,
}

impl ScanState {
    /// Create a new scan in [`ScanPhase::Idle`]
    pub fn new() -> Self {
        Self {
            phase: ScanPhase::Idle,
            preview_bytes: 0,
            jpeg_size: None,
            jpeg_bytes: 0,
        }
    }

    /// Get current phase
    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Move to `next`
    pub fn advance(&mut self, next: ScanPhase) -> Result<()> {
        if self.phase.is_terminal() {
            return Err(Error::ScanFinished(self.phase));
        }

        if !self.phase.can_advance_to(next) {
            return Err(Error::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        trace!(from = ?self.phase, to = ?next, "Scan transition");
        self.phase = next;
        Ok(())
    }

    /// Abort from any non-terminal phase; no-op once terminal
    pub fn abort(&mut self) {
        if !self.phase.is_terminal() {
            trace!(from = ?self.phase, "Scan aborted");
            self.phase = ScanPhase::Aborted;
        }
    }

    /// Record received preview bytes
    pub fn add_preview(&mut self, n: usize) {
        self.preview_bytes += n;
    }

    /// Record the announced JPEG size
    pub fn set_jpeg_size(&mut self, size: u32) {
        self.jpeg_size = Some(size);
    }

    /// Record received JPEG bytes
    pub fn add_jpeg(&mut self, n: usize) {
        self.jpeg_bytes += n;
    }

    /// Preview bytes received so far
    pub fn preview_bytes(&self) -> usize {
        self.preview_bytes
    }

    /// Announced JPEG size
    pub fn jpeg_size(&self) -> Option<u32> {
        self.jpeg_size
    }

    /// JPEG bytes received so far
    pub fn jpeg_bytes(&self) -> usize {
        self.jpeg_bytes
    }

    /// Bytes still expected before the JPEG is complete
    pub fn jpeg_remaining(&self) -> usize {
        self.jpeg_size
            .map(|size| (size as usize).saturating_sub(self.jpeg_bytes))
            .unwrap_or(0)
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}
