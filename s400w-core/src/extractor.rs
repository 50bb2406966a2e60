//! Streaming payload extraction
//!
//! Preview data has no length prefix. The device terminates it in-band with
//! the `previewend` token followed by one padding byte, and that trailer can
//! be torn across two socket reads. The extractor keeps the last
//! `marker + 1` bytes of the stream back from the sink and carries them in a
//! reserved prefix in front of the read area, so the next read lands
//! directly behind them and the trailer check always sees a contiguous
//! window.
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────┐
//! │   reserved prefix    │             read area                │
//! │  marker + 1 bytes    │          capacity bytes              │
//! └──────────────────────┴──────────────────────────────────────┘
//!            └── carried ──┘└────── n bytes of this read ──────┘
//! ```

use tracing::trace;

use crate::constants::PREVIEW_CHUNK_SIZE;
use crate::response::Signature;

/// State of the stream after a chunk was fed
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// End marker not seen yet
    NeedMore,
    /// End marker found, the stream is complete
    MarkerFound,
}

/// Incremental extractor for marker-terminated payloads
#[derive(Debug)]
pub struct PayloadExtractor {
    buf: Vec<u8>,
    marker: &'static [u8],
    carried: usize,
    total: usize,
    finished: bool,
}

impl PayloadExtractor {
    /// Create an extractor for `marker` with a read area of `capacity` bytes
    pub fn new(marker: &'static [u8], capacity: usize) -> Self {
        assert!(!marker.is_empty(), "end marker must not be empty");
        assert!(capacity > 0, "read capacity must not be zero");

        Self {
            buf: vec![0; marker.len() + 1 + capacity],
            marker,
            carried: 0,
            total: 0,
            finished: false,
        }
    }

    /// Extractor for the preview stream
    pub fn for_preview() -> Self {
        Self::new(Signature::PreviewEnd.token(), PREVIEW_CHUNK_SIZE)
    }

    /// Length of the held-back trailer: marker plus one padding byte
    pub fn tail_len(&self) -> usize {
        self.marker.len() + 1
    }

    /// Size of the read area
    pub fn capacity(&self) -> usize {
        self.buf.len() - self.tail_len()
    }

    /// Area the next read must fill
    pub fn read_area(&mut self) -> &mut [u8] {
        let start = self.tail_len();
        &mut self.buf[start..]
    }

    /// The `n` bytes of the last read, before they are fed
    pub fn received(&self, n: usize) -> &[u8] {
        let start = self.tail_len();
        &self.buf[start..start + n.min(self.capacity())]
    }

    /// Total bytes read so far, marker included
    pub fn total(&self) -> usize {
        self.total
    }

    /// Check if the end marker has been found
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed the `n` bytes just read into [`read_area`](Self::read_area)
    ///
    /// Payload bytes that can no longer be part of the trailer are handed
    /// to `dispatch` before the trailer is moved into the reserved prefix.
    /// Marker bytes are never dispatched. An error from `dispatch` is
    /// returned as is and leaves the carried bytes untouched.
    pub fn feed<E>(
        &mut self,
        n: usize,
        mut dispatch: impl FnMut(&[u8]) -> Result<(), E>,
    ) -> Result<Extraction, E> {
        if self.finished {
            return Ok(Extraction::MarkerFound);
        }

        let tail_len = self.tail_len();
        let n = n.min(self.capacity());
        self.total += n;

        let start = tail_len - self.carried;
        let end = tail_len + n;
        let keep = (end - start).min(tail_len);
        let cut = end - keep;

        let tail = &self.buf[cut..end];
        let found = keep == tail_len && tail[..self.marker.len()] == self.marker[..];

        if cut > start {
            dispatch(&self.buf[start..cut])?;
        }

        if found {
            trace!(total = self.total, "End marker found");
            self.carried = 0;
            self.finished = true;
            return Ok(Extraction::MarkerFound);
        }

        self.buf.copy_within(cut..end, tail_len - keep);
        self.carried = keep;

        Ok(Extraction::NeedMore)
    }

    /// Release the held-back bytes when the stream ends without a marker
    pub fn take_held(&mut self) -> &[u8] {
        let tail_len = self.tail_len();
        let start = tail_len - self.carried;
        self.carried = 0;
        &self.buf[start..tail_len]
    }
}
