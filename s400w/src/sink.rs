//! Destinations for streamed scan data

use std::io::{self, Write};

use tracing::warn;

/// Receives the payload of one scan phase
///
/// A sink sees zero or more [`write`](ScanSink::write) calls and then
/// exactly one [`finish`](ScanSink::finish), whatever the outcome of the
/// scan. A JPEG sink is told the announced size once, before any data.
/// Returning an error from `announce_size` or `write` stops the transfer.
pub trait ScanSink: Send {
    /// Size of the JPEG that follows
    fn announce_size(&mut self, size: u32) -> io::Result<()> {
        let _ = size;
        Ok(())
    }

    /// Next chunk of payload
    fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// End of stream
    fn finish(&mut self) {}
}

/// Most a `Vec` sink reserves up front; the announced size is not trusted
const VEC_RESERVE_LIMIT: usize = 8 * 1024 * 1024;

impl ScanSink for Vec<u8> {
    fn announce_size(&mut self, size: u32) -> io::Result<()> {
        let additional = (size as usize).min(VEC_RESERVE_LIMIT);
        self.try_reserve(additional)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }
}

/// Sink adapter for any [`io::Write`], e.g. a file
#[derive(Debug)]
pub struct WriteSink<W: Write + Send> {
    inner: W,
    written: u64,
}

impl<W: Write + Send> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> ScanSink for WriteSink<W> {
    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.inner.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn finish(&mut self) {
        if let Err(e) = self.inner.flush() {
            warn!("Failed to flush scan output: {}", e);
        }
    }
}

/// Wraps a caller's sink for one scan and finishes it exactly once
pub(crate) struct SinkGuard<'a> {
    sink: &'a mut dyn ScanSink,
    finished: bool,
}

impl<'a> SinkGuard<'a> {
    pub(crate) fn new(sink: &'a mut dyn ScanSink) -> Self {
        Self {
            sink,
            finished: false,
        }
    }

    pub(crate) fn announce_size(&mut self, size: u32) -> io::Result<()> {
        self.sink.announce_size(size)
    }

    pub(crate) fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.sink.write(chunk)
    }

    pub(crate) fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.sink.finish();
        }
    }
}

impl Drop for SinkGuard<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
