//! Scan sequencing
//!
//! Drives one scan through status check, optional resolution, start,
//! optional preview stream and optional JPEG transfer. A wrong answer at any
//! step ends the scan and is handed back unchanged.

use s400w_core::constants::{PREVIEW_CHUNK_SIZE, PREVIEW_LINE_SIZE, RESPONSE_BUFFER_SIZE};
use s400w_core::{
    Command, Extraction, PayloadExtractor, Received, Response, ScanPhase, ScanState, Signature,
};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::session::{Session, pause};
use crate::sink::{ScanSink, SinkGuard};

/// Command and expected echo for a requested resolution
///
/// Only 600 selects the high resolution; anything else is standard.
pub fn resolution_command(dpi: u32) -> (Command, Signature) {
    match Command::for_resolution(dpi) {
        Command::SetDpiHigh => (Command::SetDpiHigh, Signature::DpiHigh),
        command => (command, Signature::DpiStandard),
    }
}

pub(crate) struct Sequencer<'s, 'a, 'k> {
    session: &'s mut Session<'a>,
    state: ScanState,
    preview: Option<SinkGuard<'k>>,
    jpeg: Option<SinkGuard<'k>>,
}

impl<'s, 'a, 'k> Sequencer<'s, 'a, 'k> {
    pub(crate) fn new(
        session: &'s mut Session<'a>,
        preview: Option<&'k mut dyn ScanSink>,
        jpeg: Option<&'k mut dyn ScanSink>,
    ) -> Self {
        Self {
            session,
            state: ScanState::new(),
            preview: preview.map(SinkGuard::new),
            jpeg: jpeg.map(SinkGuard::new),
        }
    }

    /// Run the scan to its terminal response
    ///
    /// Every sink handed to [`Sequencer::new`] has been finished when this
    /// returns.
    pub(crate) async fn run(mut self, resolution: Option<u32>) -> Response {
        let response = match self.steps(resolution).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Scan failed: {}", e);
                e.into_response()
            }
        };

        if self.state.phase() != ScanPhase::Done {
            self.state.abort();
            debug!(phase = ?self.state.phase(), "Scan aborted: {}", response);
        }

        if let Some(sink) = self.preview.as_mut() {
            sink.finish();
        }
        if let Some(sink) = self.jpeg.as_mut() {
            sink.finish();
        }

        response
    }

    async fn steps(&mut self, resolution: Option<u32>) -> Result<Response> {
        let normal = self.session.settings().timeouts.normal;

        let status = self.session.request(Command::GetStatus, normal).await?;
        if !status.is(Signature::ScanReady) {
            return Ok(status);
        }
        self.state.advance(ScanPhase::StatusChecked)?;

        if let Some(dpi) = resolution.filter(|dpi| *dpi > 0) {
            let (command, echo) = resolution_command(dpi);
            let response = self.session.request(command, normal).await?;
            if !response.is(echo) {
                return Ok(response);
            }
            self.state.advance(ScanPhase::ResolutionSet)?;
        }

        let go = self.session.request(Command::StartScan, normal).await?;
        if !go.is(Signature::ScanGo) {
            return Ok(go);
        }
        self.state.advance(ScanPhase::ScanStarted)?;

        let previewed = self.preview.is_some();
        if previewed {
            let response = self.stream_preview().await;
            if let Some(sink) = self.preview.as_mut() {
                sink.finish();
            }
            let response = response?;
            if response != Response::SCAN_READY {
                return Ok(response);
            }
        }

        if self.jpeg.is_some() {
            let response = self.stream_jpeg(previewed).await?;
            if response != Response::SCAN_READY {
                return Ok(response);
            }
        }

        self.state.advance(ScanPhase::Done)?;
        Ok(Response::SCAN_READY)
    }

    /// Stream the preview until its end marker
    async fn stream_preview(&mut self) -> Result<Response> {
        let settings = self.session.settings();
        let Some(sink) = self.preview.as_mut() else {
            return Ok(Response::SCAN_READY);
        };

        self.session.send(Command::SendPreviewData).await?;
        self.state.advance(ScanPhase::PreviewStreaming)?;
        pause(settings.pacing.preview).await;

        let mut extractor = PayloadExtractor::for_preview();
        let mut first = true;

        let end = loop {
            let received = self
                .session
                .receive(extractor.read_area(), settings.timeouts.data)
                .await?;

            let n = match received {
                Received::Data(0) | Received::Timeout => break Response::Timeout,
                Received::Closed => break Response::EndOfStream,
                Received::Data(n) => n,
            };

            // A short token instead of image data reports a device error
            if first && n <= RESPONSE_BUFFER_SIZE {
                if let Some(sig) = Signature::find(extractor.received(n)) {
                    warn!("Preview refused: {}", Response::from(sig));
                    return Ok(sig.into());
                }
            }
            first = false;

            self.state.add_preview(n);
            let total = self.state.preview_bytes();
            trace!("Preview: {} bytes ({} lines)", total, total / PREVIEW_LINE_SIZE);

            match extractor.feed(n, |chunk| sink.write(chunk)) {
                Ok(Extraction::MarkerFound) => {
                    debug!(bytes = self.state.preview_bytes(), "Preview complete");
                    return Ok(Response::SCAN_READY);
                }
                Ok(Extraction::NeedMore) => {}
                Err(e) => return Err(Error::SinkAborted(e)),
            }
        };

        let held = extractor.take_held();
        if !held.is_empty() {
            if let Err(e) = sink.write(held) {
                debug!("Sink refused trailing preview bytes: {}", e);
            }
        }

        warn!(bytes = self.state.preview_bytes(), "Preview incomplete: {}", end);
        Ok(end)
    }

    /// Fetch the JPEG size and stream that many bytes
    async fn stream_jpeg(&mut self, previewed: bool) -> Result<Response> {
        let settings = self.session.settings();
        let Some(sink) = self.jpeg.as_mut() else {
            return Ok(Response::SCAN_READY);
        };

        let timeout = if previewed {
            pause(settings.pacing.between_phases).await;
            settings.timeouts.jpeg_size
        } else {
            settings.timeouts.jpeg_only
        };

        let response = self.session.request(Command::GetJpegSize, timeout).await?;
        if !response.is(Signature::JpegSize) {
            return Ok(response);
        }

        let size = match self.session.jpeg_size() {
            Ok(size) => size,
            Err(e) => {
                warn!("Unusable JPEG size: {}", e);
                return Ok(response);
            }
        };
        self.state.advance(ScanPhase::JpegSizeKnown)?;
        self.state.set_jpeg_size(size);
        debug!("JPEG: {} bytes", size);

        sink.announce_size(size).map_err(Error::SinkAborted)?;

        self.session.send(Command::SendJpegData).await?;
        self.state.advance(ScanPhase::JpegStreaming)?;
        pause(settings.pacing.jpeg_data).await;

        let mut buf = vec![0u8; PREVIEW_CHUNK_SIZE];

        while self.state.jpeg_remaining() > 0 {
            let received = self.session.receive(&mut buf, settings.timeouts.data).await?;

            let n = match received {
                Received::Data(0) | Received::Timeout => return Ok(Response::Timeout),
                Received::Closed => return Ok(Response::EndOfStream),
                Received::Data(n) => n,
            };

            let take = n.min(self.state.jpeg_remaining());
            if take < n {
                debug!("Ignoring {} bytes past the announced size", n - take);
            }

            sink.write(&buf[..take]).map_err(Error::SinkAborted)?;
            self.state.add_jpeg(take);
            trace!("JPEG: {} / {} bytes", self.state.jpeg_bytes(), size);
        }

        Ok(Response::SCAN_READY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_command() {
        assert_eq!(resolution_command(600), (Command::SetDpiHigh, Signature::DpiHigh));
        assert_eq!(resolution_command(300), (Command::SetDpiStandard, Signature::DpiStandard));
        assert_eq!(resolution_command(1200), (Command::SetDpiStandard, Signature::DpiStandard));
        assert_eq!(resolution_command(1), (Command::SetDpiStandard, Signature::DpiStandard));
    }
}
