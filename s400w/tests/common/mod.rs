#![allow(dead_code)]

use std::io;

use s400w::{Pacing, ScanSink, Scanner, Settings};
use s400w_transport::{MockTransport, Step};

/// Scanner over a scripted transport, without settle delays
pub fn scanner(steps: impl IntoIterator<Item = Step>) -> (Scanner, MockTransport) {
    let mock = MockTransport::with_script(steps);
    let settings = Settings::default().with_pacing(Pacing::none());
    (Scanner::with_transport(mock.clone(), settings), mock)
}

/// Filler that never contains a response token
pub fn filler(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub const PREVIEW_TRAILER: &[u8] = b"previewend\0";

pub fn jpeg_size(size: u32) -> Step {
    let mut data = b"jpegsize".to_vec();
    data.extend_from_slice(&size.to_le_bytes());
    Step::Data(data)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Size(u32),
    Data(Vec<u8>),
    Finish,
}

/// Sink that records every call
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    /// Fail the n-th size/data call (0-based)
    pub refuse_at: Option<usize>,
    calls: usize,
}

impl Recorder {
    pub fn refusing_at(n: usize) -> Self {
        Self {
            refuse_at: Some(n),
            ..Self::default()
        }
    }

    fn record(&mut self, event: Event) -> io::Result<()> {
        self.events.push(event);
        let call = self.calls;
        self.calls += 1;
        if self.refuse_at == Some(call) {
            return Err(io::Error::other("sink full"));
        }
        Ok(())
    }

    /// All data bytes in order
    pub fn data(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Data(d) => Some(d.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Sizes of the data chunks
    pub fn chunks(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Data(d) => Some(d.len()),
                _ => None,
            })
            .collect()
    }

    pub fn finishes(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Finish).count()
    }

    pub fn sizes(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Size(s) => Some(*s),
                _ => None,
            })
            .collect()
    }
}

impl ScanSink for Recorder {
    fn announce_size(&mut self, size: u32) -> io::Result<()> {
        self.record(Event::Size(size))
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.record(Event::Data(chunk.to_vec()))
    }

    fn finish(&mut self) {
        self.events.push(Event::Finish);
    }
}
