//! Scripted transport for testing
//!
//! Every [`Transport::receive`] consumes one [`Step`] of the script, so
//! tests control exactly where the stream is split between reads. The
//! handle is cheap to clone; clones share the script and the record of
//! sent data, so a test can keep one while the scanner owns the other.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};
use s400w_core::Command;
use tracing::trace;

use crate::{Readiness, Received, Transport, Wait, error::*};

/// One scripted read outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The next read returns these bytes
    ///
    /// If the read buffer is smaller, the rest is returned by the
    /// following read.
    Data(Vec<u8>),
    /// Nothing arrives; the read waits out its timeout
    Silence,
    /// The peer closes the connection
    Close,
}

impl Step {
    /// Data step from anything byte-like
    pub fn data(bytes: impl AsRef<[u8]>) -> Self {
        Self::Data(bytes.as_ref().to_vec())
    }
}

/// Mock transport for unit testing
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    script: VecDeque<Step>,
    sent: Vec<Vec<u8>>,
    connected: bool,
    connects: usize,
    failing_sends: usize,
    refuse_connect: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport with a script
    pub fn with_script(steps: impl IntoIterator<Item = Step>) -> Self {
        let mock = Self::new();
        mock.push_all(steps);
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock()
    }

    /// Append a step to the script
    pub fn push(&self, step: Step) {
        self.lock().script.push_back(step);
    }

    /// Append several steps to the script
    pub fn push_all(&self, steps: impl IntoIterator<Item = Step>) {
        self.lock().script.extend(steps);
    }

    /// Steps not consumed yet
    pub fn remaining(&self) -> usize {
        self.lock().script.len()
    }

    /// Everything sent, one entry per send call
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    /// Sent data decoded as commands
    pub fn sent_commands(&self) -> Vec<Command> {
        self.lock()
            .sent
            .iter()
            .filter_map(|data| <[u8; 4]>::try_from(data.as_slice()).ok())
            .map(|code| Command::from(u32::from_le_bytes(code)))
            .collect()
    }

    /// Number of successful connects
    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    /// Make the next `count` sends fail with a broken pipe
    pub fn fail_sends(&self, count: usize) {
        self.lock().failing_sends = count;
    }

    /// Make every following connect fail
    pub fn refuse_connect(&self) {
        self.lock().refuse_connect = true;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<()> {
        let mut inner = self.lock();
        if inner.connected {
            return Err(Error::AlreadyConnected);
        }
        if inner.refuse_connect {
            return Err(Error::Io(io::ErrorKind::ConnectionRefused.into()));
        }

        inner.connected = true;
        inner.connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(Error::NotConnected);
        }
        if inner.failing_sends > 0 {
            inner.failing_sends -= 1;
            return Err(Error::Io(io::ErrorKind::BrokenPipe.into()));
        }

        trace!("Mock sent {}", hex::encode(data));
        inner.sent.push(data.to_vec());
        Ok(())
    }

    async fn poll(&mut self, wait: Wait) -> Result<Readiness> {
        let silent = {
            let mut inner = self.lock();
            if !inner.connected {
                return Err(Error::NotConnected);
            }
            if wait == Wait::Forever {
                // Nothing ends an unbounded wait but the next step
                while matches!(inner.script.front(), Some(Step::Silence)) {
                    inner.script.pop_front();
                }
            }
            matches!(inner.script.front(), Some(Step::Silence))
        };

        if !silent {
            return Ok(Readiness::READABLE);
        }

        // Let the clock run out the same way a real socket would
        if let Wait::Bounded(limit) = wait {
            tokio::time::sleep(limit).await;
        }
        Ok(Readiness::empty())
    }

    async fn receive(&mut self, buf: &mut [u8], wait: Wait) -> Result<Received> {
        if self.poll(wait).await?.is_empty() {
            self.lock().script.pop_front();
            return Ok(Received::Timeout);
        }

        let mut inner = self.lock();
        match inner.script.pop_front() {
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    let rest = data.split_off(n);
                    inner.script.push_front(Step::Data(rest));
                }
                Ok(Received::Data(n))
            }
            Some(Step::Silence) => Ok(Received::Timeout),
            Some(Step::Close) | None => Ok(Received::Closed),
        }
    }

    fn remote_addr(&self) -> String {
        "mock".to_string()
    }
}
