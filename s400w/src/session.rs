//! One connection to the scanner
//!
//! Every public operation opens a session, runs its request/response steps
//! over it and closes it again. The session owns the classification
//! buffer, so nothing is shared between operations.

use std::time::Duration;

use s400w_core::constants::RESPONSE_BUFFER_SIZE;
use s400w_core::{Command, Received, Response, response};
use s400w_transport::{Transport, Wait};
use tracing::{debug, trace};

use crate::error::Result;
use crate::settings::Settings;

pub(crate) struct Session<'a> {
    transport: &'a mut dyn Transport,
    settings: &'a Settings,
    buffer: [u8; RESPONSE_BUFFER_SIZE],
    received: usize,
}

impl<'a> Session<'a> {
    /// Connect and start a session
    pub(crate) async fn open(transport: &'a mut dyn Transport, settings: &'a Settings) -> Result<Self> {
        if transport.is_connected() {
            transport.disconnect().await?;
        }
        transport.connect().await?;

        Ok(Self {
            transport,
            settings,
            buffer: [0; RESPONSE_BUFFER_SIZE],
            received: 0,
        })
    }

    /// Close the connection; errors are only logged
    pub(crate) async fn close(self) {
        if let Err(e) = self.transport.disconnect().await {
            debug!("Failed to close connection: {}", e);
        }
    }

    /// Reconnect, e.g. after the device stopped answering
    pub(crate) async fn reopen(&mut self) -> Result<()> {
        if let Err(e) = self.transport.disconnect().await {
            debug!("Failed to close connection: {}", e);
        }
        self.transport.connect().await?;
        Ok(())
    }

    pub(crate) fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Send one command, framed by the settle delays
    pub(crate) async fn send(&mut self, command: Command) -> Result<()> {
        let pacing = &self.settings.pacing;

        pause(pacing.before_send).await;
        let sent = self.transport.send(&command.encode()).await;
        trace!("Sent {}: {}", command, if sent.is_ok() { "ok" } else { "failed" });
        sent?;
        pause(pacing.after_send).await;

        Ok(())
    }

    /// Read and classify one short response
    pub(crate) async fn read_response(&mut self, timeout: Wait) -> Result<Response> {
        self.buffer = [0; RESPONSE_BUFFER_SIZE];
        self.received = 0;

        let received = self
            .transport
            .receive(&mut self.buffer, timeout)
            .await?;
        if let Received::Data(n) = received {
            self.received = n;
        }

        Ok(Response::classify(&self.buffer, received))
    }

    /// Send a command and read its response
    pub(crate) async fn request(&mut self, command: Command, timeout: Wait) -> Result<Response> {
        self.send(command).await?;
        let response = self.read_response(timeout).await?;
        debug!("{} -> {}", command.name(), response);
        Ok(response)
    }

    /// Read once into a payload buffer
    pub(crate) async fn receive(&mut self, buf: &mut [u8], timeout: Wait) -> Result<Received> {
        Ok(self.transport.receive(buf, timeout).await?)
    }

    /// Bytes of the last short response
    pub(crate) fn last_response(&self) -> &[u8] {
        &self.buffer[..self.received]
    }

    /// JPEG size carried by the last response
    pub(crate) fn jpeg_size(&self) -> Result<u32> {
        Ok(response::jpeg_size(self.last_response())?)
    }
}

/// Wait out a settle delay
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
