//! TCP transport

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use s400w_core::constants::timeouts;
use tokio::io::{AsyncWriteExt, Interest};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{Readiness, Received, Transport, Wait, error::*};

/// TCP transport for S400W scanners
pub struct TcpTransport {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create new TCP transport
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket_addr: None,
            stream: None,
            connect_timeout: timeouts::CONNECT,
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let addr_str = format!("{}:{}", self.addr, self.port);

        let addr = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .next()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))?;

        self.socket_addr = Some(addr);
        Ok(addr)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr().await?;

        debug!("Connecting to {}...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Commands are 4 bytes and must leave immediately
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.remote_addr());

            let _ = stream.shutdown().await;
        }

        // Resolve again on the next connect
        self.socket_addr = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {}", data.len(), hex::encode(data));

        let written = stream.write(data).await?;
        if written != data.len() {
            return Err(Error::ShortWrite {
                written,
                expected: data.len(),
            });
        }

        Ok(())
    }

    async fn poll(&mut self, wait: Wait) -> Result<Readiness> {
        let stream = self.stream.as_ref().ok_or(Error::NotConnected)?;

        let ready = match wait {
            Wait::Forever => stream.ready(Interest::READABLE).await?,
            Wait::Bounded(limit) => match timeout(limit, stream.ready(Interest::READABLE)).await {
                Ok(ready) => ready?,
                Err(_) => return Ok(Readiness::empty()),
            },
        };

        let mut readiness = Readiness::empty();
        if ready.is_readable() || ready.is_read_closed() {
            readiness |= Readiness::READABLE;
        }
        if ready.is_error() {
            readiness |= Readiness::ERROR;
        }

        Ok(readiness)
    }

    async fn receive(&mut self, buf: &mut [u8], wait: Wait) -> Result<Received> {
        if buf.is_empty() {
            return Ok(Received::Data(0));
        }

        let deadline = wait.deadline();

        loop {
            let readiness = self.poll(Wait::until(deadline)).await?;
            if readiness.is_empty() {
                trace!("Read timed out");
                return Ok(Received::Timeout);
            }

            let stream = self.stream.as_ref().ok_or(Error::NotConnected)?;

            match stream.try_read(buf) {
                Ok(0) => {
                    debug!("Connection closed by {}", self.remote_addr());
                    return Ok(Received::Closed);
                }
                Ok(n) => {
                    trace!("Received {} bytes: {}", n, hex::encode(&buf[..n.min(16)]));
                    return Ok(Received::Data(n));
                }
                // Spurious readiness, wait again within what is left
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) => {
                    warn!("Read from {} failed: {}", self.remote_addr(), e);
                    return Ok(Received::Closed);
                }
            }
        }
    }

    fn remote_addr(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            debug!("TCP transport dropped while still connected");
        }
    }
}
