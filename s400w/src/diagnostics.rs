//! Protocol exploration
//!
//! Tools for finding out what the firmware understands. Unexpected commands
//! tend to leave the device unresponsive until the next connection, so the
//! probe reconnects generously and makes no guarantees beyond best effort.

use s400w_core::{Command, Response};
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::scanner::Scanner;
use crate::session::Session;

/// Opcodes a probe skips by default
pub const KNOWN_COMMANDS: [u32; 11] = [
    0x1000_2000, 0x1020_3040, 0x3000_4000, 0x3030_4040, 0x5000_6000, 0x5060_7080,
    0x7000_8000, 0x7070_8080, 0xA000_B000, 0xC000_D000, 0xE000_F000,
];

/// Candidate commands of a probe, in probing order
///
/// Commands have the form `i1 << 28 | i2 << 20 | i3 << 12 | i4 << 4` with
/// `i1` in `1..16` and the other nibbles in `0..16`.
pub fn probe_space() -> impl Iterator<Item = u32> {
    (1u32..16).flat_map(|i1| {
        (0u32..16).flat_map(move |i2| {
            (0u32..16).flat_map(move |i3| {
                (0u32..16).map(move |i4| i1 << 28 | i2 << 20 | i3 << 12 | i4 << 4)
            })
        })
    })
}

/// Check if `command` is the last one of its `i2` block
fn ends_block(command: u32) -> bool {
    (command >> 12) & 0xF == 0xF && (command >> 4) & 0xF == 0xF
}

/// A probed command that got an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit {
    pub command: u32,
    pub response: Response,
}

impl Scanner {
    /// Send an arbitrary 4-byte command and return the response
    pub async fn raw(&mut self, command: u32) -> Response {
        let timeout = self.settings().timeouts.normal;
        self.query("raw", Command::from(command), timeout).await
    }

    /// Walk the probe space from `start`, skipping `known` commands
    ///
    /// Returns the commands the device answered. The probe ends early when
    /// the device cannot be reached anymore.
    pub async fn probe(&mut self, start: u32, known: &[u32]) -> Vec<ProbeHit> {
        info!("Probing from {:08x}", start);

        let mut hits = Vec::new();
        let mut session = match self.open().await {
            Ok(session) => session,
            Err(e) => {
                warn!("probe(): can't connect: {}", e);
                return hits;
            }
        };

        if let Err(e) = probe_steps(&mut session, start, known, &mut hits).await {
            warn!("probe(): giving up: {}", e);
        }
        session.close().await;

        info!("Probe finished, {} commands answered", hits.len());
        hits
    }
}

async fn probe_steps(
    session: &mut Session<'_>,
    start: u32,
    known: &[u32],
    hits: &mut Vec<ProbeHit>,
) -> Result<()> {
    let timeout = session.settings().timeouts.probe;
    let mut dirty = false;

    for code in probe_space() {
        if code & 0x0000_F0F0 == 0 {
            debug!("probe({:08x})", code);
        }

        if code >= start && !known.contains(&code) {
            let command = Command::from(code);
            dirty = true;

            if let Err(e) = session.send(command).await {
                warn!("probe({:08x}): can't send, reconnecting: {}", code, e);
                session.reopen().await?;
                session.send(command).await?;
            }

            let response = session.read_response(timeout).await?;
            if response.is_timeout() {
                trace!("probe({:08x}): no answer", code);
            } else {
                info!("probe({:08x}): {}", code, response);
                if !response.is_end_of_stream() {
                    hits.push(ProbeHit {
                        command: code,
                        response,
                    });
                }
                session.reopen().await?;
                dirty = false;
            }
        } else if known.contains(&code) {
            trace!("probe({:08x}): known command", code);
        }

        if ends_block(code) && dirty {
            session.reopen().await?;
            dirty = false;
        }
    }

    Ok(())
}
