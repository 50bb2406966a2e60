//! Scanner settings
//!
//! Defaults match the device. Every value can be overridden from the
//! environment, timeouts in (fractional) seconds. A read timeout of `-1`
//! or `inf` waits forever:
//!
//! | Variable                  | Default         |
//! |---------------------------|-----------------|
//! | `S400W_HOST`              | `192.168.18.33` |
//! | `S400W_PORT`              | `23`            |
//! | `S400W_TIMEOUT_CONNECT`   | 5               |
//! | `S400W_TIMEOUT`           | 10              |
//! | `S400W_TIMEOUT_CLEAN`     | 40              |
//! | `S400W_TIMEOUT_CALIBRATE` | 60              |
//! | `S400W_TIMEOUT_DATA`      | 30              |
//! | `S400W_TIMEOUT_JPEG_SIZE` | 20              |
//! | `S400W_TIMEOUT_JPEG_ONLY` | 60              |

use std::time::Duration;

use s400w_core::constants::{DEFAULT_HOST, DEFAULT_PORT, delays, timeouts};
use s400w_transport::Wait;
use tracing::debug;

use crate::error::{Error, Result};

/// Per-phase read timeouts
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    /// Socket connect
    pub connect: Duration,
    /// Simple request/response calls
    pub normal: Wait,
    /// Completion of the cleaning routine
    pub clean: Wait,
    /// Completion of the calibration routine
    pub calibrate: Wait,
    /// Gap between preview or jpeg data chunks
    pub data: Wait,
    /// JPEG size after a streamed preview
    pub jpeg_size: Wait,
    /// JPEG size without a preview
    pub jpeg_only: Wait,
    /// Reply to a probed command
    pub probe: Wait,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: timeouts::CONNECT,
            normal: Wait::Bounded(timeouts::NORMAL),
            clean: Wait::Bounded(timeouts::CLEAN),
            calibrate: Wait::Bounded(timeouts::CALIBRATE),
            data: Wait::Bounded(timeouts::DATA),
            jpeg_size: Wait::Bounded(timeouts::JPEG_SIZE),
            jpeg_only: Wait::Bounded(timeouts::JPEG_ONLY),
            probe: Wait::Bounded(timeouts::PROBE),
        }
    }
}

/// Settle delays the firmware needs between protocol steps
#[derive(Debug, Clone, PartialEq)]
pub struct Pacing {
    /// Before every command
    pub before_send: Duration,
    /// After every command that was sent
    pub after_send: Duration,
    /// Before the go reply of clean and calibrate
    pub start: Duration,
    /// Before the first preview read
    pub preview: Duration,
    /// Between preview and jpeg phase
    pub between_phases: Duration,
    /// Before the first jpeg data read
    pub jpeg_data: Duration,
}

impl Pacing {
    /// No delays at all, for simulated devices
    pub fn none() -> Self {
        Self {
            before_send: Duration::ZERO,
            after_send: Duration::ZERO,
            start: Duration::ZERO,
            preview: Duration::ZERO,
            between_phases: Duration::ZERO,
            jpeg_data: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            before_send: delays::BEFORE_SEND,
            after_send: delays::AFTER_SEND,
            start: delays::START,
            preview: delays::PREVIEW,
            between_phases: delays::BETWEEN_PHASES,
            jpeg_data: delays::JPEG_DATA,
        }
    }
}

/// Connection target, timeouts and pacing
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub timeouts: Timeouts,
    pub pacing: Pacing,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeouts: Timeouts::default(),
            pacing: Pacing::default(),
        }
    }
}

impl Settings {
    /// Defaults for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Defaults overridden by `S400W_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for a variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(host) = lookup("S400W_HOST") {
            settings.host = host;
        }
        if let Some(port) = lookup("S400W_PORT") {
            settings.port = port
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("S400W_PORT={port:?}: {e}")))?;
        }

        let t = &mut settings.timeouts;
        if let Some(value) = lookup("S400W_TIMEOUT_CONNECT") {
            t.connect = parse_seconds("S400W_TIMEOUT_CONNECT", &value)?;
        }
        for (key, slot) in [
            ("S400W_TIMEOUT", &mut t.normal),
            ("S400W_TIMEOUT_CLEAN", &mut t.clean),
            ("S400W_TIMEOUT_CALIBRATE", &mut t.calibrate),
            ("S400W_TIMEOUT_DATA", &mut t.data),
            ("S400W_TIMEOUT_JPEG_SIZE", &mut t.jpeg_size),
            ("S400W_TIMEOUT_JPEG_ONLY", &mut t.jpeg_only),
        ] {
            if let Some(value) = lookup(key) {
                *slot = parse_wait(key, &value)?;
            }
        }

        debug!(host = %settings.host, port = settings.port, "Loaded settings");
        Ok(settings)
    }

    /// Replace the pacing
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}

fn parse_wait(key: &str, value: &str) -> Result<Wait> {
    match value.trim() {
        "-1" | "inf" | "forever" => Ok(Wait::Forever),
        _ => parse_seconds(key, value).map(Wait::Bounded),
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value:?}: {e}")))?;

    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("{key}={value:?}: {e}")))
}
