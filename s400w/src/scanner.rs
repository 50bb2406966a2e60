//! High-level scanner interface

use s400w_core::{Command, Response, Signature};
use s400w_transport::{TcpTransport, Transport, Wait};
use s400w_types::{BatteryState, FirmwareVersion};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::scan::{Sequencer, resolution_command};
use crate::session::{Session, pause};
use crate::settings::Settings;
use crate::sink::ScanSink;

/// S400W scanner
///
/// Every operation connects, talks to the device and disconnects again, so
/// a `Scanner` can be kept around between scans. Operations report the
/// scanner's own answer as a [`Response`]; timeouts and lost connections
/// show up as [`Response::Timeout`] and [`Response::EndOfStream`].
///
/// # Examples
///
/// ```no_run
/// use s400w::{Response, Scanner};
///
/// #[tokio::main]
/// async fn main() {
///     let mut scanner = Scanner::new("192.168.18.33", 23);
///
///     let mut jpeg: Vec<u8> = Vec::new();
///     let response = scanner.scan(Some(300), None, Some(&mut jpeg)).await;
///
///     if response == Response::SCAN_READY {
///         println!("Scanned {} bytes", jpeg.len());
///     }
/// }
/// ```
pub struct Scanner {
    transport: Box<dyn Transport>,
    settings: Settings,
}

impl Scanner {
    /// Create a scanner at `host:port` with default settings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_settings(Settings::new(host, port))
    }

    /// Create a scanner from explicit settings (TCP transport)
    pub fn with_settings(settings: Settings) -> Self {
        let transport = TcpTransport::new(settings.host.clone(), settings.port)
            .with_connect_timeout(settings.timeouts.connect);

        Self {
            transport: Box::new(transport),
            settings,
        }
    }

    /// Create a scanner configured from `S400W_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_settings(Settings::from_env()?))
    }

    /// Create a scanner over any transport
    pub fn with_transport(transport: impl Transport + 'static, settings: Settings) -> Self {
        Self {
            transport: Box::new(transport),
            settings,
        }
    }

    /// Get settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get remote address
    pub fn remote_addr(&self) -> String {
        self.transport.remote_addr()
    }

    pub(crate) async fn open(&mut self) -> Result<Session<'_>> {
        Session::open(&mut *self.transport, &self.settings).await
    }

    /// Send one command and return its response
    pub(crate) async fn query(&mut self, op: &str, command: Command, timeout: Wait) -> Response {
        let result = match self.open().await {
            Ok(mut session) => {
                let result = session.request(command, timeout).await;
                session.close().await;
                result
            }
            Err(e) => Err(e),
        };

        settle(op, result)
    }

    /// Query the firmware version
    ///
    /// The version string arrives as an unknown response, e.g. `"1.26"`.
    pub async fn version(&mut self) -> Response {
        let timeout = self.settings.timeouts.normal;
        self.query("version", Command::GetVersion, timeout).await
    }

    /// Query and parse the firmware version
    pub async fn firmware(&mut self) -> Result<FirmwareVersion> {
        let response = self.version().await;
        match response.text() {
            Some(text) => Ok(FirmwareVersion::parse(&text)?),
            None => Err(Error::from_response(response)),
        }
    }

    /// Check if the firmware accepts resolution changes
    pub async fn supports_resolution(&mut self) -> bool {
        match self.firmware().await {
            Ok(firmware) => {
                debug!("Firmware {}", firmware);
                firmware.supports_resolution()
            }
            Err(e) => {
                warn!("Cannot determine firmware version: {}", e);
                false
            }
        }
    }

    /// Query the device status
    ///
    /// [`Signature::ScanReady`] means paper is inserted and the device is
    /// ready to scan, calibrate or clean.
    pub async fn status(&mut self) -> Response {
        let timeout = self.settings.timeouts.normal;
        self.query("status", Command::GetStatus, timeout).await
    }

    /// Query the battery state
    pub async fn battery(&mut self) -> Response {
        let timeout = self.settings.timeouts.normal;
        self.query("battery", Command::GetBatteryState, timeout).await
    }

    /// Query and parse the battery state
    pub async fn battery_state(&mut self) -> Result<BatteryState> {
        let response = self.battery().await;
        match response.text() {
            Some(text) => Ok(BatteryState::parse(&text)?),
            None => Err(Error::from_response(response)),
        }
    }

    /// Power the device off
    pub async fn power_off(&mut self) -> Response {
        warn!("Powering off scanner...");
        let timeout = self.settings.timeouts.normal;
        self.query("power_off", Command::PowerOff, timeout).await
    }

    /// Select the scan resolution
    ///
    /// 600 selects high resolution, anything else standard. Returns true
    /// only if the device echoed the matching resolution.
    pub async fn set_resolution(&mut self, dpi: u32) -> bool {
        let (command, echo) = resolution_command(dpi);
        let timeout = self.settings.timeouts.normal;

        self.query("set_resolution", command, timeout).await.is(echo)
    }

    /// Run the cleaning routine
    ///
    /// Returns [`Signature::CleanEnd`] when the routine completed.
    pub async fn clean(&mut self) -> Response {
        let limit = self.settings.timeouts.clean;
        self.routine("clean", Command::StartCleaning, Signature::CleanGo, limit)
            .await
    }

    /// Run the calibration routine
    ///
    /// Returns [`Signature::CalibrateEnd`] when the routine completed.
    pub async fn calibrate(&mut self) -> Response {
        let limit = self.settings.timeouts.calibrate;
        self.routine("calibrate", Command::StartCalibration, Signature::CalibrateGo, limit)
            .await
    }

    async fn routine(
        &mut self,
        op: &str,
        start: Command,
        go: Signature,
        limit: Wait,
    ) -> Response {
        info!("Starting {}...", op);

        let result = match self.open().await {
            Ok(mut session) => {
                let result = routine_steps(&mut session, start, go, limit).await;
                session.close().await;
                result
            }
            Err(e) => Err(e),
        };

        settle(op, result)
    }

    /// Scan a page
    ///
    /// `resolution` is set first when given and non-zero. The preview sink
    /// receives the raw preview lines, the JPEG sink the size and then the
    /// JPEG data. Returns [`Response::SCAN_READY`] on success, or the
    /// response that ended the scan. Every given sink is finished exactly
    /// once, whatever the outcome.
    pub async fn scan<'k>(
        &mut self,
        resolution: Option<u32>,
        preview: Option<&'k mut dyn ScanSink>,
        jpeg: Option<&'k mut dyn ScanSink>,
    ) -> Response {
        info!(
            ?resolution,
            preview = preview.is_some(),
            jpeg = jpeg.is_some(),
            "Scanning..."
        );

        let mut session = match self.open().await {
            Ok(session) => session,
            Err(e) => {
                warn!("scan(): {}", e);
                for sink in [preview, jpeg].into_iter().flatten() {
                    sink.finish();
                }
                return e.into_response();
            }
        };

        let response = Sequencer::new(&mut session, preview, jpeg)
            .run(resolution)
            .await;
        session.close().await;

        info!("scan(): {}", response);
        response
    }
}

async fn routine_steps(
    session: &mut Session<'_>,
    start: Command,
    go: Signature,
    limit: Wait,
) -> Result<Response> {
    let settings = session.settings();

    let status = session.request(Command::GetStatus, settings.timeouts.normal).await?;
    if !status.is(Signature::ScanReady) {
        return Ok(status);
    }

    session.send(start).await?;
    pause(settings.pacing.start).await;

    let response = session.read_response(settings.timeouts.normal).await?;
    debug!("{} -> {}", start.name(), response);
    if !response.is(go) {
        return Ok(response);
    }

    session.read_response(limit).await
}

/// Log the outcome of an operation and reduce it to a response
fn settle(op: &str, result: Result<Response>) -> Response {
    match result {
        Ok(response) => {
            debug!("{}(): {}", op, response);
            response
        }
        Err(e) => {
            warn!("{}(): {}", op, e);
            e.into_response()
        }
    }
}
