//! Protocol constants

use std::time::Duration;

/// Default scanner address (the device's own access point)
pub const DEFAULT_HOST: &str = "192.168.18.33";

/// Default scanner port
pub const DEFAULT_PORT: u16 = 23;

/// Classification buffer size; every short response fits in it
pub const RESPONSE_BUFFER_SIZE: usize = 16;

/// Preview payload read capacity (32 lines)
pub const PREVIEW_CHUNK_SIZE: usize = 61_440;

/// Bytes per preview line
pub const PREVIEW_LINE_SIZE: usize = 1_920;

/// Default timeouts
pub mod timeouts {
    use super::Duration;

    /// Socket connect
    pub const CONNECT: Duration = Duration::from_secs(5);

    /// Simple calls that don't start anything
    pub const NORMAL: Duration = Duration::from_secs(10);

    /// Cleaning routine completion
    pub const CLEAN: Duration = Duration::from_secs(40);

    /// Calibration routine completion
    pub const CALIBRATE: Duration = Duration::from_secs(60);

    /// Between preview and jpeg data chunks
    pub const DATA: Duration = Duration::from_secs(30);

    /// JPEG size after a streamed preview
    pub const JPEG_SIZE: Duration = Duration::from_secs(20);

    /// JPEG size when the preview was skipped
    pub const JPEG_ONLY: Duration = Duration::from_secs(60);

    /// Reply to a probed command
    pub const PROBE: Duration = Duration::from_secs(1);
}

/// Settle delays required by the device firmware
pub mod delays {
    use super::Duration;

    /// Before every command write
    pub const BEFORE_SEND: Duration = Duration::from_millis(200);

    /// After every successful command write
    pub const AFTER_SEND: Duration = Duration::from_millis(200);

    /// Before reading the go reply of clean/calibrate
    pub const START: Duration = Duration::from_millis(500);

    /// Before the first preview read
    pub const PREVIEW: Duration = Duration::from_millis(1000);

    /// Between the preview and jpeg phases
    pub const BETWEEN_PHASES: Duration = Duration::from_millis(1000);

    /// Before the first jpeg data read
    pub const JPEG_DATA: Duration = Duration::from_millis(500);
}
