//! Value types for s400w

pub mod battery;
pub mod error;
pub mod firmware;

pub use battery::BatteryState;
pub use error::{Error, Result};
pub use firmware::FirmwareVersion;
