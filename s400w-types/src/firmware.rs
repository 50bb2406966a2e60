//! Firmware version

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Firmware minor version that accepts the resolution commands
pub const MIN_SET_RESOLUTION_MINOR: u32 = 26;

/// Firmware version as reported by get-version, e.g. `"1.26"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// Number before the first `.`, zero if absent
    pub major: u32,

    /// Number after the first `.`
    pub minor: u32,

    /// Version string as received
    pub raw: String,
}

/// Leading decimal digits of `s`
fn leading_number(s: &str) -> Option<u32> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

impl FirmwareVersion {
    /// Parse a version string
    ///
    /// Only the digits directly after the first `.` are significant;
    /// anything following them is kept in `raw` but ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use s400w_types::FirmwareVersion;
    ///
    /// let fw = FirmwareVersion::parse("1.26").unwrap();
    /// assert_eq!((fw.major, fw.minor), (1, 26));
    /// assert!(fw.supports_resolution());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim_end_matches('\0').trim();
        let (major, minor) = raw
            .split_once('.')
            .ok_or_else(|| Error::Parse(format!("firmware version without '.': {raw:?}")))?;

        let minor = leading_number(minor)
            .ok_or_else(|| Error::Parse(format!("firmware minor version missing: {raw:?}")))?;

        Ok(Self {
            major: leading_number(major.trim()).unwrap_or(0),
            minor,
            raw: raw.to_string(),
        })
    }

    /// Check if this firmware accepts the set-resolution commands
    pub fn supports_resolution(&self) -> bool {
        self.minor >= MIN_SET_RESOLUTION_MINOR
    }
}

impl FromStr for FirmwareVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
