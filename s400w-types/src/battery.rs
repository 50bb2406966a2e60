//! Battery state

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Battery state as reported by get-battery-state
///
/// The device answers with a hexadecimal number in ASCII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryState {
    level: u32,

    /// String as received
    pub raw: String,
}

impl BatteryState {
    /// Parse the battery response
    ///
    /// # Examples
    ///
    /// ```
    /// use s400w_types::BatteryState;
    ///
    /// assert_eq!(BatteryState::parse("1f").unwrap().level(), 31);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim_end_matches('\0').trim();
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);

        let level = u32::from_str_radix(digits, 16)
            .map_err(|e| Error::Parse(format!("battery state {raw:?}: {e}")))?;

        Ok(Self {
            level,
            raw: raw.to_string(),
        })
    }

    /// Battery level as reported by the device
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl FromStr for BatteryState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BatteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
