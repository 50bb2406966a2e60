//! Response classification
//!
//! The scanner answers with short ASCII tokens that carry no terminator.
//! That is safe only because no token is a prefix of another one, which is
//! checked at compile time below. Everything that does not start with a
//! known token is passed through as raw data.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::error::{Error, Result};

/// Known response tokens
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    /// Device busy
    DeviceBusy,
    /// Battery low
    BatteryLow,
    /// No paper inserted
    NoPaper,
    /// Paper inserted, ready to scan, calibrate or clean
    ScanReady,
    /// Calibration has started
    CalibrateGo,
    /// Calibration has finished
    CalibrateEnd,
    /// Cleaning has started
    CleanGo,
    /// Cleaning has finished
    CleanEnd,
    /// Standard resolution selected
    DpiStandard,
    /// High resolution selected
    DpiHigh,
    /// Scanning has started
    ScanGo,
    /// End marker inside the preview data stream
    PreviewEnd,
    /// JPEG size, followed by a little-endian u32
    JpegSize,
}

impl Signature {
    /// All known tokens, in matching priority order
    pub const REGISTRY: [Signature; 13] = [
        Self::DeviceBusy,
        Self::BatteryLow,
        Self::NoPaper,
        Self::ScanReady,
        Self::CalibrateGo,
        Self::CalibrateEnd,
        Self::CleanGo,
        Self::CleanEnd,
        Self::DpiStandard,
        Self::DpiHigh,
        Self::ScanGo,
        Self::PreviewEnd,
        Self::JpegSize,
    ];

    /// Wire token
    pub const fn token(self) -> &'static [u8] {
        match self {
            Self::DeviceBusy => b"devbusy",
            Self::BatteryLow => b"battlow",
            Self::NoPaper => b"nopaper",
            Self::ScanReady => b"scanready",
            Self::CalibrateGo => b"calgo",
            Self::CalibrateEnd => b"calibrate",
            Self::CleanGo => b"cleango",
            Self::CleanEnd => b"cleanend",
            Self::DpiStandard => b"dpistd",
            Self::DpiHigh => b"dpifine",
            Self::ScanGo => b"scango",
            Self::PreviewEnd => b"previewend",
            Self::JpegSize => b"jpegsize",
        }
    }

    /// Token length in bytes
    pub const fn len(self) -> usize {
        self.token().len()
    }

    /// Check if `data` starts with this token
    pub fn matches(self, data: &[u8]) -> bool {
        data.starts_with(self.token())
    }

    /// Find the first registered token that prefixes `data`
    pub fn find(data: &[u8]) -> Option<Signature> {
        Self::REGISTRY.into_iter().find(|sig| sig.matches(data))
    }
}

const fn is_prefix(prefix: &[u8], of: &[u8]) -> bool {
    if prefix.len() > of.len() {
        return false;
    }
    let mut i = 0;
    while i < prefix.len() {
        if prefix[i] != of[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Check that no token in `registry` is a prefix of another one
pub const fn is_prefix_free(registry: &[Signature]) -> bool {
    let mut i = 0;
    while i < registry.len() {
        let mut j = 0;
        while j < registry.len() {
            if i != j && is_prefix(registry[i].token(), registry[j].token()) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    is_prefix_free(&Signature::REGISTRY),
    "response tokens must not prefix each other"
);

/// Outcome of a single bounded read
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Received {
    /// `n` bytes were read
    Data(usize),
    /// Nothing arrived within the timeout
    Timeout,
    /// Peer closed the connection, or the socket failed
    Closed,
}

/// A scanner response
///
/// Either a known token, raw bytes (e.g. the firmware version string),
/// or one of the artificial sentinels [`Response::Timeout`] and
/// [`Response::EndOfStream`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Response {
    Known(Signature),
    Unknown(Bytes),
    Timeout,
    EndOfStream,
}

impl Response {
    /// Success sentinel of a finished scan
    pub const SCAN_READY: Response = Response::Known(Signature::ScanReady);

    /// Classify the outcome of a read into `buf`
    ///
    /// # Examples
    ///
    /// ```
    /// use s400w_core::{Received, Response, Signature};
    ///
    /// let buf = *b"nopaper\0\0\0\0\0\0\0\0\0";
    /// assert_eq!(Response::classify(&buf, Received::Data(7)), Response::Known(Signature::NoPaper));
    /// assert_eq!(Response::classify(&buf, Received::Timeout), Response::Timeout);
    /// assert_eq!(Response::classify(&buf, Received::Closed), Response::EndOfStream);
    /// ```
    pub fn classify(buf: &[u8], received: Received) -> Self {
        match received {
            Received::Timeout => Self::Timeout,
            Received::Closed => Self::EndOfStream,
            Received::Data(0) => Self::Timeout,
            Received::Data(n) => Self::from_bytes(&buf[..n.min(buf.len())]),
        }
    }

    /// Classify bytes that were actually received
    pub fn from_bytes(data: &[u8]) -> Self {
        match Signature::find(data) {
            Some(sig) => Self::Known(sig),
            None => {
                let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
                Self::Unknown(Bytes::copy_from_slice(&data[..end]))
            }
        }
    }

    /// Get the known token, if any
    pub fn signature(&self) -> Option<Signature> {
        match self {
            Self::Known(sig) => Some(*sig),
            _ => None,
        }
    }

    /// Check if this is the given known token
    pub fn is(&self, sig: Signature) -> bool {
        self.signature() == Some(sig)
    }

    /// Check if this is a known token
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Check if this is the timeout sentinel
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Check if this is the end-of-stream sentinel
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// Check if this is one of the artificial sentinels
    pub fn is_sentinel(&self) -> bool {
        self.is_timeout() || self.is_end_of_stream()
    }

    /// Raw bytes of an unknown response
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Unknown(data) => Some(&data[..]),
            _ => None,
        }
    }

    /// Unknown response as text, e.g. the firmware version
    pub fn text(&self) -> Option<String> {
        self.data().map(|data| String::from_utf8_lossy(data).into_owned())
    }
}

impl From<Signature> for Response {
    fn from(sig: Signature) -> Self {
        Self::Known(sig)
    }
}

/// Decode the JPEG size that follows the `jpegsize` token
///
/// `buf` holds the bytes received for the size response, starting with
/// the token.
///
/// # Examples
///
/// ```
/// use s400w_core::response::jpeg_size;
///
/// assert_eq!(jpeg_size(b"jpegsize\x10\x00\x00\x00").unwrap(), 16);
/// ```
pub fn jpeg_size(buf: &[u8]) -> Result<u32> {
    let offset = Signature::JpegSize.len();
    let expected = offset + 4;

    if buf.len() < expected {
        return Err(Error::ResponseTooShort {
            expected,
            actual: buf.len(),
        });
    }

    Ok(LittleEndian::read_u32(&buf[offset..expected]))
}

fn is_printable(data: &[u8]) -> bool {
    data.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(sig) => f.write_str(&String::from_utf8_lossy(sig.token())),
            Self::Unknown(data) if data.is_empty() => f.write_str("<empty>"),
            Self::Unknown(data) if is_printable(data) => {
                f.write_str(&String::from_utf8_lossy(data))
            }
            Self::Unknown(data) => write!(f, "0x{}", hex::encode(data)),
            Self::Timeout => f.write_str("<timeout>"),
            Self::EndOfStream => f.write_str("<eof>"),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(sig) => write!(f, "Known({sig:?})"),
            Self::Unknown(data) => write!(f, "Unknown({})", hex::encode(data)),
            Self::Timeout => f.write_str("Timeout"),
            Self::EndOfStream => f.write_str("EndOfStream"),
        }
    }
}
