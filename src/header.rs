//! Wire constants and the 10-byte message header.
//!
//! ```text
//! offset  len  field
//!      0    1  marker (0x1B)
//!      1    2  declared length, BCD (4 digits, whole frame incl. terminator)
//!      3    1  business type, BCD
//!      4    1  format code, BCD ("01", "06", ...)
//!      5    1  format version, BCD
//!      6    4  sequence number, BCD (kept as digits)
//! ```
use serde::Serialize;

use crate::bcd::{bcd_to_digits, number_from_bcd};
use crate::error::{DecodeError, Result};

/// Start-of-message byte (ESC).
pub const MARKER: u8 = 0x1B;

/// Every frame ends with CR LF.
pub const TERMINATOR: [u8; 2] = [0x0D, 0x0A];

pub const HEADER_LEN: usize = 10;

/// Format code of the fixed-length static-info message.
pub const FMT01_CODE: &str = "01";
/// Length every format "01" frame has regardless of what it declares.
pub const FMT01_LEN: usize = 114;

/// Format code of the variable-length quote/trade message.
pub const FMT06_CODE: &str = "06";
pub const FMT06_MIN_LEN: usize = 32;

/// Decoded view of a header prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub declared_len: usize,
    pub business_type: String,
    pub format_code: String,
    pub format_version: String,
    pub sequence: String,
}

impl Header {
    /// Interpret the first [`HEADER_LEN`] bytes of `buf`.
    ///
    /// Fails when fewer than 10 bytes are given, the first byte is not the
    /// marker, or the length field does not hold four decimal digits.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let Some(h) = buf.get(..HEADER_LEN) else {
            return Err(DecodeError::MalformedFrame(format!(
                "header needs {HEADER_LEN} bytes, have {}",
                buf.len()
            )));
        };
        if h[0] != MARKER {
            return Err(DecodeError::MalformedFrame(format!(
                "expected marker 0x1B, found {:#04X}",
                h[0]
            )));
        }
        let declared_len = number_from_bcd(&h[1..3], "declared_len")? as usize;
        Ok(Self::from_parts(h, declared_len))
    }

    /// [`parse`](Self::parse) for fixed-length formats, whose length comes
    /// from the format code. An unreadable length field reads as 0.
    pub fn parse_fixed(buf: &[u8]) -> Result<Self> {
        match Self::parse(buf) {
            Err(DecodeError::MalformedNumeric { field: "declared_len", .. }) => {
                Ok(Self::from_parts(&buf[..HEADER_LEN], 0))
            }
            other => other,
        }
    }

    fn from_parts(h: &[u8], declared_len: usize) -> Self {
        Self {
            declared_len,
            business_type: bcd_to_digits(&h[3..4]),
            format_code: bcd_to_digits(&h[4..5]),
            format_version: bcd_to_digits(&h[5..6]),
            sequence: bcd_to_digits(&h[6..10]),
        }
    }

    /// Frame length the framer should cut: "01" is always [`FMT01_LEN`].
    pub fn effective_len(&self) -> usize {
        if self.format_code == FMT01_CODE {
            FMT01_LEN
        } else {
            self.declared_len
        }
    }
}

/// True when `frame` ends with [`TERMINATOR`].
pub fn has_terminator(frame: &[u8]) -> bool {
    frame.ends_with(&TERMINATOR)
}

/// Check marker, terminator, and minimum length shared by every decoder.
pub fn check_envelope(frame: &[u8], min_len: usize) -> Result<()> {
    if frame.len() < min_len {
        return Err(DecodeError::MalformedFrame(format!(
            "frame is {} bytes, need at least {min_len}",
            frame.len()
        )));
    }
    if frame.first() != Some(&MARKER) {
        return Err(DecodeError::MalformedFrame("missing start marker".into()));
    }
    if !has_terminator(frame) {
        return Err(DecodeError::MalformedFrame("missing CR LF terminator".into()));
    }
    Ok(())
}
