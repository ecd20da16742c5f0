//! Packed-BCD and fixed-width field helpers.
//!
//! Every numeric field on the wire is packed BCD: one byte carries two
//! decimal digits, high nibble first. Expansion to digits never fails;
//! nibbles above 9 come out as the characters `:` through `?` and are
//! rejected only when the digit string is parsed as a number.
//!
//! - Price: 5 bytes, 10 digits, `9(6)V9(4)` (implied point after digit 6)
//! - Quantity: 4 bytes, 8 digits
//! - Match time: 6 bytes, 12 digits, `HHMMSSmmmuuu`
use std::fmt;

use serde::Serialize;

use crate::error::{DecodeError, Result};

/// Fixed-point price in ten-thousandths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Number of ticks in one unit of price.
    pub const SCALE: u64 = 10_000;
    pub const ZERO: Price = Price(0);

    pub fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    pub fn ticks(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{}.{:04}", self.0 / Self::SCALE, self.0 % Self::SCALE))
    }
}

/// Expand packed BCD into its digit characters, two per byte.
pub fn bcd_to_digits(bcd: &[u8]) -> String {
    let mut s = String::with_capacity(bcd.len() * 2);
    for &b in bcd {
        s.push(char::from(b'0' + (b >> 4)));
        s.push(char::from(b'0' + (b & 0x0F)));
    }
    s
}

fn check_digits(digits: &str, width: usize, field: &'static str) -> Result<()> {
    if digits.len() == width && digits.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(DecodeError::MalformedNumeric {
            field,
            digits: digits.to_owned(),
        })
    }
}

/// Parse a 10-digit `9(6)V9(4)` string into a [`Price`].
pub fn digits_to_price(digits: &str) -> Result<Price> {
    check_digits(digits, 10, "price")?;
    // Ten ASCII digits always fit in u64.
    let int: u64 = digits[..6].parse().unwrap_or_default();
    let frac: u64 = digits[6..].parse().unwrap_or_default();
    Ok(Price(int * Price::SCALE + frac))
}

/// Parse an 8-digit quantity.
pub fn digits_to_quantity(digits: &str) -> Result<u32> {
    check_digits(digits, 8, "quantity")?;
    Ok(digits.parse().unwrap_or_default())
}

/// Format a 12-digit `HHMMSSmmmuuu` string as `HH:MM:SS.mmmuuu`.
pub fn digits_to_match_time(digits: &str) -> Result<String> {
    check_digits(digits, 12, "match_time")?;
    let mut out = String::with_capacity(15);
    out.push_str(&digits[0..2]);
    out.push(':');
    out.push_str(&digits[2..4]);
    out.push(':');
    out.push_str(&digits[4..6]);
    out.push('.');
    out.push_str(&digits[6..12]);
    Ok(out)
}

pub fn price_from_bcd(bcd: &[u8]) -> Result<Price> {
    digits_to_price(&bcd_to_digits(bcd))
}

pub fn quantity_from_bcd(bcd: &[u8]) -> Result<u32> {
    digits_to_quantity(&bcd_to_digits(bcd))
}

pub fn match_time_from_bcd(bcd: &[u8]) -> Result<String> {
    digits_to_match_time(&bcd_to_digits(bcd))
}

/// Parse a short BCD field (at most 4 bytes) as an unsigned integer.
pub fn number_from_bcd(bcd: &[u8], field: &'static str) -> Result<u32> {
    let digits = bcd_to_digits(bcd);
    if bcd.len() > 4 {
        return Err(DecodeError::MalformedNumeric { field, digits });
    }
    check_digits(&digits, bcd.len() * 2, field)?;
    Ok(digits.parse().unwrap_or_default())
}

/// Cut a fixed-width field at the first NUL and drop trailing spaces.
///
/// Leading spaces are significant and kept.
pub fn trim_field(raw: &[u8]) -> &[u8] {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let text = &raw[..end];
    let len = text.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &text[..len]
}

/// Read a fixed-width field as text, trimmed as [`trim_field`] does.
pub fn ascii_field(raw: &[u8]) -> String {
    String::from_utf8_lossy(trim_field(raw)).into_owned()
}

/// Uppercase hex pairs for byte ranges kept uninterpreted.
pub fn hex_upper(raw: &[u8]) -> String {
    hex::encode_upper(raw)
}

/// XOR of every byte in the slice.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Bounds-checked view of `len` bytes at `offset`.
pub fn field(frame: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| frame.get(offset..end))
        .ok_or(DecodeError::OutOfBounds {
            offset,
            len,
            frame_len: frame.len(),
        })
}

/// Pack a decimal digit string into BCD. Test fixtures build frames with it.
#[cfg(test)]
pub(crate) fn digits_to_bcd(digits: &str) -> Vec<u8> {
    digits
        .as_bytes()
        .chunks(2)
        .map(|p| ((p[0] - b'0') << 4) | (p[1] - b'0'))
        .collect()
}
