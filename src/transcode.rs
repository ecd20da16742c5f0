//! Legacy text transcoding for the security-name field.
//!
//! The exchange sends names in Big5. Decoders take the conversion as an
//! injected [`Transcode`] so callers can swap it out; whatever it cannot
//! handle comes back as the raw bytes read as lossy UTF-8.
use std::fmt;

use crate::bcd::trim_field;

pub trait Transcode: Send + Sync {
    /// Convert legacy-encoded bytes, or `None` if they do not decode.
    fn transcode(&self, raw: &[u8]) -> Option<String>;
}

/// Big5 to UTF-8 via `encoding_rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Big5;

impl Transcode for Big5 {
    fn transcode(&self, raw: &[u8]) -> Option<String> {
        encoding_rs::BIG5
            .decode_without_bom_handling_and_without_replacement(raw)
            .map(|text| text.into_owned())
    }
}

/// Never converts; every name takes the raw-bytes fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Transcode for Raw {
    fn transcode(&self, _raw: &[u8]) -> Option<String> {
        None
    }
}

impl fmt::Debug for dyn Transcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Transcode")
    }
}

/// Trim a fixed-width legacy text field and transcode it, falling back to
/// lossy UTF-8 of the trimmed bytes.
pub fn legacy_text(transcoder: &dyn Transcode, raw: &[u8]) -> String {
    let raw = trim_field(raw);
    transcoder
        .transcode(raw)
        .unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned())
}
