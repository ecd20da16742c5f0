//! Format code to decoder lookup.
use std::sync::Arc;

use crate::error::{DecodeError, Result};
use crate::fmt01::Fmt01Decoder;
use crate::fmt06::Fmt06Decoder;
use crate::header::{FMT01_CODE, FMT06_CODE};
use crate::record::Record;
use crate::transcode::{Big5, Transcode};

/// Every decoder the crate knows about.
#[derive(Debug, Clone)]
pub enum FormatDecoder {
    Fmt01(Fmt01Decoder),
    Fmt06(Fmt06Decoder),
}

impl FormatDecoder {
    pub fn format_code(&self) -> &'static str {
        match self {
            FormatDecoder::Fmt01(_) => FMT01_CODE,
            FormatDecoder::Fmt06(_) => FMT06_CODE,
        }
    }

    pub fn decode(&self, frame: &[u8]) -> Result<Record> {
        match self {
            FormatDecoder::Fmt01(d) => d.decode(frame).map(Record::Static),
            FormatDecoder::Fmt06(d) => d.decode(frame).map(Record::Quote),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    transcoder: Arc<dyn Transcode>,
}

impl Registry {
    /// Registry whose format "01" names are decoded as Big5.
    pub fn new() -> Self {
        Self::with_transcoder(Arc::new(Big5))
    }

    pub fn with_transcoder(transcoder: Arc<dyn Transcode>) -> Self {
        Self { transcoder }
    }

    pub fn is_supported(code: &str) -> bool {
        matches!(code, FMT01_CODE | FMT06_CODE)
    }

    /// Decoder for `code`, or `None` for formats this crate does not read.
    pub fn create(&self, code: &str) -> Option<FormatDecoder> {
        match code {
            FMT01_CODE => Some(FormatDecoder::Fmt01(Fmt01Decoder::new(Arc::clone(&self.transcoder)))),
            FMT06_CODE => Some(FormatDecoder::Fmt06(Fmt06Decoder::new())),
            _ => None,
        }
    }

    /// Look up the decoder for `code` and run it over `frame`.
    pub fn decode(&self, code: &str, frame: &[u8]) -> Result<Record> {
        self.create(code)
            .ok_or_else(|| DecodeError::UnsupportedFormat(code.to_owned()))?
            .decode(frame)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
