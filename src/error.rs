//! Error types for record decoding.
//!
//! Framing anomalies never show up here: the framer resolves them by
//! resynchronizing and only counts them (see [`crate::framer::FramerStats`]).
//! Everything below is what a decoder can refuse a frame for.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Marker, terminator, or length do not describe a usable frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A BCD-expanded digit string is not a number of the expected width.
    #[error("malformed numeric field {field}: {digits:?}")]
    MalformedNumeric { field: &'static str, digits: String },

    /// A fixed-offset field reaches past the end of the frame.
    #[error("field at offset {offset} (len {len}) out of bounds for {frame_len}-byte frame")]
    OutOfBounds {
        offset: usize,
        len: usize,
        frame_len: usize,
    },

    /// No decoder is registered for this format code.
    #[error("unsupported format code {0:?}")]
    UnsupportedFormat(String),
}

impl DecodeError {
    /// Rename the field of a [`DecodeError::MalformedNumeric`].
    pub fn in_field(self, name: &'static str) -> Self {
        match self {
            DecodeError::MalformedNumeric { digits, .. } => DecodeError::MalformedNumeric {
                field: name,
                digits,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
