//! Taiwan Stock Exchange feed decoder.
//!
//! This crate provides the framing and decoding logic used by the
//! `tse_feed` binary (capture file to CSV) and the `inspect` tool:
//!
//! - `framer`: incremental splitter that turns arbitrary byte chunks into
//!   complete `0x1B ... CR LF` frames, resynchronising on garbage
//! - `header`, `bcd`: the common 10-byte header and packed-BCD field codec
//! - `fmt01`, `fmt06`: decoders for the static security info and the
//!   real-time quote formats
//! - `registry`, `pipeline`: format-code dispatch and the chunk-to-record
//!   driver tying the pieces together
//! - `export`: CSV rendering of decoded records
//!
//! Framing never fails; it skips what it cannot use. Decoding returns
//! [`DecodeError`] for structurally broken frames and reports checksum
//! mismatches on the record itself.
pub mod bcd;
pub mod error;
pub mod export;
pub mod fmt01;
pub mod fmt06;
pub mod framer;
pub mod header;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod transcode;

#[cfg(test)]
mod fixtures;

pub use error::{DecodeError, Result};
pub use framer::{Frame, FramerConfig, FramerStats, StreamFramer};
pub use pipeline::{DecodeStats, FeedDecoder};
pub use record::{Fmt01Record, Fmt06Record, Level, Record};
pub use registry::{FormatDecoder, Registry};
