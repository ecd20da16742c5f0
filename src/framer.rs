//! Incremental framer for the raw feed.
//!
//! Bytes arrive in arbitrary chunks. The framer keeps whatever has not been
//! consumed yet in a single `BytesMut`, finds the next marker, reads the
//! header, and cuts a frame once enough bytes are buffered and the
//! terminator checks out. Anything that looks inconsistent (bad header,
//! impossible length, wrong terminator) costs exactly one leading byte and
//! the scan starts over, so every retry shrinks the buffer.
//!
//! Nothing in here returns an error. Partial input waits for the next
//! `feed`, garbage is skipped, and an oversized accumulator is dropped.
//!
//! # Example
//!
//! ```ignore
//! use tse_feed::framer::StreamFramer;
//!
//! let mut framer = StreamFramer::new();
//! for chunk in chunks {
//!     framer.feed(&chunk, |frame| println!("{} {}", frame.format_code(), frame.len()));
//! }
//! ```
use bytes::{Buf, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::header::{has_terminator, Header, HEADER_LEN, MARKER};

/// Hard cap on buffered, unconsumed bytes (10 MiB).
pub const DEFAULT_BUFFER_CAP: usize = 10 * 1024 * 1024;

/// Longest frame accepted; longer declared lengths are treated as noise.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramerConfig {
    pub buffer_cap: usize,
    pub max_message_len: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            buffer_cap: DEFAULT_BUFFER_CAP,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

/// Running totals since the framer was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    pub bytes_fed: u64,
    pub frames: u64,
    /// Bytes skipped while searching for a marker.
    pub garbage_bytes: u64,
    /// Leading bytes dropped because the structure after a marker was bad.
    pub resync_drops: u64,
    /// Times the accumulator went over the cap and was cleared.
    pub overflow_resets: u64,
}

/// One complete candidate frame, starting at the marker and ending in CR LF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: Header,
    bytes: Bytes,
}

impl Frame {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn format_code(&self) -> &str {
        &self.header.format_code
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

enum Step {
    Emit(Frame),
    Resync,
    Wait,
}

pub struct StreamFramer {
    buffer: BytesMut,
    config: FramerConfig,
    stats: FramerStats,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self::with_config(FramerConfig::default())
    }

    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            config,
            stats: FramerStats::default(),
        }
    }

    /// Append `data` and hand every frame that can now be cut to `on_frame`.
    ///
    /// Frames are delivered in stream order. Whatever cannot be framed yet
    /// stays buffered for the next call.
    pub fn feed<F: FnMut(Frame)>(&mut self, data: &[u8], mut on_frame: F) {
        self.buffer.extend_from_slice(data);
        self.stats.bytes_fed += data.len() as u64;

        if self.buffer.len() > self.config.buffer_cap {
            warn!(
                buffered = self.buffer.len(),
                cap = self.config.buffer_cap,
                "framer buffer over cap, dropping buffered bytes"
            );
            self.buffer.clear();
            self.stats.overflow_resets += 1;
            return;
        }

        loop {
            match self.step() {
                Step::Emit(frame) => on_frame(frame),
                Step::Resync => {
                    self.buffer.advance(1);
                    self.stats.resync_drops += 1;
                }
                Step::Wait => return,
            }
        }
    }

    /// [`feed`](Self::feed) collecting the frames into a vector.
    pub fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        self.feed(data, |f| frames.push(f));
        frames
    }

    fn step(&mut self) -> Step {
        let Some(pos) = self.buffer.iter().position(|&b| b == MARKER) else {
            if !self.buffer.is_empty() {
                trace!(skipped = self.buffer.len(), "no marker in buffer");
                self.stats.garbage_bytes += self.buffer.len() as u64;
                self.buffer.clear();
            }
            return Step::Wait;
        };
        if pos > 0 {
            trace!(skipped = pos, "skipping bytes before marker");
            self.stats.garbage_bytes += pos as u64;
            self.buffer.advance(pos);
        }

        // A short header waits; a full one that does not parse is noise.
        if self.buffer.len() < HEADER_LEN {
            return Step::Wait;
        }
        let header = match Header::parse(&self.buffer[..HEADER_LEN]) {
            Ok(h) => h,
            Err(e) => {
                trace!(error = %e, "unparsable header");
                return Step::Resync;
            }
        };

        let len = header.effective_len();
        if len == 0 || len > self.config.max_message_len {
            trace!(len, fmt = %header.format_code, "frame length out of range");
            return Step::Resync;
        }
        if self.buffer.len() < len {
            return Step::Wait;
        }
        if !has_terminator(&self.buffer[..len]) {
            trace!(len, fmt = %header.format_code, "terminator mismatch");
            return Step::Resync;
        }

        let bytes = self.buffer.split_to(len).freeze();
        self.stats.frames += 1;
        Step::Emit(Frame { header, bytes })
    }

    /// Number of buffered, unconsumed bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn config(&self) -> FramerConfig {
        self.config
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}
