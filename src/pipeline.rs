//! Framer plus registry: raw chunks in, decoded records out.
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::framer::{Frame, FramerConfig, FramerStats, StreamFramer};
use crate::registry::{FormatDecoder, Registry};
use crate::record::Record;

/// Per-run decode totals. Framing totals live in [`FramerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub fmt01_records: u64,
    pub fmt06_records: u64,
    /// Records delivered with a carried checksum that disagrees with the bytes.
    pub checksum_failures: u64,
    /// Frames of a supported format that failed to decode.
    pub decode_errors: u64,
    pub unsupported_frames: u64,
}

impl DecodeStats {
    pub fn records(&self) -> u64 {
        self.fmt01_records + self.fmt06_records
    }
}

pub struct FeedDecoder {
    framer: StreamFramer,
    registry: Registry,
    decoders: HashMap<String, FormatDecoder>,
    unsupported: BTreeSet<String>,
    stats: DecodeStats,
}

impl FeedDecoder {
    pub fn new() -> Self {
        Self::with_parts(StreamFramer::new(), Registry::new())
    }

    pub fn with_config(config: FramerConfig) -> Self {
        Self::with_parts(StreamFramer::with_config(config), Registry::new())
    }

    pub fn with_parts(framer: StreamFramer, registry: Registry) -> Self {
        Self {
            framer,
            registry,
            decoders: HashMap::new(),
            unsupported: BTreeSet::new(),
            stats: DecodeStats::default(),
        }
    }

    /// Feed one chunk and hand every record it completes to `on_record`.
    ///
    /// Frames of unknown formats and frames that fail to decode are counted
    /// and skipped; the stream carries on with the next frame. Records whose
    /// checksum disagrees are still delivered with `checksum_ok() == false`.
    pub fn feed<F: FnMut(Record)>(&mut self, chunk: &[u8], mut on_record: F) {
        let Self {
            framer,
            registry,
            decoders,
            unsupported,
            stats,
        } = self;
        framer.feed(chunk, |frame| {
            if let Some(record) = dispatch(&frame, registry, decoders, unsupported, stats) {
                on_record(record);
            }
        });
    }

    /// [`feed`](Self::feed) collecting the records into a vector.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Record> {
        let mut records = Vec::new();
        self.feed(chunk, |r| records.push(r));
        records
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    pub fn framer_stats(&self) -> FramerStats {
        self.framer.stats()
    }

    /// Bytes still waiting for the rest of a frame.
    pub fn pending(&self) -> usize {
        self.framer.len()
    }

    /// Distinct unsupported format codes seen so far, sorted.
    pub fn unsupported_codes(&self) -> impl Iterator<Item = &str> {
        self.unsupported.iter().map(String::as_str)
    }
}

impl Default for FeedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch(
    frame: &Frame,
    registry: &Registry,
    decoders: &mut HashMap<String, FormatDecoder>,
    unsupported: &mut BTreeSet<String>,
    stats: &mut DecodeStats,
) -> Option<Record> {
    let code = frame.format_code();
    if !decoders.contains_key(code) {
        match registry.create(code) {
            Some(decoder) => {
                decoders.insert(code.to_owned(), decoder);
            }
            None => {
                stats.unsupported_frames += 1;
                if unsupported.insert(code.to_owned()) {
                    info!(format = %code, "skipping unsupported format");
                }
                return None;
            }
        }
    }
    let decoder = decoders.get(code)?;

    match decoder.decode(frame.bytes()) {
        Ok(record) => {
            match record {
                Record::Static(_) => stats.fmt01_records += 1,
                Record::Quote(_) => stats.fmt06_records += 1,
            }
            if !record.checksum_ok() {
                stats.checksum_failures += 1;
            }
            Some(record)
        }
        Err(e) => {
            debug!(
                format = %code,
                seq = %frame.header().sequence,
                error = %e,
                "dropping undecodable frame"
            );
            stats.decode_errors += 1;
            None
        }
    }
}
