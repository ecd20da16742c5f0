use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, Receiver};
use dotenvy::dotenv;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tse_feed::export::CsvSink;
use tse_feed::framer::{FramerConfig, DEFAULT_BUFFER_CAP, DEFAULT_MAX_MESSAGE_LEN};
use tse_feed::{FeedDecoder, Record};

const PROGRESS_EVERY: usize = 100_000;

#[derive(Debug, Parser)]
#[command(version, about = "Decode a TSE binary feed capture into CSV files")]
struct Args {
    /// Capture file to read
    #[arg(long, short = 'i', env = "TSE_INPUT", default_value = "Tse.bin")]
    input: PathBuf,

    /// Directory receiving out_fmt01.csv and out_fmt06.csv
    #[arg(long, env = "TSE_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Bytes read from the capture per feed call
    #[arg(long, default_value_t = 2048)]
    chunk_size: usize,

    /// Rows written per format before that format is ignored
    #[arg(long, default_value_t = 100_000)]
    max_rows: usize,

    /// Framer buffer cap in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAP)]
    max_buffer: usize,

    /// Longest frame accepted in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_LEN)]
    max_message: usize,

    /// Also write records whose checksum does not match
    #[arg(long, default_value_t = false)]
    keep_bad_checksum: bool,
}

fn log_checksum_mismatch(record: &Record) {
    let header = record.header();
    let (carried, computed) = record.checksum_pair();
    warn!(
        format = %header.format_code,
        seq = %header.sequence,
        stock_id = %record.stock_id(),
        computed = %format!("0x{computed:02X}"),
        field = %format!("0x{carried:02X}"),
        "checksum mismatch"
    );
}

fn writer_thread(mut sink: CsvSink<File>, rx: Receiver<Record>, full: Arc<AtomicBool>) -> Result<(usize, usize)> {
    for record in rx {
        if !sink.write(&record)? {
            continue;
        }
        let (rows01, rows06) = sink.rows();
        match record {
            Record::Static(_) if rows01 % PROGRESS_EVERY == 0 => info!(rows = rows01, "format 01 progress"),
            Record::Quote(_) if rows06 % PROGRESS_EVERY == 0 => info!(rows = rows06, "format 06 progress"),
            _ => {}
        }
        if sink.is_full() {
            full.store(true, Ordering::Relaxed);
        }
    }
    sink.flush()?;
    Ok(sink.rows())
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let mut input = File::open(&args.input).with_context(|| format!("open {:?}", args.input))?;
    let sink = CsvSink::create(&args.out_dir, args.max_rows)?;

    let (tx, rx) = bounded::<Record>(8192);
    let full = Arc::new(AtomicBool::new(false));
    let writer = {
        let full = Arc::clone(&full);
        std::thread::spawn(move || writer_thread(sink, rx, full))
    };

    // Ctrl+C stops reading; the writer still drains and flushes.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)).ok();
    }

    let mut decoder = FeedDecoder::with_config(FramerConfig {
        buffer_cap: args.max_buffer,
        max_message_len: args.max_message,
    });
    let mut chunk = vec![0u8; args.chunk_size];
    let mut writer_gone = false;
    while !stop.load(Ordering::Relaxed) && !full.load(Ordering::Relaxed) && !writer_gone {
        let n = input.read(&mut chunk).with_context(|| format!("read {:?}", args.input))?;
        if n == 0 {
            break;
        }
        decoder.feed(&chunk[..n], |record| {
            if !record.checksum_ok() {
                log_checksum_mismatch(&record);
                if !args.keep_bad_checksum {
                    return;
                }
            }
            if tx.send(record).is_err() {
                writer_gone = true;
            }
        });
    }
    if stop.load(Ordering::Relaxed) {
        warn!("interrupted, flushing output");
    }
    if decoder.pending() > 0 {
        warn!(bytes = decoder.pending(), "incomplete frame left at end of input");
    }

    drop(tx);
    let (rows01, rows06) = writer
        .join()
        .map_err(|_| anyhow!("writer thread panicked"))?
        .context("write csv output")?;

    let framing = decoder.framer_stats();
    let decoding = decoder.stats();
    let unsupported: Vec<_> = decoder.unsupported_codes().collect();
    info!(
        bytes = framing.bytes_fed,
        frames = framing.frames,
        garbage = framing.garbage_bytes,
        resyncs = framing.resync_drops,
        overflows = framing.overflow_resets,
        "framing done"
    );
    info!(
        fmt01 = decoding.fmt01_records,
        fmt06 = decoding.fmt06_records,
        checksum_failures = decoding.checksum_failures,
        decode_errors = decoding.decode_errors,
        unsupported_frames = decoding.unsupported_frames,
        unsupported_codes = ?unsupported,
        "decoding done"
    );
    eprintln!(
        "Wrote {} rows to {} and {} rows to {}.",
        rows01,
        args.out_dir.join(tse_feed::export::FMT01_FILE).display(),
        rows06,
        args.out_dir.join(tse_feed::export::FMT06_FILE).display()
    );
    Ok(())
}
