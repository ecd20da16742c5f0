use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tse_feed::{Frame, Record, Registry, StreamFramer};

#[derive(Debug, Parser)]
#[command(about = "Print the frames of a TSE feed capture")]
struct Args {
    /// Input capture file to read
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Decode supported formats and print the record after each frame
    #[arg(long, default_value_t = false)]
    decode: bool,

    /// Stop after this many frames
    #[arg(long)]
    limit: Option<usize>,
}

fn print_record(record: &Record) {
    let ok = if record.checksum_ok() { "ok" } else { "BAD" };
    match record {
        Record::Static(r) => println!(
            "    {} {:<16} ref={} up={} down={} industry={} type={} checksum={}",
            r.stock_id, r.stock_name, r.ref_price, r.up_limit, r.down_limit, r.industry, r.security_type, ok
        ),
        Record::Quote(r) => {
            println!(
                "    {} {} last={} x {} cum={} checksum={}",
                r.stock_id, r.match_time, r.last_price, r.last_qty, r.cumulative_qty, ok
            );
            for (i, (b, a)) in r.bids.iter().zip(&r.asks).enumerate() {
                if b.is_empty() && a.is_empty() {
                    continue;
                }
                println!("    {:>3}: {:>12} x {:>8} | {:>12} x {:>8}", i + 1, b.price, b.qty, a.price, a.qty);
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rdr = BufReader::new(File::open(&args.input).with_context(|| format!("open {:?}", args.input))?);
    let registry = Registry::new();
    let mut framer = StreamFramer::new();
    let mut per_format: BTreeMap<String, usize> = BTreeMap::new();
    let mut frames = 0usize;
    let mut buf = vec![0u8; 64 * 1024];

    'read: loop {
        let n = rdr.read(&mut buf).with_context(|| format!("read {:?}", args.input))?;
        if n == 0 {
            break;
        }
        for frame in framer.push(&buf[..n]) {
            if args.limit.is_some_and(|limit| frames >= limit) {
                break 'read;
            }
            frames += 1;
            show(&frame, &registry, args.decode);
            *per_format.entry(frame.format_code().to_owned()).or_default() += 1;
        }
    }

    let stats = framer.stats();
    eprintln!(
        "Read {} bytes, {} frames ({} garbage bytes, {} resync drops, {} pending).",
        stats.bytes_fed,
        frames,
        stats.garbage_bytes,
        stats.resync_drops,
        framer.len()
    );
    for (code, count) in &per_format {
        let note = if Registry::is_supported(code) { "" } else { " (unsupported)" };
        eprintln!("  format {code}: {count}{note}");
    }
    Ok(())
}

fn show(frame: &Frame, registry: &Registry, decode: bool) {
    let h = frame.header();
    println!(
        "seq={} fmt={} ver={} biz={} len={}",
        h.sequence,
        h.format_code,
        h.format_version,
        h.business_type,
        frame.len()
    );
    if !decode {
        return;
    }
    match registry.create(frame.format_code()).map(|d| d.decode(frame.bytes())) {
        Some(Ok(record)) => print_record(&record),
        Some(Err(e)) => println!("    decode error: {e}"),
        None => {}
    }
}
