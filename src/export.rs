//! CSV rendering of decoded records.
//!
//! One writer per format. Each gets its header row before its first data
//! row and stops taking rows once `max_rows` is reached.
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::record::{Fmt01Record, Fmt06Record, Record, BOOK_DEPTH};

pub const FMT01_FILE: &str = "out_fmt01.csv";
pub const FMT06_FILE: &str = "out_fmt06.csv";

pub const FMT01_COLUMNS: [&str; 5] = [
    "Stock Code",
    "Stock Name",
    "Today Ref Price",
    "Up Limit Price",
    "Down Limit Price",
];

pub fn fmt06_columns() -> Vec<String> {
    let mut cols = vec!["Stock ID".to_owned()];
    for side in ["Bid", "Ask"] {
        for i in 1..=BOOK_DEPTH {
            cols.push(format!("{side}{i} Price"));
            cols.push(format!("{side}{i} Qty"));
        }
    }
    cols.extend(["Last Trade Price", "Last Trade Qty", "Last Match Time"].map(String::from));
    cols
}

pub fn fmt01_row(r: &Fmt01Record) -> [String; 5] {
    [
        r.stock_id.clone(),
        r.stock_name.clone(),
        r.ref_price.to_string(),
        r.up_limit.to_string(),
        r.down_limit.to_string(),
    ]
}

pub fn fmt06_row(r: &Fmt06Record) -> Vec<String> {
    let mut row = Vec::with_capacity(4 + 4 * BOOK_DEPTH);
    row.push(r.stock_id.clone());
    for level in r.bids.iter().chain(&r.asks) {
        row.push(level.price.to_string());
        row.push(level.qty.to_string());
    }
    row.push(r.last_price.to_string());
    row.push(r.last_qty.to_string());
    row.push(r.match_time.clone());
    row
}

struct Table<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> Table<W> {
    fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            rows: 0,
        }
    }

    fn append<I, T>(&mut self, header: I, row: &[String]) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        if self.rows == 0 {
            self.writer.write_record(header)?;
        }
        self.writer.write_record(row)?;
        self.rows += 1;
        Ok(())
    }
}

pub struct CsvSink<W: Write> {
    fmt01: Table<W>,
    fmt06: Table<W>,
    max_rows: usize,
}

impl CsvSink<File> {
    /// Create (truncating) both CSV files inside `dir`.
    pub fn create(dir: &Path, max_rows: usize) -> Result<Self> {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        let open = |name: &str| {
            let path = dir.join(name);
            File::create(&path).with_context(|| format!("create {}", path.display()))
        };
        Ok(Self::new(open(FMT01_FILE)?, open(FMT06_FILE)?, max_rows))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(fmt01: W, fmt06: W, max_rows: usize) -> Self {
        Self {
            fmt01: Table::new(fmt01),
            fmt06: Table::new(fmt06),
            max_rows,
        }
    }

    /// Append one record. Returns `false` when its format is already full.
    pub fn write(&mut self, record: &Record) -> Result<bool> {
        match record {
            Record::Static(r) => {
                if self.fmt01.rows >= self.max_rows {
                    return Ok(false);
                }
                self.fmt01.append(FMT01_COLUMNS, &fmt01_row(r))?;
            }
            Record::Quote(r) => {
                if self.fmt06.rows >= self.max_rows {
                    return Ok(false);
                }
                self.fmt06.append(fmt06_columns(), &fmt06_row(r))?;
            }
        }
        Ok(true)
    }

    /// Rows written so far, `(format 01, format 06)`.
    pub fn rows(&self) -> (usize, usize) {
        (self.fmt01.rows, self.fmt06.rows)
    }

    pub fn is_full(&self) -> bool {
        self.fmt01.rows >= self.max_rows && self.fmt06.rows >= self.max_rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.fmt01.writer.flush()?;
        self.fmt06.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writers.
    pub fn into_inner(self) -> Result<(W, W)> {
        let finish = |w: csv::Writer<W>| {
            w.into_inner()
                .map_err(|e| anyhow!("flush csv output: {}", e.error()))
        };
        Ok((finish(self.fmt01.writer)?, finish(self.fmt06.writer)?))
    }
}
