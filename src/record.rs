//! Decoded message records.
//!
//! Each format decoder produces exactly one of these; they own all their
//! data and never point back into the frame they were decoded from.
use serde::Serialize;

use crate::bcd::Price;
use crate::header::Header;

/// Depth of the best bid/ask book carried by format "06".
pub const BOOK_DEPTH: usize = 5;

/// Format "01": fixed-length static security information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fmt01Record {
    pub header: Header,
    pub stock_id: String,
    pub stock_name: String,        // transcoded, see crate::transcode
    pub industry: String,
    pub security_type: String,
    pub trade_note: String,
    pub abnormal_code: u8,
    pub board: String,
    pub ref_price: Price,
    pub up_limit: Price,
    pub down_limit: Price,
    pub non_ten_par: String,
    pub abnormal_promotion: String,
    pub special_abnormal: String,
    pub day_trade_cash: String,
    pub exempt_short_sale: String,
    pub exempt_sbl: String,
    pub match_cycle_secs: u32,
    /// Warrant block, uninterpreted.
    pub warrant_raw_hex: String,
    /// Trailing "other" block, uninterpreted.
    pub other_raw_hex: String,
    pub line_note: String,
    /// Checksum byte carried by the frame.
    pub checksum: u8,
    /// XOR computed over the covered range.
    pub computed_xor: u8,
    pub checksum_ok: bool,
}

/// One price level of the book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Level {
    pub price: Price,
    pub qty: u32,
}

impl Level {
    pub fn is_empty(&self) -> bool {
        self.price.is_zero() && self.qty == 0
    }
}

/// Format "06": variable-length trade and best-five quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fmt06Record {
    pub header: Header,
    pub stock_id: String,
    /// `HH:MM:SS.mmmuuu`
    pub match_time: String,
    pub item_bitmap: u8,
    pub limit_bitmap: u8,
    pub state_bitmap: u8,
    pub cumulative_qty: u32,
    pub last_price: Price,
    pub last_qty: u32,
    pub bids: [Level; BOOK_DEPTH], // index 0 = best bid
    pub asks: [Level; BOOK_DEPTH], // index 0 = best ask
    pub checksum: u8,
    pub computed_xor: u8,
    pub checksum_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Record {
    Static(Fmt01Record),
    Quote(Fmt06Record),
}

impl Record {
    pub fn header(&self) -> &Header {
        match self {
            Record::Static(r) => &r.header,
            Record::Quote(r) => &r.header,
        }
    }

    pub fn stock_id(&self) -> &str {
        match self {
            Record::Static(r) => &r.stock_id,
            Record::Quote(r) => &r.stock_id,
        }
    }

    pub fn checksum_ok(&self) -> bool {
        match self {
            Record::Static(r) => r.checksum_ok,
            Record::Quote(r) => r.checksum_ok,
        }
    }

    /// `(carried, computed)` checksum bytes.
    pub fn checksum_pair(&self) -> (u8, u8) {
        match self {
            Record::Static(r) => (r.checksum, r.computed_xor),
            Record::Quote(r) => (r.checksum, r.computed_xor),
        }
    }
}
