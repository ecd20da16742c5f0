//! Format "06": trade and best-five quote, variable length.
//!
//! Fixed section, always present:
//!
//! ```text
//! offset  len  field
//!     10    6  stock id (ASCII)
//!     16    6  match time (BCD, HHMMSSmmmuuu)
//!     22    1  item bitmap
//!     23    1  limit bitmap (low two bits: deferred match)
//!     24    1  state bitmap
//!     25    4  cumulative quantity (BCD)
//! ```
//!
//! Then, in order, as the item bitmap declares: one trade (price 5 +
//! quantity 4), up to five bid levels, up to five ask levels. The last
//! three bytes are the checksum and CR LF.
use serde::Serialize;

use crate::bcd::{
    ascii_field, field, match_time_from_bcd, price_from_bcd, quantity_from_bcd, xor_checksum, Price,
};
use crate::error::{DecodeError, Result};
use crate::header::{check_envelope, Header, FMT06_MIN_LEN};
use crate::record::{Fmt06Record, Level, BOOK_DEPTH};

const VARIABLE_START: usize = 29;
const PRICE_LEN: usize = 5;
const QTY_LEN: usize = 4;

/// Item bitmap.
///
/// Bit layout:
///   bit 7    = a trade (price + quantity) follows the fixed section
///   bits 4-6 = number of bid levels
///   bits 1-3 = number of ask levels
///   bit 0    = trade only, no book levels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ItemBitmap(u8);

impl ItemBitmap {
    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn has_trade(self) -> bool {
        self.0 & 0b1000_0000 != 0
    }

    /// Declared bid depth, clamped to [`BOOK_DEPTH`].
    pub fn bid_levels(self) -> usize {
        usize::from((self.0 >> 4) & 0b111).min(BOOK_DEPTH)
    }

    /// Declared ask depth, clamped to [`BOOK_DEPTH`].
    pub fn ask_levels(self) -> usize {
        usize::from((self.0 >> 1) & 0b111).min(BOOK_DEPTH)
    }

    pub fn trade_only(self) -> bool {
        self.0 & 0b0000_0001 != 0
    }
}

/// Deferred matching: the limit bitmap's low two bits are `01` or `10`.
/// The trade quantity is suppressed and no book levels are read.
pub fn is_deferred(limit_bitmap: u8) -> bool {
    matches!(limit_bitmap & 0b11, 0b01 | 0b10)
}

/// Reads prices and quantities out of the variable section, never past the
/// checksum byte. Each value is bounds-checked on its own.
struct Levels<'a> {
    frame: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Levels<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let stop = self.pos + len;
        if stop > self.end {
            return None;
        }
        let raw = &self.frame[self.pos..stop];
        self.pos = stop;
        Some(raw)
    }

    /// Read price then quantity into `level`. A price that fits and parses
    /// is kept even when the quantity after it does not.
    fn read_into(&mut self, level: &mut Level) -> bool {
        let Some(price) = self.take(PRICE_LEN).and_then(|b| price_from_bcd(b).ok()) else {
            return false;
        };
        level.price = price;
        let Some(qty) = self.take(QTY_LEN).and_then(|b| quantity_from_bcd(b).ok()) else {
            return false;
        };
        level.qty = qty;
        true
    }

    /// Fill `count` slots in order; stops at the first value that is missing.
    fn fill(&mut self, slots: &mut [Level], count: usize) -> bool {
        slots.iter_mut().take(count).all(|slot| self.read_into(slot))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Fmt06Decoder;

impl Fmt06Decoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode one frame.
    ///
    /// The declared length must match the frame exactly. Once the fixed
    /// section parses a record is always returned; prices and quantities
    /// that do not fit before the checksum stay zero.
    pub fn decode(&self, frame: &[u8]) -> Result<Fmt06Record> {
        check_envelope(frame, FMT06_MIN_LEN)?;
        let header = Header::parse(frame)
            .map_err(|e| DecodeError::MalformedFrame(format!("unreadable header: {e}")))?;
        if header.declared_len != frame.len() {
            return Err(DecodeError::MalformedFrame(format!(
                "declared length {} but frame is {} bytes",
                header.declared_len,
                frame.len()
            )));
        }

        let stock_id = ascii_field(field(frame, 10, 6)?);
        let match_time = match_time_from_bcd(field(frame, 16, 6)?).map_err(|e| e.in_field("match_time"))?;
        let bitmaps = field(frame, 22, 3)?;
        let (item, limit_bitmap, state_bitmap) = (ItemBitmap::from_raw(bitmaps[0]), bitmaps[1], bitmaps[2]);
        let cumulative_qty = quantity_from_bcd(field(frame, 25, 4)?).map_err(|e| e.in_field("cumulative_qty"))?;

        let checksum_at = frame.len() - 3;
        let checksum = field(frame, checksum_at, 1)?[0];
        let computed_xor = xor_checksum(field(frame, 1, checksum_at - 1)?);

        let mut rec = Fmt06Record {
            header,
            stock_id,
            match_time,
            item_bitmap: item.raw(),
            limit_bitmap,
            state_bitmap,
            cumulative_qty,
            last_price: Price::ZERO,
            last_qty: 0,
            bids: [Level::default(); BOOK_DEPTH],
            asks: [Level::default(); BOOK_DEPTH],
            checksum,
            computed_xor,
            checksum_ok: checksum == computed_xor,
        };

        let mut levels = Levels {
            frame,
            pos: VARIABLE_START,
            end: checksum_at,
        };
        let deferred = is_deferred(limit_bitmap);

        if item.has_trade() {
            let mut trade = Level::default();
            let complete = levels.read_into(&mut trade);
            rec.last_price = trade.price;
            rec.last_qty = if deferred { 0 } else { trade.qty };
            if !complete {
                return Ok(rec);
            }
        }
        if item.trade_only() || deferred {
            return Ok(rec);
        }
        if levels.fill(&mut rec.bids, item.bid_levels()) {
            levels.fill(&mut rec.asks, item.ask_levels());
        }
        Ok(rec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{item_bitmap, price_bcd, Quote};

    fn decode(frame: &[u8]) -> Result<Fmt06Record> {
        Fmt06Decoder::new().decode(frame)
    }

    fn non_empty(levels: &[Level]) -> usize {
        levels.iter().filter(|l| !l.is_empty()).count()
    }

    #[test]
    fn bitmap_fields() {
        let b = ItemBitmap::from_raw(0b1011_0101);
        assert!(b.has_trade());
        assert_eq!(b.bid_levels(), 3);
        assert_eq!(b.ask_levels(), 2);
        assert!(b.trade_only());
        assert_eq!(ItemBitmap::from_raw(0b0111_1110).bid_levels(), 5);
        assert_eq!(ItemBitmap::from_raw(0b0111_1110).ask_levels(), 5);
        assert!(is_deferred(0b01) && is_deferred(0b10));
        assert!(!is_deferred(0b00) && !is_deferred(0b11) && !is_deferred(0b100));
    }

    #[test]
    fn decodes_trade_and_book() {
        let q = Quote {
            cum_qty: 1500,
            ..Quote::book(
                Some((5_805_000, 12)),
                vec![(5_800_000, 30), (5_790_000, 41)],
                vec![(5_810_000, 7)],
            )
        };
        let rec = decode(&q.build()).unwrap();
        assert_eq!(rec.stock_id, "2330");
        assert_eq!(rec.match_time, "09:30:15.123456");
        assert_eq!(rec.header.format_code, "06");
        assert_eq!(rec.header.declared_len, q.build().len());
        assert_eq!(rec.cumulative_qty, 1500);
        assert_eq!(rec.last_price.to_string(), "580.5000");
        assert_eq!(rec.last_qty, 12);
        assert_eq!(rec.bids[0], Level { price: Price::from_ticks(5_800_000), qty: 30 });
        assert_eq!(rec.bids[1].qty, 41);
        assert_eq!(non_empty(&rec.bids), 2);
        assert_eq!(rec.asks[0].price.to_string(), "581.0000");
        assert_eq!(non_empty(&rec.asks), 1);
        assert!(rec.checksum_ok);
    }

    #[test]
    fn minimal_frame_has_empty_book() {
        let frame = Quote::default().build();
        assert_eq!(frame.len(), FMT06_MIN_LEN);
        let rec = decode(&frame).unwrap();
        assert_eq!(non_empty(&rec.bids) + non_empty(&rec.asks), 0);
        assert!(rec.last_price.is_zero());
    }

    #[test]
    fn declared_depth_beyond_frame_truncates() {
        let q = Quote {
            item: item_bitmap(false, 5, 5, false),
            bids: vec![(1_000_000, 1), (990_000, 2)],
            ..Quote::default()
        };
        let rec = decode(&q.build()).unwrap();
        assert_eq!(non_empty(&rec.bids), 2);
        assert!(rec.bids[2..].iter().all(Level::is_empty));
        assert_eq!(non_empty(&rec.asks), 0);
        assert!(rec.checksum_ok);
    }

    #[test]
    fn depth_is_clamped_to_five() {
        let bids: Vec<_> = (0..6).map(|i| (1_000_000 - i * 500, 10 + i as u32)).collect();
        let q = Quote {
            item: item_bitmap(false, 7, 1, false),
            bids,
            asks: vec![(2_000_000, 9)],
            ..Quote::default()
        };
        let rec = decode(&q.build()).unwrap();
        assert_eq!(non_empty(&rec.bids), 5);
        assert_eq!(rec.bids[4].qty, 14);
        // The sixth bid sits where the first ask is expected.
        assert_eq!(rec.asks[0].qty, 15);
    }

    #[test]
    fn deferred_match_zeroes_qty_and_skips_book() {
        let q = Quote {
            limit: 0b10,
            ..Quote::book(Some((3_000_000, 99)), vec![(2_990_000, 5)], vec![])
        };
        let rec = decode(&q.build()).unwrap();
        assert_eq!(rec.last_price.to_string(), "300.0000");
        assert_eq!(rec.last_qty, 0);
        assert_eq!(non_empty(&rec.bids), 0);
    }

    #[test]
    fn trade_only_skips_book() {
        let mut q = Quote::book(Some((3_000_000, 99)), vec![(2_990_000, 5)], vec![]);
        q.item |= 0b1;
        let rec = decode(&q.build()).unwrap();
        assert_eq!(rec.last_qty, 99);
        assert_eq!(non_empty(&rec.bids), 0);
    }

    #[test]
    fn malformed_level_truncates_rest() {
        let q = Quote::book(None, vec![(1_000_000, 1), (990_000, 2), (980_000, 3)], vec![(1_010_000, 4)]);
        let mut frame = q.build();
        // First byte of the second bid price.
        frame[29 + 9] = 0xAA;
        let rec = decode(&frame).unwrap();
        assert_eq!(non_empty(&rec.bids), 1);
        assert_eq!(non_empty(&rec.asks), 0);
        assert!(!rec.checksum_ok);
    }

    #[test]
    fn trade_price_kept_when_qty_does_not_fit() {
        let q = Quote {
            item: item_bitmap(true, 0, 0, false),
            tail: price_bcd(1_000_000),
            ..Quote::default()
        };
        let frame = q.build();
        assert_eq!(frame.len(), 37);
        let rec = decode(&frame).unwrap();
        assert_eq!(rec.last_price.to_string(), "100.0000");
        assert_eq!(rec.last_qty, 0);
        assert!(rec.checksum_ok);
    }

    #[test]
    fn bid_price_kept_when_qty_does_not_fit() {
        let q = Quote {
            item: item_bitmap(false, 2, 1, false),
            bids: vec![(1_000_000, 4)],
            tail: price_bcd(990_000),
            ..Quote::default()
        };
        let rec = decode(&q.build()).unwrap();
        assert_eq!(rec.bids[0], Level { price: Price::from_ticks(1_000_000), qty: 4 });
        assert_eq!(rec.bids[1], Level { price: Price::from_ticks(990_000), qty: 0 });
        assert_eq!(non_empty(&rec.asks), 0);
    }

    #[test]
    fn malformed_qty_keeps_its_price() {
        let q = Quote::book(Some((2_000_000, 8)), vec![(1_990_000, 3)], vec![(2_010_000, 6)]);
        let mut frame = q.build();
        // Last byte of the trade quantity.
        frame[29 + 8] = 0x0B;
        let rec = decode(&frame).unwrap();
        assert_eq!(rec.last_price.to_string(), "200.0000");
        assert_eq!(rec.last_qty, 0);
        assert_eq!(non_empty(&rec.bids) + non_empty(&rec.asks), 0);
    }

    #[test]
    fn checksum_mismatch_keeps_decoding() {
        let mut frame = Quote::book(None, vec![(1_000_000, 1)], vec![]).build();
        let at = frame.len() - 3;
        frame[at] ^= 0x55;
        let rec = decode(&frame).unwrap();
        assert!(!rec.checksum_ok);
        assert_eq!(non_empty(&rec.bids), 1);
    }

    #[test]
    fn declared_length_must_match() {
        let mut frame = Quote::default().build();
        frame[2] = 0x33;
        assert!(matches!(decode(&frame), Err(DecodeError::MalformedFrame(_))));
        let mut frame = Quote::default().build();
        frame[1] = 0xF0;
        assert!(matches!(decode(&frame), Err(DecodeError::MalformedFrame(_))));
    }

    #[test]
    fn bad_fixed_section_aborts() {
        let mut frame = Quote::default().build();
        frame[26] = 0x0C;
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::MalformedNumeric { field: "cumulative_qty", .. })
        ));
        let mut frame = Quote::default().build();
        frame[16] = 0xA0;
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::MalformedNumeric { field: "match_time", .. })
        ));
    }

    #[test]
    fn rejects_short_frames() {
        let frame = Quote::default().build();
        assert!(matches!(decode(&frame[..31]), Err(DecodeError::MalformedFrame(_))));
    }
}
