//! Format "01": static security information, fixed 114 bytes.
//!
//! ```text
//! offset  len  field
//!     10    6  stock id (ASCII)
//!     16   16  stock name (Big5)
//!     32    2  industry        34  2  security type     36  2  trade note
//!     38    1  abnormal code (BCD)                      39  1  board
//!     40    5  reference price 45  5  up limit          50  5  down limit
//!     55    6  one-byte flags (ASCII)
//!     61    3  match cycle seconds (BCD)
//!     64   39  warrant info (raw)
//!    103    7  other info (raw)
//!    110    1  line note (BCD)
//!    111    1  checksum, XOR of bytes 1..=110
//!    112    2  CR LF
//! ```
use std::sync::Arc;

use crate::bcd::{
    ascii_field, bcd_to_digits, field, hex_upper, number_from_bcd, price_from_bcd, xor_checksum,
};
use crate::error::Result;
use crate::header::{check_envelope, Header, FMT01_LEN};
use crate::record::Fmt01Record;
use crate::transcode::{legacy_text, Transcode};

const CHECKSUM_AT: usize = 111;

#[derive(Debug, Clone)]
pub struct Fmt01Decoder {
    transcoder: Arc<dyn Transcode>,
}

impl Fmt01Decoder {
    pub fn new(transcoder: Arc<dyn Transcode>) -> Self {
        Self { transcoder }
    }

    /// Decode one frame. Checksum mismatch is reported on the record, not
    /// as an error.
    pub fn decode(&self, frame: &[u8]) -> Result<Fmt01Record> {
        check_envelope(frame, FMT01_LEN)?;
        let header = Header::parse_fixed(frame)?;
        let ascii = |offset, len| field(frame, offset, len).map(ascii_field);
        let price = |offset, name| field(frame, offset, 5).and_then(price_from_bcd).map_err(|e| e.in_field(name));

        let computed_xor = xor_checksum(field(frame, 1, CHECKSUM_AT - 1)?);
        let checksum = field(frame, CHECKSUM_AT, 1)?[0];

        Ok(Fmt01Record {
            header,
            stock_id: ascii(10, 6)?,
            stock_name: legacy_text(self.transcoder.as_ref(), field(frame, 16, 16)?),
            industry: ascii(32, 2)?,
            security_type: ascii(34, 2)?,
            trade_note: ascii(36, 2)?,
            abnormal_code: number_from_bcd(field(frame, 38, 1)?, "abnormal_code")? as u8,
            board: ascii(39, 1)?,
            ref_price: price(40, "ref_price")?,
            up_limit: price(45, "up_limit")?,
            down_limit: price(50, "down_limit")?,
            non_ten_par: ascii(55, 1)?,
            abnormal_promotion: ascii(56, 1)?,
            special_abnormal: ascii(57, 1)?,
            day_trade_cash: ascii(58, 1)?,
            exempt_short_sale: ascii(59, 1)?,
            exempt_sbl: ascii(60, 1)?,
            match_cycle_secs: number_from_bcd(field(frame, 61, 3)?, "match_cycle_secs")?,
            warrant_raw_hex: hex_upper(field(frame, 64, 39)?),
            other_raw_hex: hex_upper(field(frame, 103, 7)?),
            line_note: bcd_to_digits(field(frame, 110, 1)?),
            checksum,
            computed_xor,
            checksum_ok: checksum == computed_xor,
        })
    }
}
