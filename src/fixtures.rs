//! Synthetic wire frames for unit tests.
use crate::bcd::{digits_to_bcd, xor_checksum};
use crate::header::{FMT01_LEN, MARKER, TERMINATOR};

fn bcd_num(value: u64, digits: usize) -> Vec<u8> {
    digits_to_bcd(&format!("{value:0digits$}"))
}

fn put_ascii(frame: &mut [u8], offset: usize, len: usize, text: &str) {
    let dst = &mut frame[offset..offset + len];
    dst.fill(b' ');
    dst[..text.len()].copy_from_slice(text.as_bytes());
}

/// Structurally valid frame of `total_len` bytes with the given format byte
/// and a zeroed body. The length field carries `total_len`.
pub(crate) fn raw_frame(fmt: u8, total_len: usize) -> Vec<u8> {
    let mut f = vec![0u8; total_len];
    f[0] = MARKER;
    f[1..3].copy_from_slice(&bcd_num(total_len as u64, 4));
    f[3] = 0x01;
    f[4] = fmt;
    f[5] = 0x01;
    f[total_len - 2..].copy_from_slice(&TERMINATOR);
    f
}

/// Format "01" frame with a valid checksum.
pub(crate) fn fmt01_frame(stock_id: &str, name: &[u8], prices: [u64; 3]) -> Vec<u8> {
    let mut f = vec![0u8; FMT01_LEN];
    f[0] = MARKER;
    f[1..3].copy_from_slice(&bcd_num(FMT01_LEN as u64, 4));
    f[3] = 0x01;
    f[4] = 0x01;
    f[5] = 0x08;
    f[6..10].copy_from_slice(&bcd_num(42, 8));
    put_ascii(&mut f, 10, 6, stock_id);
    f[16..32].fill(b' ');
    f[16..16 + name.len()].copy_from_slice(name);
    put_ascii(&mut f, 32, 2, "24");
    put_ascii(&mut f, 34, 2, "ST");
    put_ascii(&mut f, 36, 2, "0");
    f[38] = 0x00;
    f[39] = b'0';
    for (i, ticks) in prices.iter().enumerate() {
        let at = 40 + i * 5;
        f[at..at + 5].copy_from_slice(&bcd_num(*ticks, 10));
    }
    for (i, flag) in b"NNNYNN".iter().enumerate() {
        f[55 + i] = *flag;
    }
    f[61..64].copy_from_slice(&bcd_num(20, 6));
    f[64] = 0xAB;
    f[103] = 0x01;
    f[110] = 0x01;
    f[111] = xor_checksum(&f[1..=110]);
    f[112..].copy_from_slice(&TERMINATOR);
    f
}

/// Packed 10-digit price, for hand-built tails.
pub(crate) fn price_bcd(ticks: u64) -> Vec<u8> {
    bcd_num(ticks, 10)
}

pub(crate) fn item_bitmap(trade: bool, bids: u8, asks: u8, trade_only: bool) -> u8 {
    (u8::from(trade) << 7) | ((bids & 0x07) << 4) | ((asks & 0x07) << 1) | u8::from(trade_only)
}

/// Builder for format "06" frames. Levels are `(price ticks, qty)`.
pub(crate) struct Quote {
    pub stock_id: &'static str,
    pub time: &'static str,
    pub item: u8,
    pub limit: u8,
    pub cum_qty: u32,
    pub trade: Option<(u64, u32)>,
    pub bids: Vec<(u64, u32)>,
    pub asks: Vec<(u64, u32)>,
    /// Raw bytes placed after the levels, before the checksum.
    pub tail: Vec<u8>,
}

impl Default for Quote {
    fn default() -> Self {
        Self {
            stock_id: "2330",
            time: "093015123456",
            item: 0,
            limit: 0,
            cum_qty: 0,
            trade: None,
            bids: Vec::new(),
            asks: Vec::new(),
            tail: Vec::new(),
        }
    }
}

impl Quote {
    /// Frame whose item bitmap matches the populated sections.
    pub fn book(trade: Option<(u64, u32)>, bids: Vec<(u64, u32)>, asks: Vec<(u64, u32)>) -> Self {
        Self {
            item: item_bitmap(trade.is_some(), bids.len() as u8, asks.len() as u8, false),
            trade,
            bids,
            asks,
            ..Self::default()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut f = vec![MARKER, 0, 0, 0x01, 0x06, 0x04];
        f.extend(bcd_num(7, 8));
        let mut id = [b' '; 6];
        id[..self.stock_id.len()].copy_from_slice(self.stock_id.as_bytes());
        f.extend(id);
        f.extend(digits_to_bcd(self.time));
        f.extend([self.item, self.limit, 0x00]);
        f.extend(bcd_num(self.cum_qty.into(), 8));
        let levels = self.trade.iter().chain(&self.bids).chain(&self.asks);
        for (px, qty) in levels {
            f.extend(bcd_num(*px, 10));
            f.extend(bcd_num((*qty).into(), 8));
        }
        f.extend(&self.tail);
        let len = f.len() + 3;
        f[1..3].copy_from_slice(&bcd_num(len as u64, 4));
        f.push(xor_checksum(&f[1..]));
        f.extend(TERMINATOR);
        f
    }
}
