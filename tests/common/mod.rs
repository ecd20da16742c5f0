//! Wire frame builders shared by the integration tests.
#![allow(dead_code)]

use tse_feed::bcd::xor_checksum;

pub const MARKER: u8 = 0x1B;
pub const CRLF: [u8; 2] = [0x0D, 0x0A];

/// Pack `value` as `digits` decimal digits of BCD.
pub fn bcd(value: u64, digits: usize) -> Vec<u8> {
    let s = format!("{value:0digits$}");
    s.as_bytes()
        .chunks(2)
        .map(|p| ((p[0] - b'0') << 4) | (p[1] - b'0'))
        .collect()
}

/// Valid envelope with a zeroed body; the checksum is not meaningful.
pub fn raw_frame(fmt: u8, total_len: usize) -> Vec<u8> {
    let mut f = vec![0u8; total_len];
    f[0] = MARKER;
    f[1..3].copy_from_slice(&bcd(total_len as u64, 4));
    f[3] = 0x01;
    f[4] = fmt;
    f[5] = 0x01;
    f[total_len - 2..].copy_from_slice(&CRLF);
    f
}

/// Format "01" frame with reference, up and down limit prices in ticks.
pub fn fmt01(seq: u64, stock_id: &str, name: &[u8], prices: [u64; 3]) -> Vec<u8> {
    let mut f = vec![0u8; 114];
    f[0] = MARKER;
    f[1..3].copy_from_slice(&bcd(114, 4));
    f[3] = 0x01;
    f[4] = 0x01;
    f[5] = 0x08;
    f[6..10].copy_from_slice(&bcd(seq, 8));
    f[10..32].fill(b' ');
    f[10..10 + stock_id.len()].copy_from_slice(stock_id.as_bytes());
    f[16..16 + name.len()].copy_from_slice(name);
    for (i, px) in prices.iter().enumerate() {
        f[40 + i * 5..45 + i * 5].copy_from_slice(&bcd(*px, 10));
    }
    f[111] = xor_checksum(&f[1..=110]);
    f[112..].copy_from_slice(&CRLF);
    f
}

/// Format "06" frame with a consistent item bitmap, length and checksum.
pub fn fmt06(seq: u64, stock_id: &str, trade: Option<(u64, u32)>, bids: &[(u64, u32)], asks: &[(u64, u32)]) -> Vec<u8> {
    let item = (u8::from(trade.is_some()) << 7) | ((bids.len() as u8) << 4) | ((asks.len() as u8) << 1);
    let mut f = vec![MARKER, 0, 0, 0x01, 0x06, 0x04];
    f.extend(bcd(seq, 8));
    let mut id = [b' '; 6];
    id[..stock_id.len()].copy_from_slice(stock_id.as_bytes());
    f.extend(id);
    f.extend(bcd(93_015_123_456, 12));
    f.extend([item, 0x00, 0x00]);
    f.extend(bcd(1_000, 8));
    for (px, qty) in trade.iter().chain(bids).chain(asks) {
        f.extend(bcd(*px, 10));
        f.extend(bcd(u64::from(*qty), 8));
    }
    let len = f.len() + 3;
    f[1..3].copy_from_slice(&bcd(len as u64, 4));
    f.push(xor_checksum(&f[1..]));
    f.extend(CRLF);
    f
}
