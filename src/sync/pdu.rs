//! Raw BIGInfo PDU timing extraction.
//!
//! The HCI BIGInfo report omits the subevent interval and BIS spacing,
//! so they are read straight from the raw BIGInfo PDU body. Both are
//! 20-bit little-endian bit-packed fields:
//!
//! | Field          | Byte offset | Bits  |
//! |----------------|-------------|-------|
//! | Sub_Interval   | 5           | 0..20 |
//! | BIS_Spacing    | 8           | 0..20 |

const SUB_INTERVAL_OFFSET: usize = 5;
const BIS_SPACING_OFFSET: usize = 8;
const TIMING_FIELD_BITS: u32 = 20;

/// Shortest PDU holding both fields.
pub const MIN_BIG_INFO_PDU_LEN: usize = BIS_SPACING_OFFSET + 3;

/// Read `num_bits` (at most 32) starting `bit_offset` bits into `data`,
/// least-significant bit first. `None` when the field runs past `data`.
pub fn get_bits(data: &[u8], bit_offset: u32, num_bits: u32) -> Option<u32> {
    if num_bits > 32 {
        return None;
    }
    let mut value = 0u32;
    let mut shift = 0u32;
    let mut remaining = num_bits;
    let mut index = (bit_offset / 8) as usize;
    let mut offset = bit_offset % 8;

    while remaining > 0 {
        let byte = *data.get(index)?;
        let bits = remaining.min(8 - offset);
        let mask = ((1u16 << bits) - 1) as u8;
        value |= u32::from((byte >> offset) & mask) << shift;
        shift += bits;
        remaining -= bits;
        offset = 0;
        index += 1;
    }
    Some(value)
}

/// Timing fields recovered from one raw BIGInfo PDU (microseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawTiming {
    pub sub_interval: u32,
    pub bis_spacing: u32,
}

impl RawTiming {
    pub fn from_big_info_pdu(pdu: &[u8]) -> Option<Self> {
        if pdu.len() < MIN_BIG_INFO_PDU_LEN {
            return None;
        }
        Some(Self {
            sub_interval: get_bits(&pdu[SUB_INTERVAL_OFFSET..], 0, TIMING_FIELD_BITS)?,
            bis_spacing: get_bits(&pdu[BIS_SPACING_OFFSET..], 0, TIMING_FIELD_BITS)?,
        })
    }
}
