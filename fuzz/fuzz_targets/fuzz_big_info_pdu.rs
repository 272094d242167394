//! Fuzz target: raw BIGInfo PDU timing extraction
//!
//! Any byte string either decodes into two 20-bit timing fields or is
//! rejected as too short. Arbitrary bit windows over the same bytes must
//! stay in range.
//!
//! cargo fuzz run fuzz_big_info_pdu

#![no_main]

use auracast_toolkit::sync::pdu::{MIN_BIG_INFO_PDU_LEN, RawTiming, get_bits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match RawTiming::from_big_info_pdu(data) {
        Some(t) => {
            assert!(data.len() >= MIN_BIG_INFO_PDU_LEN);
            assert!(t.sub_interval < 1 << 20);
            assert!(t.bis_spacing < 1 << 20);
        }
        None => assert!(data.len() < MIN_BIG_INFO_PDU_LEN),
    }

    if let [offset, width, rest @ ..] = data {
        let width = u32::from(*width % 33);
        if let Some(v) = get_bits(rest, u32::from(*offset), width) {
            assert!(width == 32 || v < 1 << width);
        }
    }
});
