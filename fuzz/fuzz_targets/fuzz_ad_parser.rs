//! Fuzz target: advertising data parsing
//!
//! Feeds arbitrary extended advertising payloads through the AD element
//! iterator and the ID/name extractors, then folds the report into a
//! registry entry. None of it may panic or read past the input.
//!
//! cargo fuzz run fuzz_ad_parser

#![no_main]

use auracast_toolkit::app::events::AdvertisingReport;
use auracast_toolkit::broadcast::{Address, AddressKind, Phy};
use auracast_toolkit::registry::BroadcastRegistry;
use auracast_toolkit::scan::ad::{AdElements, broadcast_id, broadcaster_name};
use auracast_toolkit::scan::record_report;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let consumed: usize = AdElements::new(data).map(|e| e.data.len() + 2).sum();
    assert!(consumed <= data.len(), "element ran past the payload");

    let _ = broadcast_id(data);
    let _ = broadcaster_name(data);

    let mut registry = BroadcastRegistry::new();
    let report = AdvertisingReport {
        address: Address::new(AddressKind::Random, [1, 2, 3, 4, 5, 6]),
        interval: 0x00A0,
        sid: 0,
        phy: Phy::Le2M,
        rssi: -60,
        data,
    };
    let discovery = record_report(&mut registry, &report).expect("empty registry has room");
    let b = registry.by_index(discovery.index).expect("slot just created");
    assert!(b.name.len() <= b.name.capacity());
});
