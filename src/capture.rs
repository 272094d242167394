//! Raw ISO capture routing.
//!
//! While subscribed, the controller forwards every raw BIS data PDU and
//! every raw BIGInfo PDU. Data PDUs are only interesting during a dump;
//! BIGInfo PDUs feed the timing fields of any outstanding BIGInfo
//! request and are echoed during a dump.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::debug;

use crate::app::events::{AppEvent, capture_copy};
use crate::app::ports::EventSink;
use crate::sync::pdu::RawTiming;
use crate::sync::request::PendingRequests;

pub struct CaptureRouter {
    dumping: AtomicBool,
    print_interval: AtomicU64,
}

impl CaptureRouter {
    pub const fn new(print_interval: u64) -> Self {
        Self {
            dumping: AtomicBool::new(false),
            print_interval: AtomicU64::new(if print_interval == 0 { 1 } else { print_interval }),
        }
    }

    pub fn start_dump(&self) {
        self.dumping.store(true, Ordering::Release);
    }

    pub fn stop_dump(&self) {
        self.dumping.store(false, Ordering::Release);
    }

    pub fn is_dumping(&self) -> bool {
        self.dumping.load(Ordering::Acquire)
    }

    /// Raw BIS data PDU.
    pub fn on_iso_pdu(&self, seq: u64, payload: &[u8], sink: &mut impl EventSink) {
        if !self.is_dumping() {
            return;
        }
        if seq % self.print_interval.load(Ordering::Relaxed) != 0 {
            return;
        }
        sink.emit(&AppEvent::PduCaptured {
            seq,
            len: payload.len(),
            payload: capture_copy(payload),
        });
    }

    /// Raw BIGInfo PDU.
    pub fn on_raw_big_info(&self, pdu: &[u8], pending: &PendingRequests, sink: &mut impl EventSink) {
        match RawTiming::from_big_info_pdu(pdu) {
            Some(timing) => {
                if pending.on_timing(timing) {
                    debug!(
                        "RAW BIGInfo | sub_interval={}us bis_spacing={}us",
                        timing.sub_interval, timing.bis_spacing
                    );
                }
            }
            None => debug!("RAW BIGInfo | {} byte PDU too short for timing", pdu.len()),
        }

        if self.is_dumping() {
            sink.emit(&AppEvent::BigInfoPdu {
                len: pdu.len(),
                payload: capture_copy(pdu),
            });
        }
    }
}
