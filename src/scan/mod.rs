//! Scan coordinator.
//!
//! Toggles advertising report delivery and turns periodic-capable
//! reports into registry entries.
//!
//! ```text
//!   Off ──start()──▶ Scanning ──stop()──▶ Off
//! ```
//!
//! `start()` and `stop()` run on the command side; [`ScanCoordinator::on_report`]
//! runs in the stack's callback context. The scanning flag is an atomic
//! so both sides see the same state without a lock.

pub mod ad;

use core::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::app::events::AdvertisingReport;
use crate::app::ports::{ScanPort, StackError};
use crate::broadcast::{BroadcastId, ScanInfo};
use crate::error::{Error, ProtocolOp, Result};
use crate::registry::BroadcastRegistry;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Off,
    Scanning,
}

/// Outcome of [`ScanCoordinator::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStart {
    Started,
    /// The stack was already scanning. Informational, not a failure.
    AlreadyRunning,
}

/// A report that landed in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovery {
    pub index: usize,
    pub created: bool,
    pub id: BroadcastId,
}

/// Owns the scanning flag and the report-to-registry policy.
#[derive(Debug, Default)]
pub struct ScanCoordinator {
    scanning: AtomicBool,
}

impl ScanCoordinator {
    pub const fn new() -> Self {
        Self {
            scanning: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ScanState {
        if self.scanning.load(Ordering::Acquire) {
            ScanState::Scanning
        } else {
            ScanState::Off
        }
    }

    /// Start advertising report delivery.
    pub fn start(&self, port: &mut impl ScanPort) -> Result<ScanStart> {
        let outcome = match port.start_scan() {
            Ok(()) => ScanStart::Started,
            Err(StackError::AlreadyRunning) => {
                info!("SCAN | already running");
                ScanStart::AlreadyRunning
            }
            Err(e) => return Err(Error::Protocol(e.during(ProtocolOp::ScanStart))),
        };
        self.scanning.store(true, Ordering::Release);
        Ok(outcome)
    }

    /// Stop report delivery. The coordinator is `Off` afterwards even if
    /// the stack reported an error.
    pub fn stop(&self, port: &mut impl ScanPort) -> Result<()> {
        self.scanning.store(false, Ordering::Release);
        port.stop_scan().map_err(|e| {
            warn!("SCAN | stop failed with {}, resetting", e.code());
            Error::Protocol(e.during(ProtocolOp::ScanStop))
        })
    }

    /// Fold one advertising report into the registry.
    ///
    /// Returns `Ok(None)` for reports that are ignored: non-periodic
    /// advertisers, or anything arriving while scanning is off.
    pub fn on_report(
        &self,
        registry: &mut BroadcastRegistry,
        report: &AdvertisingReport<'_>,
    ) -> Result<Option<Discovery>> {
        if self.state() == ScanState::Off || report.interval == 0 {
            return Ok(None);
        }
        Ok(Some(record_report(registry, report)?))
    }
}

/// Upsert the reporting broadcaster and refresh its scan snapshot.
///
/// A report without Broadcast Audio Announcement service data keeps the
/// previously learned ID instead of resetting it to 0, so an interleaved
/// report without service data cannot erase a known ID. A new entry
/// without one starts at 0.
pub fn record_report(
    registry: &mut BroadcastRegistry,
    report: &AdvertisingReport<'_>,
) -> Result<Discovery> {
    let parsed_id = ad::broadcast_id(report.data);
    let slot = registry.upsert(report.address, parsed_id.unwrap_or_default())?;
    let b = slot.broadcast;

    b.address = report.address;
    if let Some(id) = parsed_id {
        b.id = id;
    }
    b.last_scan = ScanInfo {
        interval: report.interval,
        sid: report.sid,
        phy: report.phy,
    };
    if let Some(name) = ad::broadcaster_name(report.data) {
        b.set_name(name);
    }
    b.found = true;

    Ok(Discovery {
        index: slot.index,
        created: slot.created,
        id: b.id,
    })
}
