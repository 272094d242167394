//! Periodic sync orchestration and BIGInfo acquisition.
//!
//! ```text
//!   get_big_info(index)
//!     │ register token ─▶ subscribe raw ─▶ create PA sync
//!     │                                         │
//!     │        StackEvent::BigInfo ────────────▶│ token
//!     │        StackEvent::RawBigInfo ─────────▶│ token
//!     ▼                                         ▼
//!   wait (bounded) ─▶ apply to registry ─▶ unsubscribe ─▶ delete PA sync
//! ```
//!
//! The token is registered before the sync is created, so completions
//! that race the create call are never lost.

pub mod pdu;
pub mod request;

use core::time::Duration;

use log::{info, warn};

use crate::app::ports::{PaSyncParams, PeriodicSyncPort, RawCapturePort, SyncHandle};
use crate::config::ToolkitConfig;
use crate::error::{Error, ProtocolOp, Result};
use crate::shared::SharedState;

/// Interval value the stack reports when the periodic interval is unknown.
pub const PA_INTERVAL_UNKNOWN: u16 = 0xFFFF;

/// Smallest periodic sync timeout the controller accepts (10 ms units).
pub const PA_SYNC_MIN_TIMEOUT: u16 = 0x000A;

/// Largest periodic sync timeout the controller accepts (10 ms units).
pub const PA_SYNC_MAX_TIMEOUT: u16 = 0x4000;

/// Periodic sync timeout (10 ms units) that survives `ratio` missed
/// periodic events at `interval` (1.25 ms units).
pub fn sync_timeout(interval: u16, ratio: u32) -> u16 {
    if interval == PA_INTERVAL_UNKNOWN {
        return PA_SYNC_MAX_TIMEOUT;
    }
    let interval_ms = u32::from(interval) * 5 / 4;
    let timeout = interval_ms.saturating_mul(ratio) / 10;
    timeout.clamp(u32::from(PA_SYNC_MIN_TIMEOUT), u32::from(PA_SYNC_MAX_TIMEOUT)) as u16
}

/// How a BIGInfo acquisition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// BIGInfo was stored. `timing` is set when the raw PDU timing
    /// arrived as well.
    Complete { timing: bool },
    /// The bound expired before any BIGInfo arrived. Raw timing, if it
    /// arrived anyway, was still stored.
    TimedOut { timing: bool },
}

/// Result of waiting for a freshly created periodic sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSync {
    pub handle: SyncHandle,
    /// `false` when the wait expired before the stack confirmed the sync.
    pub established: bool,
}

/// Creates periodic syncs and assembles BIGInfo from both event sources.
#[derive(Debug, Clone, Copy)]
pub struct SyncOrchestrator {
    pa_timeout_ratio: u32,
    biginfo_timeout: Duration,
    sync_pending_timeout: Duration,
}

impl SyncOrchestrator {
    pub fn new(config: &ToolkitConfig) -> Self {
        Self {
            pa_timeout_ratio: config.pa_timeout_ratio,
            biginfo_timeout: Duration::from_millis(u64::from(config.biginfo_timeout_ms)),
            sync_pending_timeout: Duration::from_millis(u64::from(config.sync_pending_timeout_ms)),
        }
    }

    /// Request a periodic sync to the broadcast at `index`. The handle is
    /// stored on the entry; establishment is reported later.
    pub fn create_sync(
        &self,
        shared: &SharedState,
        port: &mut impl PeriodicSyncPort,
        index: usize,
    ) -> Result<SyncHandle> {
        let params = shared.with_registry(|reg| {
            reg.by_index(index).map(|b| PaSyncParams {
                address: b.address,
                sid: b.last_scan.sid,
                skip: 0,
                timeout: sync_timeout(b.last_scan.interval, self.pa_timeout_ratio),
            })
        })?;

        info!(
            "PA SYNC | creating for {} sid={} timeout={}",
            params.address, params.sid, params.timeout
        );
        let handle = port
            .create_sync(&params)
            .map_err(|e| Error::Protocol(e.during(ProtocolOp::PaSyncCreate)))?;

        shared.with_registry(|reg| {
            if let Ok(b) = reg.by_index_mut(index) {
                b.sync = Some(handle);
            }
        });
        Ok(handle)
    }

    /// Acquire BIGInfo for the broadcast at `index`.
    ///
    /// With `retained` set, the given sync (owned by an active session)
    /// is reused and left running; otherwise a sync is created for the
    /// acquisition and deleted afterwards.
    ///
    /// A running dump already holds the raw capture subscription and is
    /// left to feed it. Raw PDUs carry no address, so timing is only
    /// requested when no other session sync can be the source.
    pub fn get_big_info<C>(
        &self,
        shared: &SharedState,
        ctrl: &mut C,
        index: usize,
        retained: Option<SyncHandle>,
    ) -> Result<Acquisition>
    where
        C: PeriodicSyncPort + RawCapturePort,
    {
        let address = shared.with_registry(|reg| reg.by_index(index).map(|b| b.address))?;
        let wants_timing = retained.is_some() || !shared.watch.is_armed();
        let request = shared.pending.register(address, wants_timing)?;

        let subscribed = if shared.capture.is_dumping() {
            false
        } else {
            match ctrl.subscribe_raw() {
                Ok(()) => true,
                Err(e) => {
                    warn!("BIGInfo | raw capture unavailable ({}), timing fields skipped", e.code());
                    false
                }
            }
        };

        let sync = match retained {
            Some(handle) => handle,
            None => match self.create_sync(shared, ctrl, index) {
                Ok(handle) => handle,
                Err(e) => {
                    if subscribed {
                        let _ = ctrl.unsubscribe_raw();
                    }
                    return Err(e);
                }
            },
        };

        let waited = request.wait_until(self.biginfo_timeout, |c| c.big_info.is_some());
        drop(request);

        let collected = waited.collected;
        shared.with_registry(|reg| {
            if let Ok(b) = reg.by_index_mut(index) {
                if let Some(info) = collected.big_info {
                    b.set_big_info(info);
                }
                if let Some(t) = collected.timing {
                    b.sub_interval = t.sub_interval;
                    b.bis_spacing = t.bis_spacing;
                }
            }
        });

        if subscribed {
            if let Err(e) = ctrl.unsubscribe_raw() {
                warn!("BIGInfo | raw capture unsubscribe failed: {}", e.code());
            }
        }

        if retained.is_none() {
            if let Err(e) = ctrl.delete_sync(sync) {
                warn!("BIGInfo | PA sync delete failed: {}", e.code());
            }
            shared.with_registry(|reg| {
                if let Ok(b) = reg.by_index_mut(index) {
                    b.sync = None;
                }
            });
        }

        let timing = collected.timing.is_some();
        if waited.completed {
            Ok(Acquisition::Complete { timing })
        } else {
            warn!(
                "BIGInfo | none within {} ms for broadcast {index}",
                self.biginfo_timeout.as_millis()
            );
            Ok(Acquisition::TimedOut { timing })
        }
    }

    /// Create a periodic sync and wait until the stack confirms it, or a
    /// BIGInfo for the address shows it is already flowing.
    ///
    /// Expiry is not an error; the handle is returned either way and the
    /// caller decides whether to continue.
    pub fn await_sync(
        &self,
        shared: &SharedState,
        port: &mut impl PeriodicSyncPort,
        index: usize,
    ) -> Result<PendingSync> {
        let address = shared.with_registry(|reg| reg.by_index(index).map(|b| b.address))?;
        let request = shared.pending.register(address, false)?;
        let handle = self.create_sync(shared, port, index)?;

        let waited = request.wait_until(self.sync_pending_timeout, |c| {
            c.synced || c.big_info.is_some()
        });
        if !waited.completed {
            warn!(
                "PA SYNC | not confirmed within {} ms, continuing",
                self.sync_pending_timeout.as_millis()
            );
        }
        Ok(PendingSync {
            handle,
            established: waited.completed,
        })
    }
}
