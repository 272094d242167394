//! Per-request correlation tokens.
//!
//! A [`SyncRequest`] collects everything the stack reports for one
//! outstanding periodic-sync attempt: establishment, the decoded BIGInfo
//! and the raw-PDU timing fields. Both event sources write into the
//! token and signal it; the waiting command combines the payloads once,
//! when the wait ends.
//!
//! ```text
//!   PaSynced / BigInfo ──(by address)──▶ ┌────────────┐
//!                                        │ SyncRequest │──▶ wait_until()
//!   RawBigInfo ──(oldest wanting)──────▶ └────────────┘
//! ```
//!
//! Raw BIGInfo PDUs carry no address. They go to the oldest registered
//! request that asked for timing and has none yet, which is only the
//! right one while a single periodic sync is on air. Callers leave
//! `wants_timing` off when another sync may be the source.

use std::sync::Arc;
use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::time::Instant;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use heapless::Vec;

use crate::broadcast::{Address, BigInfo};
use crate::config::MAX_BROADCASTS;
use crate::error::{Error, Result};

use super::pdu::RawTiming;

/// Payloads gathered so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collected {
    pub synced: bool,
    pub big_info: Option<BigInfo>,
    pub timing: Option<RawTiming>,
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitResult {
    pub collected: Collected,
    /// `false` when the bound expired first.
    pub completed: bool,
}

/// Correlation token for one outstanding sync attempt.
pub struct SyncRequest {
    address: Address,
    wants_timing: bool,
    collected: Mutex<CriticalSectionRawMutex, Cell<Collected>>,
    signal: Signal<CriticalSectionRawMutex, ()>,
}

impl SyncRequest {
    pub fn new(address: Address, wants_timing: bool) -> Self {
        Self {
            address,
            wants_timing,
            collected: Mutex::new(Cell::new(Collected::default())),
            signal: Signal::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn snapshot(&self) -> Collected {
        self.collected.lock(Cell::get)
    }

    fn update(&self, f: impl FnOnce(&mut Collected)) {
        self.collected.lock(|cell| {
            let mut c = cell.get();
            f(&mut c);
            cell.set(c);
        });
        self.signal.signal(());
    }

    pub fn on_synced(&self) {
        self.update(|c| c.synced = true);
    }

    pub fn on_big_info(&self, info: BigInfo) {
        self.update(|c| c.big_info = Some(info));
    }

    pub fn on_timing(&self, timing: RawTiming) {
        self.update(|c| c.timing = Some(timing));
    }

    fn awaiting_timing(&self) -> bool {
        self.wants_timing && self.snapshot().timing.is_none()
    }

    /// Block until `done` holds for the collected payloads or `timeout`
    /// elapses. Re-checks after every signal, so updates from either
    /// source can arrive in any order.
    pub fn wait_until(&self, timeout: Duration, done: impl Fn(&Collected) -> bool) -> WaitResult {
        let deadline = Instant::now() + timeout;
        loop {
            let collected = self.snapshot();
            if done(&collected) {
                return WaitResult {
                    collected,
                    completed: true,
                };
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return WaitResult {
                    collected,
                    completed: false,
                };
            }

            let signalled = future::block_on(future::or(
                async {
                    self.signal.wait().await;
                    true
                },
                async {
                    async_io_mini::Timer::after(remaining).await;
                    false
                },
            ));

            if !signalled {
                let collected = self.snapshot();
                return WaitResult {
                    completed: done(&collected),
                    collected,
                };
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Registry of outstanding requests
// ───────────────────────────────────────────────────────────────

/// Outstanding requests, oldest first.
pub struct PendingRequests {
    slots: Mutex<CriticalSectionRawMutex, RefCell<Vec<Arc<SyncRequest>, MAX_BROADCASTS>>>,
}

impl PendingRequests {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Register a new request. Deregistered when the guard drops.
    pub fn register(&self, address: Address, wants_timing: bool) -> Result<PendingGuard<'_>> {
        let request = Arc::new(SyncRequest::new(address, wants_timing));
        self.slots
            .lock(|slots| slots.borrow_mut().push(Arc::clone(&request)))
            .map_err(|_| Error::Busy)?;
        Ok(PendingGuard {
            pending: self,
            request,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.lock(|slots| slots.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, address: &Address) -> Vec<Arc<SyncRequest>, MAX_BROADCASTS> {
        self.slots.lock(|slots| {
            slots
                .borrow()
                .iter()
                .filter(|r| r.address == *address)
                .cloned()
                .collect()
        })
    }

    /// Route a periodic-sync establishment.
    pub fn on_synced(&self, address: &Address) {
        for request in self.matching(address) {
            request.on_synced();
        }
    }

    /// Route a decoded BIGInfo. Returns `true` if any request took it.
    pub fn on_big_info(&self, address: &Address, info: &BigInfo) -> bool {
        let requests = self.matching(address);
        for request in &requests {
            request.on_big_info(*info);
        }
        !requests.is_empty()
    }

    /// Route raw timing to the oldest request still waiting for it.
    pub fn on_timing(&self, timing: RawTiming) -> bool {
        let target = self.slots.lock(|slots| {
            slots
                .borrow()
                .iter()
                .find(|r| r.awaiting_timing())
                .cloned()
        });
        match target {
            Some(request) => {
                request.on_timing(timing);
                true
            }
            None => false,
        }
    }

    fn remove(&self, request: &Arc<SyncRequest>) {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            if let Some(pos) = slots.iter().position(|r| Arc::ptr_eq(r, request)) {
                slots.remove(pos);
            }
        });
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a request registered for its lifetime.
pub struct PendingGuard<'a> {
    pending: &'a PendingRequests,
    request: Arc<SyncRequest>,
}

impl core::ops::Deref for PendingGuard<'_> {
    type Target = SyncRequest;

    fn deref(&self) -> &SyncRequest {
        &self.request
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.request);
    }
}
