//! The single active attack session.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::ports::{BigHandle, SyncHandle};
use crate::broadcast::{Address, BroadcastId};

use super::state::AttackMode;

/// Owned record of the broadcast under attack and the stack handles
/// that keep it synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    pub mode: AttackMode,
    pub index: usize,
    pub id: BroadcastId,
    pub address: Address,
    pub sync: SyncHandle,
    pub big: BigHandle,
}

/// Callback-side view of the session handles.
///
/// The stack reports terminations asynchronously. The watch latches a
/// flag when one of them hits the active session so the engine can
/// drop the session on its next command.
pub struct SessionWatch {
    handles: Mutex<CriticalSectionRawMutex, Cell<Option<(SyncHandle, BigHandle)>>>,
    lost: AtomicBool,
}

impl SessionWatch {
    pub const fn new() -> Self {
        Self {
            handles: Mutex::new(Cell::new(None)),
            lost: AtomicBool::new(false),
        }
    }

    pub fn arm(&self, sync: SyncHandle, big: BigHandle) {
        self.lost.store(false, Ordering::Release);
        self.handles.lock(|h| h.set(Some((sync, big))));
    }

    pub fn disarm(&self) {
        self.handles.lock(|h| h.set(None));
        self.lost.store(false, Ordering::Release);
    }

    /// Whether a session currently holds stack handles.
    pub fn is_armed(&self) -> bool {
        self.handles.lock(|h| h.get().is_some())
    }

    /// Returns `true` if `sync` belongs to the active session.
    pub fn on_pa_terminated(&self, sync: SyncHandle) -> bool {
        self.mark_if(|(s, _)| s == sync)
    }

    /// Returns `true` if `big` belongs to the active session.
    pub fn on_big_terminated(&self, big: BigHandle) -> bool {
        self.mark_if(|(_, b)| b == big)
    }

    fn mark_if(&self, hit: impl Fn((SyncHandle, BigHandle)) -> bool) -> bool {
        let matched = self.handles.lock(|h| h.get().is_some_and(hit));
        if matched {
            self.lost.store(true, Ordering::Release);
        }
        matched
    }

    /// Consume the termination flag.
    pub fn take_lost(&self) -> bool {
        self.lost.swap(false, Ordering::AcqRel)
    }
}

impl Default for SessionWatch {
    fn default() -> Self {
        Self::new()
    }
}
