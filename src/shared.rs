//! State shared between command processing and the stack's callback
//! context.
//!
//! ```text
//! ┌───────────────┐  with_registry()  ┌──────────────────┐
//! │ Command side  │──────────────────▶│   SharedState    │
//! │ (Toolkit)     │                   │  registry  (lock)│
//! └───────────────┘                   │  pending   (lock)│
//! ┌───────────────┐  dispatch()       │  scan/capture/   │
//! │ Stack thread  │──────────────────▶│  watch (atomics) │
//! └───────────────┘                   └──────────────────┘
//! ```
//!
//! Every lock is a critical-section blocking mutex held only for the
//! duration of a closure. Port calls and sink emissions never happen
//! while a lock is held.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::attack::session::SessionWatch;
use crate::capture::CaptureRouter;
use crate::config::ToolkitConfig;
use crate::registry::BroadcastRegistry;
use crate::scan::ScanCoordinator;
use crate::sync::request::PendingRequests;

pub struct SharedState {
    registry: Mutex<CriticalSectionRawMutex, RefCell<BroadcastRegistry>>,
    pub(crate) pending: PendingRequests,
    pub(crate) scan: ScanCoordinator,
    pub(crate) capture: CaptureRouter,
    pub(crate) watch: SessionWatch,
    debug: AtomicBool,
}

impl SharedState {
    pub fn new(config: &ToolkitConfig) -> Self {
        Self {
            registry: Mutex::new(RefCell::new(BroadcastRegistry::with_limit(
                config.max_broadcasts,
            ))),
            pending: PendingRequests::new(),
            scan: ScanCoordinator::new(),
            capture: CaptureRouter::new(config.dump_print_interval),
            watch: SessionWatch::new(),
            debug: AtomicBool::new(config.debug),
        }
    }

    /// Run `f` with exclusive access to the registry.
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut BroadcastRegistry) -> R) -> R {
        self.registry.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Copy of the registry as it is right now.
    pub fn registry_snapshot(&self) -> BroadcastRegistry {
        self.registry.lock(|cell| cell.borrow().clone())
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, on: bool) {
        self.debug.store(on, Ordering::Relaxed);
    }
}
