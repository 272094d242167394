//! Inbound stack events and outbound application events.
//!
//! [`StackEvent`]s arrive from the Bluetooth stack's callback context and
//! are fed to [`StackEvents::dispatch`](super::service::StackEvents::dispatch).
//! The core emits [`AppEvent`]s through the [`EventSink`](super::ports::EventSink)
//! port; adapters on the other side decide what to do with them.

use heapless::Vec;

use crate::attack::state::AttackMode;
use crate::broadcast::{Address, BigInfo, BroadcastId, Phy};

use super::ports::{BigHandle, SyncHandle};

/// Captured PDUs are truncated to this many bytes before emission.
pub const MAX_CAPTURE_LEN: usize = 256;

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

/// One extended advertising report.
#[derive(Debug, Clone, Copy)]
pub struct AdvertisingReport<'a> {
    pub address: Address,
    /// Periodic advertising interval (1.25 ms units); 0 when none.
    pub interval: u16,
    pub sid: u8,
    pub phy: Phy,
    pub rssi: i8,
    /// Raw AD structures.
    pub data: &'a [u8],
}

/// Asynchronous notifications from the stack.
#[derive(Debug, Clone, Copy)]
pub enum StackEvent<'a> {
    AdvertisingReport(AdvertisingReport<'a>),
    PaSynced {
        sync: SyncHandle,
        address: Address,
        interval: u16,
        phy: Phy,
    },
    PaTerminated {
        sync: SyncHandle,
        address: Address,
    },
    PaData {
        sync: SyncHandle,
        address: Address,
        rssi: i8,
        data: &'a [u8],
    },
    BigInfo {
        sync: SyncHandle,
        address: Address,
        info: BigInfo,
    },
    BigTerminated {
        big: BigHandle,
        reason: u8,
    },
    /// Raw ISO data PDU while subscribed to raw capture.
    IsoPdu { seq: u64, payload: &'a [u8] },
    /// Raw BIGInfo PDU (ACAD body) while subscribed to raw capture.
    RawBigInfo { pdu: &'a [u8] },
}

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

/// Structured events emitted by the toolkit core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A broadcaster was seen for the first time.
    BroadcastDiscovered {
        index: usize,
        id: BroadcastId,
        address: Address,
        sid: u8,
    },
    /// The registry is full and a new broadcaster was dropped.
    RegistryFull { address: Address },
    /// BIGInfo (and possibly raw timing) was stored for a broadcast.
    BigInfoAcquired { index: usize, id: BroadcastId },
    /// No BIGInfo arrived within the bound.
    BigInfoTimeout { index: usize, id: BroadcastId },
    /// An attack session reached the active state.
    SessionStarted {
        mode: AttackMode,
        index: usize,
        id: BroadcastId,
    },
    /// The active session ended (stop, reset or external termination).
    SessionStopped { id: BroadcastId },
    /// A raw ISO data PDU during a dump.
    PduCaptured {
        seq: u64,
        len: usize,
        payload: Vec<u8, MAX_CAPTURE_LEN>,
    },
    /// A raw BIGInfo PDU during a dump.
    BigInfoPdu {
        len: usize,
        payload: Vec<u8, MAX_CAPTURE_LEN>,
    },
}

/// Copy up to [`MAX_CAPTURE_LEN`] bytes for emission.
pub(crate) fn capture_copy(bytes: &[u8]) -> Vec<u8, MAX_CAPTURE_LEN> {
    let n = bytes.len().min(MAX_CAPTURE_LEN);
    // Cannot fail: `n` is bounded by the capacity.
    Vec::from_slice(&bytes[..n]).unwrap_or_default()
}
