//! Port traits: the hexagonal boundary between the toolkit core and the
//! Bluetooth stack.
//!
//! ```text
//!   Stack adapter ──▶ Port trait ◀── Toolkit (domain)
//!   Stack callbacks ──▶ StackEvents::dispatch ──▶ shared state
//! ```
//!
//! Driven adapters implement these traits. The [`Toolkit`](super::service::Toolkit)
//! consumes them via generics, so the domain core never touches the
//! controller directly. Asynchronous completions do not come back through
//! these traits; the stack reports them as [`StackEvent`](super::events::StackEvent)s.
//!
//! ## Vendor commands
//!
//! [`VendorCommandPort`] sends raw HCI commands to firmware that understands
//! the two non-standard opcodes below. They are protocol constants of that
//! firmware and must not change.

use heapless::Vec;

use crate::broadcast::Address;
use crate::config::MAX_BIS;
use crate::error::{ProtocolError, ProtocolOp};

/// Disable encryption and MIC enforcement for BIG reception.
pub const OPCODE_DISABLE_ENCRYPTION: u16 = 0x0666;

/// Transmit garbage BIS PDUs into a synchronized BIG.
pub const OPCODE_GARBAGE_BIS_PDU: u16 = 0x0667;

/// Length of a BIG broadcast code.
pub const BROADCAST_CODE_LEN: usize = 16;

/// `MSE` value accepting any number of subevents.
pub const MSE_ANY: u8 = 0;

// ───────────────────────────────────────────────────────────────
// Handles and errors
// ───────────────────────────────────────────────────────────────

/// Periodic advertising sync handle issued by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncHandle(pub u16);

/// BIG handle issued by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BigHandle(pub u8);

/// Error reported by a stack operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// The operation is already in progress (`-EALREADY`).
    AlreadyRunning,
    /// Any other failure, carrying the stack's (negative) error code.
    Code(i32),
}

impl StackError {
    /// Errno value of `EALREADY`.
    pub const EALREADY: i32 = 120;

    pub const fn code(self) -> i32 {
        match self {
            Self::AlreadyRunning => -Self::EALREADY,
            Self::Code(c) => c,
        }
    }

    /// Tag with the failing operation.
    pub const fn during(self, op: ProtocolOp) -> ProtocolError {
        ProtocolError::new(op, self.code())
    }
}

// ───────────────────────────────────────────────────────────────
// Parameters
// ───────────────────────────────────────────────────────────────

/// Periodic advertising sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaSyncParams {
    pub address: Address,
    pub sid: u8,
    pub skip: u16,
    /// Sync timeout (10 ms units).
    pub timeout: u16,
}

/// BIG sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigSyncParams {
    /// BIS indices to receive, one reception channel each.
    pub channels: Vec<u8, MAX_BIS>,
    /// Bit `n` selects BIS `n + 1`.
    pub bis_bitfield: u32,
    /// Maximum subevents per BIS event, [`MSE_ANY`] for no limit.
    pub mse: u8,
    /// BIG sync timeout (10 ms units).
    pub sync_timeout: u16,
    pub encryption: bool,
    /// Present when decryption and MIC checks should use a real code.
    pub broadcast_code: Option<[u8; BROADCAST_CODE_LEN]>,
}

// ───────────────────────────────────────────────────────────────
// Radio port
// ───────────────────────────────────────────────────────────────

/// Brings the host stack up.
pub trait RadioPort {
    fn enable(&mut self) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// Scan port
// ───────────────────────────────────────────────────────────────

/// Toggles advertising report delivery.
pub trait ScanPort {
    /// Start active scanning. [`StackError::AlreadyRunning`] is informational.
    fn start_scan(&mut self) -> Result<(), StackError>;

    fn stop_scan(&mut self) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// Periodic sync port
// ───────────────────────────────────────────────────────────────

/// Periodic advertising sync lifecycle.
pub trait PeriodicSyncPort {
    /// Start synchronizing. The handle is issued immediately; establishment
    /// is reported later through `StackEvent::PaSynced`.
    fn create_sync(&mut self, params: &PaSyncParams) -> Result<SyncHandle, StackError>;

    fn delete_sync(&mut self, sync: SyncHandle) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// BIG sync port
// ───────────────────────────────────────────────────────────────

/// Broadcast Isochronous Group synchronization.
pub trait BigSyncPort {
    fn big_sync(&mut self, sync: SyncHandle, params: &BigSyncParams)
    -> Result<BigHandle, StackError>;

    fn big_terminate(&mut self, big: BigHandle) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// Raw capture port
// ───────────────────────────────────────────────────────────────

/// Raw ISO PDU forwarding from the controller.
///
/// While subscribed, the stack reports `StackEvent::IsoPdu` and
/// `StackEvent::RawBigInfo` events.
pub trait RawCapturePort {
    fn subscribe_raw(&mut self) -> Result<(), StackError>;

    fn unsubscribe_raw(&mut self) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// Vendor command port
// ───────────────────────────────────────────────────────────────

/// Send-and-wait for a parameterless HCI command.
pub trait VendorCommandPort {
    fn send_command(&mut self, opcode: u16) -> Result<(), StackError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Combined controller
// ───────────────────────────────────────────────────────────────

/// Everything the toolkit needs from the stack.
pub trait Controller:
    RadioPort + ScanPort + PeriodicSyncPort + BigSyncPort + RawCapturePort + VendorCommandPort
{
}

impl<T> Controller for T where
    T: RadioPort + ScanPort + PeriodicSyncPort + BigSyncPort + RawCapturePort + VendorCommandPort
{
}
