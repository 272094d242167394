//! Unified error types for the toolkit.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! command layer's error handling uniform. All variants are `Copy` so they
//! can be passed out of callback context and through the attack engine
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the toolkit funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Bad or missing index/argument. No state was changed.
    Validation(&'static str),
    /// The broadcast registry is full; the discovery was dropped.
    Capacity,
    /// Unknown index, address or broadcast ID.
    NotFound(Lookup),
    /// The broadcast has no BIGInfo yet; run `scan biginfo` first.
    NotReady,
    /// A bounded wait expired. Non-fatal; the caller may retry.
    Timeout,
    /// The Bluetooth stack rejected an operation.
    Protocol(ProtocolError),
    /// A mode that is deliberately not implemented.
    Unimplemented(&'static str),
    /// The Bluetooth stack has not been enabled; run `init` first.
    Uninitialized,
    /// A session is already active; stop it first.
    Busy,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "invalid argument: {msg}"),
            Self::Capacity => write!(f, "broadcast registry is full"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::NotReady => write!(
                f,
                "broadcast does not have BIGInfo yet, run `scan biginfo` first"
            ),
            Self::Timeout => write!(f, "timed out waiting for the stack"),
            Self::Protocol(e) => write!(f, "{e}"),
            Self::Unimplemented(what) => write!(f, "not implemented: {what}"),
            Self::Uninitialized => write!(f, "Bluetooth is not initialized yet, run `init` first"),
            Self::Busy => write!(f, "a broadcast session is already active, stop it first"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup failures
// ---------------------------------------------------------------------------

/// What kind of key failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Index(usize),
    Id(u32),
    Address,
    ActiveSession,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "broadcast index {i}"),
            Self::Id(id) => write!(f, "broadcast ID 0x{id:06X}"),
            Self::Address => write!(f, "broadcaster address"),
            Self::ActiveSession => write!(f, "active broadcast session"),
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Which stack operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolOp {
    Enable,
    ScanStart,
    ScanStop,
    PaSyncCreate,
    PaSyncDelete,
    BigSync,
    BigTerminate,
    RawCapture,
    VendorCommand(u16),
}

impl fmt::Display for ProtocolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enable => write!(f, "Bluetooth enable"),
            Self::ScanStart => write!(f, "scan start"),
            Self::ScanStop => write!(f, "scan stop"),
            Self::PaSyncCreate => write!(f, "periodic advertising sync create"),
            Self::PaSyncDelete => write!(f, "periodic advertising sync delete"),
            Self::BigSync => write!(f, "BIG sync"),
            Self::BigTerminate => write!(f, "BIG terminate"),
            Self::RawCapture => write!(f, "raw ISO capture subscription"),
            Self::VendorCommand(opcode) => write!(f, "HCI command 0x{opcode:04X}"),
        }
    }
}

/// A stack failure tagged with the operation and the stack's error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolError {
    pub op: ProtocolOp,
    pub code: i32,
}

impl ProtocolError {
    pub const fn new(op: ProtocolOp, code: i32) -> Self {
        Self { op, code }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.op, self.code)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Toolkit-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
