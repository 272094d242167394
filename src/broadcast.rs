//! Broadcast data model.
//!
//! A [`Broadcast`] is one discovered Auracast broadcaster: its link-layer
//! address, broadcast ID and name from the extended advertisement, the
//! scan snapshot needed to create a periodic sync, and the BIGInfo
//! decoded once that sync is up.

use core::fmt;

use crate::app::ports::SyncHandle;

/// Upper bound on a stored broadcaster name, in bytes.
pub const MAX_NAME_LEN: usize = 128;

/// A fixed-capacity broadcaster name.
pub type BroadcastName = heapless::String<MAX_NAME_LEN>;

// ───────────────────────────────────────────────────────────────
// Address
// ───────────────────────────────────────────────────────────────

/// Link-layer address type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Public,
    Random,
    PublicIdentity,
    RandomIdentity,
}

/// LE device address. `bytes` is little-endian as on the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub kind: AddressKind,
    pub bytes: [u8; 6],
}

impl Address {
    pub const fn new(kind: AddressKind, bytes: [u8; 6]) -> Self {
        Self { kind, bytes }
    }

    /// Random address written most-significant byte first, e.g. `[0xC0, .., 0x01]`
    /// for `C0:..:01`.
    pub fn random_msb(msb_first: [u8; 6]) -> Self {
        let mut bytes = msb_first;
        bytes.reverse();
        Self::new(AddressKind::Random, bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        let kind = match self.kind {
            AddressKind::Public => "public",
            AddressKind::Random => "random",
            AddressKind::PublicIdentity => "public-id",
            AddressKind::RandomIdentity => "random-id",
        };
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X} ({kind})",
            b[5], b[4], b[3], b[2], b[1], b[0]
        )
    }
}

// ───────────────────────────────────────────────────────────────
// Broadcast ID
// ───────────────────────────────────────────────────────────────

/// 24-bit Broadcast_ID from the Broadcast Audio Announcement service data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BroadcastId(u32);

impl BroadcastId {
    pub const MAX: u32 = 0x00FF_FFFF;

    /// Build from a raw value; bits above 24 are dropped.
    pub const fn new(raw: u32) -> Self {
        Self(raw & Self::MAX)
    }

    /// Decode the little-endian 24-bit field.
    pub fn from_le_bytes(b: [u8; 3]) -> Self {
        Self(u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BroadcastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06X}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// PHY
// ───────────────────────────────────────────────────────────────

/// LE PHY as reported by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phy {
    /// No packets received on any PHY yet.
    #[default]
    None,
    Le1M,
    Le2M,
    Coded,
    Unknown(u8),
}

impl Phy {
    /// Map the stack's PHY bit value.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            0x01 => Self::Le1M,
            0x02 => Self::Le2M,
            0x04 => Self::Coded,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for Phy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "No packets",
            Self::Le1M => "LE 1M",
            Self::Le2M => "LE 2M",
            Self::Coded => "LE Coded",
            Self::Unknown(_) => "Unknown",
        })
    }
}

// ───────────────────────────────────────────────────────────────
// BIGInfo
// ───────────────────────────────────────────────────────────────

/// BIG parameters decoded from the periodic advertising ACAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BigInfo {
    pub sid: u8,
    pub num_bis: u8,
    /// NSE
    pub sub_evt_count: u8,
    /// 1.25 ms units
    pub iso_interval: u16,
    /// BN
    pub burst_number: u8,
    /// PTO
    pub offset: u8,
    /// IRC
    pub rep_count: u8,
    pub max_pdu: u16,
    /// Microseconds
    pub sdu_interval: u32,
    pub max_sdu: u16,
    pub phy: Phy,
    pub framing: bool,
    pub encryption: bool,
}

impl BigInfo {
    /// ISO interval in whole milliseconds.
    pub fn iso_interval_ms(&self) -> u32 {
        u32::from(self.iso_interval) * 5 / 4
    }
}

// ───────────────────────────────────────────────────────────────
// Scan snapshot
// ───────────────────────────────────────────────────────────────

/// The parts of the last advertising report needed to create a PA sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanInfo {
    /// Periodic advertising interval (1.25 ms units); 0 when not periodic.
    pub interval: u16,
    pub sid: u8,
    pub phy: Phy,
}

// ───────────────────────────────────────────────────────────────
// Broadcast
// ───────────────────────────────────────────────────────────────

/// One tracked broadcaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub found: bool,
    pub id: BroadcastId,
    pub address: Address,
    pub name: BroadcastName,
    /// Latches to `true`; only a registry reset clears it.
    pub has_big_info: bool,
    pub big_info: BigInfo,
    pub sync: Option<SyncHandle>,
    pub last_scan: ScanInfo,
    /// Subevent interval from the raw BIGInfo PDU (microseconds).
    pub sub_interval: u32,
    /// BIS spacing from the raw BIGInfo PDU (microseconds).
    pub bis_spacing: u32,
}

impl Broadcast {
    pub fn new(address: Address) -> Self {
        Self {
            found: false,
            id: BroadcastId::default(),
            address,
            name: BroadcastName::new(),
            has_big_info: false,
            big_info: BigInfo::default(),
            sync: None,
            last_scan: ScanInfo::default(),
            sub_interval: 0,
            bis_spacing: 0,
        }
    }

    /// Whether BIS subevents are interleaved rather than sequential.
    ///
    /// Zero values mean the raw timing was never captured, which is
    /// classified as sequential.
    pub fn is_interleaved(&self) -> bool {
        self.sub_interval > 0 && self.bis_spacing > 0 && self.bis_spacing < self.sub_interval
    }

    /// Store a BIGInfo and latch `has_big_info`.
    pub fn set_big_info(&mut self, info: BigInfo) {
        self.big_info = info;
        self.has_big_info = true;
    }

    /// Replace the name, truncating to [`MAX_NAME_LEN`] bytes.
    ///
    /// Invalid UTF-8 sequences become U+FFFD while they fit. A character
    /// split by the cut is dropped.
    pub fn set_name(&mut self, raw: &[u8]) {
        self.name.clear();
        let cut = raw.len() > MAX_NAME_LEN;
        let bounded = &raw[..raw.len().min(MAX_NAME_LEN)];
        let mut chunks = bounded.utf8_chunks().peekable();
        while let Some(chunk) = chunks.next() {
            if self.name.push_str(chunk.valid()).is_err() {
                break;
            }
            let split_by_cut = cut && chunks.peek().is_none();
            if !chunk.invalid().is_empty()
                && !split_by_cut
                && self.name.push(char::REPLACEMENT_CHARACTER).is_err()
            {
                break;
            }
        }
    }
}
