//! Toolkit configuration parameters
//!
//! All tunable parameters for discovery, BIGInfo acquisition and attack
//! sessions. Defaults mirror the constants the firmware shipped with.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hard ceiling on concurrently tracked broadcasts.
pub const MAX_BROADCASTS: usize = 10;

/// Highest BIS index a BIG can carry.
pub const MAX_BIS: usize = 31;

/// Core toolkit configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    // --- Registry ---
    /// Number of broadcasts tracked at once (1..=MAX_BROADCASTS)
    pub max_broadcasts: usize,

    // --- Periodic sync ---
    /// Bounded wait for BIGInfo after creating a periodic sync (milliseconds)
    pub biginfo_timeout_ms: u32,
    /// Bounded wait for a periodic sync before attempting BIG sync (milliseconds)
    pub sync_pending_timeout_ms: u32,
    /// Periodic events the PA sync timeout must survive
    pub pa_timeout_ratio: u32,

    // --- BIG sync ---
    /// BIG sync establishment timeout (10 ms units)
    pub big_sync_timeout: u16,
    /// Upper bound on BIS channels requested in one BIG sync (1..=MAX_BIS)
    pub max_bis: u8,

    // --- Output ---
    /// Emit every Nth captured ISO PDU during a dump
    pub dump_print_interval: u64,
    /// Log stack callback chatter
    pub debug: bool,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            max_broadcasts: MAX_BROADCASTS,

            biginfo_timeout_ms: 2000,
            sync_pending_timeout_ms: 2000,
            pa_timeout_ratio: 5,

            big_sync_timeout: 100, // 1 s
            max_bis: MAX_BIS as u8,

            dump_print_interval: 1,
            debug: false,
        }
    }
}

impl ToolkitConfig {
    /// Reject out-of-range values. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_broadcasts == 0 || self.max_broadcasts > MAX_BROADCASTS {
            return Err(Error::Validation("max_broadcasts must be 1..=10"));
        }
        if self.biginfo_timeout_ms == 0 || self.sync_pending_timeout_ms == 0 {
            return Err(Error::Validation("wait timeouts must be non-zero"));
        }
        if self.pa_timeout_ratio == 0 {
            return Err(Error::Validation("pa_timeout_ratio must be non-zero"));
        }
        // HCI LE BIG Create Sync accepts 0x000A..=0x4000.
        if !(0x000A..=0x4000).contains(&self.big_sync_timeout) {
            return Err(Error::Validation("big_sync_timeout must be 10..=16384"));
        }
        if self.max_bis == 0 || usize::from(self.max_bis) > MAX_BIS {
            return Err(Error::Validation("max_bis must be 1..=31"));
        }
        if self.dump_print_interval == 0 {
            return Err(Error::Validation("dump_print_interval must be non-zero"));
        }
        Ok(())
    }

    /// Parse a JSON document and validate it. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Validation("malformed config JSON"))?;
        config.validate()?;
        Ok(config)
    }
}
