//! Attack state machine.
//!
//! ```text
//!   IDLE ──▶ SYNC_PENDING ──▶ BIG_SYNCING ──▶ ACTIVE
//!    ▲            │                │             │
//!    └────────────┴────[error]─────┴──[stop]─────┘
//! ```
//!
//! Every state may fall back to `IDLE` (error, stop or external
//! termination). Forward moves go one step at a time.

use core::fmt;

/// Attack mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackMode {
    /// Passive capture of the BIS PDUs.
    Dump,
    /// Garbage BIS PDU injection.
    Bisquit,
    /// Reserved; a no-op.
    Hijack,
}

impl fmt::Display for AttackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dump => "dump",
            Self::Bisquit => "bisquit",
            Self::Hijack => "hijack",
        })
    }
}

/// States of one attack attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AttackState {
    #[default]
    Idle = 0,
    SyncPending = 1,
    BigSyncing = 2,
    Active = 3,
}

impl AttackState {
    pub const COUNT: usize = 4;

    const NAMES: [&'static str; Self::COUNT] = ["IDLE", "SYNC_PENDING", "BIG_SYNCING", "ACTIVE"];

    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Whether `self -> next` is a legal edge.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::SyncPending)
                | (Self::SyncPending, Self::BigSyncing)
                | (Self::BigSyncing, Self::Active)
                | (Self::SyncPending | Self::BigSyncing | Self::Active, Self::Idle)
        )
    }
}

impl fmt::Display for AttackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
