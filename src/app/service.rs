//! Toolkit service, the hexagonal core.
//!
//! [`Toolkit`] owns the attack engine and the command-side half of the
//! shared state. [`StackEvents`] is the callback-side half, handed to
//! whatever drives the Bluetooth stack. All I/O flows through port traits
//! injected at call sites, making the whole service testable with mock
//! adapters.
//!
//! ```text
//!  AppCommand ──▶ ┌─────────────────────────┐ ──▶ Controller ports
//!                 │        Toolkit           │
//!                 │ Scan · Sync · Attack     │ ──▶ EventSink
//!                 └───────────┬─────────────┘
//!                             │ Arc<SharedState>
//!  StackEvent ──▶ ┌───────────┴─────────────┐ ──▶ EventSink
//!                 │      StackEvents         │
//!                 └─────────────────────────┘
//! ```

use std::sync::Arc;

use heapless::Vec;
use log::{debug, info, warn};

use crate::attack::{ActiveSession, AttackEngine, AttackState, StopOutcome};
use crate::broadcast::Broadcast;
use crate::config::{MAX_BROADCASTS, ToolkitConfig};
use crate::error::{Error, ProtocolOp, Result};
use crate::scan::ScanStart;
use crate::shared::SharedState;
use crate::sync::{Acquisition, SyncOrchestrator};

use super::commands::AppCommand;
use super::events::{AppEvent, StackEvent};
use super::ports::{Controller, EventSink};

/// Prompt shown while no session is active.
pub const IDLE_PROMPT: &str = "auracast:~$ ";

// ───────────────────────────────────────────────────────────────
// Results
// ───────────────────────────────────────────────────────────────

/// One registry slot as seen by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub index: usize,
    pub broadcast: Broadcast,
}

impl BroadcastSummary {
    pub fn interleaved(&self) -> bool {
        self.broadcast.is_interleaved()
    }
}

/// BIGInfo acquisition result per broadcast.
pub type BigInfoReport = Vec<(usize, Acquisition), MAX_BROADCASTS>;

/// What a successfully handled command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Initialized,
    /// `stopped` is the session that was torn down first, if any.
    Reset { stopped: Option<ActiveSession> },
    Debug(bool),
    ScanStarted(ScanStart),
    ScanStopped,
    Listing(Vec<BroadcastSummary, MAX_BROADCASTS>),
    BigInfo(BigInfoReport),
    SessionStarted(ActiveSession),
    Stopped(StopOutcome),
    Hijack,
}

// ───────────────────────────────────────────────────────────────
// Toolkit
// ───────────────────────────────────────────────────────────────

/// The toolkit service orchestrates all domain logic.
pub struct Toolkit {
    shared: Arc<SharedState>,
    sync: SyncOrchestrator,
    engine: AttackEngine,
    initialized: bool,
}

impl Toolkit {
    /// Construct the service from a validated configuration.
    pub fn new(config: ToolkitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(SharedState::new(&config)),
            sync: SyncOrchestrator::new(&config),
            engine: AttackEngine::new(&config),
            initialized: false,
        })
    }

    /// Callback-side handle. Clone it into the stack's event context.
    pub fn events(&self) -> StackEvents {
        StackEvents {
            shared: Arc::clone(&self.shared),
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one command to completion.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        ctrl: &mut impl Controller,
        sink: &mut impl EventSink,
    ) -> Result<Outcome> {
        if let Some(lost) = self.engine.observe_external_termination(&self.shared, ctrl) {
            sink.emit(&AppEvent::SessionStopped { id: lost.id });
        }

        match cmd {
            AppCommand::Init => {
                if self.initialized {
                    return Err(Error::Validation("already initialized"));
                }
                ctrl.enable()
                    .map_err(|e| Error::Protocol(e.during(ProtocolOp::Enable)))?;
                self.initialized = true;
                info!("Bluetooth initialized");
                Ok(Outcome::Initialized)
            }
            AppCommand::Reset => {
                let stopped = self.stop_session(ctrl, sink);
                self.shared.with_registry(|reg| reg.reset_all());
                info!("Application reset");
                Ok(Outcome::Reset { stopped })
            }
            AppCommand::Debug(Some(on)) => {
                self.shared.set_debug(on);
                info!("Debug {}", if on { "enabled" } else { "disabled" });
                Ok(Outcome::Debug(on))
            }
            AppCommand::Debug(None) => Ok(Outcome::Debug(self.shared.debug())),
            AppCommand::ScanOn => {
                self.require_init()?;
                self.shared.scan.start(ctrl).map(Outcome::ScanStarted)
            }
            AppCommand::ScanOff => {
                self.shared.scan.stop(ctrl)?;
                Ok(Outcome::ScanStopped)
            }
            AppCommand::ScanList | AppCommand::BroadcastList => Ok(Outcome::Listing(self.broadcasts())),
            AppCommand::ScanBigInfo(target) => {
                self.require_init()?;
                self.acquire_big_info(target, ctrl, sink).map(Outcome::BigInfo)
            }
            AppCommand::Dump { index, code } => {
                self.require_init()?;
                let session =
                    self.engine
                        .dump(&self.shared, &self.sync, ctrl, index, code.as_deref())?;
                Ok(self.started(session, sink))
            }
            AppCommand::Bisquit(index) => {
                self.require_init()?;
                let session = self.engine.bisquit(&self.shared, &self.sync, ctrl, index)?;
                Ok(self.started(session, sink))
            }
            AppCommand::DumpStop | AppCommand::BisquitStop => {
                let outcome = self.engine.stop(&self.shared, ctrl);
                if let StopOutcome::Stopped { session, .. } = &outcome {
                    sink.emit(&AppEvent::SessionStopped { id: session.id });
                }
                Ok(Outcome::Stopped(outcome))
            }
            AppCommand::Hijack => {
                self.engine.hijack()?;
                Ok(Outcome::Hijack)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of every occupied registry slot.
    pub fn broadcasts(&self) -> Vec<BroadcastSummary, MAX_BROADCASTS> {
        self.shared
            .registry_snapshot()
            .iter()
            .enumerate()
            .map(|(index, b)| BroadcastSummary {
                index,
                broadcast: b.clone(),
            })
            .collect()
    }

    pub fn attack_state(&self) -> AttackState {
        self.engine.state()
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.engine.session()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn debug(&self) -> bool {
        self.shared.debug()
    }

    /// Shell prompt reflecting the active session.
    pub fn prompt(&self) -> String {
        match self.engine.session() {
            Some(s) => format!("broadcast [ID=0x{:x}]:~$ ", s.id.get()),
            None => String::from(IDLE_PROMPT),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn require_init(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::Uninitialized)
        }
    }

    fn started(&self, session: ActiveSession, sink: &mut impl EventSink) -> Outcome {
        sink.emit(&AppEvent::SessionStarted {
            mode: session.mode,
            index: session.index,
            id: session.id,
        });
        Outcome::SessionStarted(session)
    }

    fn stop_session(
        &mut self,
        ctrl: &mut impl Controller,
        sink: &mut impl EventSink,
    ) -> Option<ActiveSession> {
        match self.engine.stop(&self.shared, ctrl) {
            StopOutcome::NothingToStop => None,
            StopOutcome::Stopped { session, report } => {
                if !report.is_clean() {
                    warn!("Reset: {} teardown step(s) failed", report.failures.len());
                }
                sink.emit(&AppEvent::SessionStopped { id: session.id });
                Some(session)
            }
        }
    }

    /// BIGInfo for one index, or for every tracked broadcast.
    ///
    /// A timeout is not an error: it is recorded as
    /// [`Acquisition::TimedOut`] with a `BigInfoTimeout` event and the
    /// caller may retry.
    fn acquire_big_info(
        &mut self,
        target: Option<usize>,
        ctrl: &mut impl Controller,
        sink: &mut impl EventSink,
    ) -> Result<BigInfoReport> {
        let indices = match target {
            Some(index) => {
                self.shared.with_registry(|reg| reg.by_index(index).map(|_| ()))?;
                index..index + 1
            }
            None => 0..self.shared.with_registry(|reg| reg.len()),
        };

        let mut report = BigInfoReport::new();
        for index in indices {
            let retained = self
                .engine
                .session()
                .filter(|s| s.index == index)
                .map(|s| s.sync);
            let acquisition = self.sync.get_big_info(&self.shared, ctrl, index, retained)?;
            let id = self
                .shared
                .with_registry(|reg| reg.by_index(index).map(|b| b.id))?;

            match acquisition {
                Acquisition::Complete { .. } => sink.emit(&AppEvent::BigInfoAcquired { index, id }),
                Acquisition::TimedOut { .. } => sink.emit(&AppEvent::BigInfoTimeout { index, id }),
            }
            // Bounded by the registry's capacity.
            let _ = report.push((index, acquisition));
        }
        Ok(report)
    }
}

// ───────────────────────────────────────────────────────────────
// StackEvents
// ───────────────────────────────────────────────────────────────

/// Entry point for the stack's callback context.
///
/// Cheap to clone; every clone shares the toolkit's state. Dispatch never
/// blocks beyond the short critical sections guarding that state.
#[derive(Clone)]
pub struct StackEvents {
    shared: Arc<SharedState>,
}

impl StackEvents {
    /// Dispatcher over state shared with something other than a
    /// [`Toolkit`], such as a bare [`SyncOrchestrator`].
    pub fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    pub fn dispatch(&self, event: &StackEvent<'_>, sink: &mut impl EventSink) {
        let shared = &*self.shared;
        let chatty = shared.debug();

        match *event {
            StackEvent::AdvertisingReport(ref report) => {
                let result = shared.with_registry(|reg| shared.scan.on_report(reg, report));
                match result {
                    Ok(Some(d)) if d.created => sink.emit(&AppEvent::BroadcastDiscovered {
                        index: d.index,
                        id: d.id,
                        address: report.address,
                        sid: report.sid,
                    }),
                    Ok(_) => {}
                    Err(Error::Capacity) => sink.emit(&AppEvent::RegistryFull {
                        address: report.address,
                    }),
                    Err(e) => warn!("SCAN | report from {} dropped: {e}", report.address),
                }
            }
            StackEvent::PaSynced {
                sync,
                address,
                interval,
                phy,
            } => {
                if chatty {
                    debug!(
                        "PA SYNC | established {address} handle={} interval={} phy={phy}",
                        sync.0, interval
                    );
                }
                shared.pending.on_synced(&address);
            }
            StackEvent::PaTerminated { sync, address } => {
                if chatty {
                    debug!("PA SYNC | terminated {address} handle={}", sync.0);
                }
                shared.with_registry(|reg| {
                    if let Some(index) = reg.position(&address) {
                        if let Ok(b) = reg.by_index_mut(index) {
                            if b.sync == Some(sync) {
                                b.sync = None;
                            }
                        }
                    }
                });
                if shared.watch.on_pa_terminated(sync) {
                    warn!("PA SYNC | lost for the active session");
                }
            }
            StackEvent::PaData {
                sync,
                address,
                rssi,
                data,
            } => {
                if chatty {
                    debug!(
                        "PA DATA | {address} handle={} rssi={rssi} len={} {}",
                        sync.0,
                        data.len(),
                        hex::encode(data)
                    );
                }
            }
            StackEvent::BigInfo {
                sync,
                address,
                ref info,
            } => {
                if chatty {
                    debug!(
                        "BIGInfo | {address} handle={} sid={} bis={} nse={} iso={}ms bn={} pto={} irc={} \
                         pdu={} sdu_interval={}us sdu={} phy={} framing={} encryption={}",
                        sync.0,
                        info.sid,
                        info.num_bis,
                        info.sub_evt_count,
                        info.iso_interval_ms(),
                        info.burst_number,
                        info.offset,
                        info.rep_count,
                        info.max_pdu,
                        info.sdu_interval,
                        info.max_sdu,
                        info.phy,
                        info.framing,
                        info.encryption
                    );
                }
                shared.with_registry(|reg| reg.apply_big_info(&address, info));
                shared.pending.on_big_info(&address, info);
            }
            StackEvent::BigTerminated { big, reason } => {
                if chatty {
                    debug!("BIG | terminated handle={} reason=0x{reason:02X}", big.0);
                }
                if shared.watch.on_big_terminated(big) {
                    warn!("BIG | lost for the active session (reason 0x{reason:02X})");
                }
            }
            StackEvent::IsoPdu { seq, payload } => shared.capture.on_iso_pdu(seq, payload, sink),
            StackEvent::RawBigInfo { pdu } => {
                shared.capture.on_raw_big_info(pdu, &shared.pending, sink);
            }
        }
    }
}
