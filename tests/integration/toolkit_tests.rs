//! Integration tests for the Toolkit → ports pipeline.
//!
//! These run on the host and drive full command sequences against the
//! recording mock stack, with stack events injected through
//! `StackEvents::dispatch` the way a real controller would deliver them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use auracast_toolkit::app::events::{AppEvent, StackEvent};
use auracast_toolkit::app::ports::{BigHandle, StackError, SyncHandle};
use auracast_toolkit::app::shell::{EXIT_ERROR, EXIT_OK, run_line};
use auracast_toolkit::attack::{AttackMode, AttackState, StopOutcome};
use auracast_toolkit::error::{ProtocolError, ProtocolOp};
use auracast_toolkit::scan::record_report;
use auracast_toolkit::shared::SharedState;
use auracast_toolkit::sync::{Acquisition, SyncOrchestrator, sync_timeout};
use auracast_toolkit::{AppCommand, Error, Outcome, StackEvents, Toolkit, ToolkitConfig};

use crate::mock_stack::{
    INTERVAL, MockController, RecordingSink, Scripted, StackCall, ad_payload, address, big_info,
    raw_big_info_pdu, report,
};

// ── Rig ───────────────────────────────────────────────────────

struct Rig {
    toolkit: Toolkit,
    events: StackEvents,
    ctrl: MockController,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: ToolkitConfig) -> Self {
        let toolkit = Toolkit::new(config).unwrap();
        let events = toolkit.events();
        let ctrl = MockController::wired(events.clone());
        Self {
            toolkit,
            events,
            ctrl,
            sink: RecordingSink::new(),
        }
    }

    fn run(&mut self, words: &[&str]) -> auracast_toolkit::Result<Outcome> {
        let cmd = AppCommand::parse(words)?;
        self.toolkit.handle_command(cmd, &mut self.ctrl, &mut self.sink)
    }

    fn shell(&mut self, line: &str) -> (i32, String) {
        let mut out = String::new();
        let code = run_line(&mut self.toolkit, line, &mut self.ctrl, &mut self.sink, &mut out);
        (code, out)
    }

    /// `init` + `scan on`.
    fn ready(&mut self) {
        self.run(&["init"]).unwrap();
        self.run(&["scan", "on"]).unwrap();
    }

    fn discover(&mut self, n: u8, id: u32, name: &str) {
        let data = ad_payload(id, name);
        self.events.dispatch(
            &StackEvent::AdvertisingReport(report(address(n), &data)),
            &mut self.sink,
        );
    }

    /// Discover broadcast 0 and acquire BIGInfo for it.
    fn with_big_info(&mut self, num_bis: u8, encryption: bool) {
        self.ready();
        self.discover(1, 0x12_3456, "Gate 12");
        self.ctrl.script = vec![Scripted::BigInfo(big_info(num_bis, encryption))];
        self.run(&["scan", "biginfo", "0"]).unwrap();
        self.ctrl.script = vec![Scripted::PaSynced];
        self.ctrl.calls.clear();
        self.sink.events.clear();
    }
}

fn fast_config() -> ToolkitConfig {
    ToolkitConfig {
        biginfo_timeout_ms: 200,
        sync_pending_timeout_ms: 50,
        ..ToolkitConfig::default()
    }
}

// ── End-to-end scenario ───────────────────────────────────────

#[test]
fn discover_acquire_and_dump_encrypted_broadcast() {
    let mut rig = Rig::new(fast_config());
    rig.ready();
    rig.discover(1, 0x12_3456, "Gate 12");

    let list = rig.toolkit.broadcasts();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].broadcast.id.get(), 0x12_3456);
    assert_eq!(list[0].broadcast.name.as_str(), "Gate 12");
    assert_eq!(list[0].broadcast.last_scan.sid, 1);

    // BIGInfo acquisition: both sources fire.
    rig.ctrl.script = vec![
        Scripted::RawBigInfo(raw_big_info_pdu(8000, 4000)),
        Scripted::BigInfo(big_info(2, true)),
    ];
    let Outcome::BigInfo(report) = rig.run(&["scan", "biginfo", "0"]).unwrap() else {
        panic!("expected a BIGInfo report");
    };
    assert_eq!(
        report.as_slice(),
        &[(0, Acquisition::Complete { timing: true })]
    );

    let params = *rig.ctrl.create_sync_params().unwrap();
    assert_eq!(params.address, address(1));
    assert_eq!(params.sid, 1);
    assert_eq!(params.timeout, sync_timeout(INTERVAL, 5));
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::DeleteSync(_))), 1);
    assert_eq!(rig.ctrl.count(|c| *c == StackCall::SubscribeRaw), 1);
    assert_eq!(rig.ctrl.count(|c| *c == StackCall::UnsubscribeRaw), 1);

    let b = rig.toolkit.broadcasts()[0].broadcast.clone();
    assert!(b.has_big_info);
    assert_eq!(b.big_info.num_bis, 2);
    assert!(b.big_info.encryption);
    assert_eq!((b.sub_interval, b.bis_spacing), (8000, 4000));
    assert!(b.is_interleaved());

    // Dump without a code.
    rig.ctrl.calls.clear();
    rig.ctrl.script = vec![Scripted::PaSynced];
    let outcome = rig.run(&["broadcast", "dump", "0"]).unwrap();
    assert!(matches!(outcome, Outcome::SessionStarted(s) if s.mode == AttackMode::Dump));

    let vendor = rig
        .ctrl
        .position(|c| *c == StackCall::Vendor(0x0666))
        .expect("0x0666 sent");
    let big = rig
        .ctrl
        .position(|c| matches!(c, StackCall::BigSync(..)))
        .expect("BIG sync requested");
    assert!(vendor < big, "encryption must be disabled before BIG sync");
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::Vendor(_))), 1);

    let p = rig.ctrl.big_sync_params().unwrap();
    assert_eq!(p.channels.as_slice(), &[1, 2]);
    assert_eq!(p.bis_bitfield, 0b11);
    assert_eq!(p.sync_timeout, 100);
    assert!(p.encryption);
    assert_eq!(p.broadcast_code, None);

    assert_eq!(rig.toolkit.attack_state(), AttackState::Active);
    assert_eq!(rig.toolkit.prompt(), "broadcast [ID=0x123456]:~$ ");
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::SessionStarted { mode: AttackMode::Dump, .. })),
        1
    );
}

// ── Registry ──────────────────────────────────────────────────

#[test]
fn registry_caps_at_ten_and_drops_the_eleventh() {
    let mut rig = Rig::new(fast_config());
    rig.ready();
    for n in 0..11u8 {
        rig.discover(n, 0x1000 + u32::from(n), "Hall");
    }
    assert_eq!(rig.toolkit.broadcasts().len(), 10);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::BroadcastDiscovered { .. })),
        10
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::RegistryFull { .. })),
        1
    );
    // Known addresses still update when full.
    rig.discover(0, 0x1000, "Renamed");
    assert_eq!(rig.toolkit.broadcasts()[0].broadcast.name.as_str(), "Renamed");
}

#[test]
fn re_reporting_updates_in_place() {
    let mut rig = Rig::new(fast_config());
    rig.ready();
    rig.discover(3, 0xAB_CDEF, "Old");
    rig.discover(3, 0xAB_CDEF, "New");
    let list = rig.toolkit.broadcasts();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].broadcast.name.as_str(), "New");
}

#[test]
fn reports_while_scanning_is_off_are_ignored() {
    let mut rig = Rig::new(fast_config());
    rig.run(&["init"]).unwrap();
    rig.discover(1, 1, "Early");
    assert!(rig.toolkit.broadcasts().is_empty());

    rig.run(&["scan", "on"]).unwrap();
    rig.run(&["scan", "off"]).unwrap();
    rig.discover(1, 1, "Late");
    assert!(rig.toolkit.broadcasts().is_empty());
}

// ── BIGInfo acquisition ───────────────────────────────────────

#[test]
fn biginfo_wait_is_bounded_and_leaves_entry_untouched() {
    let mut rig = Rig::new(ToolkitConfig {
        biginfo_timeout_ms: 150,
        ..fast_config()
    });
    rig.ready();
    rig.discover(1, 0x42, "Quiet");

    let start = Instant::now();
    let outcome = rig.run(&["scan", "biginfo", "0"]).unwrap();
    let elapsed = start.elapsed();

    let Outcome::BigInfo(report) = outcome else {
        panic!("expected a BIGInfo report");
    };
    assert_eq!(
        report.as_slice(),
        &[(0, Acquisition::TimedOut { timing: false })]
    );
    assert!(elapsed >= Duration::from_millis(150), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    assert!(!rig.toolkit.broadcasts()[0].broadcast.has_big_info);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::BigInfoTimeout { .. })),
        1
    );
    // The sync created for the attempt is not leaked.
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::DeleteSync(_))), 1);
}

#[test]
fn biginfo_timeout_is_not_a_shell_failure() {
    let mut rig = Rig::new(ToolkitConfig {
        biginfo_timeout_ms: 50,
        ..fast_config()
    });
    rig.ready();
    rig.discover(1, 0x42, "Quiet");

    let (code, out) = rig.shell("scan biginfo 0");
    assert_eq!(code, EXIT_OK);
    assert_eq!(out, "[0] BIGInfo timed out, try again\n");
}

#[test]
fn biginfo_sweep_records_each_entry() {
    let mut rig = Rig::new(ToolkitConfig {
        biginfo_timeout_ms: 50,
        ..fast_config()
    });
    rig.ready();
    rig.discover(1, 1, "A");
    rig.discover(2, 2, "B");
    rig.ctrl.script = vec![Scripted::BigInfo(big_info(2, false))];

    let Outcome::BigInfo(report) = rig.run(&["scan", "biginfo"]).unwrap() else {
        panic!("expected a BIGInfo report");
    };
    assert_eq!(report.len(), 2);
    assert!(
        rig.toolkit
            .broadcasts()
            .iter()
            .all(|s| s.broadcast.has_big_info)
    );
}

#[test]
fn biginfo_for_unknown_index_is_not_found() {
    let mut rig = Rig::new(fast_config());
    rig.ready();
    rig.discover(1, 1, "Only");
    // Index equal to the count is outside the table.
    assert!(matches!(
        rig.run(&["scan", "biginfo", "1"]),
        Err(Error::NotFound(_))
    ));
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::CreateSync(_))), 0);
}

#[test]
fn concurrent_acquisitions_keep_their_own_payloads() {
    let config = ToolkitConfig::default();
    let shared = Arc::new(SharedState::new(&config));
    let events = StackEvents::new(Arc::clone(&shared));
    let (ad1, ad2) = (ad_payload(1, "One"), ad_payload(2, "Two"));
    shared.with_registry(|reg| {
        record_report(reg, &report(address(1), &ad1)).unwrap();
        record_report(reg, &report(address(2), &ad2)).unwrap();
    });
    let sync = SyncOrchestrator::new(&config);

    let mut a = MockController::wired(events.clone());
    a.delay = Some(Duration::from_millis(40));
    a.script = vec![Scripted::BigInfo(big_info(2, true))];
    let mut b = MockController::wired(events);
    b.delay = Some(Duration::from_millis(10));
    b.script = vec![Scripted::BigInfo(big_info(4, false))];

    std::thread::scope(|s| {
        let ha = s.spawn(|| sync.get_big_info(&shared, &mut a, 0, None));
        let hb = s.spawn(|| sync.get_big_info(&shared, &mut b, 1, None));
        assert_eq!(
            ha.join().unwrap(),
            Ok(Acquisition::Complete { timing: false })
        );
        assert_eq!(
            hb.join().unwrap(),
            Ok(Acquisition::Complete { timing: false })
        );
    });

    let registry = shared.registry_snapshot();
    assert_eq!(registry.by_index(0).unwrap().big_info.num_bis, 2);
    assert_eq!(registry.by_index(1).unwrap().big_info.num_bis, 4);
}

#[test]
fn biginfo_during_dump_keeps_the_capture_subscription() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();
    rig.ctrl.calls.clear();

    // The session's sync is reused, so the stack reports on it directly.
    let events = rig.events.clone();
    let feeder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        let mut sink = RecordingSink::new();
        events.dispatch(
            &StackEvent::RawBigInfo {
                pdu: &raw_big_info_pdu(6000, 2000),
            },
            &mut sink,
        );
        events.dispatch(
            &StackEvent::BigInfo {
                sync: SyncHandle(2),
                address: address(1),
                info: big_info(2, true),
            },
            &mut sink,
        );
    });
    let outcome = rig.run(&["scan", "biginfo", "0"]);
    feeder.join().unwrap();

    let Ok(Outcome::BigInfo(report)) = outcome else {
        panic!("expected a BIGInfo report, got {outcome:?}");
    };
    assert_eq!(
        report.as_slice(),
        &[(0, Acquisition::Complete { timing: true })]
    );
    assert!(rig.ctrl.calls.is_empty(), "{:?}", rig.ctrl.calls);
    assert_eq!(rig.toolkit.attack_state(), AttackState::Active);
    assert!(rig.toolkit.broadcasts()[0].broadcast.is_interleaved());

    rig.run(&["broadcast", "dump", "stop"]).unwrap();
    assert_eq!(rig.ctrl.count(|c| *c == StackCall::UnsubscribeRaw), 1);
}

#[test]
fn biginfo_for_another_broadcast_during_dump_skips_raw_timing() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();
    rig.discover(2, 0x77, "Other");
    rig.ctrl.calls.clear();

    // Raw PDUs from the session's own sync must not land on entry 1.
    rig.ctrl.script = vec![
        Scripted::RawBigInfo(raw_big_info_pdu(8000, 4000)),
        Scripted::BigInfo(big_info(3, false)),
    ];
    let Outcome::BigInfo(report) = rig.run(&["scan", "biginfo", "1"]).unwrap() else {
        panic!("expected a BIGInfo report");
    };
    assert_eq!(
        report.as_slice(),
        &[(1, Acquisition::Complete { timing: false })]
    );

    let other = rig.toolkit.broadcasts()[1].broadcast.clone();
    assert_eq!(other.big_info.num_bis, 3);
    assert_eq!((other.sub_interval, other.bis_spacing), (0, 0));
    assert_eq!(rig.ctrl.count(|c| *c == StackCall::SubscribeRaw), 0);
    assert_eq!(rig.ctrl.count(|c| *c == StackCall::UnsubscribeRaw), 0);
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::DeleteSync(_))), 1);
    assert_eq!(rig.toolkit.attack_state(), AttackState::Active);
}

// ── Attack preconditions ──────────────────────────────────────

#[test]
fn dump_without_biginfo_is_not_ready() {
    let mut rig = Rig::new(fast_config());
    rig.ready();
    rig.discover(1, 1, "Cold");
    rig.ctrl.calls.clear();

    assert_eq!(rig.run(&["broadcast", "dump", "0"]), Err(Error::NotReady));
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::BigSync(..))), 0);
    assert!(rig.ctrl.calls.is_empty());
    assert_eq!(rig.toolkit.attack_state(), AttackState::Idle);
}

#[test]
fn commands_before_init_are_rejected() {
    let mut rig = Rig::new(fast_config());
    assert_eq!(rig.run(&["scan", "on"]), Err(Error::Uninitialized));
    assert_eq!(rig.run(&["broadcast", "dump", "0"]), Err(Error::Uninitialized));
    assert!(rig.ctrl.calls.is_empty());

    rig.run(&["init"]).unwrap();
    assert!(matches!(rig.run(&["init"]), Err(Error::Validation(_))));
    assert_eq!(rig.ctrl.count(|c| *c == StackCall::Enable), 1);
}

#[test]
fn scan_already_running_is_informational() {
    let mut rig = Rig::new(fast_config());
    rig.run(&["init"]).unwrap();
    rig.ctrl.fail.start_scan = Some(StackError::AlreadyRunning);
    assert_eq!(
        rig.run(&["scan", "on"]),
        Ok(Outcome::ScanStarted(auracast_toolkit::scan::ScanStart::AlreadyRunning))
    );
}

// ── Dump ──────────────────────────────────────────────────────

#[test]
fn dump_with_code_sends_no_vendor_command() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);

    rig.run(&["broadcast", "dump", "0", "Broadcast"]).unwrap();
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::Vendor(_))), 0);
    let mut expected = [0u8; 16];
    expected[..9].copy_from_slice(b"Broadcast");
    assert_eq!(
        rig.ctrl.big_sync_params().unwrap().broadcast_code,
        Some(expected)
    );
}

#[test]
fn unencrypted_dump_sends_no_vendor_command() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(3, false);

    rig.run(&["broadcast", "dump", "0"]).unwrap();
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::Vendor(_))), 0);
    assert_eq!(rig.ctrl.big_sync_params().unwrap().channels.as_slice(), &[1, 2, 3]);
}

#[test]
fn dump_emits_every_nth_pdu() {
    let mut rig = Rig::new(ToolkitConfig {
        dump_print_interval: 2,
        ..fast_config()
    });
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();

    for seq in 0..4u64 {
        rig.events.dispatch(
            &StackEvent::IsoPdu {
                seq,
                payload: &[0xA5; 40],
            },
            &mut rig.sink,
        );
    }
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::PduCaptured { .. })),
        2
    );
}

#[test]
fn big_sync_failure_returns_to_idle_and_cleans_up() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.ctrl.fail.big_sync = Some(StackError::Code(-5));

    assert_eq!(
        rig.run(&["broadcast", "dump", "0"]),
        Err(Error::Protocol(ProtocolError::new(ProtocolOp::BigSync, -5)))
    );
    assert_eq!(rig.toolkit.attack_state(), AttackState::Idle);
    assert!(rig.toolkit.active_session().is_none());
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::DeleteSync(_))), 1);
}

#[test]
fn vendor_command_failure_aborts_before_big_sync() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.ctrl.fail.vendor = Some(StackError::Code(-1));

    assert!(matches!(
        rig.run(&["broadcast", "dump", "0"]),
        Err(Error::Protocol(ProtocolError {
            op: ProtocolOp::VendorCommand(0x0666),
            ..
        }))
    ));
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::BigSync(..))), 0);
    assert_eq!(rig.toolkit.attack_state(), AttackState::Idle);
}

#[test]
fn second_session_is_busy() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();
    assert_eq!(rig.run(&["broadcast", "bisquit", "0"]), Err(Error::Busy));
}

// ── Bisquit / hijack ──────────────────────────────────────────

#[test]
fn bisquit_on_unencrypted_stream_is_unimplemented() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, false);

    assert!(matches!(
        rig.run(&["broadcast", "bisquit", "0"]),
        Err(Error::Unimplemented(_))
    ));
    assert!(rig.ctrl.calls.is_empty());
    assert!(rig.toolkit.active_session().is_none());
    assert_eq!(rig.toolkit.attack_state(), AttackState::Idle);
}

#[test]
fn bisquit_on_encrypted_stream_injects_with_empty_code() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);

    rig.run(&["broadcast", "bisquit", "0"]).unwrap();
    let vendor = rig.ctrl.position(|c| *c == StackCall::Vendor(0x0667)).unwrap();
    let big = rig
        .ctrl
        .position(|c| matches!(c, StackCall::BigSync(..)))
        .unwrap();
    assert!(vendor < big);
    assert_eq!(
        rig.ctrl.big_sync_params().unwrap().broadcast_code,
        Some([0u8; 16])
    );
    assert_eq!(
        rig.toolkit.active_session().map(|s| s.mode),
        Some(AttackMode::Bisquit)
    );
}

#[test]
fn hijack_touches_nothing() {
    let mut rig = Rig::new(fast_config());
    assert_eq!(rig.run(&["broadcast", "hijack"]), Ok(Outcome::Hijack));
    assert!(rig.ctrl.calls.is_empty());
}

// ── Stop / reset / termination ────────────────────────────────

#[test]
fn stop_without_session_has_no_side_effects() {
    let mut rig = Rig::new(fast_config());
    rig.run(&["init"]).unwrap();
    rig.ctrl.calls.clear();

    assert_eq!(
        rig.run(&["broadcast", "dump", "stop"]),
        Ok(Outcome::Stopped(StopOutcome::NothingToStop))
    );
    assert!(rig.ctrl.calls.is_empty());
}

#[test]
fn stop_tears_down_and_returns_to_idle() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();
    rig.ctrl.calls.clear();

    let outcome = rig.run(&["broadcast", "dump", "stop"]).unwrap();
    assert!(matches!(
        outcome,
        Outcome::Stopped(StopOutcome::Stopped { ref report, .. }) if report.is_clean()
    ));
    assert!(
        matches!(
            rig.ctrl.calls.as_slice(),
            [
                StackCall::BigTerminate(BigHandle(0)),
                StackCall::DeleteSync(_),
                StackCall::UnsubscribeRaw,
            ]
        ),
        "{:?}",
        rig.ctrl.calls
    );
    assert_eq!(rig.toolkit.attack_state(), AttackState::Idle);
    assert_eq!(rig.toolkit.prompt(), "auracast:~$ ");
}

#[test]
fn teardown_continues_past_failures() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();
    rig.ctrl.fail.big_terminate = Some(StackError::Code(-22));
    rig.ctrl.calls.clear();

    let Outcome::Stopped(StopOutcome::Stopped { report, .. }) =
        rig.run(&["broadcast", "dump", "stop"]).unwrap()
    else {
        panic!("expected a stopped session");
    };
    assert_eq!(
        report.failures.as_slice(),
        &[ProtocolError::new(ProtocolOp::BigTerminate, -22)]
    );
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::DeleteSync(_))), 1);
    assert_eq!(rig.ctrl.count(|c| *c == StackCall::UnsubscribeRaw), 1);
    assert!(rig.toolkit.active_session().is_none());
}

#[test]
fn reset_tears_down_session_and_clears_registry() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();
    rig.ctrl.calls.clear();

    let outcome = rig.run(&["reset"]).unwrap();
    assert!(matches!(outcome, Outcome::Reset { stopped: Some(_) }));
    assert!(rig.toolkit.broadcasts().is_empty());
    assert!(rig.toolkit.active_session().is_none());
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::BigTerminate(_))), 1);
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::DeleteSync(_))), 1);
}

#[test]
fn external_big_termination_drops_session_on_next_command() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);
    rig.run(&["broadcast", "dump", "0"]).unwrap();
    rig.ctrl.calls.clear();

    rig.events.dispatch(
        &StackEvent::BigTerminated {
            big: BigHandle(0),
            reason: 0x13,
        },
        &mut rig.sink,
    );
    rig.run(&["broadcast", "list"]).unwrap();

    assert!(rig.toolkit.active_session().is_none());
    assert_eq!(rig.toolkit.attack_state(), AttackState::Idle);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SessionStopped { .. })),
        1
    );
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::BigTerminate(_))), 0);
    assert_eq!(rig.ctrl.count(|c| matches!(c, StackCall::DeleteSync(_))), 0);
}

// ── Shell ─────────────────────────────────────────────────────

#[test]
fn shell_reports_exit_status() {
    let mut rig = Rig::new(fast_config());

    let (code, out) = rig.shell("scan list");
    assert_eq!(code, EXIT_OK);
    assert_eq!(out, "No broadcasts found\n");

    let (code, out) = rig.shell("broadcast dump zero");
    assert_eq!(code, EXIT_ERROR);
    assert!(out.starts_with("error:"), "{out}");

    let (code, out) = rig.shell("broadcast dump stop");
    assert_eq!(code, EXIT_OK);
    assert_eq!(out, "Nothing to stop\n");

    assert_eq!(rig.shell("   ").0, EXIT_OK);
}

#[test]
fn shell_lists_biginfo_details() {
    let mut rig = Rig::new(fast_config());
    rig.with_big_info(2, true);

    let (code, out) = rig.shell("broadcast list");
    assert_eq!(code, EXIT_OK);
    assert!(out.contains("ID=0x123456"), "{out}");
    assert!(out.contains("\"Gate 12\""), "{out}");
    assert!(out.contains("2 BIS"), "{out}");
    assert!(out.contains("ISO interval 10 ms"), "{out}");
    assert!(out.contains("LE 2M"), "{out}");
    assert!(out.contains("sequential"), "{out}");
    assert!(
        out.contains("BN 2, PTO 0, IRC 0, max PDU 120, SDU interval 10000 us, max SDU 120, unframed framing"),
        "{out}"
    );
}
