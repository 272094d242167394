//! Line-oriented shell front end.
//!
//! Parses one command line, runs it against a [`Toolkit`] and renders the
//! outcome as text. This is the outermost surface, so errors are carried
//! as `anyhow` values with a context line naming the command.

use core::fmt::Write;

use anyhow::{Context, Result, bail};

use crate::attack::StopOutcome;
use crate::broadcast::Broadcast;
use crate::scan::ScanStart;
use crate::sync::Acquisition;

use super::commands::AppCommand;
use super::ports::{Controller, EventSink};
use super::service::{BroadcastSummary, Outcome, Toolkit};

/// Exit status of a successful command.
pub const EXIT_OK: i32 = 0;
/// Exit status of a failed command.
pub const EXIT_ERROR: i32 = 1;

/// Run one command line. Output and errors both go to `out`.
pub fn run_line(
    toolkit: &mut Toolkit,
    line: &str,
    ctrl: &mut impl Controller,
    sink: &mut impl EventSink,
    out: &mut impl Write,
) -> i32 {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return EXIT_OK;
    }
    match execute(toolkit, &words, ctrl, sink, out) {
        Ok(()) => EXIT_OK,
        Err(e) => {
            log::error!("{e:#}");
            let _ = writeln!(out, "error: {e:#}");
            EXIT_ERROR
        }
    }
}

fn execute(
    toolkit: &mut Toolkit,
    words: &[&str],
    ctrl: &mut impl Controller,
    sink: &mut impl EventSink,
    out: &mut impl Write,
) -> Result<()> {
    let cmd = AppCommand::parse(words).context("invalid command")?;
    let outcome = toolkit
        .handle_command(cmd, ctrl, sink)
        .with_context(|| format!("`{}` failed", words.join(" ")))?;
    render(&outcome, out)
}

fn render(outcome: &Outcome, out: &mut impl Write) -> Result<()> {
    match outcome {
        Outcome::Initialized => writeln!(out, "Bluetooth initialized")?,
        Outcome::Reset { stopped } => {
            if let Some(s) = stopped {
                writeln!(out, "Stopped {} on broadcast {}", s.mode, s.id)?;
            }
            writeln!(out, "Reset complete")?;
        }
        Outcome::Debug(on) => writeln!(out, "debug {}", if *on { "on" } else { "off" })?,
        Outcome::ScanStarted(ScanStart::Started) => writeln!(out, "Scanning started")?,
        Outcome::ScanStarted(ScanStart::AlreadyRunning) => writeln!(out, "Scan already running")?,
        Outcome::ScanStopped => writeln!(out, "Scanning stopped")?,
        Outcome::Listing(entries) => {
            if entries.is_empty() {
                writeln!(out, "No broadcasts found")?;
            }
            for entry in entries {
                render_summary(entry, out)?;
            }
        }
        Outcome::BigInfo(report) => {
            for (index, acquisition) in report {
                match acquisition {
                    Acquisition::Complete { timing } => writeln!(
                        out,
                        "[{index}] BIGInfo acquired{}",
                        if *timing { "" } else { " (no raw timing)" }
                    )?,
                    Acquisition::TimedOut { .. } => {
                        writeln!(out, "[{index}] BIGInfo timed out, try again")?
                    }
                }
            }
        }
        Outcome::SessionStarted(s) => {
            writeln!(out, "{} active on broadcast {} (index {})", s.mode, s.id, s.index)?;
        }
        Outcome::Stopped(StopOutcome::NothingToStop) => writeln!(out, "Nothing to stop")?,
        Outcome::Stopped(StopOutcome::Stopped { session, report }) => {
            writeln!(out, "Stopped {} on broadcast {}", session.mode, session.id)?;
            for failure in &report.failures {
                writeln!(out, "  {failure}")?;
            }
            if !report.is_clean() {
                bail!("teardown incomplete");
            }
        }
        Outcome::Hijack => writeln!(out, "hijack: nothing to do")?,
    }
    Ok(())
}

fn render_summary(entry: &BroadcastSummary, out: &mut impl Write) -> Result<()> {
    let b: &Broadcast = &entry.broadcast;
    writeln!(
        out,
        "[{}] ID={} {} \"{}\" sid={} phy={}",
        entry.index, b.id, b.address, b.name, b.last_scan.sid, b.last_scan.phy
    )?;
    if b.has_big_info {
        let info = &b.big_info;
        writeln!(
            out,
            "    {} BIS, NSE {}, ISO interval {} ms, PHY {}, {}, {}",
            info.num_bis,
            info.sub_evt_count,
            info.iso_interval_ms(),
            info.phy,
            if info.encryption { "encrypted" } else { "unencrypted" },
            if entry.interleaved() { "interleaved" } else { "sequential" },
        )?;
        writeln!(
            out,
            "    BN {}, PTO {}, IRC {}, max PDU {}, SDU interval {} us, max SDU {}, {} framing",
            info.burst_number,
            info.offset,
            info.rep_count,
            info.max_pdu,
            info.sdu_interval,
            info.max_sdu,
            if info.framing { "framed" } else { "unframed" },
        )?;
        if b.sub_interval > 0 || b.bis_spacing > 0 {
            writeln!(
                out,
                "    sub-interval {} us, BIS spacing {} us",
                b.sub_interval, b.bis_spacing
            )?;
        }
    }
    Ok(())
}
