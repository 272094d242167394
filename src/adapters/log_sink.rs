//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured toolkit events to the
//! `log` facade. A capture-file or socket adapter would implement the
//! same trait.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::BroadcastDiscovered {
                index,
                id,
                address,
                sid,
            } => {
                info!("SCAN | [{index}] found {id} at {address} sid={sid}");
            }
            AppEvent::RegistryFull { address } => {
                debug!("SCAN | registry full, dropped {address}");
            }
            AppEvent::BigInfoAcquired { index, id } => {
                info!("BIGInfo | [{index}] acquired for {id}");
            }
            AppEvent::BigInfoTimeout { index, id } => {
                warn!("BIGInfo | [{index}] timed out for {id}");
            }
            AppEvent::SessionStarted { mode, index, id } => {
                info!("SESSION | {mode} started on [{index}] {id}");
            }
            AppEvent::SessionStopped { id } => {
                info!("SESSION | stopped on {id}");
            }
            AppEvent::PduCaptured { seq, len, payload } => {
                info!(
                    "PDU | seq={seq} len={len} | {}{}",
                    hex::encode(payload),
                    if *len > payload.len() { " ..." } else { "" }
                );
            }
            AppEvent::BigInfoPdu { len, payload } => {
                info!("BIGINFO PDU | len={len} | {}", hex::encode(payload));
            }
        }
    }
}
