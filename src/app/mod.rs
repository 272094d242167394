//! Application core: domain orchestration with no direct I/O.
//!
//! This module wires discovery, BIGInfo acquisition and the attack
//! engine behind a single [`service::Toolkit`]. All interaction with the
//! Bluetooth stack happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without a controller.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod shell;
