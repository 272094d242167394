//! Auracast broadcast toolkit.
//!
//! Discovers LE Audio broadcasters, acquires their BIGInfo and drives
//! BIG-level attack sessions against them. The Bluetooth stack is reached
//! only through the port traits in [`app::ports`]; its callbacks come back
//! in through [`app::service::StackEvents`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod attack;
pub mod broadcast;
pub mod capture;
pub mod config;
pub mod error;
pub mod registry;
pub mod scan;
pub mod shared;
pub mod sync;

pub use app::commands::AppCommand;
pub use app::service::{Outcome, StackEvents, Toolkit};
pub use config::ToolkitConfig;
pub use error::{Error, Result};
