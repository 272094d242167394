//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to        |
//! |------------|------------|--------------------|
//! | `log_sink` | EventSink  | `log` facade       |
//!
//! Controller adapters live with the host that embeds the toolkit, since
//! they bind to a specific Bluetooth stack.

pub mod log_sink;
