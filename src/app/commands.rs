//! Inbound commands to the toolkit.
//!
//! These represent the shell words an operator types. [`AppCommand::parse`]
//! turns a tokenized line into a typed command that the
//! [`Toolkit`](super::service::Toolkit) interprets and acts upon.
//!
//! ```text
//! init
//! reset
//! debug [on|off]
//! scan {on|off|list|biginfo [index]}
//! broadcast {list|dump <index> [code]|dump stop|bisquit <index>|bisquit stop|hijack}
//! ```

use heapless::Vec;

use crate::error::{Error, Result};

/// Broadcast code as typed by the operator. Longer input is truncated
/// to [`BROADCAST_CODE_LEN`](super::ports::BROADCAST_CODE_LEN) bytes when the session starts.
pub type CodeArg = Vec<u8, 64>;

/// Commands the outside world can send into the toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Enable the Bluetooth stack.
    Init,

    /// Tear down any session and clear the registry.
    Reset,

    /// Set the debug flag, or report it when `None`.
    Debug(Option<bool>),

    ScanOn,
    ScanOff,
    ScanList,

    /// Acquire BIGInfo for one broadcast, or every tracked one when `None`.
    ScanBigInfo(Option<usize>),

    BroadcastList,

    /// Start a passive dump, optionally decrypting with a broadcast code.
    Dump { index: usize, code: Option<CodeArg> },
    DumpStop,

    /// Start garbage PDU injection.
    Bisquit(usize),
    BisquitStop,

    Hijack,
}

impl AppCommand {
    /// Parse a tokenized command line.
    pub fn parse(words: &[&str]) -> Result<Self> {
        match words {
            ["init"] => Ok(Self::Init),
            ["reset"] => Ok(Self::Reset),
            ["debug"] => Ok(Self::Debug(None)),
            ["debug", flag] => Ok(Self::Debug(Some(parse_switch(flag)?))),

            ["scan", "on"] => Ok(Self::ScanOn),
            ["scan", "off"] => Ok(Self::ScanOff),
            ["scan", "list"] => Ok(Self::ScanList),
            ["scan", "biginfo"] => Ok(Self::ScanBigInfo(None)),
            ["scan", "biginfo", index] => Ok(Self::ScanBigInfo(Some(parse_index(index)?))),
            ["scan", ..] => Err(Error::Validation("usage: scan {on|off|list|biginfo [index]}")),

            ["broadcast", "list"] => Ok(Self::BroadcastList),
            ["broadcast", "dump", "stop"] => Ok(Self::DumpStop),
            ["broadcast", "dump", index] => Ok(Self::Dump {
                index: parse_index(index)?,
                code: None,
            }),
            ["broadcast", "dump", index, code] => Ok(Self::Dump {
                index: parse_index(index)?,
                code: Some(parse_code(code)?),
            }),
            ["broadcast", "bisquit", "stop"] => Ok(Self::BisquitStop),
            ["broadcast", "bisquit", index] => Ok(Self::Bisquit(parse_index(index)?)),
            ["broadcast", "hijack"] => Ok(Self::Hijack),
            ["broadcast", ..] => Err(Error::Validation(
                "usage: broadcast {list|dump <index> [code]|dump stop|bisquit <index>|bisquit stop|hijack}",
            )),

            [] => Err(Error::Validation("empty command")),
            _ => Err(Error::Validation("unknown command")),
        }
    }
}

fn parse_index(word: &str) -> Result<usize> {
    word.parse()
        .map_err(|_| Error::Validation("index must be a non-negative integer"))
}

fn parse_switch(word: &str) -> Result<bool> {
    match word {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(Error::Validation("expected on or off")),
    }
}

fn parse_code(word: &str) -> Result<CodeArg> {
    if word.is_empty() {
        return Err(Error::Validation("broadcast code must not be empty"));
    }
    Vec::from_slice(word.as_bytes()).map_err(|_| Error::Validation("broadcast code too long"))
}
