//! BIG sync parameter construction.

use heapless::Vec;
use log::warn;

use crate::app::ports::{BROADCAST_CODE_LEN, BigSyncParams, MSE_ANY};
use crate::broadcast::BigInfo;
use crate::config::MAX_BIS;
use crate::error::{Error, Result};

pub type BroadcastCode = [u8; BROADCAST_CODE_LEN];

/// Copy up to 16 bytes of `raw`, zero-padding the rest.
pub fn broadcast_code_from(raw: &[u8]) -> BroadcastCode {
    if raw.len() > BROADCAST_CODE_LEN {
        warn!(
            "BIG SYNC | broadcast code is {} bytes, using the first {BROADCAST_CODE_LEN}",
            raw.len()
        );
    }
    let mut code = [0u8; BROADCAST_CODE_LEN];
    let n = raw.len().min(BROADCAST_CODE_LEN);
    code[..n].copy_from_slice(&raw[..n]);
    code
}

/// BIG sync request receiving BIS `1..=num_bis`.
///
/// `num_bis` above `max_bis` is clamped; zero BIS is rejected.
pub fn big_sync_params(
    info: &BigInfo,
    code: Option<BroadcastCode>,
    sync_timeout: u16,
    max_bis: u8,
) -> Result<BigSyncParams> {
    if info.num_bis == 0 {
        return Err(Error::Validation("BIGInfo reports zero BIS"));
    }
    let ceiling = max_bis.min(MAX_BIS as u8);
    let count = if info.num_bis > ceiling {
        warn!(
            "BIG SYNC | {} BIS advertised, receiving the first {ceiling}",
            info.num_bis
        );
        ceiling
    } else {
        info.num_bis
    };

    let mut channels = Vec::new();
    for bis in 1..=count {
        channels
            .push(bis)
            .map_err(|_| Error::Validation("too many BIS channels"))?;
    }

    Ok(BigSyncParams {
        channels,
        bis_bitfield: bitfield(count),
        mse: MSE_ANY,
        sync_timeout,
        encryption: info.encryption,
        broadcast_code: code,
    })
}

fn bitfield(count: u8) -> u32 {
    if u32::from(count) >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << count) - 1
    }
}
