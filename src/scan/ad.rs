//! Advertising data (AD) structure parsing.
//!
//! AD payloads are a sequence of `[len][type][data; len - 1]` elements.
//! A zero length byte ends the payload early; an element whose length
//! runs past the buffer is malformed and ends iteration.

use crate::broadcast::BroadcastId;

pub const AD_NAME_SHORTENED: u8 = 0x08;
pub const AD_NAME_COMPLETE: u8 = 0x09;
pub const AD_SERVICE_DATA16: u8 = 0x16;
pub const AD_BROADCAST_NAME: u8 = 0x30;

/// Broadcast Audio Announcement Service.
pub const BROADCAST_AUDIO_UUID: u16 = 0x1852;

const UUID16_LEN: usize = 2;
const BROADCAST_ID_LEN: usize = 3;

/// One AD element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdElement<'a> {
    pub kind: u8,
    pub data: &'a [u8],
}

/// Iterator over the AD elements of a payload.
#[derive(Debug, Clone)]
pub struct AdElements<'a> {
    rest: &'a [u8],
}

impl<'a> AdElements<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }
}

impl<'a> Iterator for AdElements<'a> {
    type Item = AdElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, tail) = self.rest.split_first()?;
        let len = usize::from(len);
        if len == 0 || len > tail.len() {
            self.rest = &[];
            return None;
        }
        let (element, rest) = tail.split_at(len);
        self.rest = rest;
        Some(AdElement {
            kind: element[0],
            data: &element[1..],
        })
    }
}

/// Broadcast Name element, falling back to the first complete or
/// shortened local name.
pub fn broadcaster_name(data: &[u8]) -> Option<&[u8]> {
    let mut local_name = None;
    for element in AdElements::new(data) {
        match element.kind {
            AD_BROADCAST_NAME => return Some(element.data),
            AD_NAME_COMPLETE | AD_NAME_SHORTENED if local_name.is_none() => {
                local_name = Some(element.data);
            }
            _ => {}
        }
    }
    local_name
}

/// Broadcast_ID from the first Broadcast Audio Announcement service data.
pub fn broadcast_id(data: &[u8]) -> Option<BroadcastId> {
    AdElements::new(data)
        .filter(|e| e.kind == AD_SERVICE_DATA16 && e.data.len() >= UUID16_LEN + BROADCAST_ID_LEN)
        .find(|e| u16::from_le_bytes([e.data[0], e.data[1]]) == BROADCAST_AUDIO_UUID)
        .map(|e| BroadcastId::from_le_bytes([e.data[2], e.data[3], e.data[4]]))
}
