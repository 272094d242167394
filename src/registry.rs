//! Broadcast registry.
//!
//! Fixed-capacity table of discovered broadcasters, deduplicated by
//! address. Slots are never removed individually; only [`reset_all`]
//! empties the table.
//!
//! Indices are exclusive of the current count: `by_index(len())` is
//! `NotFound`.
//!
//! [`reset_all`]: BroadcastRegistry::reset_all

use heapless::Vec;

use crate::broadcast::{Address, BigInfo, Broadcast, BroadcastId};
use crate::config::MAX_BROADCASTS;
use crate::error::{Error, Lookup, Result};

/// Result of [`BroadcastRegistry::upsert`].
pub struct Slot<'a> {
    pub index: usize,
    /// `true` when this call allocated the slot.
    pub created: bool,
    pub broadcast: &'a mut Broadcast,
}

/// Table of up to [`MAX_BROADCASTS`] broadcasters.
#[derive(Debug, Clone)]
pub struct BroadcastRegistry {
    entries: Vec<Broadcast, MAX_BROADCASTS>,
    limit: usize,
}

impl BroadcastRegistry {
    /// Registry holding the full [`MAX_BROADCASTS`].
    pub fn new() -> Self {
        Self::with_limit(MAX_BROADCASTS)
    }

    /// Registry holding at most `limit` entries (capped at [`MAX_BROADCASTS`]).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.min(MAX_BROADCASTS),
        }
    }

    /// Return the entry for `address`, allocating a slot if it is unseen.
    ///
    /// A newly allocated slot starts with `id`; an existing one keeps its
    /// fields untouched so the caller decides what to overwrite.
    pub fn upsert(&mut self, address: Address, id: BroadcastId) -> Result<Slot<'_>> {
        if let Some(index) = self.position(&address) {
            return Ok(Slot {
                index,
                created: false,
                broadcast: &mut self.entries[index],
            });
        }

        if self.is_full() {
            return Err(Error::Capacity);
        }

        let mut b = Broadcast::new(address);
        b.id = id;
        self.entries.push(b).map_err(|_| Error::Capacity)?;
        let index = self.entries.len() - 1;
        Ok(Slot {
            index,
            created: true,
            broadcast: &mut self.entries[index],
        })
    }

    pub fn by_index(&self, index: usize) -> Result<&Broadcast> {
        self.entries
            .get(index)
            .ok_or(Error::NotFound(Lookup::Index(index)))
    }

    pub fn by_index_mut(&mut self, index: usize) -> Result<&mut Broadcast> {
        self.entries
            .get_mut(index)
            .ok_or(Error::NotFound(Lookup::Index(index)))
    }

    pub fn by_id(&self, id: BroadcastId) -> Result<&Broadcast> {
        self.entries
            .iter()
            .find(|b| b.id == id)
            .ok_or(Error::NotFound(Lookup::Id(id.get())))
    }

    pub fn by_address(&self, address: &Address) -> Result<&Broadcast> {
        self.entries
            .iter()
            .find(|b| b.address == *address)
            .ok_or(Error::NotFound(Lookup::Address))
    }

    /// Index of the entry with `address`, if tracked.
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.entries.iter().position(|b| b.address == *address)
    }

    /// First entry whose name contains `needle`, ignoring ASCII case.
    pub fn find_by_name(&self, needle: &str) -> Option<(usize, &Broadcast)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, b)| contains_ignore_ascii_case(&b.name, needle))
    }

    /// Write a decoded BIGInfo into the entry for `address`.
    /// Returns `false` when the address is not tracked.
    pub fn apply_big_info(&mut self, address: &Address, info: &BigInfo) -> bool {
        match self.entries.iter_mut().find(|b| b.address == *address) {
            Some(b) => {
                b.set_big_info(*info);
                true
            }
            None => false,
        }
    }

    /// Drop every entry.
    pub fn reset_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &Broadcast> {
        self.entries.iter()
    }
}

impl Default for BroadcastRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
