//! Fingerprint extension: lengthening entries whose base fingerprints
//! collide so they stop matching each other.
use super::config::OpFlags;
use super::filter::{Filter, Match};
use super::runs::Placement;
use crate::error::{FilterError, Result};
use tracing::trace;

/// Outcome of [`Filter::extend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    /// New effective length of both entries, in bits.
    pub length: u32,
    /// The stored entry, now lengthened with its owner's bits.
    pub existing: Match,
    /// The entry written for the incoming key.
    pub incoming: Match,
}

impl Filter {
    /// Resolve a collision reported by `insert`.
    ///
    /// `slot` is the colliding entry, `owner` the hash it was stored for and
    /// `incoming` the different key that hit it. The same key on both sides
    /// is `NotColliding`. The entry gains `rbits`
    /// chunks of its owner's hash until the chunks of the two hashes differ
    /// (or the length cap is reached), and the incoming key is stored as its
    /// own entry of the same length. Room for every new slot is checked
    /// before anything is written.
    pub fn extend(
        &mut self,
        slot: usize,
        incoming: u64,
        owner: u64,
        flags: OpFlags,
    ) -> Result<Extension> {
        let incoming = self.hash_key(incoming, flags);
        let owner = self.hash_key(owner, flags);
        let (quotient, remainder) = self.split(incoming);
        if incoming == owner || self.split(owner) != (quotient, remainder) {
            return Err(FilterError::NotColliding);
        }
        let entry = self.entry_at(quotient, slot, owner)?;
        if !self.entry_matches(slot, entry.chunks, incoming) {
            return Err(FilterError::NotColliding);
        }
        let target = self.target_chunks(&entry, owner, incoming)?;

        let grow = target - entry.chunks;
        if !self.blocks.has_room(slot, grow + 1 + target) {
            return Err(FilterError::NoSpace);
        }

        self.grow_entry(quotient, slot, &entry, owner, target)?;
        let chunks: Vec<u64> = (1..=target).map(|i| self.chunk(incoming, i)).collect();
        let (pos, placement) = self.insertion_point(quotient, remainder);
        self.write_entry(quotient, pos, placement, remainder, &chunks)?;

        self.header.used_slots += (grow + 1 + target) as u64;
        self.header.entries += 1;
        self.sync_header()?;

        let existing = self.entry_match(quotient, slot, target);
        let incoming = self.entry_match(quotient, pos, target);
        trace!(
            slot,
            incoming_slot = pos,
            length = existing.length,
            "extended colliding fingerprints"
        );
        Ok(Extension {
            length: existing.length,
            existing,
            incoming,
        })
    }

    /// Lengthen the entry at `slot` (stored for `owner`) until it no longer
    /// matches `non_member`, a hash found to be a false positive.
    pub fn adapt(
        &mut self,
        slot: usize,
        owner: u64,
        non_member: u64,
        flags: OpFlags,
    ) -> Result<Match> {
        let owner = self.hash_key(owner, flags);
        let non_member = self.hash_key(non_member, flags);
        let (quotient, remainder) = self.split(owner);
        if self.split(non_member) != (quotient, remainder) {
            return Err(FilterError::NotColliding);
        }
        let entry = self.entry_at(quotient, slot, owner)?;
        if !self.entry_matches(slot, entry.chunks, non_member) {
            return Err(FilterError::NotColliding);
        }
        let target = self.target_chunks(&entry, owner, non_member)?;

        let grow = target - entry.chunks;
        if !self.blocks.has_room(slot, grow) {
            return Err(FilterError::NoSpace);
        }
        self.grow_entry(quotient, slot, &entry, owner, target)?;
        self.header.used_slots += grow as u64;
        self.sync_header()?;

        let adapted = self.entry_match(quotient, slot, target);
        trace!(slot, length = adapted.length, "adapted fingerprint");
        Ok(adapted)
    }

    /// The entry of `quotient`'s run starting at `slot`, which must match
    /// `owner`.
    fn entry_at(&self, quotient: usize, slot: usize, owner: u64) -> Result<StoredEntry> {
        let (_, end) = self
            .blocks
            .run_bounds(quotient)
            .ok_or(FilterError::SlotMismatch { slot })?;
        let (_, chunks) = self
            .blocks
            .run_entries(quotient)
            .find(|&(start, _)| start == slot)
            .ok_or(FilterError::SlotMismatch { slot })?;
        if !self.entry_matches(slot, chunks, owner) {
            return Err(FilterError::SlotMismatch { slot });
        }
        Ok(StoredEntry {
            chunks,
            ends_run: slot + chunks == end,
        })
    }

    /// Smallest chunk count above the entry's at which `a` and `b` differ,
    /// capped at the maximum.
    fn target_chunks(&self, entry: &StoredEntry, a: u64, b: u64) -> Result<usize> {
        let max = self.max_extension_chunks();
        if entry.chunks >= max {
            return Err(FilterError::ExtensionLimit {
                length: u32::from(self.header.rbits) * (1 + entry.chunks as u32),
            });
        }
        Ok((entry.chunks + 1..=max)
            .find(|&i| self.chunk(a, i) != self.chunk(b, i))
            .unwrap_or(max))
    }

    /// Append `owner`'s chunks to the entry until it has `target` of them.
    fn grow_entry(
        &mut self,
        quotient: usize,
        slot: usize,
        entry: &StoredEntry,
        owner: u64,
        target: usize,
    ) -> Result<()> {
        for i in entry.chunks + 1..=target {
            let at = slot + i;
            let placement = if entry.ends_run {
                Placement::Append { end: at - 1 }
            } else {
                Placement::Within
            };
            let value = self.chunk(owner, i);
            self.blocks.insert_slot(quotient, at, value, true, placement)?;
        }
        Ok(())
    }
}

struct StoredEntry {
    chunks: usize,
    /// Whether the entry's last slot is its run's last slot.
    ends_run: bool,
}
