//! Run location and slot-level insert/remove on top of [`BlockArray`].
//!
//! A block's `offset` word counts the leading slots of that block taken by
//! runs whose quotients live in earlier blocks. With it, the end of the run
//! covering any slot is a rank on the block's occupieds plus a select on
//! runends, with no backwards scan.
use super::blocks::BlockArray;
use super::layout::{SLOTS_PER_BLOCK, Word};
use crate::bits::rank;
use crate::error::{FilterError, Result};

/// Where a new slot goes relative to its quotient's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The quotient has no run yet; the slot becomes the whole run.
    NewRun,
    /// Strictly inside the run; the run-end bit moves with the shift.
    Within,
    /// Right after the current run end `end`.
    Append { end: usize },
}

impl Placement {
    /// Placement for the slot following one just written at `at`.
    pub fn after(self, at: usize) -> Self {
        match self {
            Placement::Within => Placement::Within,
            Placement::NewRun | Placement::Append { .. } => Placement::Append { end: at },
        }
    }
}

impl BlockArray {
    pub fn is_occupied(&self, quotient: usize) -> bool {
        self.bit(Word::Occupieds, quotient)
    }

    /// End of the run of the greatest occupied quotient `<= slot`, provided
    /// that run reaches `slot`. `None` means `slot` is empty.
    pub fn run_end(&self, slot: usize) -> Option<usize> {
        let block = slot / SLOTS_PER_BLOCK;
        let bit = slot % SLOTS_PER_BLOCK;
        let offset = self.offset(block);
        let start = block * SLOTS_PER_BLOCK;
        let runs = rank(self.word(block, Word::Occupieds), bit);
        if runs == 0 {
            return (offset > bit).then(|| start + offset - 1);
        }
        let end = self
            .select_from(Word::Runends, start + offset, runs - 1)
            .unwrap_or(self.total_slots() - 1);
        (end >= slot).then_some(end)
    }

    /// Slot where the run of `quotient` starts, or would start if the
    /// quotient got its first entry now.
    pub fn run_start(&self, quotient: usize) -> usize {
        if quotient == 0 {
            return 0;
        }
        self.run_end(quotient - 1).map_or(quotient, |end| end + 1)
    }

    /// First and last slot of the run of `quotient`, if it is occupied.
    pub fn run_bounds(&self, quotient: usize) -> Option<(usize, usize)> {
        if !self.is_occupied(quotient) {
            return None;
        }
        let end = self.run_end(quotient)?;
        Some((self.run_start(quotient), end))
    }

    /// First empty slot at or after `from`.
    pub fn first_empty(&self, from: usize) -> Option<usize> {
        let mut slot = from;
        while slot < self.total_slots() {
            match self.run_end(slot) {
                None => return Some(slot),
                Some(end) => slot = end + 1,
            }
        }
        None
    }

    /// Whether `n` slots can be inserted one after another at or after
    /// `from` without running off the end of the array.
    pub fn has_room(&self, from: usize, n: usize) -> bool {
        let mut slot = from;
        for _ in 0..n {
            match self.first_empty(slot) {
                Some(empty) => slot = empty + 1,
                None => return false,
            }
        }
        true
    }

    /// Write one slot for quotient `home` at `pos`, shifting everything
    /// from `pos` up to the next empty slot one position right.
    pub fn insert_slot(
        &mut self,
        home: usize,
        pos: usize,
        remainder: u64,
        extension: bool,
        placement: Placement,
    ) -> Result<()> {
        let empty = self.first_empty(pos).ok_or(FilterError::NoSpace)?;
        if empty > pos {
            self.shift_right(pos, empty);
        }
        match placement {
            Placement::NewRun => {
                self.set_bit(Word::Occupieds, home, true);
                self.set_bit(Word::Runends, pos, true);
            }
            Placement::Within => {}
            Placement::Append { end } => {
                self.set_bit(Word::Runends, end, false);
                self.set_bit(Word::Runends, pos, true);
            }
        }
        self.set_bit(Word::Extensions, pos, extension);
        self.set_remainder(pos, remainder);
        self.refresh_offsets(home, empty);
        Ok(())
    }

    /// Remove the slot at `pos` from the run of `home`, pulling the rest of
    /// the cluster one position left.
    pub fn remove_slot(&mut self, home: usize, pos: usize) -> Result<()> {
        let (start, end) = self.run_bounds(home).ok_or_else(|| {
            FilterError::Corrupted(format!("Quotient {home} has no run"))
        })?;
        if pos < start || pos > end {
            return Err(FilterError::Corrupted(format!(
                "Slot {pos} outside run {start}..={end} of quotient {home}"
            )));
        }

        // Later runs move only while they sit past their home slot.
        let mut last = end;
        let mut quotient = home;
        loop {
            let next = last + 1;
            if next >= self.total_slots() {
                break;
            }
            match self.next_set(Word::Occupieds, quotient + 1) {
                Some(q) if q < next => {
                    last = self
                        .next_set(Word::Runends, next)
                        .unwrap_or(self.total_slots() - 1);
                    quotient = q;
                }
                _ => break,
            }
        }

        self.shift_left(pos, last);
        if start == end {
            self.set_bit(Word::Occupieds, home, false);
        } else if pos == end {
            self.set_bit(Word::Runends, pos - 1, true);
        }
        self.refresh_offsets(home, last);
        Ok(())
    }

    // Blocks up to and including the home block keep their offsets.
    fn refresh_offsets(&mut self, home: usize, last: usize) {
        let first = home / SLOTS_PER_BLOCK + 1;
        let last = last / SLOTS_PER_BLOCK;
        for block in first..=last.min(self.nblocks() - 1) {
            let start = block * SLOTS_PER_BLOCK;
            let offset = self.run_end(start - 1).map_or(0, |end| end + 1 - start);
            self.set_word(block, Word::Offset, offset as u64);
        }
    }

    /// Entries of the run `start..=end`: each base slot with the number of
    /// continuation slots following it.
    pub fn entries_in(&self, start: usize, end: usize) -> RunEntries<'_> {
        RunEntries {
            blocks: self,
            next: start,
            end,
        }
    }

    /// Entries of `quotient`'s run; empty when it has none.
    pub fn run_entries(&self, quotient: usize) -> RunEntries<'_> {
        match self.run_bounds(quotient) {
            Some((start, end)) => self.entries_in(start, end),
            None => RunEntries {
                blocks: self,
                next: 1,
                end: 0,
            },
        }
    }
}

pub struct RunEntries<'a> {
    blocks: &'a BlockArray,
    next: usize,
    end: usize,
}

impl Iterator for RunEntries<'_> {
    /// `(base slot, continuation slots)`
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.end {
            return None;
        }
        let slot = self.next;
        let mut chunks = 0;
        while slot + chunks < self.end && self.blocks.bit(Word::Extensions, slot + chunks + 1) {
            chunks += 1;
        }
        self.next = slot + chunks + 1;
        Some((slot, chunks))
    }
}
