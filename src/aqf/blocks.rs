//! Slot-addressed view over the block array.
//!
//! Slot `i` lives in block `i / 64` at bit `i % 64` of each bitmap word and
//! at field `i % 64` of the packed remainder array. Nothing here knows about
//! runs; see `runs.rs` for that.
use super::layout::{BLOCK_META_BYTES, Geometry, HEADER_BYTES, SLOTS_PER_BLOCK, Word};
use super::storage::Storage;
use crate::bits::{low_mask, range_mask};
use bitvec::prelude::*;

pub struct BlockArray {
    storage: Storage,
    geometry: Geometry,
}

impl BlockArray {
    pub fn new(storage: Storage, geometry: Geometry) -> Self {
        Self { storage, geometry }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn total_slots(&self) -> usize {
        self.geometry.total_slots
    }

    pub fn nblocks(&self) -> usize {
        self.geometry.nblocks
    }

    #[inline]
    fn block_base(&self, block: usize) -> usize {
        HEADER_BYTES + block * self.geometry.block_bytes
    }

    #[inline]
    pub fn word(&self, block: usize, word: Word) -> u64 {
        let at = self.block_base(block) + word as usize;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.storage.bytes()[at..at + 8]);
        u64::from_le_bytes(buf)
    }

    #[inline]
    pub fn set_word(&mut self, block: usize, word: Word, value: u64) {
        let at = self.block_base(block) + word as usize;
        self.storage.bytes_mut()[at..at + 8].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn offset(&self, block: usize) -> usize {
        self.word(block, Word::Offset) as usize
    }

    #[inline]
    pub fn bit(&self, word: Word, slot: usize) -> bool {
        (self.word(slot / SLOTS_PER_BLOCK, word) >> (slot % SLOTS_PER_BLOCK)) & 1 == 1
    }

    pub fn set_bit(&mut self, word: Word, slot: usize, value: bool) {
        let block = slot / SLOTS_PER_BLOCK;
        let mask = 1u64 << (slot % SLOTS_PER_BLOCK);
        let current = self.word(block, word);
        let next = if value { current | mask } else { current & !mask };
        self.set_word(block, word, next);
    }

    fn remainder_bytes(&self, block: usize) -> std::ops::Range<usize> {
        let start = self.block_base(block) + BLOCK_META_BYTES;
        start..start + 8 * self.geometry.rbits as usize
    }

    pub fn remainder(&self, slot: usize) -> u64 {
        let rbits = self.geometry.rbits as usize;
        let field = slot % SLOTS_PER_BLOCK;
        let bytes = &self.storage.bytes()[self.remainder_bytes(slot / SLOTS_PER_BLOCK)];
        bytes.view_bits::<Lsb0>()[field * rbits..(field + 1) * rbits].load_le::<u64>()
    }

    pub fn set_remainder(&mut self, slot: usize, value: u64) {
        let rbits = self.geometry.rbits as usize;
        let field = slot % SLOTS_PER_BLOCK;
        let range = self.remainder_bytes(slot / SLOTS_PER_BLOCK);
        let bytes = &mut self.storage.bytes_mut()[range];
        bytes.view_bits_mut::<Lsb0>()[field * rbits..(field + 1) * rbits]
            .store_le(value & low_mask(rbits as u32));
    }

    /// First set bit of `word` at or after slot `from`.
    pub fn next_set(&self, word: Word, from: usize) -> Option<usize> {
        self.select_from(word, from, 0)
    }

    /// The `k`-th (0-indexed) set bit of `word` at or after slot `from`,
    /// scanning forward one block word at a time.
    pub fn select_from(&self, word: Word, from: usize, k: u32) -> Option<usize> {
        if from >= self.total_slots() {
            return None;
        }
        let mut block = from / SLOTS_PER_BLOCK;
        let mut bits = self.word(block, word) & (u64::MAX << (from % SLOTS_PER_BLOCK));
        let mut k = k;
        loop {
            let ones = bits.count_ones();
            if k < ones {
                return crate::bits::select(bits, k).map(|bit| block * SLOTS_PER_BLOCK + bit);
            }
            k -= ones;
            block += 1;
            if block >= self.nblocks() {
                return None;
            }
            bits = self.word(block, word);
        }
    }

    /// Set bits of `word` over the whole array.
    pub fn count_ones(&self, word: Word) -> u64 {
        (0..self.nblocks())
            .map(|b| u64::from(self.word(b, word).count_ones()))
            .sum()
    }

    /// Move slots `[lo, hi)` to `[lo + 1, hi]` and clear slot `lo`.
    /// Slot `hi` must be empty. Occupieds are indexed by quotient and do not
    /// move.
    pub fn shift_right(&mut self, lo: usize, hi: usize) {
        debug_assert!(lo <= hi && hi < self.total_slots());
        for slot in (lo..hi).rev() {
            let value = self.remainder(slot);
            self.set_remainder(slot + 1, value);
        }
        self.set_remainder(lo, 0);
        self.shift_word_right(Word::Runends, lo, hi);
        self.shift_word_right(Word::Extensions, lo, hi);
    }

    /// Move slots `[lo + 1, hi]` to `[lo, hi - 1]` and clear slot `hi`.
    pub fn shift_left(&mut self, lo: usize, hi: usize) {
        debug_assert!(lo <= hi && hi < self.total_slots());
        for slot in lo..hi {
            let value = self.remainder(slot + 1);
            self.set_remainder(slot, value);
        }
        self.set_remainder(hi, 0);
        self.shift_word_left(Word::Runends, lo, hi);
        self.shift_word_left(Word::Extensions, lo, hi);
    }

    // High blocks first so each carry reads the untouched lower word.
    fn shift_word_right(&mut self, word: Word, lo: usize, hi: usize) {
        let (first, last) = (lo / SLOTS_PER_BLOCK, hi / SLOTS_PER_BLOCK);
        for block in (first..=last).rev() {
            let lo_bit = if block == first { lo % SLOTS_PER_BLOCK } else { 0 };
            let hi_bit = if block == last { hi % SLOTS_PER_BLOCK } else { 63 };
            let mask = range_mask(lo_bit, hi_bit);
            let current = self.word(block, word);
            let carry = if block > first {
                self.word(block - 1, word) >> 63
            } else {
                0
            };
            let mut moved = ((current << 1) | carry) & mask;
            if block == first {
                moved &= !(1u64 << lo_bit);
            }
            self.set_word(block, word, (current & !mask) | moved);
        }
    }

    // Low blocks first so each carry reads the untouched higher word.
    fn shift_word_left(&mut self, word: Word, lo: usize, hi: usize) {
        let (first, last) = (lo / SLOTS_PER_BLOCK, hi / SLOTS_PER_BLOCK);
        for block in first..=last {
            let lo_bit = if block == first { lo % SLOTS_PER_BLOCK } else { 0 };
            let hi_bit = if block == last { hi % SLOTS_PER_BLOCK } else { 63 };
            let mask = range_mask(lo_bit, hi_bit);
            let current = self.word(block, word);
            let carry = if block < last {
                (self.word(block + 1, word) & 1) << 63
            } else {
                0
            };
            let mut moved = ((current >> 1) | carry) & mask;
            if block == last {
                moved &= !(1u64 << hi_bit);
            }
            self.set_word(block, word, (current & !mask) | moved);
        }
    }

    /// Zero every block, leaving the header bytes alone.
    pub fn clear(&mut self) {
        self.storage.bytes_mut()[HEADER_BYTES..].fill(0);
    }

    pub fn header_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.storage.bytes_mut()[..HEADER_BYTES]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(qbits: u8, rbits: u8) -> BlockArray {
        let geometry = Geometry::new(qbits, rbits);
        let storage = Storage::heap(geometry.image_bytes()).unwrap();
        BlockArray::new(storage, geometry)
    }

    #[test]
    fn test_remainders_cross_byte_boundaries() {
        let mut blocks = array(8, 7);
        for slot in 0..blocks.total_slots() {
            blocks.set_remainder(slot, (slot as u64 * 37) & 0x7f);
        }
        for slot in 0..blocks.total_slots() {
            assert_eq!(blocks.remainder(slot), (slot as u64 * 37) & 0x7f);
        }
        // Values wider than rbits are truncated, neighbours untouched.
        blocks.set_remainder(5, 0xffff);
        assert_eq!(blocks.remainder(5), 0x7f);
        assert_eq!(blocks.remainder(4), (4 * 37) & 0x7f);
        assert_eq!(blocks.remainder(6), (6 * 37) & 0x7f);
    }

    #[test]
    fn test_select_from_crosses_blocks() {
        let mut blocks = array(8, 4);
        blocks.set_bit(Word::Runends, 3, true);
        blocks.set_bit(Word::Runends, 70, true);
        blocks.set_bit(Word::Runends, 200, true);
        assert_eq!(blocks.next_set(Word::Runends, 0), Some(3));
        assert_eq!(blocks.next_set(Word::Runends, 4), Some(70));
        assert_eq!(blocks.select_from(Word::Runends, 0, 2), Some(200));
        assert_eq!(blocks.select_from(Word::Runends, 4, 1), Some(200));
        assert_eq!(blocks.select_from(Word::Runends, 4, 2), None);
        assert_eq!(blocks.next_set(Word::Runends, 201), None);
        assert_eq!(blocks.count_ones(Word::Runends), 3);
    }

    #[test]
    fn test_shift_right_then_left_across_blocks() {
        let mut blocks = array(8, 5);
        for slot in 60..70 {
            blocks.set_remainder(slot, slot as u64 & 0x1f);
        }
        blocks.set_bit(Word::Runends, 63, true);
        blocks.set_bit(Word::Extensions, 61, true);
        blocks.set_bit(Word::Runends, 69, true);

        blocks.shift_right(60, 70);
        assert_eq!(blocks.remainder(60), 0);
        assert_eq!(blocks.remainder(64), 63 & 0x1f);
        assert_eq!(blocks.remainder(70), 69 & 0x1f);
        assert!(!blocks.bit(Word::Runends, 63));
        assert!(blocks.bit(Word::Runends, 64));
        assert!(blocks.bit(Word::Extensions, 62));
        assert!(blocks.bit(Word::Runends, 70));
        assert!(!blocks.bit(Word::Runends, 60));

        blocks.shift_left(60, 70);
        for slot in 60..70 {
            assert_eq!(blocks.remainder(slot), slot as u64 & 0x1f);
        }
        assert_eq!(blocks.remainder(70), 0);
        assert!(blocks.bit(Word::Runends, 63));
        assert!(blocks.bit(Word::Extensions, 61));
        assert!(blocks.bit(Word::Runends, 69));
        assert!(!blocks.bit(Word::Runends, 70));
        assert_eq!(blocks.count_ones(Word::Runends), 2);
    }

    #[test]
    fn test_clear_keeps_header() {
        let mut blocks = array(6, 3);
        blocks.header_bytes_mut()[0] = 9;
        blocks.set_word(1, Word::Occupieds, u64::MAX);
        blocks.clear();
        assert_eq!(blocks.word(1, Word::Occupieds), 0);
        assert_eq!(blocks.storage().bytes()[0], 9);
    }
}
