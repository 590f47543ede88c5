use super::blocks::BlockArray;
use super::config::{Backing, FilterConfig, FilterConfigBuilder, KeyEncoding, OpFlags};
use super::layout::{Geometry, Header, SLOTS_PER_BLOCK, Word};
use super::runs::{Placement, RunEntries};
use super::storage::Storage;
use crate::bits::low_mask;
use crate::error::{FilterError, Result};
use crate::hash::HashMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// The hash prefix an entry stands for: the low `len` bits of every hash
/// the entry matches.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Fingerprint {
    pub bits: u64,
    pub len: u32,
}

impl Fingerprint {
    pub fn of(hash: u64, len: u32) -> Self {
        Self {
            bits: hash & low_mask(len),
            len,
        }
    }

    /// Whether `hash` agrees with this fingerprint on all known bits.
    pub fn matches(&self, hash: u64) -> bool {
        hash & low_mask(self.len) == self.bits
    }
}

/// A stored entry that matched a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Slot of the entry's base remainder.
    pub slot: usize,
    pub quotient: usize,
    /// Base remainder with every continuation chunk concatenated above it.
    pub remainder: u64,
    /// Effective length in bits: `rbits * (1 + chunks)`.
    pub length: u32,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// A fresh fingerprint was written as `count` entries starting at `slot`.
    Inserted {
        slot: usize,
        count: u64,
        fingerprint: Fingerprint,
    },
    /// An entry already matches the hash. Whether that is the same key again
    /// or a different key colliding is for the caller to decide.
    DuplicateOrCollision(Match),
}

/// Adaptive quotient filter over one flat block buffer.
///
/// A 64-bit hash splits into a remainder (low `rbits` bits), a quotient
/// (next `qbits` bits) and extension chunks (the bits above, `rbits` at a
/// time). Entries live in runs addressed by rank/select over the occupied
/// and run-end bitmaps; adaptivity lengthens colliding entries with
/// continuation slots.
///
/// The filter owns its buffer; for a file backing the on-disk bytes are the
/// in-memory bytes. Mutations take `&mut self`. Use [`ConcurrentFilter`] to
/// share one between threads.
///
/// [`ConcurrentFilter`]: crate::ConcurrentFilter
pub struct Filter {
    pub(super) blocks: BlockArray,
    pub(super) header: Header,
}

impl Filter {
    /// Heap-backed filter with default settings.
    pub fn new(qbits: u8, rbits: u8) -> Result<Self> {
        let config = FilterConfigBuilder::default()
            .qbits(qbits)
            .rbits(rbits)
            .build()
            .map_err(|e| FilterError::InvalidConfig(e.to_string()))?;
        Self::create(config)
    }

    pub fn create(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        let geometry = Geometry::new(config.qbits, config.rbits);
        let storage = match &config.backing {
            Backing::Heap => Storage::heap(geometry.image_bytes())?,
            Backing::File(path) => Storage::create_file(path, geometry.image_bytes())?,
        };
        let header = Header::new(
            &geometry,
            config.hash_mode,
            config.seed,
            config.auto_resize,
            config.max_extension_chunks.unwrap_or(u8::MAX),
            config.resize_load_factor,
        );
        let filter = Self::from_parts(storage, geometry, header)?;
        debug!(
            qbits = config.qbits,
            rbits = config.rbits,
            total_slots = geometry.total_slots,
            bytes = geometry.image_bytes(),
            "created filter"
        );
        Ok(filter)
    }

    pub(super) fn from_parts(
        storage: Storage,
        geometry: Geometry,
        header: Header,
    ) -> Result<Self> {
        let mut filter = Self {
            blocks: BlockArray::new(storage, geometry),
            header,
        };
        filter.sync_header()?;
        Ok(filter)
    }

    /// Map an existing filter file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let storage = Storage::open_file(path.as_ref())?;
        Self::load(storage)
    }

    /// Load a filter image (as produced by [`Filter::as_bytes`]) onto the
    /// heap.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut storage = Storage::heap(bytes.len())?;
        storage.bytes_mut().copy_from_slice(bytes);
        Self::load(storage)
    }

    fn load(storage: Storage) -> Result<Self> {
        let header = Header::read_from(storage.bytes())?;
        let geometry = header.geometry(storage.len())?;
        debug!(
            qbits = header.qbits,
            rbits = header.rbits,
            entries = header.entries,
            "loaded filter"
        );
        Ok(Self {
            blocks: BlockArray::new(storage, geometry),
            header,
        })
    }

    pub(super) fn sync_header(&mut self) -> Result<()> {
        self.header.write_to(self.blocks.header_bytes_mut())
    }

    pub fn qbits(&self) -> u8 {
        self.header.qbits
    }

    pub fn rbits(&self) -> u8 {
        self.header.rbits
    }

    /// Bits of the hash consumed by quotient and base remainder.
    pub fn key_bits(&self) -> u32 {
        u32::from(self.header.qbits) + u32::from(self.header.rbits)
    }

    pub fn hash_mode(&self) -> HashMode {
        self.header.hash_mode
    }

    pub fn seed(&self) -> u32 {
        self.header.seed
    }

    pub fn total_slots(&self) -> usize {
        self.blocks.total_slots()
    }

    pub fn used_slots(&self) -> usize {
        self.header.used_slots as usize
    }

    /// Number of stored entries, counting every copy.
    pub fn len(&self) -> usize {
        self.header.entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.entries == 0
    }

    pub fn auto_resize(&self) -> bool {
        self.header.auto_resize
    }

    pub fn set_auto_resize(&mut self, enabled: bool) -> Result<()> {
        self.header.auto_resize = enabled;
        self.sync_header()
    }

    /// Most continuation slots an entry may carry at the current widths.
    pub fn max_extension_chunks(&self) -> usize {
        let available = (64 - self.key_bits()) / u32::from(self.header.rbits);
        available.min(u32::from(self.header.max_extension_chunks)) as usize
    }

    pub fn path(&self) -> Option<&Path> {
        self.blocks.storage().path()
    }

    /// The whole image: header followed by the blocks.
    pub fn as_bytes(&self) -> &[u8] {
        self.blocks.storage().bytes()
    }

    pub fn flush(&self) -> Result<()> {
        self.blocks.storage().flush()
    }

    pub fn hash_key(&self, key: u64, flags: OpFlags) -> u64 {
        match flags.key {
            KeyEncoding::Raw => self.header.hash_mode.hash_u64(key, self.header.seed),
            KeyEncoding::Hash => key,
        }
    }

    pub fn hash_item(&self, item: &[u8]) -> u64 {
        self.header.hash_mode.hash_bytes(item, self.header.seed)
    }

    /// `(quotient, base remainder)` of a hash.
    pub(super) fn split(&self, hash: u64) -> (usize, u64) {
        let rbits = u32::from(self.header.rbits);
        let quotient = (hash >> rbits) & low_mask(u32::from(self.header.qbits));
        (quotient as usize, hash & low_mask(rbits))
    }

    /// Extension chunk `i` (1-based) of a hash.
    pub(super) fn chunk(&self, hash: u64, i: usize) -> u64 {
        let rbits = u32::from(self.header.rbits);
        let shift = self.key_bits() + (i as u32 - 1) * rbits;
        hash.checked_shr(shift).unwrap_or(0) & low_mask(rbits)
    }

    pub(super) fn entry_matches(&self, slot: usize, chunks: usize, hash: u64) -> bool {
        let (_, remainder) = self.split(hash);
        self.blocks.remainder(slot) == remainder
            && (1..=chunks).all(|i| self.blocks.remainder(slot + i) == self.chunk(hash, i))
    }

    pub(super) fn entry_match(&self, quotient: usize, slot: usize, chunks: usize) -> Match {
        let rbits = u32::from(self.header.rbits);
        let key_bits = self.key_bits();
        let base = self.blocks.remainder(slot);
        let mut remainder = base;
        let mut bits = ((quotient as u64) << rbits) | base;
        for i in 1..=chunks {
            let value = self.blocks.remainder(slot + i);
            remainder |= value.checked_shl(i as u32 * rbits).unwrap_or(0);
            bits |= value
                .checked_shl(key_bits + (i as u32 - 1) * rbits)
                .unwrap_or(0);
        }
        let length = rbits * (1 + chunks as u32);
        Match {
            slot,
            quotient,
            remainder,
            length,
            fingerprint: Fingerprint {
                bits,
                len: key_bits + chunks as u32 * rbits,
            },
        }
    }

    /// Entries of the quotient's run whose fingerprint `hash` extends, in
    /// storage order.
    pub(super) fn matches_hash(&self, hash: u64) -> impl Iterator<Item = Match> + '_ {
        let (quotient, remainder) = self.split(hash);
        self.blocks
            .run_entries(quotient)
            .take_while(move |&(slot, _)| self.blocks.remainder(slot) <= remainder)
            .filter(move |&(slot, chunks)| self.entry_matches(slot, chunks, hash))
            .map(move |(slot, chunks)| self.entry_match(quotient, slot, chunks))
    }

    /// Where a new entry with base `remainder` goes: after every entry with
    /// a base at or below it.
    pub(super) fn insertion_point(&self, quotient: usize, remainder: u64) -> (usize, Placement) {
        let Some((start, end)) = self.blocks.run_bounds(quotient) else {
            return (self.blocks.run_start(quotient), Placement::NewRun);
        };
        self.blocks
            .entries_in(start, end)
            .find(|&(slot, _)| self.blocks.remainder(slot) > remainder)
            .map_or((end + 1, Placement::Append { end }), |(slot, _)| {
                (slot, Placement::Within)
            })
    }

    /// Write a base slot followed by its continuation chunks.
    pub(super) fn write_entry(
        &mut self,
        quotient: usize,
        pos: usize,
        placement: Placement,
        remainder: u64,
        chunks: &[u64],
    ) -> Result<()> {
        let mut placement = placement;
        for (i, value) in std::iter::once(remainder).chain(chunks.iter().copied()).enumerate() {
            let at = pos + i;
            self.blocks.insert_slot(quotient, at, value, i > 0, placement)?;
            placement = placement.after(at);
        }
        Ok(())
    }

    /// Insert `count` copies of a key.
    ///
    /// If an entry already matches, nothing is written and the first match
    /// is reported. With auto-resize on, the filter grows first when the
    /// insert would not fit or would push the load past the configured
    /// factor.
    pub fn insert(&mut self, key: u64, count: u64, flags: OpFlags) -> Result<Insert> {
        if count == 0 {
            return Err(FilterError::InvalidArgument(
                "Insert count must be at least 1".into(),
            ));
        }
        let need = usize::try_from(count)
            .map_err(|_| FilterError::InvalidArgument(format!("Count {count} too large")))?;
        let hash = self.hash_key(key, flags);
        let mut grown = false;
        loop {
            if let Some(found) = self.matches_hash(hash).next() {
                return Ok(Insert::DuplicateOrCollision(found));
            }
            let (quotient, remainder) = self.split(hash);
            let (pos, placement) = self.insertion_point(quotient, remainder);
            let room = self.blocks.has_room(pos, need);
            let crowded = !grown
                && self.header.auto_resize
                && (self.used_slots() + need) as f64
                    > self.header.resize_load_factor * (1u64 << self.header.qbits) as f64;

            if (!room || crowded) && self.header.auto_resize && self.header.rbits > 1 {
                match self.resize() {
                    Ok(()) => {
                        grown = true;
                        continue;
                    }
                    Err(e) => warn!(error = %e, "auto-resize failed"),
                }
            }
            if !room {
                return Err(FilterError::NoSpace);
            }

            let mut placement = placement;
            for copy in 0..need {
                let at = pos + copy;
                self.blocks.insert_slot(quotient, at, remainder, false, placement)?;
                placement = placement.after(at);
            }
            self.header.used_slots += count;
            self.header.entries += count;
            self.sync_header()?;
            return Ok(Insert::Inserted {
                slot: pos,
                count,
                fingerprint: Fingerprint::of(hash, self.key_bits()),
            });
        }
    }

    /// First entry matching the key, if any.
    pub fn query(&self, key: u64, flags: OpFlags) -> Option<Match> {
        self.matches_hash(self.hash_key(key, flags)).next()
    }

    pub fn contains(&self, key: u64, flags: OpFlags) -> bool {
        self.query(key, flags).is_some()
    }

    /// Every entry matching the key, in storage order.
    pub fn matches(&self, key: u64, flags: OpFlags) -> impl Iterator<Item = Match> + '_ {
        self.matches_hash(self.hash_key(key, flags))
    }

    /// Number of entries matching the key.
    pub fn count(&self, key: u64, flags: OpFlags) -> u64 {
        self.matches(key, flags).count() as u64
    }

    /// Remove one entry matching the key: the longest match, the most
    /// recently inserted among equals.
    pub fn remove(&mut self, key: u64, flags: OpFlags) -> Result<Option<Match>> {
        let hash = self.hash_key(key, flags);
        let target = self.matches_hash(hash).fold(None, |best: Option<Match>, m| match best {
            Some(best) if best.length > m.length => Some(best),
            _ => Some(m),
        });
        if let Some(found) = target {
            self.remove_entry(&found)?;
        }
        Ok(target)
    }

    /// Remove the entry starting at `slot`, which must match the key.
    pub fn remove_at(&mut self, slot: usize, key: u64, flags: OpFlags) -> Result<Match> {
        let hash = self.hash_key(key, flags);
        let found = self
            .matches_hash(hash)
            .find(|m| m.slot == slot)
            .ok_or(FilterError::SlotMismatch { slot })?;
        self.remove_entry(&found)?;
        Ok(found)
    }

    fn remove_entry(&mut self, entry: &Match) -> Result<()> {
        let slots = (entry.length / u32::from(self.header.rbits)) as usize;
        for _ in 0..slots {
            self.blocks.remove_slot(entry.quotient, entry.slot)?;
        }
        self.header.used_slots -= slots as u64;
        self.header.entries -= 1;
        self.sync_header()
    }

    pub fn insert_item(&mut self, item: &[u8]) -> Result<Insert> {
        let hash = self.hash_item(item);
        self.insert(hash, 1, OpFlags::hashed())
    }

    pub fn contains_item(&self, item: &[u8]) -> bool {
        self.contains(self.hash_item(item), OpFlags::hashed())
    }

    pub fn remove_item(&mut self, item: &[u8]) -> Result<bool> {
        let hash = self.hash_item(item);
        Ok(self.remove(hash, OpFlags::hashed())?.is_some())
    }

    /// Every stored entry in ascending quotient order.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            filter: self,
            next_quotient: 0,
            run: None,
        }
    }

    /// Drop every entry, keeping widths and settings.
    pub fn clear(&mut self) -> Result<()> {
        self.blocks.clear();
        self.header.used_slots = 0;
        self.header.entries = 0;
        self.sync_header()
    }

    /// Walk the whole array and check every structural invariant.
    pub fn verify(&self) -> Result<()> {
        let corrupted = |msg: String| Err(FilterError::Corrupted(msg));
        let blocks = &self.blocks;

        if blocks.offset(0) != 0 {
            return corrupted("Block 0 has a non-zero offset".into());
        }
        for block in 1..blocks.nblocks() {
            let start = block * SLOTS_PER_BLOCK;
            let expected = blocks.run_end(start - 1).map_or(0, |end| end + 1 - start);
            if blocks.offset(block) != expected {
                return corrupted(format!(
                    "Block {block} offset {} expected {expected}",
                    blocks.offset(block)
                ));
            }
        }

        let occupieds = blocks.count_ones(Word::Occupieds);
        if occupieds != blocks.count_ones(Word::Runends) {
            return corrupted(format!(
                "{occupieds} occupied quotients but {} run ends",
                blocks.count_ones(Word::Runends)
            ));
        }
        if blocks
            .next_set(Word::Occupieds, 1usize << self.header.qbits)
            .is_some()
        {
            return corrupted("Occupied bit past the last quotient".into());
        }

        let max_chunks = self.max_extension_chunks();
        let mut used = 0u64;
        let mut entries = 0u64;
        let mut extensions = 0u64;
        let mut prev_end: Option<usize> = None;
        let mut quotient = 0;
        while let Some(q) = blocks.next_set(Word::Occupieds, quotient) {
            quotient = q + 1;
            let start = prev_end.map_or(q, |end| q.max(end + 1));
            let Some(end) = blocks.next_set(Word::Runends, start) else {
                return corrupted(format!("Run of quotient {q} has no end"));
            };
            if blocks.run_bounds(q) != Some((start, end)) {
                return corrupted(format!(
                    "Run of quotient {q} located at {:?}, walked {start}..={end}",
                    blocks.run_bounds(q)
                ));
            }
            if blocks.bit(Word::Extensions, start) {
                return corrupted(format!("Run of quotient {q} starts with a continuation"));
            }
            let mut prev_base = None;
            for (slot, chunks) in blocks.entries_in(start, end) {
                let base = blocks.remainder(slot);
                if prev_base.is_some_and(|prev| prev > base) {
                    return corrupted(format!("Run of quotient {q} unsorted at slot {slot}"));
                }
                if chunks > max_chunks {
                    return corrupted(format!("Entry at slot {slot} has {chunks} chunks"));
                }
                prev_base = Some(base);
                entries += 1;
                extensions += chunks as u64;
            }
            used += (end - start + 1) as u64;
            prev_end = Some(end);
        }

        if extensions != blocks.count_ones(Word::Extensions) {
            return corrupted("Continuation bit outside any run".into());
        }
        if used != self.header.used_slots || entries != self.header.entries {
            return corrupted(format!(
                "Header counts {} slots / {} entries, blocks hold {used} / {entries}",
                self.header.used_slots, self.header.entries
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Filter {{ qbits: {}, rbits: {}, total_slots: {}, used_slots: {}, entries: {}, hash_mode: {:?}, auto_resize: {}, path: {:?} }}",
            self.header.qbits,
            self.header.rbits,
            self.total_slots(),
            self.header.used_slots,
            self.header.entries,
            self.header.hash_mode,
            self.header.auto_resize,
            self.path()
        )
    }
}

/// Iterator over every stored entry, see [`Filter::entries`].
pub struct Entries<'a> {
    filter: &'a Filter,
    next_quotient: usize,
    run: Option<(usize, RunEntries<'a>)>,
}

impl Iterator for Entries<'_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        loop {
            if let Some((quotient, run)) = &mut self.run {
                if let Some((slot, chunks)) = run.next() {
                    return Some(self.filter.entry_match(*quotient, slot, chunks));
                }
                self.run = None;
            }
            let quotient = self
                .filter
                .blocks
                .next_set(Word::Occupieds, self.next_quotient)?;
            self.next_quotient = quotient + 1;
            self.run = Some((quotient, self.filter.blocks.run_entries(quotient)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed() -> OpFlags {
        OpFlags::hashed()
    }

    #[test]
    fn test_split_and_chunks() {
        let filter = Filter::new(8, 7).unwrap();
        let hash = 0b1010_1010u64 << 15 | 0x42 << 7 | 0x11;
        assert_eq!(filter.split(hash), (0x42, 0x11));
        assert_eq!(filter.chunk(hash, 1), 0b010_1010);
        assert_eq!(filter.chunk(hash, 2), 0b1);
        // (64 - 15) / 7
        assert_eq!(filter.max_extension_chunks(), 7);
    }

    #[test]
    fn test_insert_query_remove() {
        let mut filter = Filter::new(8, 7).unwrap();
        assert!(matches!(
            filter.insert(1, 1, hashed()).unwrap(),
            Insert::Inserted { slot: 0, count: 1, .. }
        ));
        let found = filter.query(1, hashed()).unwrap();
        assert_eq!((found.slot, found.remainder, found.length), (0, 1, 7));
        assert!(filter.query(2, hashed()).is_none());
        assert_eq!(filter.len(), 1);

        assert_eq!(filter.remove(1, hashed()).unwrap(), Some(found));
        assert!(filter.query(1, hashed()).is_none());
        assert_eq!(filter.remove(1, hashed()).unwrap(), None);
        assert!(filter.is_empty());
        filter.verify().unwrap();
    }

    #[test]
    fn test_count_copies() {
        let mut filter = Filter::new(8, 7).unwrap();
        filter.insert(77, 3, hashed()).unwrap();
        filter.insert(77 + (1 << 7), 1, hashed()).unwrap();
        assert_eq!(filter.count(77, hashed()), 3);
        assert_eq!(filter.used_slots(), 4);
        filter.remove(77, hashed()).unwrap();
        assert_eq!(filter.count(77, hashed()), 2);
        filter.verify().unwrap();
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut filter = Filter::new(6, 4).unwrap();
        assert!(matches!(
            filter.insert(5, 0, hashed()),
            Err(FilterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_runs_stay_sorted() {
        let mut filter = Filter::new(8, 7).unwrap();
        let quotient = 9u64 << 7;
        for remainder in [50u64, 99, 0, 127] {
            filter.insert(quotient | remainder, 1, hashed()).unwrap();
        }
        let bases: Vec<u64> = filter.entries().map(|m| m.remainder).collect();
        assert_eq!(bases, vec![0, 50, 99, 127]);
        filter.verify().unwrap();
    }

    #[test]
    fn test_equal_bases_keep_insertion_order() {
        let mut filter = Filter::new(8, 7).unwrap();
        let quotient = 9u64 << 7;
        // Same base remainder 3, first chunks 5, 2 and 7.
        let first = 5 << 15 | quotient | 3;
        let second = 2 << 15 | quotient | 3;
        let third = 7 << 15 | quotient | 3;
        filter.insert(quotient | 50, 1, hashed()).unwrap();
        filter.insert(first, 1, hashed()).unwrap();
        filter.insert(quotient | 99, 1, hashed()).unwrap();
        let Insert::DuplicateOrCollision(found) = filter.insert(second, 1, hashed()).unwrap()
        else {
            panic!("equal bases must collide");
        };
        filter.extend(found.slot, second, first, hashed()).unwrap();
        assert!(matches!(
            filter.insert(third, 1, hashed()).unwrap(),
            Insert::Inserted { .. }
        ));
        filter.insert(quotient, 1, hashed()).unwrap();
        filter.insert(quotient | 127, 1, hashed()).unwrap();

        // Equal bases stay in arrival order whatever their chunks.
        let stored: Vec<u64> = filter.entries().map(|m| m.remainder).collect();
        assert_eq!(stored, vec![0, 3 | 5 << 7, 3 | 2 << 7, 3, 50, 99, 127]);
        let slots: Vec<usize> = [first, second, third]
            .iter()
            .map(|&hash| filter.query(hash, hashed()).unwrap().slot)
            .collect();
        assert!(slots.windows(2).all(|w| w[0] < w[1]), "{slots:?}");
        filter.verify().unwrap();
    }

    #[test]
    fn test_copies_share_one_base() {
        let mut filter = Filter::new(8, 7).unwrap();
        let quotient = 9u64 << 7;
        filter.insert(quotient | 40, 1, hashed()).unwrap();
        filter.insert(quotient | 3, 2, hashed()).unwrap();
        let stored: Vec<(usize, u64)> = filter.entries().map(|m| (m.slot, m.remainder)).collect();
        assert_eq!(stored, vec![(9, 3), (10, 3), (11, 40)]);
        filter.verify().unwrap();
    }

    #[test]
    fn test_item_helpers() {
        let mut filter = Filter::new(10, 8).unwrap();
        filter.insert_item(b"apple").unwrap();
        assert!(filter.contains_item(b"apple"));
        assert!(filter.remove_item(b"apple").unwrap());
        assert!(!filter.contains_item(b"apple"));
    }

    #[test]
    fn test_clear() {
        let mut filter = Filter::new(8, 6).unwrap();
        for key in 0..50 {
            filter.insert(key, 1, OpFlags::default()).unwrap();
        }
        filter.clear().unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter.entries().count(), 0);
        filter.verify().unwrap();
    }
}
