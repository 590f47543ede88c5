//! Owner tracking on top of [`Filter`].
//!
//! The filter cannot tell a repeated key from a different key with the same
//! fingerprint. [`AdaptiveFilter`] remembers, for every stored fingerprint,
//! the full hashes it was inserted for, and uses them to extend colliding
//! entries on insert and to adapt entries that produce false positives on
//! query.
//!
//! A fingerprint can have several owners: entries that could not be told
//! apart within the extension limit, or that a resize re-chunked into the
//! same bits, are stored as identical copies.
use super::config::{FilterConfig, KeyEncoding, OpFlags};
use super::filter::{Filter, Fingerprint, Insert};
use crate::error::{FilterError, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key was already present.
    Duplicate,
    /// The key collided with another and both fingerprints were lengthened.
    Extended { length: u32 },
}

pub struct AdaptiveFilter {
    filter: Filter,
    owners: HashMap<Fingerprint, Vec<u64>>,
}

impl AdaptiveFilter {
    /// Wrap an empty filter. Entries already stored have no known owner and
    /// always answer as present.
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            owners: HashMap::new(),
        }
    }

    pub fn create(config: FilterConfig) -> Result<Self> {
        Ok(Self::new(Filter::create(config)?))
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn into_inner(self) -> Filter {
        self.filter
    }

    pub fn len(&self) -> usize {
        self.filter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }

    /// Number of keys with a recorded entry.
    pub fn owners(&self) -> usize {
        self.owners.values().map(Vec::len).sum()
    }

    fn is_owner(&self, fingerprint: &Fingerprint, hash: u64) -> bool {
        self.owners
            .get(fingerprint)
            .is_some_and(|owners| owners.contains(&hash))
    }

    fn add_owner(&mut self, fingerprint: Fingerprint, hash: u64) {
        self.owners.entry(fingerprint).or_default().push(hash);
    }

    fn take_owner(&mut self, fingerprint: &Fingerprint, hash: u64) {
        if let Some(owners) = self.owners.get_mut(fingerprint) {
            if let Some(at) = owners.iter().position(|&owner| owner == hash) {
                owners.swap_remove(at);
            }
            if owners.is_empty() {
                self.owners.remove(fingerprint);
            }
        }
    }

    pub fn insert(&mut self, key: u64, flags: OpFlags) -> Result<InsertOutcome> {
        let hash = self.filter.hash_key(key, flags);
        let flags = flags.with_key(KeyEncoding::Hash);
        let mut retried = false;
        loop {
            let qbits = self.filter.qbits();
            let inserted = self.filter.insert(hash, 1, flags);
            if self.filter.qbits() != qbits {
                self.rebuild_owners();
            }
            let found = match inserted? {
                Insert::Inserted { fingerprint, .. } => {
                    self.add_owner(fingerprint, hash);
                    return Ok(InsertOutcome::Inserted);
                }
                Insert::DuplicateOrCollision(found) => found,
            };

            if self
                .filter
                .matches(hash, flags)
                .any(|m| self.is_owner(&m.fingerprint, hash))
            {
                return Ok(InsertOutcome::Duplicate);
            }
            let owner = self
                .owners
                .get(&found.fingerprint)
                .and_then(|owners| owners.first().copied())
                .ok_or(FilterError::OwnerNotFound(found.fingerprint))?;
            match self.filter.extend(found.slot, hash, owner, flags) {
                Ok(ext) => {
                    self.take_owner(&found.fingerprint, owner);
                    self.add_owner(ext.existing.fingerprint, owner);
                    self.add_owner(ext.incoming.fingerprint, hash);
                    return Ok(InsertOutcome::Extended { length: ext.length });
                }
                Err(FilterError::NoSpace) if self.filter.auto_resize() && !retried => {
                    retried = true;
                    self.resize()?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Membership test that learns from its own false positives.
    ///
    /// If every matching entry belongs to some other key, the answer is
    /// `false` and the first such entry is lengthened so this key stops
    /// matching it.
    pub fn contains(&mut self, key: u64, flags: OpFlags) -> Result<bool> {
        let hash = self.filter.hash_key(key, flags);
        let flags = flags.with_key(KeyEncoding::Hash);
        let mut first_foreign = None;
        for found in self.filter.matches(hash, flags) {
            match self.owners.get(&found.fingerprint) {
                None => return Ok(true),
                Some(owners) if owners.contains(&hash) => return Ok(true),
                Some(owners) => {
                    if first_foreign.is_none() {
                        first_foreign = owners.first().map(|&owner| (found, owner));
                    }
                }
            }
        }
        let Some((found, owner)) = first_foreign else {
            return Ok(false);
        };

        match self.filter.adapt(found.slot, owner, hash, flags) {
            Ok(adapted) => {
                self.take_owner(&found.fingerprint, owner);
                self.add_owner(adapted.fingerprint, owner);
            }
            Err(e @ (FilterError::ExtensionLimit { .. } | FilterError::NoSpace)) => {
                debug!(error = %e, slot = found.slot, "could not adapt false positive");
            }
            Err(e) => return Err(e),
        }
        Ok(false)
    }

    /// Remove the key's own entry. Entries owned by other keys that merely
    /// match are left alone.
    pub fn remove(&mut self, key: u64, flags: OpFlags) -> Result<bool> {
        let hash = self.filter.hash_key(key, flags);
        let flags = flags.with_key(KeyEncoding::Hash);
        let owned = self
            .filter
            .matches(hash, flags)
            .find(|found| self.is_owner(&found.fingerprint, hash));
        let Some(found) = owned else {
            return Ok(false);
        };
        self.filter.remove_at(found.slot, hash, flags)?;
        self.take_owner(&found.fingerprint, hash);
        Ok(true)
    }

    pub fn resize(&mut self) -> Result<()> {
        self.filter.resize()?;
        self.rebuild_owners();
        Ok(())
    }

    /// Re-key every owner after fingerprints changed shape.
    ///
    /// Each owner goes to the longest matching fingerprint that still has an
    /// unclaimed copy; owners of entries that became identical share one
    /// fingerprint.
    fn rebuild_owners(&mut self) {
        let flags = OpFlags::hashed();
        let mut unclaimed: HashMap<Fingerprint, usize> = HashMap::new();
        for entry in self.filter.entries() {
            *unclaimed.entry(entry.fingerprint).or_default() += 1;
        }
        let mut hashes: Vec<u64> = self.owners.values().flatten().copied().collect();
        hashes.sort_unstable();

        let mut owners: HashMap<Fingerprint, Vec<u64>> =
            HashMap::with_capacity(self.owners.len());
        for hash in hashes {
            let mut candidates: Vec<Fingerprint> = self
                .filter
                .matches(hash, flags)
                .map(|found| found.fingerprint)
                .collect();
            candidates.sort_by_key(|fingerprint| std::cmp::Reverse(fingerprint.len));
            let claimed = candidates
                .iter()
                .find(|&&fingerprint| unclaimed.get(&fingerprint).is_some_and(|&n| n > 0))
                .or(candidates.first());
            let Some(&fingerprint) = claimed else {
                warn!(hash, "owner has no matching entry after resize");
                continue;
            };
            if let Some(n) = unclaimed.get_mut(&fingerprint) {
                *n = n.saturating_sub(1);
            }
            owners.entry(fingerprint).or_default().push(hash);
        }
        debug!(owners = owners.len(), "rebuilt owner table");
        self.owners = owners;
    }
}

impl std::fmt::Debug for AdaptiveFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AdaptiveFilter {{ filter: {:?}, owners: {} }}",
            self.filter,
            self.owners.len()
        )
    }
}
