use crate::error::{FilterError, Result};
use crate::hash::HashMode;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Widest quotient accepted at creation. 2^40 slots is already a
/// multi-terabyte filter.
pub const MAX_QBITS: u8 = 40;

/// Where the flat block buffer lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backing {
    #[default]
    Heap,
    /// Memory-mapped file. The file is created (or truncated) at `create`.
    File(PathBuf),
}

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned")]
pub struct FilterConfig {
    /// Quotient width; the filter has 2^qbits home slots
    #[builder(default = "16")]
    pub qbits: u8,

    /// Base remainder width stored per slot
    #[builder(default = "8")]
    pub rbits: u8,

    /// Hash applied to raw keys
    #[builder(default = "HashMode::Murmur3")]
    pub hash_mode: HashMode,

    /// Seed passed to the hash function
    #[builder(default = "0")]
    pub seed: u32,

    /// Grow automatically when an insert runs out of space
    #[builder(default = "false")]
    pub auto_resize: bool,

    /// Cap on continuation slots per entry. `None` allows as many as the
    /// 64-bit hash can feed.
    #[builder(default = "None")]
    pub max_extension_chunks: Option<u8>,

    /// Used-slot fraction of 2^qbits past which auto-resize grows the filter
    /// before inserting
    #[builder(default = "0.95")]
    pub resize_load_factor: f64,

    #[builder(default = "Backing::Heap")]
    pub backing: Backing,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.qbits == 0 {
            return Err(FilterError::InvalidConfig(
                "Quotient bits must be greater than 0".into(),
            ));
        }
        if self.qbits > MAX_QBITS {
            return Err(FilterError::InvalidConfig(format!(
                "Quotient bits must be at most {MAX_QBITS}"
            )));
        }
        if self.rbits == 0 {
            return Err(FilterError::InvalidConfig(
                "Remainder bits must be greater than 0".into(),
            ));
        }
        if u32::from(self.qbits) + u32::from(self.rbits) > 64 {
            return Err(FilterError::InvalidConfig(
                "Quotient and remainder bits must fit in a 64-bit hash".into(),
            ));
        }
        if !(self.resize_load_factor > 0.0 && self.resize_load_factor <= 1.0) {
            return Err(FilterError::InvalidConfig(
                "Resize load factor must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Locking behaviour of an operation on a [`ConcurrentFilter`].
///
/// An owned [`Filter`] is already exclusive through `&mut self`, so it
/// accepts any mode and never blocks.
///
/// [`ConcurrentFilter`]: crate::ConcurrentFilter
/// [`Filter`]: crate::Filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockMode {
    /// Wait for the lock.
    #[default]
    Blocking,
    /// Fail with `LockUnavailable` instead of waiting.
    NonBlocking,
    /// No lock of its own. On a shared handle the filter-wide lock is still
    /// taken (blocking); unlocked access goes through an owned `Filter`.
    None,
}

/// Whether the key handed to an operation still needs hashing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEncoding {
    /// Raw key, hashed with the filter's [`HashMode`].
    #[default]
    Raw,
    /// Caller already supplies the 64-bit hash.
    Hash,
}

/// Per-operation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpFlags {
    pub lock: LockMode,
    pub key: KeyEncoding,
}

impl OpFlags {
    /// Blocking lock, key is a pre-computed hash.
    pub const fn hashed() -> Self {
        Self {
            lock: LockMode::Blocking,
            key: KeyEncoding::Hash,
        }
    }

    pub const fn with_lock(mut self, lock: LockMode) -> Self {
        self.lock = lock;
        self
    }

    pub const fn with_key(mut self, key: KeyEncoding) -> Self {
        self.key = key;
        self
    }
}
