//! Adaptive Quotient Filter (AQF) with heap or memory-mapped file storage.
//!
//! An approximate membership filter: inserts, queries, counts and deletes
//! with no false negatives and a false-positive rate of roughly
//! `load * 2^-rbits`. On top of that it adapts: when two different keys
//! share a fingerprint, both stored fingerprints are lengthened with more
//! hash bits until they differ, so the same false positive is not repeated.
//!
//! HowTo:
//!    * Hash: every key becomes a 64-bit hash. The low `rbits` bits are the
//!      remainder, the next `qbits` bits the quotient, everything above feeds
//!      fingerprint extensions `rbits` bits at a time.
//!    * Blocks: slots are grouped in blocks of 64, each with an occupied, a
//!      run-end and an extension bitmap plus 64 packed remainders. All blocks
//!      sit back to back in one flat buffer behind a fixed header.
//!    * Runs: the entries of one quotient form a sorted run. Runs are found
//!      with rank over occupieds and select over run-ends and may spill
//!      past their home block.
//!
//! Insertion:
//!     * Locate the quotient's run; if an entry already matches, report it
//!       as a duplicate or collision and write nothing.
//!     * Otherwise shift the slots from the insertion point up to the next
//!       empty slot one position right and write the remainder.
//! Adaptivity:
//!     * `extend` lengthens a colliding entry with its owner's hash bits and
//!       stores the incoming key as an entry of the same length.
//!     * `adapt` lengthens a stored entry until it stops matching a known
//!       false positive.
//!     * `AdaptiveFilter` keeps the owner table needed to drive both.
//! Resize:
//!     * `qbits + 1`, `rbits - 1`; entries are re-split and copied into a new
//!       array which replaces the old one only on success.

pub mod aqf;
mod bits;
pub mod common;
mod error;
pub mod hash;

pub use aqf::{
    AdaptiveFilter, Backing, ConcurrentFilter, Entries, Extension, Filter, FilterConfig,
    FilterConfigBuilder, FilterConfigBuilderError, FilterStats, Fingerprint, Insert,
    InsertOutcome, KeyEncoding, LockMode, Match, OpFlags, Stats,
};
pub use error::{FilterError, Result};
pub use hash::{HashMode, invert_hash64, invertible_hash64};
