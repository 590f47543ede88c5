//! Adaptive rank-and-select quotient filter
mod adapt;
mod blocks;
mod concurrent;
pub mod config;
mod filter;
pub mod layout;
mod owners;
mod resize;
mod runs;
mod storage;
mod traits;

pub use adapt::Extension;
pub use concurrent::ConcurrentFilter;
pub use config::{
    Backing, FilterConfig, FilterConfigBuilder, FilterConfigBuilderError, KeyEncoding,
    LockMode, OpFlags,
};
pub use filter::{Entries, Filter, Fingerprint, Insert, Match};
pub use owners::{AdaptiveFilter, InsertOutcome};
pub use traits::{FilterStats, Stats};
