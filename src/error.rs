use crate::aqf::Fingerprint;
use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Error, Debug)]
pub enum FilterError {
    /// A shift reached the physical end of the slot array.
    #[error("No space left: shift reached the end of the slot array")]
    NoSpace,

    /// Non-blocking lock attempt hit contention. Always safe to retry.
    #[error("Lock unavailable: filter is in use")]
    LockUnavailable,

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Allocation failed: {0}")]
    AllocationError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Slot {slot} does not start an entry matching the given hash")]
    SlotMismatch { slot: usize },

    #[error("Hashes do not collide on quotient and remainder")]
    NotColliding,

    #[error("Fingerprint is already at its maximum length of {length} bits")]
    ExtensionLimit { length: u32 },

    #[error("Resize aborted: {0}")]
    ResizeAborted(String),

    #[error("Corrupted filter layout: {0}")]
    Corrupted(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("No owner recorded for fingerprint {0:?}")]
    OwnerNotFound(Fingerprint),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncodeError> for FilterError {
    fn from(err: EncodeError) -> Self {
        FilterError::SerializationError(err.to_string())
    }
}

impl From<DecodeError> for FilterError {
    fn from(err: DecodeError) -> Self {
        FilterError::SerializationError(err.to_string())
    }
}
