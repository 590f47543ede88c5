use super::adapt::Extension;
use super::config::{FilterConfig, LockMode, OpFlags};
use super::filter::{Filter, Insert, Match};
use super::traits::Stats;
use crate::error::{FilterError, Result};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

/// A [`Filter`] shared between threads behind one filter-wide lock.
///
/// Mutations (insert, remove, extend, adapt, resize) hold the write lock for
/// their whole duration, so a cascading shift is never observed half done.
/// Queries share the read lock. With [`LockMode::NonBlocking`] an operation
/// that cannot take the lock at once fails with `LockUnavailable` before
/// touching anything.
pub struct ConcurrentFilter {
    inner: RwLock<Filter>,
}

impl ConcurrentFilter {
    pub fn new(filter: Filter) -> Self {
        Self {
            inner: RwLock::new(filter),
        }
    }

    pub fn create(config: FilterConfig) -> Result<Self> {
        Ok(Self::new(Filter::create(config)?))
    }

    pub fn into_inner(self) -> Result<Filter> {
        self.inner
            .into_inner()
            .map_err(|_| FilterError::LockError("Filter lock poisoned".to_string()))
    }

    fn read(&self, mode: LockMode) -> Result<RwLockReadGuard<'_, Filter>> {
        match mode {
            LockMode::NonBlocking => self.inner.try_read().map_err(|e| match e {
                TryLockError::WouldBlock => FilterError::LockUnavailable,
                TryLockError::Poisoned(_) => {
                    FilterError::LockError("Failed to read filter".to_string())
                }
            }),
            LockMode::Blocking | LockMode::None => self
                .inner
                .read()
                .map_err(|_| FilterError::LockError("Failed to read filter".to_string())),
        }
    }

    fn write(&self, mode: LockMode) -> Result<RwLockWriteGuard<'_, Filter>> {
        match mode {
            LockMode::NonBlocking => self.inner.try_write().map_err(|e| match e {
                TryLockError::WouldBlock => FilterError::LockUnavailable,
                TryLockError::Poisoned(_) => {
                    FilterError::LockError("Failed to write filter".to_string())
                }
            }),
            LockMode::Blocking | LockMode::None => self
                .inner
                .write()
                .map_err(|_| FilterError::LockError("Failed to write filter".to_string())),
        }
    }

    pub fn insert(&self, key: u64, count: u64, flags: OpFlags) -> Result<Insert> {
        self.write(flags.lock)?.insert(key, count, flags)
    }

    pub fn query(&self, key: u64, flags: OpFlags) -> Result<Option<Match>> {
        Ok(self.read(flags.lock)?.query(key, flags))
    }

    pub fn contains(&self, key: u64, flags: OpFlags) -> Result<bool> {
        Ok(self.read(flags.lock)?.contains(key, flags))
    }

    pub fn count(&self, key: u64, flags: OpFlags) -> Result<u64> {
        Ok(self.read(flags.lock)?.count(key, flags))
    }

    pub fn remove(&self, key: u64, flags: OpFlags) -> Result<Option<Match>> {
        self.write(flags.lock)?.remove(key, flags)
    }

    pub fn extend(
        &self,
        slot: usize,
        incoming: u64,
        owner: u64,
        flags: OpFlags,
    ) -> Result<Extension> {
        self.write(flags.lock)?.extend(slot, incoming, owner, flags)
    }

    pub fn adapt(
        &self,
        slot: usize,
        owner: u64,
        non_member: u64,
        flags: OpFlags,
    ) -> Result<Match> {
        self.write(flags.lock)?.adapt(slot, owner, non_member, flags)
    }

    pub fn resize(&self, lock: LockMode) -> Result<()> {
        self.write(lock)?.resize()
    }

    pub fn set_auto_resize(&self, enabled: bool) -> Result<()> {
        self.write(LockMode::Blocking)?.set_auto_resize(enabled)
    }

    pub fn stats(&self) -> Result<Stats> {
        Ok(self.read(LockMode::Blocking)?.stats())
    }

    pub fn flush(&self) -> Result<()> {
        self.read(LockMode::Blocking)?.flush()
    }

    /// Run `f` under the read lock.
    pub fn with_read<T>(&self, f: impl FnOnce(&Filter) -> T) -> Result<T> {
        let guard = self.read(LockMode::Blocking)?;
        Ok(f(&guard))
    }

    /// Run `f` under the write lock.
    pub fn with_write<T>(&self, f: impl FnOnce(&mut Filter) -> T) -> Result<T> {
        let mut guard = self.write(LockMode::Blocking)?;
        Ok(f(&mut guard))
    }
}

impl std::fmt::Debug for ConcurrentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(filter) => write!(f, "ConcurrentFilter {{ {filter:?} }}"),
            Err(_) => write!(f, "ConcurrentFilter {{ <locked> }}"),
        }
    }
}
