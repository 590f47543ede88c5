use crate::error::{FilterError, Result};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The flat byte region holding the header and the block array.
pub enum Storage {
    Heap(Vec<u8>),
    Mapped {
        map: MmapMut,
        // Kept open for the lifetime of the mapping.
        _file: File,
        path: PathBuf,
    },
}

impl Storage {
    /// Zeroed heap buffer. Reports allocation failure instead of aborting.
    pub fn heap(len: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|e| {
            FilterError::AllocationError(format!("{len} bytes: {e}"))
        })?;
        buf.resize(len, 0);
        Ok(Storage::Heap(buf))
    }

    /// Create (or truncate) `path`, size it to `len` zero bytes and map it.
    pub fn create_file(path: &Path, len: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len as u64).map_err(|e| {
            FilterError::AllocationError(format!(
                "Cannot size {} to {len} bytes: {e}",
                path.display()
            ))
        })?;
        // SAFETY: the file was just created by us and stays open alongside
        // the mapping; the filter is the only writer.
        let map = unsafe { MmapMut::map_mut(&file)? };
        debug!(path = %path.display(), len, "mapped new filter file");
        Ok(Storage::Mapped {
            map,
            _file: file,
            path: path.to_path_buf(),
        })
    }

    /// Map an existing filter file read-write.
    pub fn open_file(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        // SAFETY: callers must not modify the file behind the filter's back
        // while it is open.
        let map = unsafe { MmapMut::map_mut(&file)? };
        debug!(path = %path.display(), len = map.len(), "mapped existing filter file");
        Ok(Storage::Mapped {
            map,
            _file: file,
            path: path.to_path_buf(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Storage::Heap(buf) => &buf[..],
            Storage::Mapped { map, .. } => &map[..],
        }
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Heap(buf) => &mut buf[..],
            Storage::Mapped { map, .. } => &mut map[..],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Storage::Heap(_) => None,
            Storage::Mapped { path, .. } => Some(path),
        }
    }

    /// Flush a mapping and move its file to `to`, replacing whatever is
    /// there. The mapping stays valid.
    pub fn persist_as(&mut self, to: &Path) -> Result<()> {
        self.flush()?;
        if let Storage::Mapped { path, .. } = self {
            std::fs::rename(&*path, to)?;
            *path = to.to_path_buf();
        }
        Ok(())
    }

    /// Sync a mapping to disk. No-op on the heap.
    pub fn flush(&self) -> Result<()> {
        match self {
            Storage::Heap(_) => Ok(()),
            Storage::Mapped { map, path, .. } => map.flush().map_err(|e| {
                FilterError::StorageError(format!(
                    "Failed to flush {}: {e}",
                    path.display()
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_storage_is_zeroed() {
        let storage = Storage::heap(4096).unwrap();
        assert_eq!(storage.len(), 4096);
        assert!(storage.bytes().iter().all(|&b| b == 0));
        assert!(storage.path().is_none());
        assert!(storage.flush().is_ok());
    }

    #[test]
    fn test_mapped_storage_persists_writes() {
        let path = std::env::temp_dir()
            .join(format!("aqf_storage_unit_{}.bin", std::process::id()));
        {
            let mut storage = Storage::create_file(&path, 256).unwrap();
            storage.bytes_mut()[10] = 0xab;
            storage.flush().unwrap();
            assert_eq!(storage.path(), Some(path.as_path()));
        }
        let storage = Storage::open_file(&path).unwrap();
        assert_eq!(storage.len(), 256);
        assert_eq!(storage.bytes()[10], 0xab);
        drop(storage);
        let _ = std::fs::remove_file(&path);
    }
}
