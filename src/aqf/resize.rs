use super::config::MAX_QBITS;
use super::filter::{Filter, Fingerprint};
use super::layout::{Geometry, Header};
use super::storage::Storage;
use crate::error::{FilterError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

impl Filter {
    /// Double the number of home slots.
    ///
    /// Quotient plus remainder width stays fixed, so the quotient gains the
    /// top remainder bit: `qbits + 1`, `rbits - 1`. Every entry's known hash
    /// prefix is re-split at the new widths and written into a new array;
    /// extension bits are regrouped into the narrower chunks, dropping any
    /// tail that no longer fills a whole chunk. The old array is replaced
    /// only after every entry made it across; on failure the filter is
    /// untouched and `ResizeAborted` is returned.
    ///
    /// A file-backed filter builds the new image in `<path>.resize` and
    /// renames it over the original on success.
    pub fn resize(&mut self) -> Result<()> {
        let rbits = self.header.rbits;
        if rbits <= 1 {
            return Err(FilterError::ResizeAborted(
                "Remainder is already one bit wide".into(),
            ));
        }
        let qbits = self.header.qbits + 1;
        if qbits > MAX_QBITS {
            return Err(FilterError::ResizeAborted(format!(
                "Quotient cannot grow past {MAX_QBITS} bits"
            )));
        }
        let geometry = Geometry::new(qbits, rbits - 1);
        let original = self.path().map(Path::to_path_buf);
        let staging = original.as_deref().map(staging_path);

        let mut next = match self.rebuild(geometry, staging.as_deref()) {
            Ok(next) => next,
            Err(e) => {
                if let Some(staging) = &staging {
                    let _ = std::fs::remove_file(staging);
                }
                warn!(error = %e, "resize aborted");
                return Err(FilterError::ResizeAborted(e.to_string()));
            }
        };
        if let Some(original) = &original {
            next.blocks
                .storage_mut()
                .persist_as(original)
                .map_err(|e| FilterError::ResizeAborted(e.to_string()))?;
        }

        info!(
            qbits = geometry.qbits,
            rbits = geometry.rbits,
            entries = next.len(),
            used_slots = next.used_slots(),
            "resized filter"
        );
        *self = next;
        Ok(())
    }

    fn rebuild(&self, geometry: Geometry, staging: Option<&Path>) -> Result<Filter> {
        let storage = match staging {
            None => Storage::heap(geometry.image_bytes())?,
            Some(path) => Storage::create_file(path, geometry.image_bytes())?,
        };
        let header = Header::new(
            &geometry,
            self.header.hash_mode,
            self.header.seed,
            self.header.auto_resize,
            self.header.max_extension_chunks,
            self.header.resize_load_factor,
        );
        let mut next = Filter::from_parts(storage, geometry, header)?;
        for entry in self.entries() {
            next.reinsert(entry.fingerprint)?;
        }
        next.sync_header()?;
        Ok(next)
    }

    /// Store a known hash prefix as an entry at this filter's widths.
    fn reinsert(&mut self, fingerprint: Fingerprint) -> Result<()> {
        let rbits = u32::from(self.header.rbits);
        let (quotient, remainder) = self.split(fingerprint.bits);
        let known = fingerprint.len.saturating_sub(self.key_bits());
        let chunks = ((known / rbits) as usize).min(self.max_extension_chunks());
        let values: Vec<u64> = (1..=chunks)
            .map(|i| self.chunk(fingerprint.bits, i))
            .collect();
        let (pos, placement) = self.insertion_point(quotient, remainder);
        self.write_entry(quotient, pos, placement, remainder, &values)?;
        self.header.used_slots += 1 + chunks as u64;
        self.header.entries += 1;
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".resize");
    PathBuf::from(name)
}
