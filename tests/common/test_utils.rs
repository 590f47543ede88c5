use adaptive_qf::{Backing, Filter, FilterConfigBuilder};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{fs, path::PathBuf};

/// Temporary filter file that is removed, together with any leftover
/// staging file, when dropped.
#[allow(dead_code)]
pub struct TestFile {
    path: PathBuf,
}

impl TestFile {
    /// Create a file path with a name based on the test name
    #[allow(dead_code)]
    pub fn new(test_name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "aqf_test_{}_{}.aqf",
            test_name,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        Self { path }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.path.clone()
    }

    #[allow(dead_code)]
    pub fn staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".resize");
        PathBuf::from(name)
    }
}

impl Drop for TestFile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
        let staging = self.staging_path();
        if staging.exists() {
            let _ = fs::remove_file(staging);
        }
    }
}

/// File-backed filter at the given path
#[allow(dead_code)]
pub fn setup_file_filter(file: &TestFile, qbits: u8, rbits: u8) -> Filter {
    let config = FilterConfigBuilder::default()
        .qbits(qbits)
        .rbits(rbits)
        .backing(Backing::File(file.path()))
        .build()
        .expect("Failed to build test config");
    Filter::create(config).expect("Failed to create file-backed filter")
}

/// Distinct random 64-bit hashes from a fixed seed
#[allow(dead_code)]
pub fn random_hashes(count: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut seen = std::collections::HashSet::with_capacity(count);
    let mut hashes = Vec::with_capacity(count);
    while hashes.len() < count {
        let hash: u64 = rng.random();
        if seen.insert(hash) {
            hashes.push(hash);
        }
    }
    hashes
}

/// Build a hash from its quotient, remainder and the bits above them
#[allow(dead_code)]
pub fn compose(qbits: u8, rbits: u8, quotient: u64, remainder: u64, high: u64) -> u64 {
    remainder | quotient << rbits | high << (u32::from(qbits) + u32::from(rbits))
}

/// Random hashes whose low `bits` bits are pairwise distinct
#[allow(dead_code)]
pub fn distinct_fingerprints(count: usize, seed: u64, bits: u32) -> Vec<u64> {
    let mask = (1u64 << bits) - 1;
    let mut seen = std::collections::HashSet::with_capacity(count);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hashes = Vec::with_capacity(count);
    while hashes.len() < count {
        let hash: u64 = rng.random();
        if seen.insert(hash & mask) {
            hashes.push(hash);
        }
    }
    hashes
}
