use bincode::{Decode, Encode};
use fnv::FnvHasher;
use murmur3::murmur3_x64_128;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::io::Cursor;

/// How the filter turns a raw key into a 64-bit hash.
///
/// The filter only ever sees the resulting hash: the low `rbits` bits are the
/// remainder, the next `qbits` bits the quotient, and everything above
/// `qbits + rbits` feeds fingerprint extensions. A hash function therefore
/// needs good mixing across all 64 bits, not just the low ones.
///
/// - `Murmur3`: low 64 bits of murmur3 x64_128 over the little-endian key.
/// - `Fnv`: 64-bit FNV-1a. Cheap, weaker mixing in the high bits.
/// - `Invertible`: a bijective 64-bit mix, so a stored full hash can be
///   turned back into its key with [`invert_hash64`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode,
)]
pub enum HashMode {
    #[default]
    Murmur3,
    Fnv,
    Invertible,
}

impl HashMode {
    /// Hash a raw `u64` key.
    pub fn hash_u64(self, key: u64, seed: u32) -> u64 {
        match self {
            HashMode::Murmur3 => hash_murmur64(&key.to_le_bytes(), seed),
            HashMode::Fnv => hash_fnv64(&key.to_le_bytes(), seed),
            HashMode::Invertible => invertible_hash64(key ^ u64::from(seed)),
        }
    }

    /// Hash an arbitrary byte key. `Invertible` mixes the FNV digest of the
    /// bytes, which keeps it bijective over digests rather than over keys.
    pub fn hash_bytes(self, key: &[u8], seed: u32) -> u64 {
        match self {
            HashMode::Murmur3 => hash_murmur64(key, seed),
            HashMode::Fnv => hash_fnv64(key, seed),
            HashMode::Invertible => {
                invertible_hash64(hash_fnv64(key, seed) ^ u64::from(seed))
            }
        }
    }
}

pub(crate) fn hash_murmur64(key: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(key);
    murmur3_x64_128(&mut cursor, seed).expect("Failed to compute Murmur3 hash")
        as u64
}

pub(crate) fn hash_fnv64(key: &[u8], seed: u32) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write_u32(seed);
    hasher.write(key);
    hasher.finish()
}

/// Thomas Wang's 64-bit integer mix. Every step is invertible, so the whole
/// function is a bijection on `u64`.
pub fn invertible_hash64(key: u64) -> u64 {
    let mut key = (!key).wrapping_add(key << 21);
    key ^= key >> 24;
    key = key.wrapping_mul(265);
    key ^= key >> 14;
    key = key.wrapping_mul(21);
    key ^= key >> 28;
    key.wrapping_add(key << 31)
}

/// Inverse of [`invertible_hash64`].
pub fn invert_hash64(hash: u64) -> u64 {
    let mut key = hash;

    // key + (key << 31)
    let tmp = key.wrapping_sub(key << 31);
    key = key.wrapping_sub(tmp << 31);

    // key ^ (key >> 28)
    let tmp = key ^ (key >> 28);
    key ^= tmp >> 28;

    // key * 21
    key = key.wrapping_mul(14_933_078_535_860_113_213);

    // key ^ (key >> 14)
    let mut tmp = key ^ (key >> 14);
    tmp = key ^ (tmp >> 14);
    tmp = key ^ (tmp >> 14);
    key ^= tmp >> 14;

    // key * 265
    key = key.wrapping_mul(15_244_667_743_933_553_977);

    // key ^ (key >> 24)
    let tmp = key ^ (key >> 24);
    key ^= tmp >> 24;

    // (!key) + (key << 21)
    let mut tmp = !key;
    tmp = !(key.wrapping_sub(tmp << 21));
    tmp = !(key.wrapping_sub(tmp << 21));
    !(key.wrapping_sub(tmp << 21))
}
