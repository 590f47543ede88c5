//! Word-level bitmap primitives: rank, select and range masks over `u64`.
//!
//! Bit `i` of a word is slot `i` of a block (LSB first). Everything higher in
//! the engine reduces to these on single words; crossing blocks is done by
//! the callers one word at a time.

/// Mask with bits `lo..=hi` set. Requires `lo <= hi < 64`.
#[inline]
pub fn range_mask(lo: usize, hi: usize) -> u64 {
    debug_assert!(lo <= hi && hi < 64);
    (u64::MAX >> (63 - hi)) & (u64::MAX << lo)
}

/// Mask with the low `bits` bits set; `bits` may be 64.
#[inline]
pub fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Number of set bits at or before `pos`.
#[inline]
pub fn rank(word: u64, pos: usize) -> u32 {
    (word & range_mask(0, pos)).count_ones()
}

/// Position of the `k`-th set bit (0-indexed), or `None` when `word` has
/// `k` or fewer set bits.
#[inline]
pub fn select(word: u64, k: u32) -> Option<usize> {
    if k >= word.count_ones() {
        return None;
    }
    let mut word = word;
    let mut k = k;
    let mut base = 0;
    loop {
        let ones = (word & 0xff).count_ones();
        if k < ones {
            break;
        }
        k -= ones;
        word >>= 8;
        base += 8;
    }
    let mut byte = word & 0xff;
    for _ in 0..k {
        byte &= byte - 1;
    }
    Some(base + byte.trailing_zeros() as usize)
}
