//! Image layout: a fixed 128-byte header followed by the block array.
use crate::aqf::config::MAX_QBITS;
use crate::error::{FilterError, Result};
use crate::hash::HashMode;
use bincode::{Decode, Encode};

pub const MAGIC: [u8; 8] = *b"AQFILTER";
pub const VERSION: u32 = 1;
pub const HEADER_BYTES: usize = 128;

pub const SLOTS_PER_BLOCK: usize = 64;
/// offset + occupieds + runends + extensions, each one u64.
pub const BLOCK_META_BYTES: usize = 32;

/// Byte offset of each bitmap word inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    Offset = 0,
    Occupieds = 8,
    Runends = 16,
    Extensions = 24,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Header {
    pub magic: [u8; 8],
    pub version: u32,
    pub qbits: u8,
    pub rbits: u8,
    pub hash_mode: HashMode,
    pub auto_resize: bool,
    pub max_extension_chunks: u8,
    pub seed: u32,
    pub nblocks: u64,
    pub total_slots: u64,
    pub used_slots: u64,
    pub entries: u64,
    pub resize_load_factor: f64,
    pub reserved: [u8; 32],
}

fn header_config() -> impl bincode::config::Config {
    bincode::config::standard().with_fixed_int_encoding()
}

impl Header {
    pub fn new(
        geometry: &Geometry,
        hash_mode: HashMode,
        seed: u32,
        auto_resize: bool,
        max_extension_chunks: u8,
        resize_load_factor: f64,
    ) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            qbits: geometry.qbits,
            rbits: geometry.rbits,
            hash_mode,
            auto_resize,
            max_extension_chunks,
            seed,
            nblocks: geometry.nblocks as u64,
            total_slots: geometry.total_slots as u64,
            used_slots: 0,
            entries: 0,
            resize_load_factor,
            reserved: [0; 32],
        }
    }

    pub fn write_to(&self, dst: &mut [u8]) -> Result<()> {
        let dst = dst.get_mut(..HEADER_BYTES).ok_or_else(|| {
            FilterError::StorageError("Image shorter than header".into())
        })?;
        dst.fill(0);
        bincode::encode_into_slice(self, dst, header_config())?;
        Ok(())
    }

    pub fn read_from(src: &[u8]) -> Result<Self> {
        let src = src.get(..HEADER_BYTES).ok_or_else(|| {
            FilterError::Corrupted("Image shorter than header".into())
        })?;
        if src[..MAGIC.len()] != MAGIC {
            return Err(FilterError::Corrupted("Bad magic".into()));
        }
        let (header, _): (Header, usize) =
            bincode::decode_from_slice(src, header_config())?;
        if header.version != VERSION {
            return Err(FilterError::Corrupted(format!(
                "Unsupported version {}",
                header.version
            )));
        }
        Ok(header)
    }

    /// Check the stored geometry against what `qbits`/`rbits` imply and
    /// against the actual image length.
    pub fn geometry(&self, image_len: usize) -> Result<Geometry> {
        if self.qbits == 0
            || self.qbits > MAX_QBITS
            || self.rbits == 0
            || u32::from(self.qbits) + u32::from(self.rbits) > 64
        {
            return Err(FilterError::Corrupted(format!(
                "Invalid widths qbits={} rbits={}",
                self.qbits, self.rbits
            )));
        }
        let geometry = Geometry::new(self.qbits, self.rbits);
        if geometry.nblocks as u64 != self.nblocks
            || geometry.total_slots as u64 != self.total_slots
        {
            return Err(FilterError::Corrupted(
                "Block count does not match quotient width".into(),
            ));
        }
        if geometry.image_bytes() != image_len {
            return Err(FilterError::Corrupted(format!(
                "Image is {image_len} bytes, expected {}",
                geometry.image_bytes()
            )));
        }
        if self.used_slots > self.total_slots || self.entries > self.used_slots {
            return Err(FilterError::Corrupted("Slot counters out of range".into()));
        }
        Ok(geometry)
    }
}

/// Sizes derived from the quotient and remainder widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub qbits: u8,
    pub rbits: u8,
    pub nblocks: usize,
    pub total_slots: usize,
    pub block_bytes: usize,
}

impl Geometry {
    pub fn new(qbits: u8, rbits: u8) -> Self {
        let home_slots = 1usize << qbits;
        let margin = (10.0 * (home_slots as f64).sqrt()).ceil() as usize;
        let nblocks = (home_slots + margin).div_ceil(SLOTS_PER_BLOCK);
        Self {
            qbits,
            rbits,
            nblocks,
            total_slots: nblocks * SLOTS_PER_BLOCK,
            block_bytes: BLOCK_META_BYTES + 8 * rbits as usize,
        }
    }

    pub fn home_slots(&self) -> usize {
        1 << self.qbits
    }

    pub fn image_bytes(&self) -> usize {
        HEADER_BYTES + self.nblocks * self.block_bytes
    }
}
