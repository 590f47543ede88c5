use super::filter::Filter;
use serde::{Deserialize, Serialize};

/// Size and accuracy figures of a filter.
pub trait FilterStats {
    /// Home slots, `2^qbits`.
    fn capacity(&self) -> usize;
    /// Stored entries.
    fn len(&self) -> usize;
    fn used_slots(&self) -> usize;
    /// Used slots over home slots.
    fn load_factor(&self) -> f64;
    /// Expected chance that a random non-member matches at the current load,
    /// `load * 2^-rbits`. Extended entries only make this smaller.
    fn false_positive_rate(&self) -> f64;
}

impl FilterStats for Filter {
    fn capacity(&self) -> usize {
        self.blocks.geometry().home_slots()
    }

    fn len(&self) -> usize {
        Filter::len(self)
    }

    fn used_slots(&self) -> usize {
        Filter::used_slots(self)
    }

    fn load_factor(&self) -> f64 {
        Filter::used_slots(self) as f64 / FilterStats::capacity(self) as f64
    }

    fn false_positive_rate(&self) -> f64 {
        self.load_factor() * 2f64.powi(-i32::from(self.rbits()))
    }
}

/// Snapshot of a filter's settings and figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub qbits: u8,
    pub rbits: u8,
    pub capacity: usize,
    pub total_slots: usize,
    pub used_slots: usize,
    pub entries: usize,
    pub load_factor: f64,
    pub false_positive_rate: f64,
    pub max_extension_chunks: usize,
    pub auto_resize: bool,
    pub bytes: usize,
}

impl Filter {
    pub fn stats(&self) -> Stats {
        Stats {
            qbits: self.qbits(),
            rbits: self.rbits(),
            capacity: FilterStats::capacity(self),
            total_slots: self.total_slots(),
            used_slots: Filter::used_slots(self),
            entries: Filter::len(self),
            load_factor: self.load_factor(),
            false_positive_rate: self.false_positive_rate(),
            max_extension_chunks: self.max_extension_chunks(),
            auto_resize: self.auto_resize(),
            bytes: self.as_bytes().len(),
        }
    }
}
