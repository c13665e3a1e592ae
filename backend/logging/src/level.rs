//! The process-wide minimum severity threshold.

use std::sync::atomic::{AtomicU8, Ordering};

use tracelog_core::Level;

/// Current threshold. Reads are lock-free; concurrent writers are
/// last-write-wins.
#[derive(Debug)]
pub struct LevelController {
    raw: AtomicU8,
}

impl LevelController {
    pub fn new(initial: Level) -> Self {
        Self {
            raw: AtomicU8::new(initial.as_u8()),
        }
    }

    pub fn current(&self) -> Level {
        Level::from_u8(self.raw.load(Ordering::Acquire)).unwrap_or(Level::Info)
    }

    /// Returns `true` when the threshold actually changed.
    pub fn set(&self, level: Level) -> bool {
        self.raw.swap(level.as_u8(), Ordering::AcqRel) != level.as_u8()
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.current()
    }
}
