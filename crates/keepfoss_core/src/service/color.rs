//! Accent color selection for new notes.

use crate::model::note::COLOR_INDEX_COUNT;
use rand::Rng;

/// Chooses the accent color slot for a new note.
pub trait ColorPicker {
    /// Returns a value in `0..COLOR_INDEX_COUNT`.
    fn pick(&self) -> u8;
}

/// Uniform choice over the whole palette.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomColorPicker;

impl ColorPicker for RandomColorPicker {
    fn pick(&self) -> u8 {
        rand::rng().random_range(0..COLOR_INDEX_COUNT)
    }
}

/// Always returns the same slot. Useful for deterministic callers and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedColorPicker(pub u8);

impl ColorPicker for FixedColorPicker {
    fn pick(&self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorPicker, RandomColorPicker};
    use crate::model::note::COLOR_INDEX_COUNT;
    use std::collections::BTreeSet;

    #[test]
    fn random_picker_stays_in_palette_and_covers_it() {
        let picker = RandomColorPicker;
        let seen: BTreeSet<u8> = (0..2_000).map(|_| picker.pick()).collect();
        assert!(seen.iter().all(|value| *value < COLOR_INDEX_COUNT));
        assert_eq!(seen.len(), usize::from(COLOR_INDEX_COUNT));
    }
}
