//! Named operation masks for bulk passes.
//!
//! Every slot in the arena carries a bitset of mask membership: a bulk pass
//! (health update, travel, ...) visits only the slots whose bit for the
//! pass's mask is set, so a pass over a mostly-idle population costs
//! O(slots) cheap bit tests instead of O(slots) full agent updates.
//!
//! The mask set is fixed at arena construction.  There is no late
//! registration: a `Mask` handle can only be obtained from the `MaskLayout`
//! the arena was built with, which makes "mask used before it was added"
//! unrepresentable.

/// Handle for one registered mask.  Obtained from [`MaskLayout::mask`] or
/// [`MaskLayout::handles`]; only meaningful for the arena built with the
/// same layout.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Mask(pub(crate) u8);

impl Mask {
    /// The slot bitset bit this mask occupies.
    #[inline(always)]
    pub(crate) fn bit(self) -> u32 {
        1u32 << self.0
    }
}

/// Construction-time registry of mask names.
///
/// At most 32 masks (the slot bitset is a `u32`); registering more panics at
/// construction, which is a configuration error, not a runtime condition.
#[derive(Clone, Debug)]
pub struct MaskLayout {
    names: Vec<&'static str>,
}

impl MaskLayout {
    /// Build a layout from a fixed list of mask names.
    ///
    /// # Panics
    /// Panics if more than 32 names are given or if a name repeats.
    pub fn new(names: &[&'static str]) -> Self {
        assert!(
            names.len() <= 32,
            "mask layout supports at most 32 masks, got {}",
            names.len()
        );
        for (i, name) in names.iter().enumerate() {
            assert!(
                !names[..i].contains(name),
                "duplicate mask name {name:?} in layout"
            );
        }
        Self {
            names: names.to_vec(),
        }
    }

    /// Look up the handle for `name`, if registered.
    pub fn mask(&self, name: &str) -> Option<Mask> {
        self.names
            .iter()
            .position(|n| *n == name)
            .map(|i| Mask(i as u8))
    }

    /// Handles for every registered mask, in registration order.
    pub fn handles(&self) -> impl Iterator<Item = Mask> + '_ {
        (0..self.names.len() as u8).map(Mask)
    }

    /// The name a mask was registered under (for diagnostics).
    pub fn name(&self, mask: Mask) -> &'static str {
        self.names[mask.0 as usize]
    }

    /// Number of registered masks.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
