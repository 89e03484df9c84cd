//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into slot arrays via `id.0 as usize`, but callers should
//! prefer the `.index()` helpers for clarity.
//!
//! `AgentId` and `PersonId` are deliberately distinct types: an `AgentId` is
//! a *store index* that is recycled after the slot is freed, while a
//! `PersonId` is a permanent identifier assigned monotonically and never
//! reused.  The type system prevents mixing the two up.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — the type's maximum value.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an agent slot in the store.  Recycled after the slot is
    /// freed; never use it as a durable identifier across days.
    pub struct AgentId(u32);
}

typed_id! {
    /// Permanent unique identifier of one simulated person.  Assigned
    /// monotonically at creation and retired (never reused) at death.
    pub struct PersonId(u64);
}

typed_id! {
    /// Index of a tracked condition (disease) in the condition set.
    /// `u16` keeps per-condition arrays compact.
    pub struct ConditionId(u16);
}

typed_id! {
    /// Key of a mixing group (household, workplace, school, ...).
    pub struct GroupId(u32);
}
