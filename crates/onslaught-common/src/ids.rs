//! Identity types for pooled instances and immutable templates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an instance owned by an object pool.
///
/// The index names the instance slot and is reused when the instance is
/// recycled. The generation changes on every checkout, so a handle kept
/// past its release no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Creates a handle from its parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the instance slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the checkout generation.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (gen {})", self.index, self.generation)
    }
}

/// Identifies an enemy template in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyTemplateId(u16);

impl EnemyTemplateId {
    /// Creates a template id from a raw catalog index.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw catalog index.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Identifies a weapon template in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponTemplateId(u16);

impl WeaponTemplateId {
    /// Creates a template id from a raw catalog index.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw catalog index.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// One of the player's two weapon slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponSlot {
    /// First slot, active at the start of a run.
    #[default]
    Primary,
    /// Second slot.
    Secondary,
}

impl WeaponSlot {
    /// Number of weapon slots.
    pub const COUNT: usize = 2;

    /// Maps an input slot index to a slot.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Primary),
            1 => Some(Self::Secondary),
            _ => None,
        }
    }

    /// Returns the slot's index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }

    /// Returns the other slot.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}
