//! Error types for Onslaught.

use thiserror::Error;

use crate::ids::{EnemyTemplateId, PoolHandle, WeaponTemplateId};

/// Top-level error type for Onslaught operations.
#[derive(Debug, Error)]
pub enum OnslaughtError {
    /// Object pool misuse
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Template catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid pool releases.
///
/// These are programmer errors. The simulation logs them and keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Handle index was never issued by this pool
    #[error("instance #{index} does not belong to this pool")]
    UnknownHandle {
        /// Slot index carried by the handle
        index: u32,
    },

    /// Handle refers to an earlier life of a reused instance
    #[error("handle {0} refers to a previous checkout")]
    StaleHandle(PoolHandle),

    /// Instance is already sitting in its free list
    #[error("instance {0} is already free")]
    AlreadyFree(PoolHandle),
}

/// Template lookup and roster errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The spawn roster has no templates
    #[error("spawn roster is empty")]
    EmptyRoster,

    /// Enemy template id out of range
    #[error("unknown enemy template {0:?}")]
    UnknownEnemyTemplate(EnemyTemplateId),

    /// Weapon template id out of range
    #[error("unknown weapon template {0:?}")]
    UnknownWeaponTemplate(WeaponTemplateId),

    /// The loadout needs one weapon per slot
    #[error("loadout needs {expected} weapons, got {actual}")]
    IncompleteLoadout {
        /// Required weapon count
        expected: usize,
        /// Weapons supplied
        actual: usize,
    },
}

/// Result type alias for Onslaught operations.
pub type OnslaughtResult<T> = Result<T, OnslaughtError>;
