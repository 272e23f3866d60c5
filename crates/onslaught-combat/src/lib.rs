//! # Onslaught Combat
//!
//! Combat simulation core of a top-down arcade shooter.
//!
//! This crate provides:
//! - A generic kind-keyed object pool with FIFO reuse
//! - Pooled projectiles and enemies with their per-tick behaviour
//! - The player's weapon state machine (fire, incremental reload, switch)
//! - An adaptive spawn director with a ranged concurrency cap
//! - A collision report bus that resolves hits into damage, deaths and score
//! - A cooperative timer queue standing in for suspended waits
//! - [`CombatSession`](session::CombatSession), which owns and steps all of it
//!
//! Rendering, audio, HUD and input are reached through the traits in
//! [`collaborators`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod collaborators;
pub mod config;
pub mod enemy;
pub mod events;
pub mod player;
pub mod pool;
pub mod projectile;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod spawn;
pub mod weapon;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::collaborators::*;
    pub use crate::config::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::player::*;
    pub use crate::pool::*;
    pub use crate::projectile::*;
    pub use crate::scheduler::*;
    pub use crate::score::*;
    pub use crate::session::*;
    pub use crate::spawn::*;
    pub use crate::weapon::*;
}
