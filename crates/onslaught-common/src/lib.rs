//! # Onslaught Common
//!
//! Common types shared by the Onslaught combat core and its hosts.
//!
//! This crate provides:
//! - Identity types (pool handles, template ids, weapon slots)
//! - Planar geometry helpers for headings and spread angles
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
}

pub use prelude::*;
