//! Planar geometry helpers.
//!
//! Headings are measured in radians with zero facing world +Y ("up"), which
//! is the sprite convention of the shooter: a heading is the atan2 angle of
//! the facing vector minus a quarter turn.

use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

/// Heading (radians, zero = +Y) of a direction vector.
#[must_use]
pub fn heading_of(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x) - FRAC_PI_2
}

/// Unit facing vector for a heading.
#[must_use]
pub fn facing_from_heading(heading: f32) -> Vec2 {
    Vec2::new(-heading.sin(), heading.cos())
}

/// Unit vector from `from` toward `to`, or `None` when they coincide.
#[must_use]
pub fn direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    (to - from).try_normalize()
}

/// Rotates `v` counter-clockwise by `angle` radians.
#[must_use]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Unit vector pointing to the right of `facing`.
#[must_use]
pub fn right_of(facing: Vec2) -> Vec2 {
    -facing.perp()
}
