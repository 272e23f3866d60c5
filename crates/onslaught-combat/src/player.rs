//! Player avatar: health, movement and facing.

use glam::Vec2;
use onslaught_common::{facing_from_heading, heading_of};

/// Result of damage applied to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerDamage {
    /// Health left
    pub health: u32,
    /// Health as a fraction of the maximum
    pub ratio: f32,
    /// Whether this hit killed the player
    pub died: bool,
}

/// The player-controlled shooter.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// World position
    pub position: Vec2,
    /// Sprite heading (radians, zero = +Y)
    pub heading: f32,
    health: u32,
    max_health: u32,
    /// Movement speed in world units per second
    move_speed: f32,
    /// Movement speed while reloading
    reload_speed: f32,
    /// Last polled movement direction
    movement: Vec2,
    spawn: Vec2,
}

impl Player {
    /// Creates a player at `spawn` with full health.
    #[must_use]
    pub fn new(spawn: Vec2, max_health: u32, move_speed: f32, reload_speed: f32) -> Self {
        let max_health = max_health.max(1);
        Self {
            position: spawn,
            heading: 0.0,
            health: max_health,
            max_health,
            move_speed,
            reload_speed,
            movement: Vec2::ZERO,
            spawn,
        }
    }

    /// Stores the polled movement direction. Longer-than-unit input is
    /// clamped so diagonals are not faster.
    pub fn set_movement(&mut self, direction: Vec2) {
        self.movement = direction.clamp_length_max(1.0);
    }

    /// Turns the player toward `direction`. Zero input keeps the old facing.
    pub fn set_aim(&mut self, direction: Vec2) {
        if let Some(dir) = direction.try_normalize() {
            self.heading = heading_of(dir);
        }
    }

    /// Moves the player by one physics step.
    pub fn fixed_update(&mut self, dt: f32, reloading: bool) {
        if self.is_dead() {
            return;
        }
        let speed = if reloading {
            self.reload_speed
        } else {
            self.move_speed
        };
        self.position += self.movement * speed * dt;
    }

    /// Applies `amount` damage.
    pub fn take_damage(&mut self, amount: u32) -> PlayerDamage {
        let was_alive = !self.is_dead();
        self.health = self.health.saturating_sub(amount);
        PlayerDamage {
            health: self.health,
            ratio: self.health_ratio(),
            died: was_alive && self.is_dead(),
        }
    }

    /// Unit vector the player faces.
    #[must_use]
    pub fn facing(&self) -> Vec2 {
        facing_from_heading(self.heading)
    }

    /// Point `offset` units ahead of the player.
    #[must_use]
    pub fn muzzle_point(&self, offset: f32) -> Vec2 {
        self.position + self.facing() * offset
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Health as a fraction of the maximum.
    #[must_use]
    pub fn health_ratio(&self) -> f32 {
        self.health as f32 / self.max_health as f32
    }

    /// Whether health has reached zero.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Whether the player is trying to move.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.movement != Vec2::ZERO
    }

    /// Restores full health at the spawn point.
    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.heading = 0.0;
        self.health = self.max_health;
        self.movement = Vec2::ZERO;
    }
}
