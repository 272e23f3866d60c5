//! Pooled projectiles: launch, straight-line flight and expiry.
//!
//! A projectile is armed for collision on launch and disarmed as it goes back
//! to the pool, so exactly one collision report can claim it.

use glam::Vec2;
use onslaught_common::{heading_of, PoolError, PoolHandle};
use tracing::warn;

use crate::pool::{ObjectPool, Poolable};

/// Side that fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOwner {
    /// Fired by the player
    Player,
    /// Fired by a ranged enemy
    Enemy,
}

/// Activation state of a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileState {
    /// Parked in the pool
    #[default]
    Inactive,
    /// In flight
    Active,
}

/// Pool kind for projectiles. The shooter has a single bullet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BulletKind;

/// A bullet in flight or parked in the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// World position
    pub position: Vec2,
    /// World units per second
    pub velocity: Vec2,
    /// Sprite heading (radians, zero = +Y)
    pub heading: f32,
    /// Who fired it
    pub owner: ProjectileOwner,
    /// Activation state
    pub state: ProjectileState,
    /// Seconds since launch
    pub age: f32,
    armed: bool,
}

impl Projectile {
    fn parked() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            heading: 0.0,
            owner: ProjectileOwner::Player,
            state: ProjectileState::Inactive,
            age: 0.0,
            armed: false,
        }
    }

    /// Whether a collision report can still claim this projectile.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Poolable for Projectile {
    type Kind = BulletKind;

    fn kind(&self) -> BulletKind {
        BulletKind
    }

    fn on_release(&mut self) {
        self.state = ProjectileState::Inactive;
        self.armed = false;
        self.velocity = Vec2::ZERO;
        self.age = 0.0;
    }
}

/// Owns the bullet pool and moves every live bullet each physics step.
#[derive(Debug)]
pub struct ProjectileSystem {
    pool: ObjectPool<Projectile>,
    /// Launch speed in world units per second
    speed: f32,
    /// Seconds before an unclaimed bullet is recycled (0 = never)
    lifetime: f32,
    expired: Vec<PoolHandle>,
}

impl ProjectileSystem {
    /// Creates an empty projectile system.
    #[must_use]
    pub fn new(speed: f32, lifetime: f32) -> Self {
        Self {
            pool: ObjectPool::new("bullet", |_| Projectile::parked()),
            speed,
            lifetime,
            expired: Vec::new(),
        }
    }

    /// Constructs `count` parked bullets.
    pub fn prewarm(&mut self, count: usize) {
        self.pool.prewarm(BulletKind, count);
    }

    /// Checks a bullet out of the pool and sends it along `direction`.
    pub fn launch(&mut self, origin: Vec2, direction: Vec2, owner: ProjectileOwner) -> PoolHandle {
        let direction = direction.normalize_or_zero();
        let speed = self.speed;
        let handle = self.pool.acquire(BulletKind);
        if let Some(bullet) = self.pool.get_mut(handle) {
            bullet.position = origin;
            bullet.velocity = direction * speed;
            bullet.heading = heading_of(direction);
            bullet.owner = owner;
            bullet.state = ProjectileState::Active;
            bullet.age = 0.0;
            bullet.armed = true;
        }
        handle
    }

    /// Integrates every live bullet and recycles expired ones.
    ///
    /// Returns how many bullets expired.
    pub fn fixed_update(&mut self, dt: f32) -> usize {
        let lifetime = self.lifetime;
        self.expired.clear();

        for (handle, bullet) in self.pool.iter_active_mut() {
            bullet.position += bullet.velocity * dt;
            bullet.age += dt;
            if lifetime > 0.0 && bullet.age >= lifetime {
                self.expired.push(handle);
            }
        }

        let count = self.expired.len();
        for handle in self.expired.drain(..) {
            if let Err(err) = self.pool.release(handle) {
                warn!("Failed to recycle expired bullet: {err}");
            }
        }
        count
    }

    /// Claims a bullet for collision resolution.
    ///
    /// Returns false if the bullet is already claimed or no longer live.
    pub fn disarm(&mut self, handle: PoolHandle) -> bool {
        match self.pool.get_mut(handle) {
            Some(bullet) if bullet.armed => {
                bullet.armed = false;
                true
            },
            _ => false,
        }
    }

    /// Returns a bullet to the pool.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        self.pool.release(handle)
    }

    /// Returns every live bullet to the pool.
    pub fn release_all(&mut self) -> usize {
        self.pool.release_all()
    }

    /// Looks up a live bullet.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&Projectile> {
        self.pool.get(handle)
    }

    /// Iterates live bullets.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &Projectile)> {
        self.pool.iter_active()
    }

    /// Number of bullets in flight.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &ObjectPool<Projectile> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_sets_velocity_and_arms() {
        let mut system = ProjectileSystem::new(5.0, 0.0);
        let handle =
            system.launch(Vec2::new(1.0, 1.0), Vec2::new(0.0, 2.0), ProjectileOwner::Enemy);

        let bullet = system.get(handle).expect("live bullet");
        assert_eq!(bullet.velocity, Vec2::new(0.0, 5.0));
        assert_eq!(bullet.owner, ProjectileOwner::Enemy);
        assert_eq!(bullet.state, ProjectileState::Active);
        assert!(bullet.is_armed());
        assert!(bullet.heading.abs() < 1e-6);
    }

    #[test]
    fn test_fixed_update_moves_bullets() {
        let mut system = ProjectileSystem::new(4.0, 0.0);
        let handle = system.launch(Vec2::ZERO, Vec2::X, ProjectileOwner::Player);
        assert_eq!(system.fixed_update(0.5), 0);

        let bullet = system.get(handle).expect("live bullet");
        assert!((bullet.position - Vec2::new(2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_expired_bullets_return_to_pool() {
        let mut system = ProjectileSystem::new(4.0, 1.0);
        system.launch(Vec2::ZERO, Vec2::X, ProjectileOwner::Player);
        assert_eq!(system.fixed_update(0.6), 0);
        assert_eq!(system.fixed_update(0.6), 1);
        assert_eq!(system.active_count(), 0);
        assert_eq!(system.pool().free_count(BulletKind), 1);
    }

    #[test]
    fn test_disarm_claims_once() {
        let mut system = ProjectileSystem::new(5.0, 0.0);
        let handle = system.launch(Vec2::ZERO, Vec2::Y, ProjectileOwner::Player);
        assert!(system.disarm(handle));
        assert!(!system.disarm(handle));

        system.release(handle).expect("release");
        assert!(!system.disarm(handle));
    }

    #[test]
    fn test_reused_bullet_is_rearmed() {
        let mut system = ProjectileSystem::new(5.0, 0.0);
        system.prewarm(1);
        let first = system.launch(Vec2::ZERO, Vec2::Y, ProjectileOwner::Player);
        assert!(system.disarm(first));
        system.release(first).expect("release");

        let second = system.launch(Vec2::ZERO, Vec2::X, ProjectileOwner::Player);
        assert_eq!(second.index(), first.index());
        assert!(system.get(second).is_some_and(Projectile::is_armed));
        assert_eq!(system.pool().total_count(), 1);
    }
}
