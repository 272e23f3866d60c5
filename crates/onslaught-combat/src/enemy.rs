//! Enemy lifecycle, pursuit, damage and ranged firing.
//!
//! Each pooled enemy runs `Inactive -> Active -> Dying -> Inactive`. Timed
//! behaviour (damage-flash restore, the ranged firing loop) lives in the
//! [`Scheduler`] and is cancelled the moment the enemy leaves `Active`.

use glam::Vec2;
use onslaught_common::{direction_to, facing_from_heading, heading_of, EnemyTemplateId, PoolHandle};
use tracing::{debug, warn};

use crate::catalog::{Catalog, EnemyTemplate, Tint};
use crate::collaborators::{Collaborators, MuzzleSource, SoundId};
use crate::pool::{ObjectPool, Poolable};
use crate::scheduler::{Scheduler, TaskId, TimedTask};

/// Amount added to every colour channel while an enemy flashes.
pub const DAMAGE_FLASH_BRIGHTEN: f32 = 0.2;

// ============================================================================
// Enemy instance
// ============================================================================

/// Activation state of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyState {
    /// Parked in the pool, or checked out but not yet placed
    #[default]
    Inactive,
    /// Placed in the arena and registered
    Active,
    /// Health reached zero; awaiting retirement
    Dying,
}

/// A pooled enemy.
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    template: EnemyTemplateId,
    /// Remaining health
    pub health: u32,
    /// World position
    pub position: Vec2,
    /// World units per second
    pub velocity: Vec2,
    /// Sprite heading (radians, zero = +Y)
    pub heading: f32,
    /// Lifecycle state
    pub state: EnemyState,
    /// Whether this kind runs a firing loop
    pub ranged: bool,
    /// Whether the enemy chases the pursuit target
    pub pursuing: bool,
    /// Current sprite colour
    pub tint: Tint,
    base_tint: Tint,
    flash_task: Option<TaskId>,
    fire_task: Option<TaskId>,
}

impl Enemy {
    fn parked(template: EnemyTemplateId) -> Self {
        Self {
            template,
            health: 0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            heading: 0.0,
            state: EnemyState::Inactive,
            ranged: false,
            pursuing: false,
            tint: Tint::WHITE,
            base_tint: Tint::WHITE,
            flash_task: None,
            fire_task: None,
        }
    }

    /// Template this enemy was built from.
    #[must_use]
    pub fn template(&self) -> EnemyTemplateId {
        self.template
    }

    /// Unit vector the enemy faces.
    #[must_use]
    pub fn facing(&self) -> Vec2 {
        facing_from_heading(self.heading)
    }

    /// Whether the enemy is placed and alive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == EnemyState::Active
    }

    /// Whether a damage flash is showing.
    #[must_use]
    pub fn is_flashing(&self) -> bool {
        self.flash_task.is_some()
    }

    fn cancel_tasks(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.flash_task.take() {
            scheduler.cancel(id);
        }
        if let Some(id) = self.fire_task.take() {
            scheduler.cancel(id);
        }
        self.tint = self.base_tint;
    }
}

impl Poolable for Enemy {
    type Kind = EnemyTemplateId;

    fn kind(&self) -> EnemyTemplateId {
        self.template
    }

    fn on_release(&mut self) {
        self.state = EnemyState::Inactive;
        self.velocity = Vec2::ZERO;
        self.pursuing = false;
        self.tint = self.base_tint;
        self.flash_task = None;
        self.fire_task = None;
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of one point of damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Enemy was not live (already dying, or the handle is stale)
    Ignored,
    /// Enemy took the hit and lives on
    Survived {
        /// Health left
        health: u32,
    },
    /// Enemy died; the caller retires it
    Died {
        /// Template of the dead enemy
        template: EnemyTemplateId,
        /// Score awarded for the kill
        score: u32,
    },
}

/// A shot produced by a ranged enemy's firing loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    /// Muzzle position
    pub origin: Vec2,
    /// Unit flight direction
    pub direction: Vec2,
}

// ============================================================================
// Enemy subsystem
// ============================================================================

/// Owns the enemy pool and the registry of live enemies.
#[derive(Debug)]
pub struct EnemySystem {
    pool: ObjectPool<Enemy>,
    /// Enemies placed in the arena and not yet retired
    registry: Vec<PoolHandle>,
    /// Duration of the damage flash in seconds
    flash_secs: f32,
}

impl EnemySystem {
    /// Creates an empty enemy system.
    #[must_use]
    pub fn new(flash_secs: f32) -> Self {
        Self {
            pool: ObjectPool::new("enemy", Enemy::parked),
            registry: Vec::new(),
            flash_secs,
        }
    }

    /// Constructs `count` parked enemies of one kind.
    pub fn prewarm(&mut self, template: EnemyTemplateId, count: usize) {
        self.pool.prewarm(template, count);
    }

    /// Checks an enemy of `template` out of the pool without placing it.
    pub fn checkout(&mut self, template: EnemyTemplateId) -> PoolHandle {
        self.pool.acquire(template)
    }

    /// Returns an unused checkout to the pool.
    pub fn discard(&mut self, handle: PoolHandle) {
        if let Err(err) = self.pool.release(handle) {
            warn!("Failed to discard enemy: {err}");
        }
    }

    /// Places a checked-out enemy and brings it to life.
    ///
    /// Ranged kinds start their firing loop here.
    pub fn activate(
        &mut self,
        handle: PoolHandle,
        template: &EnemyTemplate,
        position: Vec2,
        pursue: bool,
        scheduler: &mut Scheduler,
    ) -> bool {
        let Some(enemy) = self.pool.get_mut(handle) else {
            warn!("Cannot activate enemy {handle}: not checked out");
            return false;
        };

        enemy.health = template.max_health.max(1);
        enemy.position = position;
        enemy.velocity = Vec2::ZERO;
        enemy.heading = 0.0;
        enemy.state = EnemyState::Active;
        enemy.ranged = template.is_ranged();
        enemy.pursuing = pursue;
        enemy.base_tint = template.base_tint;
        enemy.tint = template.base_tint;
        enemy.flash_task = None;
        enemy.fire_task = template.ranged.map(|profile| {
            scheduler.schedule(profile.shoot_interval, TimedTask::EnemyFire { enemy: handle })
        });

        self.registry.push(handle);
        debug!("Enemy {} activated as {handle} at {position}", template.name);
        true
    }

    /// Pursuit step: every live pursuing enemy turns toward `target` and
    /// moves at its template speed.
    pub fn fixed_update(&mut self, dt: f32, target: Option<Vec2>, catalog: &Catalog) {
        for (_, enemy) in self.pool.iter_active_mut() {
            if enemy.state != EnemyState::Active {
                continue;
            }

            enemy.velocity = Vec2::ZERO;
            if let (true, Some(target)) = (enemy.pursuing, target) {
                if let Some(direction) = direction_to(enemy.position, target) {
                    let speed = catalog.enemy(enemy.template).map_or(0.0, |t| t.move_speed);
                    enemy.heading = heading_of(direction);
                    enemy.velocity = direction * speed;
                }
            }
            enemy.position += enemy.velocity * dt;
        }
    }

    /// Body contact with the player. Returns the contact damage of a live
    /// enemy; the enemy itself is unaffected.
    #[must_use]
    pub fn contact(&self, handle: PoolHandle, catalog: &Catalog) -> Option<u32> {
        let enemy = self.pool.get(handle).filter(|e| e.is_active())?;
        catalog.enemy(enemy.template).map(|t| t.contact_damage)
    }

    /// Applies one point of damage.
    pub fn take_damage(
        &mut self,
        handle: PoolHandle,
        catalog: &Catalog,
        scheduler: &mut Scheduler,
        fx: &mut Collaborators,
    ) -> DamageOutcome {
        let flash_secs = self.flash_secs;
        let Some(enemy) = self.pool.get_mut(handle).filter(|e| e.is_active()) else {
            return DamageOutcome::Ignored;
        };

        enemy.health = enemy.health.saturating_sub(1);

        if enemy.health > 0 {
            fx.play(SoundId::EnemyHit);
            if let Some(id) = enemy.flash_task.take() {
                scheduler.cancel(id);
            }
            enemy.tint = enemy.base_tint.brightened(DAMAGE_FLASH_BRIGHTEN);
            let restore = TimedTask::FlashRestore { enemy: handle };
            enemy.flash_task = Some(scheduler.schedule(flash_secs, restore));
            fx.damage_flash(handle, flash_secs);
            return DamageOutcome::Survived {
                health: enemy.health,
            };
        }

        enemy.state = EnemyState::Dying;
        enemy.velocity = Vec2::ZERO;
        enemy.cancel_tasks(scheduler);
        fx.play(SoundId::EnemyDeath);

        let score = catalog.enemy(enemy.template).map_or(0, |t| t.score_value);
        DamageOutcome::Died {
            template: enemy.template,
            score,
        }
    }

    /// Ends a damage flash. Ignored unless `task` is the enemy's current
    /// flash.
    pub fn restore_tint(&mut self, handle: PoolHandle, task: TaskId) {
        if let Some(enemy) = self.pool.get_mut(handle) {
            if enemy.flash_task == Some(task) {
                enemy.flash_task = None;
                enemy.tint = enemy.base_tint;
            }
        }
    }

    /// Runs one step of a ranged enemy's firing loop and schedules the next.
    ///
    /// Returns the shot to launch, or `None` if the loop is no longer live.
    pub fn fire_tick(
        &mut self,
        handle: PoolHandle,
        task: TaskId,
        catalog: &Catalog,
        scheduler: &mut Scheduler,
        fx: &mut Collaborators,
    ) -> Option<EnemyShot> {
        let enemy = self.pool.get_mut(handle)?;
        if !enemy.is_active() || enemy.fire_task != Some(task) {
            return None;
        }
        let profile = catalog.enemy(enemy.template)?.ranged?;

        let next = TimedTask::EnemyFire { enemy: handle };
        enemy.fire_task = Some(scheduler.schedule(profile.shoot_interval, next));

        fx.play(SoundId::Shoot);
        fx.muzzle_flash(MuzzleSource::Enemy(handle));

        let direction = enemy.facing();
        Some(EnemyShot {
            origin: enemy.position + direction * profile.muzzle_offset,
            direction,
        })
    }

    /// Finalises a death (or removes a live enemy): cancels its timed tasks,
    /// unregisters it and returns it to the pool.
    pub fn retire(&mut self, handle: PoolHandle, scheduler: &mut Scheduler) -> bool {
        let Some(enemy) = self.pool.get_mut(handle) else {
            warn!("Cannot retire enemy {handle}: not checked out");
            return false;
        };
        enemy.cancel_tasks(scheduler);
        self.registry.retain(|h| *h != handle);

        match self.pool.release(handle) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to retire enemy: {err}");
                false
            },
        }
    }

    /// Retires every checked-out enemy. Returns how many went back.
    pub fn release_all(&mut self, scheduler: &mut Scheduler) -> usize {
        for (_, enemy) in self.pool.iter_active_mut() {
            enemy.cancel_tasks(scheduler);
        }
        self.registry.clear();
        self.pool.release_all()
    }

    /// Looks up a checked-out enemy.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&Enemy> {
        self.pool.get(handle)
    }

    /// Number of registered enemies.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Positions of live ranged enemies.
    #[must_use]
    pub fn ranged_active_positions(&self) -> Vec<Vec2> {
        self.iter_active()
            .filter(|(_, e)| e.ranged)
            .map(|(_, e)| e.position)
            .collect()
    }

    /// Number of live ranged enemies.
    #[must_use]
    pub fn ranged_active_count(&self) -> usize {
        self.iter_active().filter(|(_, e)| e.ranged).count()
    }

    /// Iterates registered enemies that are alive.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &Enemy)> {
        self.registry
            .iter()
            .filter_map(|h| self.pool.get(*h).map(|e| (*h, e)))
            .filter(|(_, e)| e.is_active())
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &ObjectPool<Enemy> {
        &self.pool
    }
}
