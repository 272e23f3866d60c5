//! Collision reports in, combat effects out.
//!
//! The broad-phase pushes [`CombatReport`]s onto the bus from wherever it
//! runs. Once per physics step, after everything has moved, the session
//! drains the bus and resolves each report against the live world: health
//! changes, pool returns, score. Every effect is also published as a
//! [`CombatEvent`] for hosts and tests.

use crossbeam_channel::{unbounded, Receiver, Sender};
use onslaught_common::{EnemyTemplateId, PoolHandle};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::collaborators::Collaborators;
use crate::enemy::{DamageOutcome, EnemySystem};
use crate::player::Player;
use crate::projectile::ProjectileSystem;
use crate::scheduler::Scheduler;
use crate::score::Scoreboard;

// ============================================================================
// Reports and events
// ============================================================================

/// What a projectile touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionTarget {
    /// A pooled enemy
    Enemy(PoolHandle),
    /// The player
    Player,
    /// Walls, props, anything without health
    Neutral,
}

/// An overlap reported by the broad-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatReport {
    /// A projectile touched something
    ProjectileHit {
        /// The projectile
        projectile: PoolHandle,
        /// What it touched
        target: CollisionTarget,
    },
    /// An enemy body touched the player
    EnemyContact {
        /// The enemy
        enemy: PoolHandle,
    },
}

/// An effect produced by resolving a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatEvent {
    /// A projectile was consumed
    ProjectileSpent {
        /// The projectile, now back in its pool
        projectile: PoolHandle,
        /// What it hit
        target: CollisionTarget,
    },
    /// An enemy lost health and survived
    EnemyHit {
        /// The enemy
        enemy: PoolHandle,
        /// Health left
        health: u32,
    },
    /// An enemy died and was returned to its pool
    EnemyKilled {
        /// The enemy's final handle
        enemy: PoolHandle,
        /// Its template
        template: EnemyTemplateId,
        /// Points awarded
        score: u32,
        /// Run score after the award
        total: u64,
    },
    /// The player lost health
    PlayerHit {
        /// Damage taken
        damage: u32,
        /// Health left
        health: u32,
    },
    /// The player's health reached zero
    PlayerDied,
}

/// Mutable view of everything collision resolution touches.
pub struct CombatWorld<'a> {
    /// Live projectiles
    pub projectiles: &'a mut ProjectileSystem,
    /// Live enemies
    pub enemies: &'a mut EnemySystem,
    /// The player
    pub player: &'a mut Player,
    /// Run score
    pub score: &'a mut Scoreboard,
    /// Timed tasks of the run
    pub scheduler: &'a mut Scheduler,
    /// Templates
    pub catalog: &'a Catalog,
    /// Output sinks
    pub fx: &'a mut Collaborators,
    /// Damage a projectile deals to the player
    pub bullet_damage: u32,
}

// ============================================================================
// Bus
// ============================================================================

/// Channel of collision reports awaiting resolution.
#[derive(Debug)]
pub struct CombatBus {
    sender: Sender<CombatReport>,
    receiver: Receiver<CombatReport>,
}

impl Default for CombatBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Creates a sender handle for a broad-phase.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatReport> {
        self.sender.clone()
    }

    /// Queues a report.
    pub fn report(&self, report: CombatReport) {
        // The bus owns a receiver, so the channel cannot be disconnected.
        let _ = self.sender.send(report);
    }

    /// Number of reports waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Drops every waiting report.
    pub fn clear(&self) -> usize {
        self.receiver.try_iter().count()
    }

    /// Drains the bus and applies every report to `world`.
    pub fn dispatch(&self, world: &mut CombatWorld<'_>) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        while let Ok(report) = self.receiver.try_recv() {
            match report {
                CombatReport::ProjectileHit { projectile, target } => {
                    resolve_projectile(world, projectile, target, &mut events);
                },
                CombatReport::EnemyContact { enemy } => {
                    if let Some(damage) = world.enemies.contact(enemy, world.catalog) {
                        damage_player(world, damage, &mut events);
                    }
                },
            }
        }
        events
    }
}

fn resolve_projectile(
    world: &mut CombatWorld<'_>,
    projectile: PoolHandle,
    target: CollisionTarget,
    events: &mut Vec<CombatEvent>,
) {
    // Only the first report for a projectile counts.
    if !world.projectiles.disarm(projectile) {
        return;
    }
    if let Err(err) = world.projectiles.release(projectile) {
        warn!("Failed to recycle projectile: {err}");
    }
    events.push(CombatEvent::ProjectileSpent { projectile, target });

    match target {
        CollisionTarget::Enemy(enemy) => {
            let outcome = world
                .enemies
                .take_damage(enemy, world.catalog, world.scheduler, world.fx);
            match outcome {
                DamageOutcome::Survived { health } => {
                    events.push(CombatEvent::EnemyHit { enemy, health });
                },
                DamageOutcome::Died { template, score } => {
                    world.enemies.retire(enemy, world.scheduler);
                    let total = world.score.add(score);
                    world.fx.update_score(total);
                    debug!("Enemy {enemy} killed for {score} points (total {total})");
                    events.push(CombatEvent::EnemyKilled {
                        enemy,
                        template,
                        score,
                        total,
                    });
                },
                DamageOutcome::Ignored => {},
            }
        },
        CollisionTarget::Player => {
            let damage = world.bullet_damage;
            damage_player(world, damage, events);
        },
        CollisionTarget::Neutral => {},
    }
}

fn damage_player(world: &mut CombatWorld<'_>, damage: u32, events: &mut Vec<CombatEvent>) {
    if world.player.is_dead() {
        return;
    }
    let hit = world.player.take_damage(damage);
    world.fx.update_health_ratio(hit.ratio);
    events.push(CombatEvent::PlayerHit {
        damage,
        health: hit.health,
    });
    if hit.died {
        events.push(CombatEvent::PlayerDied);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::recording::{recorded, Call, CallLog};
    use crate::projectile::ProjectileOwner;
    use glam::Vec2;

    struct World {
        projectiles: ProjectileSystem,
        enemies: EnemySystem,
        player: Player,
        score: Scoreboard,
        scheduler: Scheduler,
        catalog: Catalog,
        fx: Collaborators,
        log: CallLog,
    }

    impl World {
        fn new() -> Self {
            let (fx, log) = recorded();
            Self {
                projectiles: ProjectileSystem::new(5.0, 0.0),
                enemies: EnemySystem::new(0.1),
                player: Player::new(Vec2::ZERO, 6, 3.0, 7.0),
                score: Scoreboard::new(),
                scheduler: Scheduler::new(),
                catalog: Catalog::arcade(),
                fx,
                log,
            }
        }

        fn spawn(&mut self, nth: usize) -> PoolHandle {
            let id = self.catalog.enemy_ids().nth(nth).expect("template");
            let handle = self.enemies.checkout(id);
            let data = self.catalog.enemy(id).expect("template").clone();
            self.enemies
                .activate(handle, &data, Vec2::new(0.0, 3.0), true, &mut self.scheduler);
            handle
        }

        fn dispatch(&mut self, bus: &CombatBus) -> Vec<CombatEvent> {
            let mut view = CombatWorld {
                projectiles: &mut self.projectiles,
                enemies: &mut self.enemies,
                player: &mut self.player,
                score: &mut self.score,
                scheduler: &mut self.scheduler,
                catalog: &self.catalog,
                fx: &mut self.fx,
                bullet_damage: 1,
            };
            bus.dispatch(&mut view)
        }
    }

    #[test]
    fn test_killing_shot_scores_once() {
        let mut world = World::new();
        let enemy = world.spawn(2);
        let bullet = world.projectiles.launch(Vec2::ZERO, Vec2::Y, ProjectileOwner::Player);
        let bus = CombatBus::new();

        let hit = CombatReport::ProjectileHit {
            projectile: bullet,
            target: CollisionTarget::Enemy(enemy),
        };
        bus.report(hit);
        bus.report(hit);
        let events = world.dispatch(&bus);

        assert_eq!(
            events,
            vec![
                CombatEvent::ProjectileSpent {
                    projectile: bullet,
                    target: CollisionTarget::Enemy(enemy)
                },
                CombatEvent::EnemyKilled {
                    enemy,
                    template: world.catalog.enemy_ids().nth(2).expect("template"),
                    score: 15,
                    total: 15
                },
            ]
        );
        assert_eq!(world.score.score(), 15);
        assert_eq!(world.projectiles.active_count(), 0);
        assert_eq!(world.enemies.active_count(), 0);
        assert!(world.enemies.pool().is_free(enemy));
        assert!(world.log.borrow().contains(&Call::Score(15)));
    }

    #[test]
    fn test_survivable_hit() {
        let mut world = World::new();
        let enemy = world.spawn(0);
        let bullet = world.projectiles.launch(Vec2::ZERO, Vec2::Y, ProjectileOwner::Player);
        let bus = CombatBus::new();
        bus.report(CombatReport::ProjectileHit {
            projectile: bullet,
            target: CollisionTarget::Enemy(enemy),
        });

        let events = world.dispatch(&bus);
        assert_eq!(events[1], CombatEvent::EnemyHit { enemy, health: 1 });
        assert_eq!(world.score.score(), 0);
        assert_eq!(world.enemies.active_count(), 1);
    }

    #[test]
    fn test_enemy_bullet_hurts_player() {
        let mut world = World::new();
        let bullet = world.projectiles.launch(Vec2::ZERO, Vec2::Y, ProjectileOwner::Enemy);
        let bus = CombatBus::new();
        bus.report(CombatReport::ProjectileHit {
            projectile: bullet,
            target: CollisionTarget::Player,
        });

        let events = world.dispatch(&bus);
        assert_eq!(events[1], CombatEvent::PlayerHit { damage: 1, health: 5 });
        assert_eq!(*world.log.borrow(), vec![Call::Health(5.0 / 6.0)]);
    }

    #[test]
    fn test_neutral_hit_only_recycles() {
        let mut world = World::new();
        let bullet = world.projectiles.launch(Vec2::ZERO, Vec2::Y, ProjectileOwner::Player);
        let bus = CombatBus::new();
        bus.report(CombatReport::ProjectileHit {
            projectile: bullet,
            target: CollisionTarget::Neutral,
        });

        assert_eq!(world.dispatch(&bus).len(), 1);
        assert_eq!(world.projectiles.active_count(), 0);
        assert!(world.log.borrow().is_empty());
    }

    #[test]
    fn test_contact_damage_can_kill() {
        let mut world = World::new();
        let strong = world.spawn(1);
        let bus = CombatBus::new();
        for _ in 0..4 {
            bus.report(CombatReport::EnemyContact { enemy: strong });
        }

        let events = world.dispatch(&bus);
        assert_eq!(
            events,
            vec![
                CombatEvent::PlayerHit { damage: 2, health: 4 },
                CombatEvent::PlayerHit { damage: 2, health: 2 },
                CombatEvent::PlayerHit { damage: 2, health: 0 },
                CombatEvent::PlayerDied,
            ]
        );
        assert!(world.player.is_dead());
        assert_eq!(world.enemies.get(strong).map(|e| e.health), Some(5));
    }

    #[test]
    fn test_sender_handles_feed_the_bus() {
        let bus = CombatBus::new();
        let sender = bus.sender();
        sender
            .send(CombatReport::EnemyContact {
                enemy: PoolHandle::new(0, 0),
            })
            .expect("send");
        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.clear(), 1);
        assert_eq!(bus.pending_count(), 0);
    }
}
