//! The simulation context of one arena.
//!
//! A [`CombatSession`] owns every pool, registry and state machine of the
//! combat core. The host drives it with two calls per frame:
//!
//! - [`CombatSession::update`] at frame rate: input, audio loops, timers
//! - [`CombatSession::fixed_update`] at the physics rate: movement, then
//!   collision resolution
//!
//! Broad-phase overlap reports reach the session through
//! [`CombatSession::collision_sender`] or the `report_*` helpers.

use crossbeam_channel::Sender;
use glam::Vec2;
use onslaught_common::{EnemyTemplateId, OnslaughtResult, PoolHandle, WeaponSlot, WeaponTemplateId};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::collaborators::{Collaborators, InputSource, SoundId};
use crate::config::CombatConfig;
use crate::enemy::EnemySystem;
use crate::events::{CollisionTarget, CombatBus, CombatEvent, CombatReport, CombatWorld};
use crate::player::Player;
use crate::projectile::{ProjectileOwner, ProjectileSystem};
use crate::scheduler::{Scheduler, TimedTask};
use crate::score::Scoreboard;
use crate::spawn::{SpawnDirector, SpawnOutcome};
use crate::weapon::{Arsenal, FireOutcome, SwitchOutcome};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    /// Built, no run started yet
    #[default]
    Idle,
    /// A run is in progress
    Running,
    /// The player died; the arena is cleared
    GameOver,
}

/// Fixed layout of the arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arena {
    /// Spawn points for melee enemies
    pub anchors: Vec<Vec2>,
    /// Spawn points for ranged enemies
    pub ranged_anchors: Vec<Vec2>,
    /// Where the player starts each run
    pub player_start: Vec2,
}

/// Which templates a session uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loadout {
    /// Enemy kinds the spawn director picks from
    pub roster: Vec<EnemyTemplateId>,
    /// The player's weapons, primary first
    pub weapons: Vec<WeaponTemplateId>,
}

impl Loadout {
    /// Every enemy in the catalog and its first two weapons.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            roster: catalog.enemy_ids().collect(),
            weapons: catalog.weapon_ids().take(WeaponSlot::COUNT).collect(),
        }
    }
}

/// Owns and steps the whole combat simulation.
#[derive(Debug)]
pub struct CombatSession {
    config: CombatConfig,
    catalog: Catalog,
    phase: RunPhase,
    scheduler: Scheduler,
    projectiles: ProjectileSystem,
    enemies: EnemySystem,
    spawner: SpawnDirector,
    arsenal: Arsenal,
    player: Player,
    score: Scoreboard,
    bus: CombatBus,
    fx: Collaborators,
    /// Whether the walk loop is playing
    walking: bool,
    /// Outcomes of spawn attempts since the last call to `take_spawn_log`
    spawn_log: Vec<SpawnOutcome>,
}

impl CombatSession {
    /// Builds a session and pre-warms its pools.
    pub fn new(
        mut config: CombatConfig,
        catalog: Catalog,
        arena: Arena,
        loadout: Loadout,
        fx: Collaborators,
    ) -> OnslaughtResult<Self> {
        config.validate();

        let mut projectiles =
            ProjectileSystem::new(config.bullet_speed, config.projectile_lifetime);
        projectiles.prewarm(config.bullet_pool_size);

        let mut enemies = EnemySystem::new(config.damage_flash_secs);
        let mut kinds = loadout.roster.clone();
        kinds.sort_unstable();
        kinds.dedup();
        for kind in kinds {
            enemies.prewarm(kind, config.enemy_pool_size);
        }

        let spawner = SpawnDirector::new(
            &catalog,
            loadout.roster,
            arena.anchors,
            arena.ranged_anchors,
            config.spawn_rules(),
        )?;
        let arsenal = Arsenal::new(
            &catalog,
            &loadout.weapons,
            config.reload_time_multiplier,
            config.spread_spawn_offset,
        )?;
        let player = Player::new(
            arena.player_start,
            config.player_max_health,
            config.player_move_speed,
            config.player_reload_move_speed,
        );

        info!(
            "Combat session ready: {} bullets, {} enemy kinds x {}",
            config.bullet_pool_size,
            spawner.roster().len(),
            config.enemy_pool_size
        );

        Ok(Self {
            config,
            catalog,
            phase: RunPhase::Idle,
            scheduler: Scheduler::new(),
            projectiles,
            enemies,
            spawner,
            arsenal,
            player,
            score: Scoreboard::new(),
            bus: CombatBus::new(),
            fx,
            walking: false,
            spawn_log: Vec::new(),
        })
    }

    // === Run lifecycle ===

    /// Starts a run: fresh player, full magazines, zero score, spawning on.
    pub fn start_run(&mut self) {
        if self.phase == RunPhase::Running {
            return;
        }

        self.scheduler.clear();
        self.enemies.release_all(&mut self.scheduler);
        self.projectiles.release_all();
        self.bus.clear();

        self.player.reset();
        self.arsenal.reset(&mut self.scheduler);
        self.spawner.start(&mut self.scheduler);
        self.walking = false;
        self.spawn_log.clear();
        self.phase = RunPhase::Running;

        self.fx.play_loop(SoundId::Music);
        self.fx.set_weapon_label(&self.arsenal.weapon().name);
        self.fx.refresh_ammo(self.arsenal.ammo(), self.arsenal.max_ammo());
        self.fx.update_score(self.score.score());
        self.fx.update_health_ratio(self.player.health_ratio());

        info!("Run started (high score {})", self.score.high_score());
    }

    /// Ends the run: banks the score and clears the arena. Pools keep their
    /// instances for the next run.
    pub fn end_run(&mut self) {
        if self.phase != RunPhase::Running {
            return;
        }

        let final_score = self.score.score();
        if self.score.bank() {
            info!("New high score: {final_score}");
        }

        self.scheduler.clear();
        self.spawner.stop(&mut self.scheduler);
        let enemies = self.enemies.release_all(&mut self.scheduler);
        let projectiles = self.projectiles.release_all();
        self.bus.clear();

        if self.walking {
            self.fx.stop(SoundId::Walk);
            self.walking = false;
        }
        self.fx.stop(SoundId::Music);
        self.phase = RunPhase::GameOver;

        info!(
            "Run over: score {final_score}, best {} ({enemies} enemies, {projectiles} bullets)",
            self.score.high_score()
        );
    }

    // === Frame-rate phase ===

    /// Polls input once and runs every timer that came due within `dt`.
    pub fn update(&mut self, dt: f32, input: &mut dyn InputSource) {
        if self.phase != RunPhase::Running {
            return;
        }

        self.player.set_movement(input.movement_vector());
        if let Some(aim) = input.aim_direction() {
            self.player.set_aim(aim);
        }
        self.update_walk_loop();

        if input.fire_pressed() {
            self.fire();
        }
        if input.reload_pressed() {
            self.arsenal.begin_reload(&mut self.scheduler, &mut self.fx);
        }
        if let Some(slot) = input.weapon_switch_requested().and_then(WeaponSlot::from_index) {
            if let SwitchOutcome::Busy = self.arsenal.switch_to(slot, &mut self.fx) {
                debug!("Weapon switch ignored while reloading");
            }
        }

        self.run_timers(dt);
    }

    fn update_walk_loop(&mut self) {
        let moving = self.player.is_moving();
        if moving == self.walking {
            return;
        }
        self.walking = moving;
        if moving {
            self.fx.play_loop(SoundId::Walk);
        } else {
            self.fx.stop(SoundId::Walk);
        }
    }

    fn fire(&mut self) {
        let muzzle = self.player.muzzle_point(self.config.muzzle_offset);
        let facing = self.player.facing();
        if let FireOutcome::Fired { shots, .. } = self.arsenal.fire(muzzle, facing, &mut self.fx) {
            for shot in shots {
                self.projectiles
                    .launch(shot.origin, shot.direction, ProjectileOwner::Player);
            }
        }
    }

    /// Advances simulation time by `dt` and runs due tasks in deadline order.
    pub fn run_timers(&mut self, dt: f32) {
        self.scheduler.advance(dt);
        while let Some((id, task)) = self.scheduler.pop_due() {
            match task {
                TimedTask::Spawn => {
                    if let Some(outcome) =
                        self.spawner
                            .on_tick(id, &self.catalog, &mut self.enemies, &mut self.scheduler)
                    {
                        self.spawn_log.push(outcome);
                    }
                },
                TimedTask::ReloadTick => {
                    self.arsenal.reload_tick(id, &mut self.scheduler, &mut self.fx);
                },
                TimedTask::EnemyFire { enemy } => {
                    let shot =
                        self.enemies
                            .fire_tick(enemy, id, &self.catalog, &mut self.scheduler, &mut self.fx);
                    if let Some(shot) = shot {
                        self.projectiles
                            .launch(shot.origin, shot.direction, ProjectileOwner::Enemy);
                    }
                },
                TimedTask::FlashRestore { enemy } => self.enemies.restore_tint(enemy, id),
            }
        }
    }

    // === Physics phase ===

    /// One physics step: movement, then collision resolution.
    pub fn fixed_update(&mut self, dt: f32) -> Vec<CombatEvent> {
        if self.phase != RunPhase::Running {
            return Vec::new();
        }
        self.integrate(dt);
        self.resolve_collisions()
    }

    /// Moves the player, enemies and projectiles by one physics step.
    ///
    /// Hosts that run their own broad-phase call this, gather overlaps, then
    /// call [`Self::resolve_collisions`].
    pub fn integrate(&mut self, dt: f32) {
        if self.phase != RunPhase::Running {
            return;
        }
        self.player.fixed_update(dt, self.arsenal.is_reloading());
        let target = (!self.player.is_dead()).then_some(self.player.position);
        self.enemies.fixed_update(dt, target, &self.catalog);
        self.projectiles.fixed_update(dt);
    }

    /// Drains the collision bus. Ends the run if the player died.
    pub fn resolve_collisions(&mut self) -> Vec<CombatEvent> {
        if self.phase != RunPhase::Running {
            self.bus.clear();
            return Vec::new();
        }

        let mut world = CombatWorld {
            projectiles: &mut self.projectiles,
            enemies: &mut self.enemies,
            player: &mut self.player,
            score: &mut self.score,
            scheduler: &mut self.scheduler,
            catalog: &self.catalog,
            fx: &mut self.fx,
            bullet_damage: self.config.bullet_damage,
        };
        let events = self.bus.dispatch(&mut world);

        if events.contains(&CombatEvent::PlayerDied) {
            info!("Player died");
            self.end_run();
        }
        events
    }

    // === Broad-phase entry points ===

    /// Sender for collision reports.
    #[must_use]
    pub fn collision_sender(&self) -> Sender<CombatReport> {
        self.bus.sender()
    }

    /// Reports a projectile touching something.
    pub fn report_projectile_hit(&self, projectile: PoolHandle, target: CollisionTarget) {
        self.bus
            .report(CombatReport::ProjectileHit { projectile, target });
    }

    /// Reports an enemy touching the player.
    pub fn report_enemy_contact(&self, enemy: PoolHandle) {
        self.bus.report(CombatReport::EnemyContact { enemy });
    }

    // === Queries ===

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Effective (validated) configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Template catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Enemy subsystem.
    #[must_use]
    pub fn enemies(&self) -> &EnemySystem {
        &self.enemies
    }

    /// Projectile subsystem.
    #[must_use]
    pub fn projectiles(&self) -> &ProjectileSystem {
        &self.projectiles
    }

    /// Weapon state.
    #[must_use]
    pub fn arsenal(&self) -> &Arsenal {
        &self.arsenal
    }

    /// Spawn director.
    #[must_use]
    pub fn spawner(&self) -> &SpawnDirector {
        &self.spawner
    }

    /// Score and high score.
    #[must_use]
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.score
    }

    /// Timer queue.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Takes the spawn outcomes recorded since the last call.
    pub fn take_spawn_log(&mut self) -> Vec<SpawnOutcome> {
        std::mem::take(&mut self.spawn_log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::recording::{recorded, Call, CallLog, ScriptedInput};

    fn arena() -> Arena {
        Arena {
            anchors: vec![Vec2::new(0.0, 8.0), Vec2::new(8.0, 0.0)],
            ranged_anchors: vec![Vec2::new(-6.0, 6.0), Vec2::new(6.0, 6.0)],
            player_start: Vec2::ZERO,
        }
    }

    fn session() -> (CombatSession, CallLog) {
        let catalog = Catalog::arcade();
        let loadout = Loadout::from_catalog(&catalog);
        let (fx, log) = recorded();
        let session = CombatSession::new(CombatConfig::default(), catalog, arena(), loadout, fx)
            .expect("session");
        (session, log)
    }

    #[test]
    fn test_new_prewarms_pools() {
        let (session, _) = session();
        assert_eq!(session.projectiles().pool().total_count(), 50);
        assert_eq!(session.enemies().pool().total_count(), 4 * 30);
        assert_eq!(session.phase(), RunPhase::Idle);
    }

    #[test]
    fn test_empty_roster_is_an_error() {
        let catalog = Catalog::arcade();
        let mut loadout = Loadout::from_catalog(&catalog);
        loadout.roster.clear();
        let result = CombatSession::new(
            CombatConfig::default(),
            catalog,
            arena(),
            loadout,
            Collaborators::none(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_start_run_primes_hud_and_spawning() {
        let (mut session, log) = session();
        session.start_run();

        assert_eq!(session.phase(), RunPhase::Running);
        assert_eq!(session.scheduler().pending_count(), 1);
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Loop(SoundId::Music),
                Call::Label("Pistol".into()),
                Call::Ammo(7, 7),
                Call::Score(0),
                Call::Health(1.0),
            ]
        );
    }

    #[test]
    fn test_idle_session_ignores_updates() {
        let (mut session, log) = session();
        let mut input = ScriptedInput {
            fire: true,
            ..ScriptedInput::default()
        };
        session.update(1.0, &mut input);
        assert!(session.fixed_update(0.02).is_empty());
        assert_eq!(session.projectiles().active_count(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_fire_launches_from_muzzle() {
        let (mut session, _) = session();
        session.start_run();
        let mut input = ScriptedInput {
            aim: Some(Vec2::X),
            fire: true,
            ..ScriptedInput::default()
        };
        session.update(0.016, &mut input);

        assert_eq!(session.arsenal().ammo(), 6);
        let (_, bullet) = session.projectiles().iter_active().next().expect("bullet");
        assert!((bullet.position - Vec2::new(0.5, 0.0)).length() < 1e-5);
        assert_eq!(bullet.owner, ProjectileOwner::Player);
    }

    #[test]
    fn test_walk_loop_follows_movement() {
        let (mut session, log) = session();
        session.start_run();
        log.borrow_mut().clear();

        let mut input = ScriptedInput {
            movement: Vec2::X,
            ..ScriptedInput::default()
        };
        session.update(0.016, &mut input);
        session.update(0.016, &mut input);
        input.movement = Vec2::ZERO;
        session.update(0.016, &mut input);

        assert_eq!(
            *log.borrow(),
            vec![Call::Loop(SoundId::Walk), Call::Stop(SoundId::Walk)]
        );
    }

    #[test]
    fn test_reload_speeds_up_player() {
        let (mut session, _) = session();
        session.start_run();
        let mut input = ScriptedInput {
            movement: Vec2::X,
            fire: true,
            ..ScriptedInput::default()
        };
        session.update(0.016, &mut input);
        input.fire = true;
        session.update(0.016, &mut input);
        input.reload = true;
        session.update(0.016, &mut input);
        assert!(session.arsenal().is_reloading());

        let before = session.player().position;
        session.fixed_update(0.1);
        assert!((session.player().position.x - before.x - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_loop_runs_on_timers() {
        let (mut session, _) = session();
        session.start_run();
        let mut input = ScriptedInput::default();

        session.update(2.0, &mut input);
        assert_eq!(session.enemies().active_count(), 0);
        session.update(0.3, &mut input);

        let log = session.take_spawn_log();
        assert_eq!(log.len(), 1);
        assert!(matches!(log[0], SpawnOutcome::Spawned { .. }));
        assert_eq!(session.enemies().active_count(), 1);
        assert!((session.spawner().interval() - 2.1).abs() < 1e-6);
    }

    #[test]
    fn test_player_death_ends_run() {
        let (mut session, log) = session();
        session.start_run();
        let total_bullets = session.projectiles().pool().total_count();
        let mut input = ScriptedInput {
            movement: Vec2::Y,
            fire: true,
            ..ScriptedInput::default()
        };
        session.update(2.3, &mut input);
        let (enemy, _) = session.enemies().iter_active().next().expect("enemy");
        log.borrow_mut().clear();

        for _ in 0..6 {
            session.report_enemy_contact(enemy);
        }
        let events = session.fixed_update(0.02);

        assert!(events.contains(&CombatEvent::PlayerDied));
        assert_eq!(session.phase(), RunPhase::GameOver);
        assert_eq!(session.enemies().active_count(), 0);
        assert_eq!(session.projectiles().active_count(), 0);
        assert_eq!(session.projectiles().pool().total_count(), total_bullets);
        assert_eq!(session.scheduler().pending_count(), 0);
        assert!(log.borrow().contains(&Call::Stop(SoundId::Walk)));
        assert!(log.borrow().contains(&Call::Stop(SoundId::Music)));
    }

    #[test]
    fn test_high_score_survives_restart() {
        let (mut session, _) = session();
        session.start_run();
        session.update(2.3, &mut ScriptedInput::default());
        let (enemy, _) = session.enemies().iter_active().next().expect("enemy");
        let template = session.enemies().get(enemy).map(|e| e.template()).expect("enemy");
        let value = session.catalog().enemy(template).map(|t| t.score_value).expect("template");
        let health = session.enemies().get(enemy).map(|e| e.health).expect("enemy");

        for _ in 0..health {
            let bullet = session
                .projectiles
                .launch(Vec2::ZERO, Vec2::Y, ProjectileOwner::Player);
            session.report_projectile_hit(bullet, CollisionTarget::Enemy(enemy));
        }
        session.fixed_update(0.02);
        assert_eq!(session.scoreboard().score(), u64::from(value));

        session.end_run();
        assert_eq!(session.scoreboard().high_score(), u64::from(value));
        session.start_run();
        assert_eq!(session.scoreboard().score(), 0);
        assert_eq!(session.scoreboard().high_score(), u64::from(value));
        assert_eq!(session.player().health(), 6);
    }
}
