//! Headless host: a scripted player, logging output sinks and a circle
//! broad-phase wrapped around a [`CombatSession`].

use ahash::AHashSet;
use glam::Vec2;
use onslaught_combat::prelude::*;
use onslaught_common::{OnslaughtResult, PoolHandle};
use tracing::{debug, info, trace};

use crate::timing::FrameTiming;

// ============================================================================
// Arena
// ============================================================================

/// Half extents of the playfield. Bullets past this hit the wall.
pub const ARENA_HALF_EXTENTS: Vec2 = Vec2::new(9.0, 5.5);

/// The stock arena: melee anchors along the edges, shooter posts inside the
/// corners, player in the middle.
#[must_use]
pub fn default_arena() -> Arena {
    let Vec2 { x, y } = ARENA_HALF_EXTENTS - Vec2::splat(0.5);
    Arena {
        anchors: vec![
            Vec2::new(-x, 0.0),
            Vec2::new(x, 0.0),
            Vec2::new(0.0, y),
            Vec2::new(0.0, -y),
            Vec2::new(-x, y),
            Vec2::new(x, -y),
        ],
        ranged_anchors: vec![
            Vec2::new(-x + 1.5, y - 1.0),
            Vec2::new(x - 1.5, y - 1.0),
            Vec2::new(-x + 1.5, -y + 1.0),
            Vec2::new(x - 1.5, -y + 1.0),
            Vec2::new(0.0, y - 1.5),
            Vec2::new(0.0, -y + 1.5),
        ],
        player_start: Vec2::ZERO,
    }
}

// ============================================================================
// Output sinks
// ============================================================================

/// Writes every effect, sound and HUD change to the trace log.
#[derive(Debug, Default)]
pub struct LogSinks;

impl VisualEffects for LogSinks {
    fn play_muzzle_flash(&mut self, source: MuzzleSource) {
        trace!("vfx: muzzle flash {source:?}");
    }

    fn play_damage_flash(&mut self, enemy: PoolHandle, duration_secs: f32) {
        trace!("vfx: damage flash on {enemy} for {duration_secs}s");
    }
}

impl AudioSink for LogSinks {
    fn play(&mut self, sound: SoundId) {
        trace!("audio: {sound:?}");
    }

    fn play_loop(&mut self, sound: SoundId) {
        trace!("audio: loop {sound:?}");
    }

    fn stop(&mut self, sound: SoundId) {
        trace!("audio: stop {sound:?}");
    }
}

impl HudSink for LogSinks {
    fn refresh_ammo(&mut self, current: u32, max: u32) {
        trace!("hud: ammo {current}/{max}");
    }

    fn update_score(&mut self, total: u64) {
        debug!("hud: score {total}");
    }

    fn update_health_ratio(&mut self, fraction: f32) {
        debug!("hud: health {:.0}%", fraction * 100.0);
    }

    fn set_weapon_label(&mut self, name: &str) {
        debug!("hud: weapon {name}");
    }
}

/// Collaborators that log everything.
#[must_use]
pub fn logging_collaborators() -> Collaborators {
    Collaborators::none()
        .with_vfx(Box::new(LogSinks))
        .with_audio(Box::new(LogSinks))
        .with_hud(Box::new(LogSinks))
}

// ============================================================================
// Scripted player
// ============================================================================

/// Seconds between trigger pulls.
const BOT_FIRE_COOLDOWN: f32 = 0.3;
/// Radius the bot circles the arena centre at.
const BOT_ORBIT_RADIUS: f32 = 2.0;

/// A bot that circles the centre and shoots the nearest enemy.
#[derive(Debug, Default)]
pub struct BotInput {
    movement: Vec2,
    aim: Option<Vec2>,
    fire: bool,
    reload: bool,
    switch_to: Option<usize>,
    orbit: f32,
    cooldown: f32,
    tried_switch: bool,
}

impl BotInput {
    /// Decides this frame's input from the session state.
    pub fn observe(&mut self, session: &CombatSession, dt: f32) {
        let player = session.player();
        let arsenal = session.arsenal();

        self.orbit += dt * 0.8;
        let waypoint = Vec2::from_angle(self.orbit) * BOT_ORBIT_RADIUS;
        self.movement = (waypoint - player.position).clamp_length_max(1.0);

        let target = session
            .enemies()
            .iter_active()
            .map(|(_, e)| e.position)
            .min_by(|a, b| {
                a.distance_squared(player.position)
                    .total_cmp(&b.distance_squared(player.position))
            });
        self.aim = target.and_then(|t| (t - player.position).try_normalize());

        self.cooldown = (self.cooldown - dt).max(0.0);
        self.fire = false;
        self.reload = false;
        self.switch_to = None;

        if arsenal.is_reloading() {
            return;
        }
        if arsenal.ammo() == 0 {
            if self.tried_switch {
                self.reload = true;
                self.tried_switch = false;
            } else {
                self.switch_to = Some(arsenal.active_slot().other().index());
                self.tried_switch = true;
            }
            return;
        }
        if self.aim.is_some() && self.cooldown <= 0.0 {
            self.fire = true;
            self.cooldown = BOT_FIRE_COOLDOWN;
        }
    }
}

impl InputSource for BotInput {
    fn movement_vector(&mut self) -> Vec2 {
        self.movement
    }

    fn aim_direction(&mut self) -> Option<Vec2> {
        self.aim
    }

    fn fire_pressed(&mut self) -> bool {
        std::mem::take(&mut self.fire)
    }

    fn reload_pressed(&mut self) -> bool {
        std::mem::take(&mut self.reload)
    }

    fn weapon_switch_requested(&mut self) -> Option<usize> {
        self.switch_to.take()
    }
}

// ============================================================================
// Broad-phase
// ============================================================================

/// Circle-overlap collision detection.
///
/// Projectiles report every overlap; enemy bodies report only when they
/// start touching the player.
#[derive(Debug)]
pub struct BroadPhase {
    /// Player collision radius
    pub player_radius: f32,
    /// Enemy collision radius
    pub enemy_radius: f32,
    /// Projectile collision radius
    pub bullet_radius: f32,
    /// Wall half extents
    pub bounds: Vec2,
    touching: AHashSet<PoolHandle>,
}

impl Default for BroadPhase {
    fn default() -> Self {
        Self {
            player_radius: 0.4,
            enemy_radius: 0.4,
            bullet_radius: 0.1,
            bounds: ARENA_HALF_EXTENTS,
            touching: AHashSet::new(),
        }
    }
}

impl BroadPhase {
    /// Finds every overlap in the current state.
    pub fn detect(&mut self, session: &CombatSession) -> Vec<CombatReport> {
        let mut reports = Vec::new();
        let player = session.player().position;
        let enemies: Vec<(PoolHandle, Vec2)> = session
            .enemies()
            .iter_active()
            .map(|(h, e)| (h, e.position))
            .collect();

        let enemy_reach = self.enemy_radius + self.bullet_radius;
        let player_reach = self.player_radius + self.bullet_radius;
        for (projectile, bullet) in session.projectiles().iter_active() {
            let target = if bullet.position.abs().cmpgt(self.bounds).any() {
                Some(CollisionTarget::Neutral)
            } else {
                match bullet.owner {
                    ProjectileOwner::Player => enemies
                        .iter()
                        .find(|(_, pos)| pos.distance(bullet.position) <= enemy_reach)
                        .map(|(h, _)| CollisionTarget::Enemy(*h)),
                    ProjectileOwner::Enemy => (player.distance(bullet.position) <= player_reach)
                        .then_some(CollisionTarget::Player),
                }
            };
            if let Some(target) = target {
                reports.push(CombatReport::ProjectileHit { projectile, target });
            }
        }

        let body_reach = self.player_radius + self.enemy_radius;
        let mut now_touching = AHashSet::new();
        for (enemy, pos) in enemies {
            if pos.distance(player) <= body_reach {
                if !self.touching.contains(&enemy) {
                    reports.push(CombatReport::EnemyContact { enemy });
                }
                now_touching.insert(enemy);
            }
        }
        self.touching = now_touching;

        reports
    }

    /// Forgets all contacts.
    pub fn reset(&mut self) {
        self.touching.clear();
    }
}

// ============================================================================
// Headless runner
// ============================================================================

/// Result of one headless run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Run number, from 1
    pub run: u32,
    /// Simulated seconds survived
    pub survived_secs: f32,
    /// Final score
    pub score: u64,
    /// Enemies killed
    pub kills: u32,
    /// Hits the player took
    pub hits_taken: u32,
    /// Whether the player died (as opposed to the time limit)
    pub died: bool,
}

/// Drives a session with the bot, the broad-phase and a jittered frame clock.
#[derive(Debug)]
pub struct Headless {
    session: CombatSession,
    bot: BotInput,
    broad_phase: BroadPhase,
    timing: FrameTiming,
    rng: fastrand::Rng,
    frame_dt: f32,
}

impl Headless {
    /// Builds a headless host around the arcade catalog.
    pub fn new(config: CombatConfig, frame_dt: f32) -> OnslaughtResult<Self> {
        let catalog = Catalog::arcade();
        let loadout = Loadout::from_catalog(&catalog);
        let seed = config.seed;
        let timing = FrameTiming::new(config.fixed_dt);
        let session = CombatSession::new(
            config,
            catalog,
            default_arena(),
            loadout,
            logging_collaborators(),
        )?;

        Ok(Self {
            session,
            bot: BotInput::default(),
            broad_phase: BroadPhase::default(),
            timing,
            rng: fastrand::Rng::with_seed(seed ^ 0xF4A3),
            frame_dt: frame_dt.max(0.001),
        })
    }

    /// The driven session.
    #[must_use]
    pub fn session(&self) -> &CombatSession {
        &self.session
    }

    /// Plays one run until the player dies or `max_secs` pass.
    pub fn play_run(&mut self, run: u32, max_secs: f32) -> RunSummary {
        self.bot = BotInput::default();
        self.broad_phase.reset();
        self.timing.reset();
        self.session.start_run();

        let sender = self.session.collision_sender();
        let mut summary = RunSummary {
            run,
            survived_secs: 0.0,
            score: 0,
            kills: 0,
            hits_taken: 0,
            died: false,
        };

        while summary.survived_secs < max_secs && self.session.phase() == RunPhase::Running {
            let jitter = 0.8 + 0.4 * self.rng.f32();
            let (dt, steps) = self.timing.frame(self.frame_dt * jitter);

            self.bot.observe(&self.session, dt);
            self.session.update(dt, &mut self.bot);

            for _ in 0..steps {
                self.session.integrate(self.timing.fixed_dt());
                for report in self.broad_phase.detect(&self.session) {
                    // The session holds the receiving end.
                    let _ = sender.send(report);
                }
                for event in self.session.resolve_collisions() {
                    match event {
                        CombatEvent::EnemyKilled { total, .. } => {
                            summary.kills += 1;
                            summary.score = total;
                        },
                        CombatEvent::PlayerHit { .. } => summary.hits_taken += 1,
                        CombatEvent::PlayerDied => summary.died = true,
                        _ => {},
                    }
                }
                if self.session.phase() != RunPhase::Running {
                    break;
                }
            }
            summary.survived_secs += dt;
        }

        if self.session.phase() == RunPhase::Running {
            self.session.end_run();
        }

        info!(
            "Run {run}: {:.1}s, score {}, {} kills, {} hits taken ({:.0} fps, {} steps)",
            summary.survived_secs,
            summary.score,
            summary.kills,
            summary.hits_taken,
            self.timing.fps(),
            self.timing.total_steps()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distant_enemies_report_nothing() {
        let mut headless = Headless::new(CombatConfig::default(), 1.0 / 60.0).expect("headless");
        headless.session.start_run();
        // Timers only: enemies stay on their anchors.
        for _ in 0..200 {
            headless.session.update(0.05, &mut BotInput::default());
        }
        assert!(headless.session.enemies().active_count() > 0);
        assert!(headless.broad_phase.detect(&headless.session).is_empty());
    }

    #[test]
    fn test_wall_hits_are_neutral() {
        let config = CombatConfig {
            bullet_speed: 100.0,
            ..CombatConfig::default()
        };
        let mut headless = Headless::new(config, 1.0 / 60.0).expect("headless");
        headless.session.start_run();

        let mut input = BotInput {
            aim: Some(Vec2::Y),
            fire: true,
            ..BotInput::default()
        };
        headless.session.update(0.01, &mut input);
        headless.session.integrate(0.1);

        let reports = headless.broad_phase.detect(&headless.session);
        assert!(matches!(
            reports.as_slice(),
            [CombatReport::ProjectileHit {
                target: CollisionTarget::Neutral,
                ..
            }]
        ));
    }

    #[test]
    fn test_contact_reported_on_enter_only() {
        let mut headless = Headless::new(CombatConfig::default(), 1.0 / 60.0).expect("headless");
        headless.session.start_run();
        for _ in 0..50 {
            headless.session.update(0.05, &mut BotInput::default());
        }
        assert_eq!(headless.session.enemies().active_count(), 1);

        let mut contacts = 0;
        for _ in 0..2_000 {
            headless.session.integrate(0.02);
            contacts += headless
                .broad_phase
                .detect(&headless.session)
                .iter()
                .filter(|r| matches!(r, CombatReport::EnemyContact { .. }))
                .count();
        }
        let shooter_only = headless
            .session
            .enemies()
            .iter_active()
            .all(|(_, e)| e.ranged);
        assert_eq!(contacts, usize::from(!shooter_only));
    }

    #[test]
    fn test_headless_run_finishes() {
        let mut headless = Headless::new(CombatConfig::default(), 1.0 / 60.0).expect("headless");
        let summary = headless.play_run(1, 30.0);

        assert_eq!(summary.run, 1);
        assert!(summary.survived_secs > 0.0);
        assert_eq!(headless.session().phase(), RunPhase::GameOver);
        assert_eq!(headless.session().enemies().active_count(), 0);
        assert!(headless.session().scoreboard().high_score() >= summary.score);
    }
}
