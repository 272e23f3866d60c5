//! Adaptive enemy spawning.
//!
//! The director runs a timed loop: wait out the interval, make one spawn
//! attempt, then recompute the interval from the number of live enemies.
//! More enemies on the field means shorter waits, down to a floor.
//!
//! Ranged enemies are limited by a concurrency cap and may only appear at a
//! ranged anchor that no live ranged enemy is standing near.

use glam::Vec2;
use onslaught_common::{CatalogError, EnemyTemplateId, PoolHandle};
use tracing::debug;

use crate::catalog::Catalog;
use crate::enemy::EnemySystem;
use crate::scheduler::{Scheduler, TaskId, TimedTask};

/// Longest wait between spawn attempts, in seconds.
pub const MAX_SPAWN_INTERVAL: f32 = 2.25;
/// Shortest wait between spawn attempts, in seconds.
pub const MIN_SPAWN_INTERVAL: f32 = 1.25;
/// Seconds shaved off the wait per live enemy.
pub const SPAWN_INTERVAL_DECAY: f32 = 0.15;
/// Default limit on simultaneously live ranged enemies.
pub const DEFAULT_RANGED_CAP: usize = 4;
/// Default clearance a ranged anchor needs from live ranged enemies.
pub const DEFAULT_EXCLUSION_RADIUS: f32 = 1.0;

/// Interval curve of the spawn loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPacing {
    /// Interval floor
    pub min_interval: f32,
    /// Interval ceiling, used with an empty field
    pub max_interval: f32,
    /// Reduction per live enemy
    pub decay: f32,
}

impl Default for SpawnPacing {
    fn default() -> Self {
        Self {
            min_interval: MIN_SPAWN_INTERVAL,
            max_interval: MAX_SPAWN_INTERVAL,
            decay: SPAWN_INTERVAL_DECAY,
        }
    }
}

impl SpawnPacing {
    /// Wait before the next attempt with `active` enemies alive.
    #[must_use]
    pub fn interval_for(&self, active: usize) -> f32 {
        let max = self.max_interval.max(self.min_interval);
        (max - active as f32 * self.decay).clamp(self.min_interval, max)
    }
}

/// Tunables of a [`SpawnDirector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRules {
    /// Interval curve
    pub pacing: SpawnPacing,
    /// Live ranged enemies allowed at once
    pub ranged_cap: usize,
    /// Minimum distance between a new ranged enemy and any live one
    pub exclusion_radius: f32,
    /// RNG seed for template and anchor choice
    pub seed: u64,
}

impl Default for SpawnRules {
    fn default() -> Self {
        Self {
            pacing: SpawnPacing::default(),
            ranged_cap: DEFAULT_RANGED_CAP,
            exclusion_radius: DEFAULT_EXCLUSION_RADIUS,
            seed: 0,
        }
    }
}

/// Why a spawn attempt placed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The ranged concurrency cap is reached
    RangedCapReached,
    /// Every ranged anchor is too close to a live ranged enemy
    NoClearRangedAnchor,
    /// No general spawn anchors are configured
    NoAnchors,
    /// The chosen template is missing from the catalog
    UnknownTemplate,
    /// The checked-out instance could not be brought to life
    ActivationFailed,
}

/// Result of one spawn attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnOutcome {
    /// An enemy was placed
    Spawned {
        /// The new enemy
        enemy: PoolHandle,
        /// Its template
        template: EnemyTemplateId,
        /// Where it was placed
        position: Vec2,
    },
    /// Nothing was placed; any checkout went back to the pool
    Skipped {
        /// Template that was rolled
        template: EnemyTemplateId,
        /// Why the attempt was abandoned
        reason: SkipReason,
    },
}

/// Drives the spawn loop.
#[derive(Debug)]
pub struct SpawnDirector {
    rng: fastrand::Rng,
    roster: Vec<EnemyTemplateId>,
    anchors: Vec<Vec2>,
    ranged_anchors: Vec<Vec2>,
    rules: SpawnRules,
    interval: f32,
    task: Option<TaskId>,
}

impl SpawnDirector {
    /// Creates a director. Every roster entry must exist in `catalog`.
    pub fn new(
        catalog: &Catalog,
        roster: Vec<EnemyTemplateId>,
        anchors: Vec<Vec2>,
        ranged_anchors: Vec<Vec2>,
        rules: SpawnRules,
    ) -> Result<Self, CatalogError> {
        if roster.is_empty() {
            return Err(CatalogError::EmptyRoster);
        }
        for id in &roster {
            catalog.require_enemy(*id)?;
        }

        Ok(Self {
            rng: fastrand::Rng::with_seed(rules.seed),
            roster,
            anchors,
            ranged_anchors,
            interval: rules.pacing.max_interval,
            rules,
            task: None,
        })
    }

    /// Current wait between attempts.
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Templates the director picks from.
    #[must_use]
    pub fn roster(&self) -> &[EnemyTemplateId] {
        &self.roster
    }

    /// Resets the interval and schedules the first attempt.
    pub fn start(&mut self, scheduler: &mut Scheduler) {
        self.stop(scheduler);
        self.interval = self.rules.pacing.max_interval;
        self.task = Some(scheduler.schedule(self.interval, TimedTask::Spawn));
    }

    /// Cancels the pending attempt.
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.task.take() {
            scheduler.cancel(id);
        }
    }

    /// Handles a due spawn task: one attempt, a new interval, the next wait.
    pub fn on_tick(
        &mut self,
        task: TaskId,
        catalog: &Catalog,
        enemies: &mut EnemySystem,
        scheduler: &mut Scheduler,
    ) -> Option<SpawnOutcome> {
        if self.task != Some(task) {
            return None;
        }

        let outcome = self.attempt(catalog, enemies, scheduler);
        self.recompute_interval(enemies.active_count());
        self.task = Some(scheduler.schedule(self.interval, TimedTask::Spawn));
        Some(outcome)
    }

    /// Sets the interval from the live enemy count.
    pub fn recompute_interval(&mut self, active: usize) -> f32 {
        self.interval = self.rules.pacing.interval_for(active);
        self.interval
    }

    /// Makes one spawn attempt.
    pub fn attempt(
        &mut self,
        catalog: &Catalog,
        enemies: &mut EnemySystem,
        scheduler: &mut Scheduler,
    ) -> SpawnOutcome {
        let template = self.roster[self.rng.usize(..self.roster.len())];
        let Some(data) = catalog.enemy(template) else {
            return self.skip(template, SkipReason::UnknownTemplate);
        };

        let handle = enemies.checkout(template);
        let position = if data.is_ranged() {
            self.ranged_anchor(enemies)
        } else {
            self.general_anchor()
        };

        let position = match position {
            Ok(position) => position,
            Err(reason) => {
                enemies.discard(handle);
                return self.skip(template, reason);
            },
        };

        if !enemies.activate(handle, data, position, true, scheduler) {
            enemies.discard(handle);
            return self.skip(template, SkipReason::ActivationFailed);
        }

        debug!(
            "Spawned {} at {position} ({} live, next in {:.2}s)",
            data.name,
            enemies.active_count(),
            self.rules.pacing.interval_for(enemies.active_count())
        );
        SpawnOutcome::Spawned {
            enemy: handle,
            template,
            position,
        }
    }

    fn skip(&self, template: EnemyTemplateId, reason: SkipReason) -> SpawnOutcome {
        debug!("Spawn of {template:?} skipped: {reason:?}");
        SpawnOutcome::Skipped { template, reason }
    }

    fn general_anchor(&mut self) -> Result<Vec2, SkipReason> {
        if self.anchors.is_empty() {
            return Err(SkipReason::NoAnchors);
        }
        Ok(self.anchors[self.rng.usize(..self.anchors.len())])
    }

    fn ranged_anchor(&mut self, enemies: &EnemySystem) -> Result<Vec2, SkipReason> {
        let occupied = enemies.ranged_active_positions();
        if occupied.len() >= self.rules.ranged_cap {
            return Err(SkipReason::RangedCapReached);
        }

        let radius = self.rules.exclusion_radius;
        let mut candidates = self.ranged_anchors.clone();
        self.rng.shuffle(&mut candidates);
        candidates
            .into_iter()
            .find(|anchor| occupied.iter().all(|pos| pos.distance(*anchor) > radius))
            .ok_or(SkipReason::NoClearRangedAnchor)
    }
}
