//! Player weapon state machine: firing, incremental reload and slot switching.
//!
//! The arsenal is either `Shooting` or `Reloading`. A reload adds one round
//! per tick; the first tick runs the moment the reload is requested and each
//! later tick waits `(ammo + reload_threshold) * reload_multiplier` seconds,
//! so a reload slows down as the magazine fills. Filling the magazine ends
//! the loop without a trailing wait.

use glam::Vec2;
use onslaught_common::{right_of, rotate, CatalogError, WeaponSlot, WeaponTemplateId};
use std::f32::consts::FRAC_PI_4;
use tracing::debug;

use crate::catalog::{Catalog, FirePattern, WeaponTemplate};
use crate::collaborators::{Collaborators, MuzzleSource, SoundId};
use crate::scheduler::{Scheduler, TaskId, TimedTask};

/// Scales every reload tick's wait.
pub const RELOAD_TIME_MULTIPLIER: f32 = 0.1;

/// Angle between the centre shot and each side shot of a spread.
pub const SPREAD_ANGLE: f32 = FRAC_PI_4;

/// Weapon state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeaponMode {
    /// Ready to fire
    #[default]
    Shooting,
    /// Reload loop running; the trigger is ignored
    Reloading,
}

/// One projectile to launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpec {
    /// Launch position
    pub origin: Vec2,
    /// Unit flight direction
    pub direction: Vec2,
}

/// Result of pulling the trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// A round was spent
    Fired {
        /// Ammo left
        ammo: u32,
        /// Projectiles to launch
        shots: Vec<ShotSpec>,
    },
    /// Magazine empty; only the empty click played
    Empty,
    /// Reloading; nothing happened
    Busy,
}

/// One step of the reload loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReloadStep {
    /// A round went in and another tick is scheduled
    Progress {
        /// Ammo after this tick
        ammo: u32,
        /// Seconds until the next tick
        next_wait: f32,
    },
    /// The magazine is full and the weapon is back to `Shooting`
    Finished {
        /// Ammo after this tick
        ammo: u32,
    },
}

/// Result of a reload request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReloadStart {
    /// The loop started; carries its first, immediate step
    Started(ReloadStep),
    /// Magazine already full
    AlreadyFull,
    /// A reload is already running
    Busy,
}

/// Result of a weapon switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The requested slot is now active
    Switched {
        /// Newly active slot
        slot: WeaponSlot,
        /// Ammo in the incoming weapon
        ammo: u32,
        /// Capacity of the incoming weapon
        max_ammo: u32,
    },
    /// The requested slot was already active
    SameSlot,
    /// Switching is blocked while reloading
    Busy,
}

/// The player's two weapon slots and the active weapon's state.
#[derive(Debug, Clone)]
pub struct Arsenal {
    loadout: [WeaponTemplate; WeaponSlot::COUNT],
    /// Ammo each slot held when it was last switched away from
    remembered: [Option<u32>; WeaponSlot::COUNT],
    active: WeaponSlot,
    ammo: u32,
    mode: WeaponMode,
    reload_task: Option<TaskId>,
    reload_multiplier: f32,
    /// Lateral distance of spread side shots from the muzzle
    spread_offset: f32,
}

impl Arsenal {
    /// Builds an arsenal from two catalog weapons, primary first.
    pub fn new(
        catalog: &Catalog,
        weapons: &[WeaponTemplateId],
        reload_multiplier: f32,
        spread_offset: f32,
    ) -> Result<Self, CatalogError> {
        let [primary, secondary] = weapons else {
            return Err(CatalogError::IncompleteLoadout {
                expected: WeaponSlot::COUNT,
                actual: weapons.len(),
            });
        };
        let loadout = [
            catalog.require_weapon(*primary)?.clone(),
            catalog.require_weapon(*secondary)?.clone(),
        ];
        let ammo = loadout[0].max_ammo;

        Ok(Self {
            loadout,
            remembered: [None; WeaponSlot::COUNT],
            active: WeaponSlot::Primary,
            ammo,
            mode: WeaponMode::Shooting,
            reload_task: None,
            reload_multiplier,
            spread_offset,
        })
    }

    // === Queries ===

    /// Active weapon slot.
    #[must_use]
    pub fn active_slot(&self) -> WeaponSlot {
        self.active
    }

    /// Active weapon template.
    #[must_use]
    pub fn weapon(&self) -> &WeaponTemplate {
        &self.loadout[self.active.index()]
    }

    /// Rounds in the active weapon.
    #[must_use]
    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    /// Capacity of the active weapon.
    #[must_use]
    pub fn max_ammo(&self) -> u32 {
        self.weapon().max_ammo
    }

    /// Current state.
    #[must_use]
    pub fn mode(&self) -> WeaponMode {
        self.mode
    }

    /// Whether the reload loop is running.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.mode == WeaponMode::Reloading
    }

    // === Firing ===

    /// Pulls the trigger with the muzzle at `muzzle` facing `facing`.
    pub fn fire(&mut self, muzzle: Vec2, facing: Vec2, fx: &mut Collaborators) -> FireOutcome {
        if self.is_reloading() {
            return FireOutcome::Busy;
        }
        if self.ammo == 0 {
            fx.play(SoundId::GunEmpty);
            return FireOutcome::Empty;
        }

        self.ammo -= 1;
        fx.play(SoundId::Shoot);
        fx.muzzle_flash(MuzzleSource::Player);
        fx.refresh_ammo(self.ammo, self.max_ammo());

        FireOutcome::Fired {
            ammo: self.ammo,
            shots: self.shot_layout(muzzle, facing),
        }
    }

    fn shot_layout(&self, muzzle: Vec2, facing: Vec2) -> Vec<ShotSpec> {
        let facing = facing.normalize_or_zero();
        let pattern = self.weapon().pattern;
        let mut shots = Vec::with_capacity(pattern.projectile_count());
        shots.push(ShotSpec {
            origin: muzzle,
            direction: facing,
        });

        if pattern == FirePattern::Spread {
            let lateral = right_of(facing) * self.spread_offset;
            shots.push(ShotSpec {
                origin: muzzle - lateral,
                direction: rotate(facing, SPREAD_ANGLE),
            });
            shots.push(ShotSpec {
                origin: muzzle + lateral,
                direction: rotate(facing, -SPREAD_ANGLE),
            });
        }
        shots
    }

    // === Reloading ===

    /// Starts the reload loop and runs its first tick immediately.
    pub fn begin_reload(
        &mut self,
        scheduler: &mut Scheduler,
        fx: &mut Collaborators,
    ) -> ReloadStart {
        if self.is_reloading() {
            return ReloadStart::Busy;
        }
        if self.ammo >= self.max_ammo() {
            return ReloadStart::AlreadyFull;
        }

        self.mode = WeaponMode::Reloading;
        debug!("Reloading {} from {}", self.weapon().name, self.ammo);
        ReloadStart::Started(self.load_round(scheduler, fx))
    }

    /// Runs a scheduled reload tick. Ticks that no longer belong to the
    /// running loop return `None`.
    pub fn reload_tick(
        &mut self,
        task: TaskId,
        scheduler: &mut Scheduler,
        fx: &mut Collaborators,
    ) -> Option<ReloadStep> {
        if !self.is_reloading() || self.reload_task != Some(task) {
            return None;
        }
        Some(self.load_round(scheduler, fx))
    }

    fn load_round(&mut self, scheduler: &mut Scheduler, fx: &mut Collaborators) -> ReloadStep {
        let max_ammo = self.max_ammo();
        let sound = if self.ammo + 1 == max_ammo {
            SoundId::ReloadFinished
        } else {
            SoundId::Reload
        };
        fx.play(sound);

        self.ammo = (self.ammo + 1).min(max_ammo);
        fx.refresh_ammo(self.ammo, max_ammo);

        if self.ammo >= max_ammo {
            self.mode = WeaponMode::Shooting;
            self.reload_task = None;
            debug!("Reload of {} finished", self.weapon().name);
            return ReloadStep::Finished { ammo: self.ammo };
        }

        let next_wait =
            (self.ammo as f32 + self.weapon().reload_threshold) * self.reload_multiplier;
        self.reload_task = Some(scheduler.schedule(next_wait, TimedTask::ReloadTick));
        debug!("Reload tick: {}/{max_ammo}, next in {next_wait:.3}s", self.ammo);
        ReloadStep::Progress {
            ammo: self.ammo,
            next_wait,
        }
    }

    // === Switching ===

    /// Makes `slot` the active weapon. The outgoing weapon keeps its ammo
    /// for when it is switched back in.
    pub fn switch_to(&mut self, slot: WeaponSlot, fx: &mut Collaborators) -> SwitchOutcome {
        if self.is_reloading() {
            return SwitchOutcome::Busy;
        }
        if slot == self.active {
            return SwitchOutcome::SameSlot;
        }

        self.remembered[self.active.index()] = Some(self.ammo);
        self.active = slot;
        let max_ammo = self.max_ammo();
        self.ammo = self.remembered[slot.index()].unwrap_or(max_ammo).min(max_ammo);

        fx.set_weapon_label(&self.weapon().name);
        fx.refresh_ammo(self.ammo, max_ammo);
        debug!("Switched to {} ({}/{max_ammo})", self.weapon().name, self.ammo);

        SwitchOutcome::Switched {
            slot,
            ammo: self.ammo,
            max_ammo,
        }
    }

    /// Back to the primary weapon with both magazines full.
    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.reload_task.take() {
            scheduler.cancel(id);
        }
        self.mode = WeaponMode::Shooting;
        self.active = WeaponSlot::Primary;
        self.remembered = [None; WeaponSlot::COUNT];
        self.ammo = self.max_ammo();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::recording::{recorded, Call};
    use proptest::prelude::*;

    fn arsenal() -> Arsenal {
        let catalog = Catalog::arcade();
        let weapons: Vec<_> = catalog.weapon_ids().collect();
        Arsenal::new(&catalog, &weapons, RELOAD_TIME_MULTIPLIER, 0.25).expect("arsenal")
    }

    fn run_reload(
        arsenal: &mut Arsenal,
        scheduler: &mut Scheduler,
        fx: &mut Collaborators,
        dt: f32,
    ) {
        scheduler.advance(dt);
        while let Some((id, task)) = scheduler.pop_due() {
            if task == TimedTask::ReloadTick {
                arsenal.reload_tick(id, scheduler, fx);
            }
        }
    }

    #[test]
    fn test_fire_decrements_and_notifies() {
        let mut arsenal = arsenal();
        let (mut fx, log) = recorded();

        let outcome = arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        assert_eq!(
            outcome,
            FireOutcome::Fired {
                ammo: 6,
                shots: vec![ShotSpec {
                    origin: Vec2::ZERO,
                    direction: Vec2::Y
                }]
            }
        );
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Sound(SoundId::Shoot),
                Call::MuzzleFlash(MuzzleSource::Player),
                Call::Ammo(6, 7)
            ]
        );
    }

    #[test]
    fn test_empty_magazine_only_clicks() {
        let mut arsenal = arsenal();
        let mut fx = Collaborators::none();
        for _ in 0..7 {
            arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        }

        let (mut fx, log) = recorded();
        assert_eq!(arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx), FireOutcome::Empty);
        assert_eq!(arsenal.ammo(), 0);
        assert_eq!(*log.borrow(), vec![Call::Sound(SoundId::GunEmpty)]);
    }

    #[test]
    fn test_single_round_reload_has_no_trailing_wait() {
        let mut arsenal = arsenal();
        let mut scheduler = Scheduler::new();
        let (mut fx, log) = recorded();
        arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        log.borrow_mut().clear();

        let start = arsenal.begin_reload(&mut scheduler, &mut fx);
        assert_eq!(start, ReloadStart::Started(ReloadStep::Finished { ammo: 7 }));
        assert_eq!(arsenal.mode(), WeaponMode::Shooting);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(
            *log.borrow(),
            vec![Call::Sound(SoundId::ReloadFinished), Call::Ammo(7, 7)]
        );
    }

    #[test]
    fn test_reload_tick_pacing() {
        let mut arsenal = arsenal();
        let mut scheduler = Scheduler::new();
        let mut fx = Collaborators::none();
        for _ in 0..3 {
            arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        }

        let start = arsenal.begin_reload(&mut scheduler, &mut fx);
        let ReloadStart::Started(ReloadStep::Progress { ammo, next_wait }) = start else {
            panic!("expected progress, got {start:?}");
        };
        assert_eq!(ammo, 5);
        assert!((next_wait - 0.575).abs() < 1e-6);
        assert!(arsenal.is_reloading());

        assert_eq!(arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx), FireOutcome::Busy);
        assert_eq!(arsenal.begin_reload(&mut scheduler, &mut fx), ReloadStart::Busy);

        run_reload(&mut arsenal, &mut scheduler, &mut fx, 0.5);
        assert_eq!(arsenal.ammo(), 5);
        run_reload(&mut arsenal, &mut scheduler, &mut fx, 0.1);
        assert_eq!(arsenal.ammo(), 6);
        run_reload(&mut arsenal, &mut scheduler, &mut fx, 0.7);
        assert_eq!(arsenal.ammo(), 7);
        assert_eq!(arsenal.mode(), WeaponMode::Shooting);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_reload_at_full_is_ignored() {
        let mut arsenal = arsenal();
        let mut scheduler = Scheduler::new();
        let (mut fx, log) = recorded();
        assert_eq!(arsenal.begin_reload(&mut scheduler, &mut fx), ReloadStart::AlreadyFull);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_switch_remembers_ammo() {
        let mut arsenal = arsenal();
        let (mut fx, log) = recorded();
        arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        log.borrow_mut().clear();

        let outcome = arsenal.switch_to(WeaponSlot::Secondary, &mut fx);
        assert_eq!(
            outcome,
            SwitchOutcome::Switched {
                slot: WeaponSlot::Secondary,
                ammo: 4,
                max_ammo: 4
            }
        );
        assert_eq!(
            *log.borrow(),
            vec![Call::Label("Shotgun".into()), Call::Ammo(4, 4)]
        );

        arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        assert_eq!(arsenal.switch_to(WeaponSlot::Secondary, &mut fx), SwitchOutcome::SameSlot);
        arsenal.switch_to(WeaponSlot::Primary, &mut fx);
        assert_eq!(arsenal.ammo(), 5);
        arsenal.switch_to(WeaponSlot::Secondary, &mut fx);
        assert_eq!(arsenal.ammo(), 3);
    }

    #[test]
    fn test_switch_blocked_while_reloading() {
        let mut arsenal = arsenal();
        let mut scheduler = Scheduler::new();
        let mut fx = Collaborators::none();
        arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        arsenal.begin_reload(&mut scheduler, &mut fx);

        assert_eq!(arsenal.switch_to(WeaponSlot::Secondary, &mut fx), SwitchOutcome::Busy);
        assert_eq!(arsenal.active_slot(), WeaponSlot::Primary);
    }

    #[test]
    fn test_spread_layout() {
        let mut arsenal = arsenal();
        let mut fx = Collaborators::none();
        arsenal.switch_to(WeaponSlot::Secondary, &mut fx);

        let FireOutcome::Fired { shots, .. } = arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx) else {
            panic!("expected a shot");
        };
        assert_eq!(shots.len(), FirePattern::Spread.projectile_count());
        let diag = std::f32::consts::FRAC_1_SQRT_2;
        assert!((shots[1].origin - Vec2::new(-0.25, 0.0)).length() < 1e-5);
        assert!((shots[1].direction - Vec2::new(-diag, diag)).length() < 1e-5);
        assert!((shots[2].origin - Vec2::new(0.25, 0.0)).length() < 1e-5);
        assert!((shots[2].direction - Vec2::new(diag, diag)).length() < 1e-5);
    }

    #[test]
    fn test_incomplete_loadout() {
        let catalog = Catalog::arcade();
        let one: Vec<_> = catalog.weapon_ids().take(1).collect();
        assert_eq!(
            Arsenal::new(&catalog, &one, RELOAD_TIME_MULTIPLIER, 0.25).err(),
            Some(CatalogError::IncompleteLoadout {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_reset_cancels_reload() {
        let mut arsenal = arsenal();
        let mut scheduler = Scheduler::new();
        let mut fx = Collaborators::none();
        for _ in 0..4 {
            arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
        }
        arsenal.begin_reload(&mut scheduler, &mut fx);
        assert_eq!(scheduler.pending_count(), 1);

        arsenal.reset(&mut scheduler);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!((arsenal.ammo(), arsenal.mode()), (7, WeaponMode::Shooting));
    }

    proptest! {
        #[test]
        fn prop_ammo_stays_in_bounds(ops in proptest::collection::vec(0u8..4, 1..80)) {
            let mut arsenal = arsenal();
            let mut scheduler = Scheduler::new();
            let mut fx = Collaborators::none();

            for op in ops {
                let before = arsenal.ammo();
                match op {
                    0 => {
                        let outcome = arsenal.fire(Vec2::ZERO, Vec2::Y, &mut fx);
                        if before == 0 {
                            let fired = matches!(outcome, FireOutcome::Fired { .. });
                            prop_assert!(!fired, "fired on an empty magazine");
                            prop_assert_eq!(arsenal.ammo(), 0);
                        }
                    },
                    1 => {
                        arsenal.begin_reload(&mut scheduler, &mut fx);
                    },
                    2 => run_reload(&mut arsenal, &mut scheduler, &mut fx, 0.3),
                    _ => {
                        arsenal.switch_to(arsenal.active_slot().other(), &mut fx);
                    },
                }
                prop_assert!(arsenal.ammo() <= arsenal.max_ammo());
            }
        }
    }
}
