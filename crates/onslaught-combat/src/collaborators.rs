//! Interfaces to the layers outside the combat core.
//!
//! Rendering, audio and HUD are push-only sinks: the core calls them with
//! derived values and never reads anything back. Input is polled once per
//! variable-rate tick. Any sink may be absent; calls to a missing sink are
//! skipped.

use glam::Vec2;
use onslaught_common::PoolHandle;

/// Sounds the core asks the audio layer to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    /// Weapon discharge (player or enemy)
    Shoot,
    /// One round loaded
    Reload,
    /// Last round loaded
    ReloadFinished,
    /// Trigger pulled on an empty magazine
    GunEmpty,
    /// Footsteps loop
    Walk,
    /// Enemy hit but still alive
    EnemyHit,
    /// Enemy killed
    EnemyDeath,
    /// UI click
    Click,
    /// Background music loop
    Music,
}

/// Who fired, for muzzle-flash placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuzzleSource {
    /// The player's weapon
    Player,
    /// A ranged enemy
    Enemy(PoolHandle),
}

/// Visual effect triggers.
pub trait VisualEffects {
    /// Plays the muzzle flash of a shooter.
    fn play_muzzle_flash(&mut self, source: MuzzleSource);

    /// Flashes an enemy sprite for `duration_secs`.
    fn play_damage_flash(&mut self, enemy: PoolHandle, duration_secs: f32);
}

/// Audio cue playback.
pub trait AudioSink {
    /// Plays a one-shot sound.
    fn play(&mut self, sound: SoundId);

    /// Starts a looping sound.
    fn play_loop(&mut self, sound: SoundId);

    /// Stops a looping sound.
    fn stop(&mut self, sound: SoundId);
}

/// HUD updates.
pub trait HudSink {
    /// Ammo counter changed.
    fn refresh_ammo(&mut self, current: u32, max: u32);

    /// Score changed.
    fn update_score(&mut self, total: u64);

    /// Player health bar changed; `fraction` is in `0.0..=1.0`.
    fn update_health_ratio(&mut self, fraction: f32);

    /// Active weapon changed.
    fn set_weapon_label(&mut self, name: &str);
}

/// Player input, sampled once per variable-rate tick.
pub trait InputSource {
    /// Movement direction, unit length or zero.
    fn movement_vector(&mut self) -> Vec2;

    /// Aim direction, if the player is aiming anywhere.
    fn aim_direction(&mut self) -> Option<Vec2>;

    /// Fire pressed this tick.
    fn fire_pressed(&mut self) -> bool;

    /// Reload pressed this tick.
    fn reload_pressed(&mut self) -> bool;

    /// Weapon slot requested this tick.
    fn weapon_switch_requested(&mut self) -> Option<usize>;
}

/// The optional output sinks of a session.
#[derive(Default)]
pub struct Collaborators {
    vfx: Option<Box<dyn VisualEffects>>,
    audio: Option<Box<dyn AudioSink>>,
    hud: Option<Box<dyn HudSink>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("vfx", &self.vfx.is_some())
            .field("audio", &self.audio.is_some())
            .field("hud", &self.hud.is_some())
            .finish()
    }
}

impl Collaborators {
    /// No sinks attached.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Attaches a visual effects sink.
    #[must_use]
    pub fn with_vfx(mut self, vfx: Box<dyn VisualEffects>) -> Self {
        self.vfx = Some(vfx);
        self
    }

    /// Attaches an audio sink.
    #[must_use]
    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Attaches a HUD sink.
    #[must_use]
    pub fn with_hud(mut self, hud: Box<dyn HudSink>) -> Self {
        self.hud = Some(hud);
        self
    }

    pub(crate) fn play(&mut self, sound: SoundId) {
        if let Some(audio) = self.audio.as_mut() {
            audio.play(sound);
        }
    }

    pub(crate) fn play_loop(&mut self, sound: SoundId) {
        if let Some(audio) = self.audio.as_mut() {
            audio.play_loop(sound);
        }
    }

    pub(crate) fn stop(&mut self, sound: SoundId) {
        if let Some(audio) = self.audio.as_mut() {
            audio.stop(sound);
        }
    }

    pub(crate) fn muzzle_flash(&mut self, source: MuzzleSource) {
        if let Some(vfx) = self.vfx.as_mut() {
            vfx.play_muzzle_flash(source);
        }
    }

    pub(crate) fn damage_flash(&mut self, enemy: PoolHandle, duration_secs: f32) {
        if let Some(vfx) = self.vfx.as_mut() {
            vfx.play_damage_flash(enemy, duration_secs);
        }
    }

    pub(crate) fn refresh_ammo(&mut self, current: u32, max: u32) {
        if let Some(hud) = self.hud.as_mut() {
            hud.refresh_ammo(current, max);
        }
    }

    pub(crate) fn update_score(&mut self, total: u64) {
        if let Some(hud) = self.hud.as_mut() {
            hud.update_score(total);
        }
    }

    pub(crate) fn update_health_ratio(&mut self, fraction: f32) {
        if let Some(hud) = self.hud.as_mut() {
            hud.update_health_ratio(fraction);
        }
    }

    pub(crate) fn set_weapon_label(&mut self, name: &str) {
        if let Some(hud) = self.hud.as_mut() {
            hud.set_weapon_label(name);
        }
    }
}
