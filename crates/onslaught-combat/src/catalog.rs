//! Immutable enemy and weapon templates.
//!
//! Templates arrive already loaded (the host owns asset loading) and are
//! shared read-only by every live instance. They are addressed by typed
//! catalog index, so a lookup cannot miss on a misspelt name.

use onslaught_common::{CatalogError, EnemyTemplateId, WeaponTemplateId};
use serde::{Deserialize, Serialize};

/// RGBA colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Tint {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a colour.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Lightens every colour channel by `amount` and forces full opacity.
    ///
    /// Channels saturate at 1.0.
    #[must_use]
    pub fn brightened(self, amount: f32) -> Self {
        Self {
            r: (self.r + amount).clamp(0.0, 1.0),
            g: (self.g + amount).clamp(0.0, 1.0),
            b: (self.b + amount).clamp(0.0, 1.0),
            a: 1.0,
        }
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Firing parameters of enemies that shoot back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedProfile {
    /// Seconds between shots
    pub shoot_interval: f32,
    /// Distance from the enemy centre to its muzzle along its facing
    pub muzzle_offset: f32,
}

/// Static attributes of an enemy kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Display name
    pub name: String,
    /// Health on spawn
    pub max_health: u32,
    /// Pursuit speed in world units per second
    pub move_speed: f32,
    /// Damage dealt to the player on body contact
    pub contact_damage: u32,
    /// Score awarded on death
    pub score_value: u32,
    /// Sprite identifier for the renderer
    pub visual_id: u16,
    /// Sound bank identifier for the audio layer
    pub audio_id: u16,
    /// Sprite colour outside of damage flashes
    pub base_tint: Tint,
    /// Present for enemies that shoot
    pub ranged: Option<RangedProfile>,
}

impl EnemyTemplate {
    /// Whether this kind runs a firing loop.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.ranged.is_some()
    }
}

/// Projectile layout of a single trigger pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FirePattern {
    /// One projectile straight ahead.
    #[default]
    Single,
    /// Centre shot plus two side shots angled 45 degrees outward.
    Spread,
}

impl FirePattern {
    /// Projectiles launched per shot.
    #[must_use]
    pub const fn projectile_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::Spread => 3,
        }
    }
}

/// Static attributes of a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponTemplate {
    /// Label shown by the HUD
    pub name: String,
    /// Magazine capacity
    pub max_ammo: u32,
    /// Reload pacing offset; higher values slow every reload tick
    pub reload_threshold: f32,
    /// Projectile layout
    pub pattern: FirePattern,
}

/// All templates available to a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    enemies: Vec<EnemyTemplate>,
    weapons: Vec<WeaponTemplate>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an enemy template and returns its id.
    pub fn add_enemy(&mut self, template: EnemyTemplate) -> EnemyTemplateId {
        self.enemies.push(template);
        EnemyTemplateId::new((self.enemies.len() - 1) as u16)
    }

    /// Adds a weapon template and returns its id.
    pub fn add_weapon(&mut self, template: WeaponTemplate) -> WeaponTemplateId {
        self.weapons.push(template);
        WeaponTemplateId::new((self.weapons.len() - 1) as u16)
    }

    /// Looks up an enemy template.
    #[must_use]
    pub fn enemy(&self, id: EnemyTemplateId) -> Option<&EnemyTemplate> {
        self.enemies.get(usize::from(id.raw()))
    }

    /// Looks up a weapon template.
    #[must_use]
    pub fn weapon(&self, id: WeaponTemplateId) -> Option<&WeaponTemplate> {
        self.weapons.get(usize::from(id.raw()))
    }

    /// Looks up an enemy template, failing on unknown ids.
    pub fn require_enemy(&self, id: EnemyTemplateId) -> Result<&EnemyTemplate, CatalogError> {
        self.enemy(id).ok_or(CatalogError::UnknownEnemyTemplate(id))
    }

    /// Looks up a weapon template, failing on unknown ids.
    pub fn require_weapon(&self, id: WeaponTemplateId) -> Result<&WeaponTemplate, CatalogError> {
        self.weapon(id).ok_or(CatalogError::UnknownWeaponTemplate(id))
    }

    /// Ids of every enemy template, in insertion order.
    pub fn enemy_ids(&self) -> impl Iterator<Item = EnemyTemplateId> {
        (0..self.enemies.len()).map(|i| EnemyTemplateId::new(i as u16))
    }

    /// Ids of every weapon template, in insertion order.
    pub fn weapon_ids(&self) -> impl Iterator<Item = WeaponTemplateId> {
        (0..self.weapons.len()).map(|i| WeaponTemplateId::new(i as u16))
    }

    /// The stock arcade roster: three melee kinds, one shooter, pistol and shotgun.
    #[must_use]
    pub fn arcade() -> Self {
        let mut catalog = Self::new();
        catalog.add_enemy(EnemyTemplate {
            name: "Enemy".into(),
            max_health: 2,
            move_speed: 1.5,
            contact_damage: 1,
            score_value: 10,
            visual_id: 0,
            audio_id: 0,
            base_tint: Tint::new(0.8, 0.2, 0.2, 1.0),
            ranged: None,
        });
        catalog.add_enemy(EnemyTemplate {
            name: "StrongEnemy".into(),
            max_health: 5,
            move_speed: 1.0,
            contact_damage: 2,
            score_value: 25,
            visual_id: 1,
            audio_id: 0,
            base_tint: Tint::new(0.5, 0.1, 0.6, 1.0),
            ranged: None,
        });
        catalog.add_enemy(EnemyTemplate {
            name: "FastEnemy".into(),
            max_health: 1,
            move_speed: 2.5,
            contact_damage: 1,
            score_value: 15,
            visual_id: 2,
            audio_id: 1,
            base_tint: Tint::new(0.9, 0.7, 0.1, 1.0),
            ranged: None,
        });
        catalog.add_enemy(EnemyTemplate {
            name: "ShooterEnemy".into(),
            max_health: 3,
            move_speed: 0.0,
            contact_damage: 1,
            score_value: 30,
            visual_id: 3,
            audio_id: 2,
            base_tint: Tint::new(0.2, 0.5, 0.9, 1.0),
            ranged: Some(RangedProfile {
                shoot_interval: 2.0,
                muzzle_offset: 0.5,
            }),
        });
        catalog.add_weapon(WeaponTemplate {
            name: "Pistol".into(),
            max_ammo: 7,
            reload_threshold: 0.75,
            pattern: FirePattern::Single,
        });
        catalog.add_weapon(WeaponTemplate {
            name: "Shotgun".into(),
            max_ammo: 4,
            reload_threshold: 2.0,
            pattern: FirePattern::Spread,
        });
        catalog
    }
}
