//! Combat tuning loaded from TOML.

use onslaught_common::{OnslaughtError, OnslaughtResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::spawn::{
    SpawnPacing, SpawnRules, DEFAULT_EXCLUSION_RADIUS, DEFAULT_RANGED_CAP, MAX_SPAWN_INTERVAL,
    MIN_SPAWN_INTERVAL, SPAWN_INTERVAL_DECAY,
};
use crate::weapon::RELOAD_TIME_MULTIPLIER;

/// Default config file name.
pub const CONFIG_FILE: &str = "onslaught.toml";

/// Tunables of a combat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === Simulation ===
    /// Seed for spawn choices
    pub seed: u64,
    /// Physics step in seconds
    pub fixed_dt: f32,

    // === Pools ===
    /// Bullets constructed up front
    pub bullet_pool_size: usize,
    /// Enemies constructed up front, per template
    pub enemy_pool_size: usize,

    // === Spawning ===
    /// Shortest wait between spawn attempts
    pub spawn_min_interval: f32,
    /// Longest wait between spawn attempts
    pub spawn_max_interval: f32,
    /// Seconds shaved off the wait per live enemy
    pub spawn_interval_decay: f32,
    /// Live ranged enemies allowed at once
    pub ranged_cap: usize,
    /// Clearance a ranged anchor needs from live ranged enemies
    pub ranged_exclusion_radius: f32,

    // === Weapons ===
    /// Scales every reload tick's wait
    pub reload_time_multiplier: f32,
    /// Lateral distance of spread side shots
    pub spread_spawn_offset: f32,
    /// Distance from the player to the muzzle
    pub muzzle_offset: f32,

    // === Projectiles ===
    /// Bullet speed in world units per second
    pub bullet_speed: f32,
    /// Damage a bullet deals to the player
    pub bullet_damage: u32,
    /// Seconds before an unclaimed bullet is recycled (0 = never)
    pub projectile_lifetime: f32,

    // === Enemies ===
    /// Damage flash duration in seconds
    pub damage_flash_secs: f32,

    // === Player ===
    /// Player health
    pub player_max_health: u32,
    /// Normal movement speed
    pub player_move_speed: f32,
    /// Movement speed while reloading
    pub player_reload_move_speed: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            fixed_dt: 1.0 / 50.0,
            bullet_pool_size: 50,
            enemy_pool_size: 30,
            spawn_min_interval: MIN_SPAWN_INTERVAL,
            spawn_max_interval: MAX_SPAWN_INTERVAL,
            spawn_interval_decay: SPAWN_INTERVAL_DECAY,
            ranged_cap: DEFAULT_RANGED_CAP,
            ranged_exclusion_radius: DEFAULT_EXCLUSION_RADIUS,
            reload_time_multiplier: RELOAD_TIME_MULTIPLIER,
            spread_spawn_offset: 0.25,
            muzzle_offset: 0.5,
            bullet_speed: 5.0,
            bullet_damage: 1,
            projectile_lifetime: 6.0,
            damage_flash_secs: 0.1,
            player_max_health: 6,
            player_move_speed: 3.0,
            player_reload_move_speed: 7.0,
        }
    }
}

impl CombatConfig {
    /// Loads configuration from `path`, failing on a missing or malformed file.
    pub fn try_load<P: AsRef<Path>>(path: P) -> OnslaughtResult<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&contents).map_err(|e| OnslaughtError::Serialization(e.to_string()))?;
        config.validate();
        Ok(config)
    }

    /// Loads configuration from `path`.
    /// Returns defaults if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to load config file: {e}");
                Self::default()
            },
        }
    }

    /// Saves configuration to `path`.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamps values to sensible ranges.
    pub fn validate(&mut self) {
        self.fixed_dt = self.fixed_dt.clamp(1.0 / 240.0, 0.1);

        self.spawn_min_interval = self.spawn_min_interval.clamp(0.1, 30.0);
        self.spawn_max_interval = self.spawn_max_interval.clamp(self.spawn_min_interval, 60.0);
        self.spawn_interval_decay = self.spawn_interval_decay.clamp(0.0, 10.0);
        self.ranged_exclusion_radius = self.ranged_exclusion_radius.max(0.0);

        self.reload_time_multiplier = self.reload_time_multiplier.clamp(0.0, 10.0);
        self.spread_spawn_offset = self.spread_spawn_offset.max(0.0);
        self.muzzle_offset = self.muzzle_offset.max(0.0);

        self.bullet_speed = self.bullet_speed.clamp(0.1, 100.0);
        self.projectile_lifetime = self.projectile_lifetime.max(0.0);
        self.damage_flash_secs = self.damage_flash_secs.clamp(0.0, 5.0);

        self.player_max_health = self.player_max_health.max(1);
        self.player_move_speed = self.player_move_speed.max(0.0);
        self.player_reload_move_speed = self.player_reload_move_speed.max(0.0);
    }

    /// Spawn director tunables.
    #[must_use]
    pub fn spawn_rules(&self) -> SpawnRules {
        SpawnRules {
            pacing: SpawnPacing {
                min_interval: self.spawn_min_interval,
                max_interval: self.spawn_max_interval,
                decay: self.spawn_interval_decay,
            },
            ranged_cap: self.ranged_cap,
            exclusion_radius: self.ranged_exclusion_radius,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CombatConfig::default();
        assert_eq!(config.bullet_pool_size, 50);
        assert_eq!(config.enemy_pool_size, 30);
        assert_eq!(config.ranged_cap, 4);
        assert!((config.reload_time_multiplier - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.player_max_health, 6);
    }

    #[test]
    fn test_config_validation() {
        let mut config = CombatConfig::default();
        config.spawn_min_interval = 3.0;
        config.spawn_max_interval = 1.0;
        config.player_max_health = 0;
        config.bullet_speed = -4.0;

        config.validate();

        assert_eq!(config.spawn_max_interval, 3.0);
        assert_eq!(config.player_max_health, 1);
        assert!((config.bullet_speed - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = CombatConfig::default();
        config.seed = 12345;
        config.ranged_cap = 2;
        config.save_to(&config_path).expect("Failed to save config");

        let loaded = CombatConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = CombatConfig::load_from("/nonexistent/path/onslaught.toml");
        assert_eq!(config, CombatConfig::default());
        assert!(CombatConfig::try_load("/nonexistent/path/onslaught.toml").is_err());
    }

    #[test]
    fn test_config_partial_and_invalid_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let partial = temp_dir.path().join("partial.toml");
        fs::write(&partial, "ranged_cap = 7\nbullet_speed = 9.0\n").expect("write");
        let config = CombatConfig::load_from(&partial);
        assert_eq!(config.ranged_cap, 7);
        assert!((config.bullet_speed - 9.0).abs() < f32::EPSILON);
        assert_eq!(config.bullet_pool_size, 50);

        let broken = temp_dir.path().join("broken.toml");
        fs::write(&broken, "ranged_cap = \"many\"").expect("write");
        assert!(matches!(
            CombatConfig::try_load(&broken),
            Err(OnslaughtError::Serialization(_))
        ));
        assert_eq!(CombatConfig::load_from(&broken), CombatConfig::default());
    }

    #[test]
    fn test_spawn_rules_follow_config() {
        let mut config = CombatConfig::default();
        config.ranged_cap = 1;
        let rules = config.spawn_rules();
        assert_eq!(rules.ranged_cap, 1);
        assert!((rules.pacing.max_interval - 2.25).abs() < f32::EPSILON);
    }
}
