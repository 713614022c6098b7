//! Encounter configuration
//!
//! Loaded from a JSON file by the headless driver; every field has a default,
//! so a partial file only overrides what it names.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::SIM_DT;
use crate::sim::{AttackTiming, Encounter, HeroScript, ScriptLeg, UnitStats};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Where a unit starts and what it can do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpawn {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub stats: UnitStats,
    /// Starting health (defaults to max)
    #[serde(default)]
    pub health: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroSpawn {
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    pub max_health: f32,
    pub movement_speed: f32,
    #[serde(default)]
    pub script: HeroScript,
}

impl Default for HeroSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 8.0),
            yaw: 180.0,
            max_health: 300.0,
            movement_speed: 5.0,
            script: HeroScript {
                legs: vec![
                    // Strafe right, then stand, then sprint left
                    ScriptLeg {
                        from_tick: 120,
                        until_tick: 240,
                        direction: Vec3::X,
                        throttle: 0.4,
                    },
                    ScriptLeg {
                        from_tick: 600,
                        until_tick: 720,
                        direction: Vec3::NEG_X,
                        throttle: 1.0,
                    },
                ],
                counter: None,
                contact_radius: 1.0,
            },
        }
    }
}

/// Full description of a headless encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// RNG seed for reproducibility
    pub seed: u64,
    /// Fixed timestep (seconds)
    pub dt: f32,
    /// Number of ticks to run
    pub ticks: u64,
    pub timing: AttackTiming,
    pub units: Vec<UnitSpawn>,
    pub hero: HeroSpawn,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        let unit = |x: f32, health: f32| UnitSpawn {
            position: Vec3::new(x, 0.0, 0.0),
            yaw: 0.0,
            stats: UnitStats::default(),
            health: Some(health),
        };
        Self {
            seed: 12345,
            dt: SIM_DT,
            ticks: 60 * 30,
            timing: AttackTiming::default(),
            units: vec![unit(-4.0, 100.0), unit(0.0, 60.0), unit(4.0, 40.0)],
            hero: HeroSpawn::default(),
        }
    }
}

impl EncounterConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        log::info!("Loaded encounter config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EncounterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Encounter config saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::Invalid("at least one unit is required".into()));
        }
        if !(self.dt > 0.0) {
            return Err(ConfigError::Invalid(format!("dt must be positive, got {}", self.dt)));
        }
        if self.timing.min_attack_interval > self.timing.max_attack_interval {
            return Err(ConfigError::Invalid(format!(
                "min_attack_interval {} exceeds max_attack_interval {}",
                self.timing.min_attack_interval, self.timing.max_attack_interval
            )));
        }
        if !(self.hero.max_health > 0.0) {
            return Err(ConfigError::Invalid("hero max_health must be positive".into()));
        }
        for (i, spawn) in self.units.iter().enumerate() {
            let stats = &spawn.stats;
            if !(stats.max_health > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "unit {}: max_health must be positive",
                    i
                )));
            }
            if stats.min_keep_distance > stats.max_keep_distance {
                return Err(ConfigError::Invalid(format!(
                    "unit {}: min_keep_distance exceeds max_keep_distance",
                    i
                )));
            }
            if stats.attack_range > stats.min_keep_distance {
                log::warn!(
                    "unit {}: attack_range {} reaches past min_keep_distance {}",
                    i,
                    stats.attack_range,
                    stats.min_keep_distance
                );
            }
        }
        Ok(())
    }

    /// Build a fresh encounter from this config
    pub fn build(&self) -> Encounter {
        let mut encounter = Encounter::new(self.seed, self.timing);
        for spawn in &self.units {
            let id = encounter.spawn_unit(spawn.stats, spawn.position, spawn.yaw);
            if let (Some(health), Some(unit)) = (spawn.health, encounter.group.unit_mut(id)) {
                unit.health = health;
            }
        }
        encounter.spawn_hero(
            self.hero.position,
            self.hero.yaw,
            self.hero.max_health,
            self.hero.movement_speed,
        );
        encounter.group.rank_units();
        encounter
    }
}
