//! Stage configuration (game speed, map scale, seed, UFO tuning). Loaded from `config.ron`.

use std::path::{Path, PathBuf};

use engine_core::{Fixed, FRACUNIT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid stage config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Kart game speed setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameSpeed {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl GameSpeed {
    /// Speed multiplier: 13/16, 16/16 and 19/16.
    pub fn scalar(self) -> Fixed {
        let value = match self {
            GameSpeed::Easy => 0,
            GameSpeed::Normal => 1,
            GameSpeed::Hard => 2,
        };
        Fixed::from_ratio(13 + 3 * value, 16)
    }
}

/// Per-stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub game_speed: GameSpeed,
    /// Raw 16.16 scale applied to every map object (65536 = 1.0).
    #[serde(default = "default_map_object_scale")]
    pub map_object_scale: i32,
    /// Seed for the decoration, sparkle and skin streams.
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
    /// Ceiling above the track, in map units.
    #[serde(default = "default_ceiling_height")]
    pub ceiling_height: i32,
    #[serde(default = "default_ufo_spawn_health")]
    pub ufo_spawn_health: i32,
    /// Map units.
    #[serde(default = "default_ufo_radius")]
    pub ufo_radius: i32,
    /// Map units.
    #[serde(default = "default_ufo_height")]
    pub ufo_height: i32,
}

fn default_map_object_scale() -> i32 {
    FRACUNIT
}
fn default_rng_seed() -> u64 {
    0x5EC1_A15E
}
fn default_ceiling_height() -> i32 {
    2048
}
fn default_ufo_spawn_health() -> i32 {
    101
}
fn default_ufo_radius() -> i32 {
    108
}
fn default_ufo_height() -> i32 {
    160
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            game_speed: GameSpeed::default(),
            map_object_scale: default_map_object_scale(),
            rng_seed: default_rng_seed(),
            ceiling_height: default_ceiling_height(),
            ufo_spawn_health: default_ufo_spawn_health(),
            ufo_radius: default_ufo_radius(),
            ufo_height: default_ufo_height(),
        }
    }
}

impl StageConfig {
    /// Load from `path`. If the file is missing or invalid, returns the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read_from(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("{}, using default stage config", e);
                Self::default()
            }
        }
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&data)
    }

    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(data)?)
    }

    pub fn map_object_scale(&self) -> Fixed {
        Fixed(self.map_object_scale)
    }
}
