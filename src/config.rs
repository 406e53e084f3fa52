use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    pursuer_speed, ANIMATION_PERIOD_MS, BLOCK_SIZE, INITIAL_LIVES, MAX_PURSUERS, PLAYER_SPEED,
    PURSUER_COUNT, PURSUER_RANGE_BASE, TICK_RATE, WANDER_PERIOD_MS,
};
use crate::error::ConfigError;
use crate::types::Vec2;
use crate::world::GridMap;

pub const ENV_TICK_RATE: &str = "MAZE_CHASE_TICK_RATE";
pub const ENV_LIVES: &str = "MAZE_CHASE_LIVES";
pub const ENV_SEED: &str = "MAZE_CHASE_SEED";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub tick_rate: u32,
    pub initial_lives: u32,
    pub player_speed: f32,
    pub pursuer_count: usize,
    pub pursuer_range_base: u32,
    pub wander_period_ms: u64,
    pub animation_period_ms: u64,
    pub seed: u32,
    pub cache_paths: bool,
    /// Grid cell the player (re)spawns in.
    pub player_start: Vec2,
    /// Pursuer `i` spawns in `pursuer_starts[i % len]`.
    pub pursuer_starts: Vec<Vec2>,
    /// Custom layout rows; the authored maze is used when absent.
    pub map: Option<Vec<String>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            initial_lives: INITIAL_LIVES,
            player_speed: PLAYER_SPEED,
            pursuer_count: PURSUER_COUNT,
            pursuer_range_base: PURSUER_RANGE_BASE,
            wander_period_ms: WANDER_PERIOD_MS,
            animation_period_ms: ANIMATION_PERIOD_MS,
            seed: 0,
            cache_paths: true,
            player_start: Vec2::new(1, 1),
            pursuer_starts: vec![Vec2::new(9, 10), Vec2::new(10, 11)],
            map: None,
        }
    }
}

impl GameConfig {
    /// Defaults, then the optional JSON file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TICK_RATE) {
            self.tick_rate = parse_env(ENV_TICK_RATE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LIVES) {
            self.initial_lives = parse_env(ENV_LIVES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            self.seed = parse_env(ENV_SEED, &raw)?;
        }
        Ok(())
    }

    pub fn build_map(&self) -> Result<GridMap, ConfigError> {
        match &self.map {
            Some(rows) => Ok(GridMap::parse(rows)?),
            None => Ok(GridMap::reference()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid(
                "tickRate must be positive".to_string(),
            ));
        }
        if self.initial_lives == 0 {
            return Err(ConfigError::Invalid(
                "initialLives must be positive".to_string(),
            ));
        }
        if self.pursuer_count > MAX_PURSUERS {
            return Err(ConfigError::Invalid(format!(
                "pursuerCount must be at most {MAX_PURSUERS}"
            )));
        }
        if self.pursuer_count > 0 && self.pursuer_starts.is_empty() {
            return Err(ConfigError::Invalid(
                "pursuerStarts must not be empty".to_string(),
            ));
        }
        if self.wander_period_ms == 0 || self.animation_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "timer periods must be positive".to_string(),
            ));
        }
        for (label, speed) in [
            ("playerSpeed", self.player_speed),
            ("pursuer speed", pursuer_speed(self.player_speed)),
        ] {
            if !speed_aligns_with_grid(speed) {
                return Err(ConfigError::Invalid(format!(
                    "{label} {speed} must be positive, below {BLOCK_SIZE} and divide it evenly"
                )));
            }
        }

        let map = self.build_map()?;
        let mut starts = vec![("playerStart", self.player_start)];
        for cell in &self.pursuer_starts {
            starts.push(("pursuerStarts", *cell));
        }
        for (label, cell) in starts {
            if !map.is_walkable(cell.x, cell.y) {
                return Err(ConfigError::Invalid(format!(
                    "{label} ({}, {}) is not an open cell",
                    cell.x, cell.y
                )));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    match raw.trim().parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::InvalidEnv {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Entities only line up with cell boundaries, and can therefore turn into
/// side passages, when their speed divides the block size.
fn speed_aligns_with_grid(speed: f32) -> bool {
    if !speed.is_finite() || speed <= 0.0 || speed >= BLOCK_SIZE {
        return false;
    }
    let steps = BLOCK_SIZE / speed;
    (steps - steps.round()).abs() < 1e-4
}
