//! Data-driven game balance
//!
//! Every timing and feel constant the simulation reads at runtime lives here,
//! so a host can ship alternate balance files without rebuilding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading tuning data
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Balance parameters for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Phase timing (ms) ===
    pub countdown_ms: u64,
    pub run_duration_ms: u64,
    pub wipeout_ms: u64,
    pub finish_banner_ms: u64,

    // === Obstacles ===
    /// Depth units per second
    pub obstacle_speed: f32,
    pub spawn_min_ms: u64,
    pub spawn_max_ms: u64,
    pub collision_threshold: f32,
    pub collision_depth: f32,
    pub disposal_depth: f32,
    /// Probability that a spawn carries loot instead of being a hazard
    pub loot_chance: f64,
    pub loot_values: Vec<u32>,

    // === Tilt ===
    pub tilt_sensitivity: f32,
    pub tilt_dead_zone: f32,
    pub tilt_smoothing: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            countdown_ms: COUNTDOWN_MS,
            run_duration_ms: RUN_DURATION_MS,
            wipeout_ms: WIPEOUT_MS,
            finish_banner_ms: FINISH_BANNER_MS,

            obstacle_speed: OBSTACLE_SPEED,
            spawn_min_ms: SPAWN_MIN_MS,
            spawn_max_ms: SPAWN_MAX_MS,
            collision_threshold: COLLISION_THRESHOLD,
            collision_depth: COLLISION_DEPTH,
            disposal_depth: DISPOSAL_DEPTH,
            loot_chance: LOOT_CHANCE,
            loot_values: LOOT_VALUES.to_vec(),

            tilt_sensitivity: TILT_SENSITIVITY,
            tilt_dead_zone: TILT_DEAD_ZONE,
            tilt_smoothing: TILT_SMOOTHING,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |field, reason| Err(TuningError::Invalid { field, reason });

        if self.countdown_ms == 0 {
            return invalid("countdown_ms", "must be positive");
        }
        if self.run_duration_ms == 0 {
            return invalid("run_duration_ms", "must be positive");
        }
        if self.wipeout_ms == 0 {
            return invalid("wipeout_ms", "must be positive");
        }
        if self.spawn_min_ms == 0 {
            return invalid("spawn_min_ms", "must be positive");
        }
        if self.spawn_min_ms > self.spawn_max_ms {
            return invalid("spawn_min_ms", "must not exceed spawn_max_ms");
        }
        if !(self.obstacle_speed.is_finite() && self.obstacle_speed > 0.0) {
            return invalid("obstacle_speed", "must be a positive number");
        }
        if !(self.collision_threshold > 0.0) {
            return invalid("collision_threshold", "must be positive");
        }
        if !(self.collision_depth.is_finite() && self.collision_depth >= 0.0) {
            return invalid("collision_depth", "must be a non-negative number");
        }
        if !self.disposal_depth.is_finite() {
            return invalid("disposal_depth", "must be a finite number");
        }
        if self.collision_depth >= self.disposal_depth {
            return invalid("collision_depth", "must be shallower than disposal_depth");
        }
        if !(0.0..=1.0).contains(&self.loot_chance) {
            return invalid("loot_chance", "must be within [0, 1]");
        }
        if self.loot_chance > 0.0 && self.loot_values.is_empty() {
            return invalid("loot_values", "required when loot_chance > 0");
        }
        if !(self.tilt_sensitivity.is_finite() && self.tilt_sensitivity > 0.0) {
            return invalid("tilt_sensitivity", "must be a positive number");
        }
        if !(self.tilt_smoothing > 0.0 && self.tilt_smoothing <= 1.0) {
            return invalid("tilt_smoothing", "must be within (0, 1]");
        }
        if !(self.tilt_dead_zone >= 0.0) {
            return invalid("tilt_dead_zone", "must not be negative");
        }
        Ok(())
    }
}
