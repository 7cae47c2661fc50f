//! Extol - a tilt-steered tube surfing arcade game
//!
//! Core modules:
//! - `sim`: Gameplay simulation (phase machine, obstacles, tilt, gestures)
//! - `score`: Run points and identity-keyed persisted totals
//! - `persistence`: Key-value store contract and backends
//! - `haptics`: Haptic pulse requests and sinks
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod haptics;
pub mod persistence;
pub mod platform;
pub mod score;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use score::ScoreLedger;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Sensor sampling interval while the tracker is active (~60 Hz)
    pub const SENSOR_INTERVAL_MS: u32 = 16;
    /// Raw accelerometer delta to tilt multiplier
    pub const TILT_SENSITIVITY: f32 = 3.5;
    /// Tilt changes smaller than this are treated as jitter
    pub const TILT_DEAD_ZONE: f32 = 0.03;
    /// EMA alpha (lower = smoother, higher = more responsive)
    pub const TILT_SMOOTHING: f32 = 0.3;

    /// Sprite lean at the tube walls, degrees per unit of tilt
    pub const LEAN_DEGREES: f32 = 35.0;

    /// Tube layout as fractions of the viewport
    pub const VANISHING_X: f32 = 0.5;
    pub const VANISHING_Y: f32 = 0.38;
    pub const ARC_BASE_Y: f32 = 0.78;
    pub const ARC_HALF_WIDTH: f32 = 0.42;
    pub const ARC_CURVE_HEIGHT: f32 = 0.22;

    /// Lane/tilt distance below which sprite and obstacle touch
    pub const COLLISION_THRESHOLD: f32 = 0.2;
    /// Depth of the player's plane, where collisions are evaluated
    pub const COLLISION_DEPTH: f32 = 0.95;
    /// Obstacles at or past this depth are discarded
    pub const DISPOSAL_DEPTH: f32 = 1.3;
    /// Obstacle approach speed (depth units per second)
    pub const OBSTACLE_SPEED: f32 = 0.45;

    /// Spawn interval range (ms)
    pub const SPAWN_MIN_MS: u64 = 800;
    pub const SPAWN_MAX_MS: u64 = 1800;

    /// Lane positions spread around the tube
    pub const LANES: [f32; 7] = [-0.8, -0.5, -0.2, 0.0, 0.2, 0.5, 0.8];
    /// Number of visual obstacle variants
    pub const OBSTACLE_KINDS: u8 = 4;

    /// Loot spawn odds and reward palette
    pub const LOOT_CHANCE: f64 = 0.2;
    pub const LOOT_VALUES: [u32; 4] = [50, 100, 250, 500];
    /// Loot values at or above these get stronger haptics
    pub const LOOT_HEAVY_TIER: u32 = 400;
    pub const LOOT_MEDIUM_TIER: u32 = 250;

    /// Phase durations (ms)
    pub const COUNTDOWN_MS: u64 = 1500;
    pub const RUN_DURATION_MS: u64 = 15_000;
    pub const WIPEOUT_MS: u64 = 1200;
    /// How long the "Solid!" banner stays up after a clean finish
    pub const FINISH_BANNER_MS: u64 = 2000;

    /// Swipe velocity (px/s) needed to trigger a hop or dash
    pub const SWIPE_VELOCITY_THRESHOLD: f32 = 800.0;
    pub const DASH_DISTANCE: f32 = 120.0;
    pub const DASH_DURATION_MS: u64 = 300;
    /// Hop height as a fraction of viewport height
    pub const HOP_HEIGHT: f32 = 0.28;
    pub const HOP_UP_MS: u64 = 250;
    pub const HOP_HOLD_MS: u64 = 200;
    pub const HOP_DOWN_MS: u64 = 300;
    pub const HOP_TOTAL_MS: u64 = HOP_UP_MS + HOP_HOLD_MS + HOP_DOWN_MS;
}

/// Clamp a value into the shared [-1, 1] tilt/lane domain.
///
/// NaN maps to 0 so a bad sample can never poison downstream geometry.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(0.4), 0.4);
        assert_eq!(clamp_unit(3.0), 1.0);
        assert_eq!(clamp_unit(-7.5), -1.0);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
    }
}
