//! Accelerometer → tilt tracking
//!
//! Pipeline per sample: subtract the calibration offset, scale by the
//! sensitivity, clamp to [-1, 1], drop changes inside the dead zone, then
//! blend toward the result with an exponential moving average.
//!
//! The tracker follows the session phase:
//! - `Countdown`/`Playing`: consumes samples
//! - `WipingOut`/`Recovering`: frozen at the last value
//! - anything else: pinned to 0

use serde::{Deserialize, Serialize};

use super::state::GamePhase;
use crate::clamp_unit;
use crate::consts::SENSOR_INTERVAL_MS;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiltTracker {
    sensitivity: f32,
    dead_zone: f32,
    smoothing: f32,
    /// Reference reading; `None` means the next sample re-zeroes
    offset: Option<f32>,
    /// Published tilt in [-1, 1]
    tilt: f32,
}

impl TiltTracker {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            sensitivity: tuning.tilt_sensitivity,
            dead_zone: tuning.tilt_dead_zone,
            smoothing: tuning.tilt_smoothing,
            offset: None,
            tilt: 0.0,
        }
    }

    /// Current tilt in [-1, 1]
    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    /// Treat the next sample as the new neutral position
    pub fn calibrate(&mut self) {
        self.offset = None;
    }

    pub fn is_calibrated(&self) -> bool {
        self.offset.is_some()
    }

    /// Requested sensor interval for `phase`, or `None` to unsubscribe
    pub fn subscription(phase: GamePhase) -> Option<u32> {
        match phase {
            GamePhase::Countdown | GamePhase::Playing => Some(SENSOR_INTERVAL_MS),
            _ => None,
        }
    }

    /// React to a phase change
    pub fn on_phase(&mut self, phase: GamePhase) {
        if Self::subscription(phase).is_none() && !phase.is_frozen() {
            self.tilt = 0.0;
        }
    }

    /// Feed one raw reading. Returns the newly published tilt, if it changed.
    pub fn on_sample(&mut self, phase: GamePhase, raw: f32) -> Option<f32> {
        if Self::subscription(phase).is_none() {
            return None;
        }
        if !raw.is_finite() {
            log::trace!("ignoring non-finite sensor sample");
            return None;
        }

        let Some(offset) = self.offset else {
            self.offset = Some(raw);
            self.tilt = 0.0;
            return Some(0.0);
        };

        let target = clamp_unit((raw - offset) * self.sensitivity);
        let diff = target - self.tilt;
        if diff.abs() < self.dead_zone {
            return None;
        }

        self.tilt = clamp_unit(self.tilt + self.smoothing * diff);
        Some(self.tilt)
    }
}
