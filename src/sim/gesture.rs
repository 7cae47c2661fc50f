//! Swipe gestures → hop and dash animations
//!
//! Only the end of a pan matters. A strong upward fling hops (with a full
//! flip); otherwise a strong sideways fling dashes. Offsets are purely
//! visual and never feed back into collision.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{GamePhase, Gesture, GestureOffsets, PanEnd};
use super::tween::{Easing, Tween, TweenStep};
use crate::consts::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GestureInterpreter {
    hop_height: f32,
    dash_x: Tween,
    hop_y: Tween,
    flip: Tween,
}

impl GestureInterpreter {
    /// `viewport_height` sets the hop height
    pub fn new(viewport_height: f32) -> Self {
        Self {
            hop_height: viewport_height * HOP_HEIGHT,
            ..Default::default()
        }
    }

    /// Classify a pan end and start its animation.
    /// Gestures are only accepted while `Playing`.
    pub fn on_pan_end(&mut self, phase: GamePhase, pan: PanEnd, now_ms: u64) -> Option<Gesture> {
        if phase != GamePhase::Playing {
            return None;
        }
        let gesture = classify(pan)?;

        match gesture {
            Gesture::Hop => {
                let peak = -self.hop_height;
                self.hop_y.play(
                    now_ms,
                    vec![
                        TweenStep::new(peak, HOP_UP_MS, Easing::QuadOut),
                        TweenStep::new(peak, HOP_HOLD_MS, Easing::Linear),
                        TweenStep::new(0.0, HOP_DOWN_MS, Easing::QuadIn),
                    ],
                );
                // 360° reads the same as 0°, so the snap back is invisible
                self.flip.clear();
                self.flip.play(
                    now_ms,
                    vec![
                        TweenStep::new(360.0, HOP_TOTAL_MS, Easing::QuadInOut),
                        TweenStep::new(0.0, 1, Easing::Linear),
                    ],
                );
            }
            Gesture::Dash { direction } => {
                let half = DASH_DURATION_MS / 2;
                self.dash_x.play(
                    now_ms,
                    vec![
                        TweenStep::new(direction * DASH_DISTANCE, half, Easing::Linear),
                        TweenStep::new(0.0, DASH_DURATION_MS - half, Easing::Linear),
                    ],
                );
            }
        }
        Some(gesture)
    }

    /// Current displacement
    pub fn offsets(&self, now_ms: u64) -> GestureOffsets {
        GestureOffsets {
            offset: Vec2::new(self.dash_x.value(now_ms), self.hop_y.value(now_ms)),
            flip_degrees: self.flip.value(now_ms),
        }
    }

    pub fn is_animating(&self, now_ms: u64) -> bool {
        self.dash_x.is_running(now_ms) || self.hop_y.is_running(now_ms) || self.flip.is_running(now_ms)
    }

    /// Retire finished animations
    pub fn settle(&mut self, now_ms: u64) {
        self.dash_x.settle(now_ms);
        self.hop_y.settle(now_ms);
        self.flip.settle(now_ms);
    }

    /// Drop all animations
    pub fn clear(&mut self) {
        self.dash_x.clear();
        self.hop_y.clear();
        self.flip.clear();
    }
}

/// Pure classification of a pan end
pub fn classify(pan: PanEnd) -> Option<Gesture> {
    if pan.velocity_y < -SWIPE_VELOCITY_THRESHOLD {
        return Some(Gesture::Hop);
    }
    if pan.velocity_x.abs() >= SWIPE_VELOCITY_THRESHOLD {
        let direction = if pan.velocity_x > 0.0 { 1.0 } else { -1.0 };
        return Some(Gesture::Dash { direction });
    }
    None
}
