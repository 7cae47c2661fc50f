//! Time-driven value sequences for transient animations
//!
//! A sequence is a start value plus ordered `(target, duration, easing)` steps.
//! It is evaluated statelessly from the clock, so there are no completion
//! callbacks to chain: once the last step ends the value rests on its target.

use serde::{Deserialize, Serialize};

/// Easing curve applied within one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
}

impl Easing {
    /// Map linear progress `t` in [0, 1] to eased progress
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TweenStep {
    pub target: f32,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl TweenStep {
    pub fn new(target: f32, duration_ms: u64, easing: Easing) -> Self {
        Self {
            target,
            duration_ms,
            easing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenSequence {
    started_at_ms: u64,
    from: f32,
    steps: Vec<TweenStep>,
}

impl TweenSequence {
    pub fn new(started_at_ms: u64, from: f32, steps: Vec<TweenStep>) -> Self {
        Self {
            started_at_ms,
            from,
            steps,
        }
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.duration_ms).sum()
    }

    pub fn is_complete(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_at_ms) >= self.total_duration_ms()
    }

    /// Final resting value
    pub fn end_value(&self) -> f32 {
        self.steps.last().map(|s| s.target).unwrap_or(self.from)
    }

    pub fn value_at(&self, now_ms: u64) -> f32 {
        let mut elapsed = now_ms.saturating_sub(self.started_at_ms);
        let mut from = self.from;
        for step in &self.steps {
            if elapsed < step.duration_ms {
                let t = elapsed as f32 / step.duration_ms as f32;
                return from + (step.target - from) * step.easing.apply(t);
            }
            elapsed -= step.duration_ms;
            from = step.target;
        }
        from
    }
}

/// An animated scalar that is either resting or running a sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    rest: f32,
    active: Option<TweenSequence>,
}

impl Tween {
    /// Start a sequence from wherever the value is right now
    pub fn play(&mut self, now_ms: u64, steps: Vec<TweenStep>) {
        let from = self.value(now_ms);
        self.active = Some(TweenSequence::new(now_ms, from, steps));
    }

    pub fn value(&self, now_ms: u64) -> f32 {
        match &self.active {
            Some(seq) => seq.value_at(now_ms),
            None => self.rest,
        }
    }

    pub fn is_running(&self, now_ms: u64) -> bool {
        self.active.as_ref().is_some_and(|s| !s.is_complete(now_ms))
    }

    /// Retire a finished sequence, keeping its end value
    pub fn settle(&mut self, now_ms: u64) {
        if let Some(seq) = &self.active {
            if seq.is_complete(now_ms) {
                self.rest = seq.end_value();
                self.active = None;
            }
        }
    }

    /// Snap back to zero, dropping any running sequence
    pub fn clear(&mut self) {
        self.rest = 0.0;
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::QuadIn,
            Easing::QuadOut,
            Easing::QuadInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert_eq!(Easing::QuadInOut.apply(0.5), 0.5);
    }

    #[test]
    fn test_sequence_walks_steps() {
        let seq = TweenSequence::new(
            1000,
            0.0,
            vec![
                TweenStep::new(100.0, 100, Easing::Linear),
                TweenStep::new(100.0, 50, Easing::Linear),
                TweenStep::new(0.0, 100, Easing::Linear),
            ],
        );
        assert_eq!(seq.total_duration_ms(), 250);
        assert_eq!(seq.value_at(1000), 0.0);
        assert_eq!(seq.value_at(1050), 50.0);
        assert_eq!(seq.value_at(1120), 100.0);
        assert_eq!(seq.value_at(1200), 50.0);
        assert_eq!(seq.value_at(1250), 0.0);
        assert!(seq.is_complete(1250));
        assert!(!seq.is_complete(1249));
    }

    #[test]
    fn test_interrupt_starts_from_current_value() {
        let mut tween = Tween::default();
        tween.play(0, vec![TweenStep::new(100.0, 100, Easing::Linear)]);
        tween.play(50, vec![TweenStep::new(0.0, 100, Easing::Linear)]);
        assert_eq!(tween.value(50), 50.0);
        assert_eq!(tween.value(100), 25.0);
    }

    #[test]
    fn test_settle_keeps_end_value() {
        let mut tween = Tween::default();
        tween.play(0, vec![TweenStep::new(7.0, 10, Easing::QuadOut)]);
        tween.settle(5);
        assert!(tween.is_running(5));
        tween.settle(10);
        assert!(!tween.is_running(10));
        assert_eq!(tween.value(500), 7.0);
    }
}
