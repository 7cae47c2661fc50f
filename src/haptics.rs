//! Haptic feedback requests
//!
//! The simulation only ever *requests* pulses (as `GameEvent::Haptic`); a host
//! drains the events and forwards them to whatever sink the platform has.

use serde::{Deserialize, Serialize};

use crate::sim::GameEvent;

/// Impact strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Notification feedback type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Success,
}

/// A fire-and-forget haptic request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HapticPulse {
    Impact(ImpactStyle),
    Notify(NotificationKind),
}

impl HapticPulse {
    pub const LIGHT: Self = HapticPulse::Impact(ImpactStyle::Light);
    pub const MEDIUM: Self = HapticPulse::Impact(ImpactStyle::Medium);
    pub const HEAVY: Self = HapticPulse::Impact(ImpactStyle::Heavy);
    pub const SUCCESS: Self = HapticPulse::Notify(NotificationKind::Success);

    /// Escalating feedback for a collected loot value
    pub fn for_loot(value: u32) -> Self {
        use crate::consts::{LOOT_HEAVY_TIER, LOOT_MEDIUM_TIER};
        if value >= LOOT_HEAVY_TIER {
            Self::HEAVY
        } else if value >= LOOT_MEDIUM_TIER {
            Self::MEDIUM
        } else {
            Self::LIGHT
        }
    }

    /// Vibration length for platforms that only offer a duration (ms)
    pub fn vibration_ms(self) -> u32 {
        match self {
            HapticPulse::Impact(ImpactStyle::Light) => 10,
            HapticPulse::Impact(ImpactStyle::Medium) => 20,
            HapticPulse::Impact(ImpactStyle::Heavy) => 40,
            HapticPulse::Notify(NotificationKind::Success) => 30,
        }
    }
}

/// Something that can play haptic pulses. Failures stay inside the sink.
pub trait HapticSink {
    fn pulse(&mut self, pulse: HapticPulse);
}

/// Sink that only logs (headless and native builds)
#[derive(Debug, Default)]
pub struct LogHaptics;

impl HapticSink for LogHaptics {
    fn pulse(&mut self, pulse: HapticPulse) {
        log::debug!("haptic {:?}", pulse);
    }
}

/// Browser vibration API sink
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct VibrationHaptics;

#[cfg(target_arch = "wasm32")]
impl HapticSink for VibrationHaptics {
    fn pulse(&mut self, pulse: HapticPulse) {
        if let Some(window) = web_sys::window() {
            // Unsupported browsers just return false
            let _ = window.navigator().vibrate_with_duration(pulse.vibration_ms());
        }
    }
}

/// Forward every haptic request in `events` to `sink`, honoring the player's
/// haptics preference. Returns how many pulses were played.
pub fn dispatch(events: &[GameEvent], sink: &mut dyn HapticSink, enabled: bool) -> usize {
    if !enabled {
        return 0;
    }
    let mut played = 0;
    for event in events {
        if let GameEvent::Haptic(pulse) = event {
            sink.pulse(*pulse);
            played += 1;
        }
    }
    played
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GamePhase;

    #[derive(Default)]
    struct Recorder(Vec<HapticPulse>);

    impl HapticSink for Recorder {
        fn pulse(&mut self, pulse: HapticPulse) {
            self.0.push(pulse);
        }
    }

    #[test]
    fn test_loot_tiers() {
        assert_eq!(HapticPulse::for_loot(500), HapticPulse::HEAVY);
        assert_eq!(HapticPulse::for_loot(400), HapticPulse::HEAVY);
        assert_eq!(HapticPulse::for_loot(399), HapticPulse::MEDIUM);
        assert_eq!(HapticPulse::for_loot(250), HapticPulse::MEDIUM);
        assert_eq!(HapticPulse::for_loot(249), HapticPulse::LIGHT);
        assert_eq!(HapticPulse::for_loot(50), HapticPulse::LIGHT);
    }

    #[test]
    fn test_dispatch_forwards_only_haptics() {
        let events = [
            GameEvent::PhaseChanged {
                from: GamePhase::Idle,
                to: GamePhase::Countdown,
            },
            GameEvent::Haptic(HapticPulse::MEDIUM),
            GameEvent::Haptic(HapticPulse::SUCCESS),
        ];
        let mut sink = Recorder::default();
        assert_eq!(dispatch(&events, &mut sink, true), 2);
        assert_eq!(sink.0, vec![HapticPulse::MEDIUM, HapticPulse::SUCCESS]);

        let mut muted = Recorder::default();
        assert_eq!(dispatch(&events, &mut muted, false), 0);
        assert!(muted.0.is_empty());
    }
}
