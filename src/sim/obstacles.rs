//! Obstacle spawning, motion and collision
//!
//! The field owns the only authoritative obstacle list. Each frame step
//! reads the tilt once, advances every obstacle, resolves at most one crash,
//! and commits the surviving list before returning.

use rand::Rng;
use rand_pcg::Pcg32;

use super::geometry::check_collision;
use super::state::{GameEvent, Obstacle, RngState};
use super::timer::{Fired, TimerHandle, TimerKind, Timers};
use crate::consts::{LANES, OBSTACLE_KINDS};
use crate::haptics::HapticPulse;
use crate::tuning::Tuning;

/// Source of every random choice made while spawning.
///
/// Kept behind a trait so tests can script exact spawns.
pub trait SpawnSource {
    /// Delay before the next spawn, within `[min_ms, max_ms]`
    fn delay_ms(&mut self, min_ms: u64, max_ms: u64) -> u64;
    /// Lane for a new obstacle
    fn lane(&mut self) -> f32;
    /// Visual variant for a new obstacle
    fn kind(&mut self) -> u8;
    /// Loot value, if this spawn carries loot
    fn loot(&mut self, chance: f64, values: &[u32]) -> Option<u32>;
}

/// Uniform draws from a seeded PCG stream
#[derive(Debug, Clone)]
pub struct SeededSpawner {
    rng: Pcg32,
}

impl SeededSpawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RngState::new(seed).to_rng(),
        }
    }
}

impl SpawnSource for SeededSpawner {
    fn delay_ms(&mut self, min_ms: u64, max_ms: u64) -> u64 {
        self.rng.random_range(min_ms..=max_ms.max(min_ms))
    }

    fn lane(&mut self) -> f32 {
        LANES[self.rng.random_range(0..LANES.len())]
    }

    fn kind(&mut self) -> u8 {
        self.rng.random_range(0..OBSTACLE_KINDS)
    }

    fn loot(&mut self, chance: f64, values: &[u32]) -> Option<u32> {
        if values.is_empty() || !self.rng.random_bool(chance.clamp(0.0, 1.0)) {
            return None;
        }
        Some(values[self.rng.random_range(0..values.len())])
    }
}

/// Result of one frame step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// A hazard was hit this step
    pub crashed: bool,
    /// Loot points collected this step
    pub points: u64,
}

pub struct ObstacleField {
    tuning: Tuning,
    source: Box<dyn SpawnSource>,
    obstacles: Vec<Obstacle>,
    next_id: u32,
    /// Set on the first crash; no collisions are evaluated until `clear`
    crashed_this_cycle: bool,
    /// Previous frame time; `None` while not running
    last_step_ms: Option<u64>,
    spawn_timer: Option<TimerHandle>,
    collision_checks: u64,
}

impl ObstacleField {
    pub fn new(tuning: &Tuning, source: Box<dyn SpawnSource>) -> Self {
        Self {
            tuning: tuning.clone(),
            source,
            obstacles: Vec::new(),
            next_id: 0,
            crashed_this_cycle: false,
            last_step_ms: None,
            spawn_timer: None,
            collision_checks: 0,
        }
    }

    /// Live obstacles, oldest first
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn is_running(&self) -> bool {
        self.last_step_ms.is_some()
    }

    pub fn crashed_this_cycle(&self) -> bool {
        self.crashed_this_cycle
    }

    /// Total `check_collision` evaluations since creation
    pub fn collision_checks(&self) -> u64 {
        self.collision_checks
    }

    pub fn spawn_timer(&self) -> Option<TimerHandle> {
        self.spawn_timer
    }

    /// Start running at `now_ms`: spawn one obstacle immediately and schedule
    /// the next.
    pub fn begin(&mut self, now_ms: u64, timers: &mut Timers) -> Obstacle {
        self.last_step_ms = Some(now_ms);
        let first = self.spawn();
        self.schedule_spawn(now_ms, timers);
        first
    }

    /// Stop stepping and spawning, keeping the current obstacles in place
    pub fn halt(&mut self, timers: &mut Timers) {
        if let Some(handle) = self.spawn_timer.take() {
            timers.cancel(handle);
        }
        self.last_step_ms = None;
    }

    /// Halt and empty the field, re-arming collision checks
    pub fn clear(&mut self, timers: &mut Timers) {
        self.halt(timers);
        self.obstacles.clear();
        self.crashed_this_cycle = false;
    }

    /// Handle a fired spawn timer. Stale handles are ignored.
    pub fn on_spawn_timer(&mut self, fired: Fired, timers: &mut Timers) -> Option<Obstacle> {
        if self.spawn_timer != Some(fired.handle) {
            log::debug!("ignoring stale spawn timer {:?}", fired.handle);
            return None;
        }
        self.spawn_timer = None;
        let obstacle = self.spawn();
        // Chain from the due time so cadence does not depend on frame rate
        self.schedule_spawn(fired.due_ms, timers);
        Some(obstacle)
    }

    fn schedule_spawn(&mut self, from_ms: u64, timers: &mut Timers) {
        // A zero delay would refire forever within one frame
        let delay = self
            .source
            .delay_ms(self.tuning.spawn_min_ms, self.tuning.spawn_max_ms)
            .max(1);
        self.spawn_timer = Some(timers.schedule(TimerKind::Spawn, from_ms, delay));
    }

    fn spawn(&mut self) -> Obstacle {
        let obstacle = Obstacle {
            id: self.next_id,
            lane: self.source.lane(),
            depth: 0.0,
            kind: self.source.kind(),
            loot: self
                .source
                .loot(self.tuning.loot_chance, &self.tuning.loot_values),
        };
        self.next_id += 1;
        log::debug!(
            "spawn #{} lane={:.1} kind={} loot={:?}",
            obstacle.id,
            obstacle.lane,
            obstacle.kind,
            obstacle.loot
        );
        self.obstacles.push(obstacle);
        obstacle
    }

    /// Advance every obstacle to `now_ms` and resolve collisions against `tilt`.
    ///
    /// An obstacle is tested once, on the step it crosses the collision depth.
    /// Loot that touches the sprite is collected; the first hazard that does
    /// is a crash, after which nothing else is tested.
    pub fn step(&mut self, now_ms: u64, tilt: f32, events: &mut Vec<GameEvent>) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let Some(last) = self.last_step_ms else {
            return outcome;
        };
        let dt = now_ms.saturating_sub(last) as f32 / 1000.0;
        self.last_step_ms = Some(now_ms);

        let collision_depth = self.tuning.collision_depth;
        let mut crash: Option<Obstacle> = None;
        let mut survivors = Vec::with_capacity(self.obstacles.len());

        for mut obstacle in std::mem::take(&mut self.obstacles) {
            let new_depth = obstacle.depth + self.tuning.obstacle_speed * dt;
            let crossing = obstacle.depth < collision_depth && new_depth >= collision_depth;

            if crossing && crash.is_none() && !self.crashed_this_cycle {
                self.collision_checks += 1;
                if check_collision(tilt, obstacle.lane, self.tuning.collision_threshold) {
                    match obstacle.loot {
                        Some(value) => {
                            log::debug!("collected loot #{} worth {}", obstacle.id, value);
                            events.push(GameEvent::LootCollected {
                                id: obstacle.id,
                                value,
                            });
                            events.push(GameEvent::Haptic(HapticPulse::for_loot(value)));
                            outcome.points += u64::from(value);
                            continue;
                        }
                        None => crash = Some(obstacle),
                    }
                }
            }

            obstacle.depth = new_depth;
            if new_depth < self.tuning.disposal_depth {
                survivors.push(obstacle);
            }
        }
        self.obstacles = survivors;

        if let Some(hit) = crash {
            self.crashed_this_cycle = true;
            log::info!(
                "crash into #{} (lane {:.2}, tilt {:.2})",
                hit.id,
                hit.lane,
                tilt
            );
            events.push(GameEvent::Crashed {
                id: hit.id,
                lane: hit.lane,
                tilt,
            });
            events.push(GameEvent::Haptic(HapticPulse::HEAVY));
            outcome.crashed = true;
        }
        outcome
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted lanes/loot; fixed delay, kind 0
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedSource {
        pub lanes: VecDeque<f32>,
        pub loot: VecDeque<Option<u32>>,
        pub delay_ms: u64,
    }

    impl ScriptedSource {
        pub(crate) fn new(lanes: &[f32], delay_ms: u64) -> Self {
            Self {
                lanes: lanes.iter().copied().collect(),
                loot: VecDeque::new(),
                delay_ms,
            }
        }

        pub(crate) fn with_loot(mut self, loot: &[Option<u32>]) -> Self {
            self.loot = loot.iter().copied().collect();
            self
        }
    }

    impl SpawnSource for ScriptedSource {
        fn delay_ms(&mut self, _min_ms: u64, _max_ms: u64) -> u64 {
            self.delay_ms
        }
        fn lane(&mut self) -> f32 {
            self.lanes.pop_front().unwrap_or(0.8)
        }
        fn kind(&mut self) -> u8 {
            0
        }
        fn loot(&mut self, _chance: f64, _values: &[u32]) -> Option<u32> {
            self.loot.pop_front().flatten()
        }
    }

    fn field(source: ScriptedSource) -> ObstacleField {
        ObstacleField::new(&Tuning::default(), Box::new(source))
    }

    /// Time for an obstacle to travel `depth` units at the default speed
    fn ms_to_depth(depth: f32) -> u64 {
        (depth / 0.45 * 1000.0).ceil() as u64
    }

    #[test]
    fn test_seeded_spawner_draws_from_palettes() {
        let mut s = SeededSpawner::new(7);
        for _ in 0..200 {
            let delay = s.delay_ms(800, 1800);
            assert!((800..=1800).contains(&delay));
            assert!(LANES.contains(&s.lane()));
            assert!(s.kind() < OBSTACLE_KINDS);
            if let Some(v) = s.loot(0.5, &[50, 500]) {
                assert!(v == 50 || v == 500);
            }
        }
        assert_eq!(s.loot(0.0, &[50]), None);
        assert_eq!(s.loot(1.0, &[]), None);
    }

    #[test]
    fn test_begin_spawns_and_schedules() {
        let mut timers = Timers::new();
        let mut f = field(ScriptedSource::new(&[-0.5], 1000));
        let first = f.begin(0, &mut timers);
        assert_eq!(first.id, 0);
        assert_eq!(first.lane, -0.5);
        assert_eq!(first.depth, 0.0);
        let handle = f.spawn_timer().unwrap();
        assert_eq!(timers.due_at(handle), Some(1000));
    }

    #[test]
    fn test_spawn_chain_uses_due_time() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let mut f = field(ScriptedSource::new(&[], 1000));
        f.begin(0, &mut timers);

        // Frame arrives late; the next spawn still lines up on the 1000ms grid
        let fired = timers.pop_due(1040, |k| k == TimerKind::Spawn).unwrap();
        let spawned = f.on_spawn_timer(fired, &mut timers).unwrap();
        assert_eq!(spawned.id, 1);
        assert_eq!(timers.due_at(f.spawn_timer().unwrap()), Some(2000));
        f.step(1040, 0.0, &mut events);
        assert_eq!(f.obstacles().len(), 2);
    }

    #[test]
    fn test_zero_delay_still_advances_the_chain() {
        let mut timers = Timers::new();
        let mut f = field(ScriptedSource::new(&[], 0));
        f.begin(100, &mut timers);
        assert_eq!(timers.due_at(f.spawn_timer().unwrap()), Some(101));

        let fired = timers.pop_due(101, |k| k == TimerKind::Spawn).unwrap();
        f.on_spawn_timer(fired, &mut timers);
        assert_eq!(timers.due_at(f.spawn_timer().unwrap()), Some(102));
        assert_eq!(timers.pop_due(101, |k| k == TimerKind::Spawn), None);
    }

    #[test]
    fn test_stale_spawn_timer_ignored() {
        let mut timers = Timers::new();
        let mut f = field(ScriptedSource::new(&[], 1000));
        f.begin(0, &mut timers);
        let stale = Fired {
            handle: timers.schedule(TimerKind::Spawn, 0, 5),
            due_ms: 5,
        };
        assert_eq!(f.on_spawn_timer(stale, &mut timers), None);
        assert_eq!(f.obstacles().len(), 1);
    }

    #[test]
    fn test_depth_advances_with_elapsed_time() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let mut f = field(ScriptedSource::new(&[0.8], 10_000));
        f.begin(0, &mut timers);
        f.step(1000, 0.0, &mut events);
        assert!((f.obstacles()[0].depth - 0.45).abs() < 1e-6);
        f.step(1500, 0.0, &mut events);
        assert!((f.obstacles()[0].depth - 0.675).abs() < 1e-6);
    }

    #[test]
    fn test_obstacle_disposed_past_threshold() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let mut f = field(ScriptedSource::new(&[0.8], 60_000));
        f.begin(0, &mut timers);
        let mut t = 0;
        while !f.obstacles().is_empty() {
            t += 16;
            f.step(t, -0.8, &mut events);
            assert!(f.obstacles().iter().all(|o| o.depth < 1.3));
            assert!(t < 5_000, "obstacle never disposed");
        }
        assert!(t >= ms_to_depth(1.3) - 16);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Crashed { .. })));
    }

    #[test]
    fn test_crash_when_lane_matches() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let mut f = field(ScriptedSource::new(&[0.2], 60_000));
        f.begin(0, &mut timers);

        let outcome = f.step(ms_to_depth(0.95), 0.1, &mut events);
        assert!(outcome.crashed);
        assert!(f.crashed_this_cycle());
        assert_eq!(f.collision_checks(), 1);
        assert!(events.contains(&GameEvent::Haptic(HapticPulse::HEAVY)));
    }

    #[test]
    fn test_each_obstacle_checked_once() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let mut f = field(ScriptedSource::new(&[0.8], 60_000));
        f.begin(0, &mut timers);
        for t in (16..3_000).step_by(16) {
            f.step(t, 0.0, &mut events);
        }
        assert_eq!(f.collision_checks(), 1);
    }

    #[test]
    fn test_at_most_one_crash_per_step_and_latch() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let mut f = field(ScriptedSource::new(&[0.0, 0.0], 60_000));
        f.begin(0, &mut timers);
        // Second obstacle in the same lane at the same depth
        let fired = Fired {
            handle: f.spawn_timer().unwrap(),
            due_ms: 0,
        };
        timers.cancel(fired.handle);
        f.on_spawn_timer(fired, &mut timers);
        assert_eq!(f.obstacles().len(), 2);

        let outcome = f.step(ms_to_depth(0.95), 0.0, &mut events);
        assert!(outcome.crashed);
        let crashes = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Crashed { .. }))
            .count();
        assert_eq!(crashes, 1);
        assert_eq!(f.collision_checks(), 1);

        // Latched: later crossings are not evaluated
        let checks = f.collision_checks();
        f.step(ms_to_depth(0.95) + 500, 0.0, &mut events);
        assert_eq!(f.collision_checks(), checks);

        // Clearing re-arms
        f.clear(&mut timers);
        assert!(!f.crashed_this_cycle());
        assert!(f.obstacles().is_empty());
        assert!(!f.is_running());
    }

    #[test]
    fn test_loot_collected_not_crashed() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let source = ScriptedSource::new(&[-0.5], 60_000).with_loot(&[Some(250)]);
        let mut f = field(source);
        f.begin(0, &mut timers);

        let outcome = f.step(ms_to_depth(0.95), -0.45, &mut events);
        assert!(!outcome.crashed);
        assert_eq!(outcome.points, 250);
        assert!(f.obstacles().is_empty());
        assert!(events.contains(&GameEvent::LootCollected { id: 0, value: 250 }));
        assert!(events.contains(&GameEvent::Haptic(HapticPulse::MEDIUM)));
        assert!(!f.crashed_this_cycle());
    }

    #[test]
    fn test_missed_loot_flies_past() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let source = ScriptedSource::new(&[0.8], 60_000).with_loot(&[Some(500)]);
        let mut f = field(source);
        f.begin(0, &mut timers);
        let outcome = f.step(ms_to_depth(0.95), -0.8, &mut events);
        assert_eq!(outcome, StepOutcome::default());
        assert_eq!(f.obstacles().len(), 1);
    }

    #[test]
    fn test_halt_freezes_obstacles() {
        let mut timers = Timers::new();
        let mut events = Vec::new();
        let mut f = field(ScriptedSource::new(&[0.5], 1000));
        f.begin(0, &mut timers);
        f.step(500, 0.0, &mut events);
        let pending = f.spawn_timer().unwrap();
        f.halt(&mut timers);
        assert!(!timers.is_pending(pending));
        let depth = f.obstacles()[0].depth;
        assert_eq!(f.step(2000, 0.0, &mut events), StepOutcome::default());
        assert_eq!(f.obstacles()[0].depth, depth);
        assert_eq!(timers.count(|k| k == TimerKind::Spawn), 0);
    }
}
