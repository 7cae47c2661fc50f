//! Session orchestration
//!
//! `Game` owns the phase and every timer. Hosts feed it three independent
//! event sources in any order (display frames, sensor samples, gestures)
//! plus the player's start/reset choices:
//!
//! ```text
//! Idle --start--> Countdown --1500ms--> Playing --run clock 0--> Finished
//!                                          |                        ^
//!                                        crash                      |
//!                                          v                        |
//!                                      WipingOut ----1200ms---------+
//! any --reset--> Idle
//! ```
//!
//! A wipeout ends the run; the remaining time is discarded. Countdown,
//! run-end, wipeout and finish-banner timers share one slot, so at most one
//! of them is ever pending.

use glam::Vec2;

use super::geometry::TubeGeometry;
use super::gesture::GestureInterpreter;
use super::obstacles::{ObstacleField, SeededSpawner, SpawnSource};
use super::state::{
    FinishReason, FinishStage, FinishState, Frame, GameEvent, GamePhase, Gesture, Obstacle,
    ObstacleView, PanEnd, SensorSample,
};
use super::tilt::TiltTracker;
use super::timer::{Fired, SessionTimer, TimerHandle, TimerKind, Timers};
use crate::haptics::HapticPulse;
use crate::persistence::KvStore;
use crate::score::ScoreLedger;
use crate::settings::Settings;
use crate::tuning::{Tuning, TuningError};

pub struct Game {
    tuning: Tuning,
    settings: Settings,
    geometry: TubeGeometry,
    phase: GamePhase,
    /// Latest time seen from any event source
    now_ms: u64,
    timers: Timers,
    phase_timer: Option<TimerHandle>,
    run_clock: Option<SessionTimer>,
    time_left_ms: u64,
    finish: Option<FinishState>,
    tilt: TiltTracker,
    gestures: GestureInterpreter,
    field: ObstacleField,
    ledger: ScoreLedger,
    store: Box<dyn KvStore>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Create a session for a `viewport` (width, height in px) with seeded spawns
    pub fn new(
        tuning: Tuning,
        viewport: Vec2,
        seed: u64,
        store: Box<dyn KvStore>,
    ) -> Result<Self, TuningError> {
        Self::with_spawner(tuning, viewport, Box::new(SeededSpawner::new(seed)), store)
    }

    /// Create a session with a custom spawn source. Rejects invalid tuning.
    pub fn with_spawner(
        tuning: Tuning,
        viewport: Vec2,
        spawner: Box<dyn SpawnSource>,
        store: Box<dyn KvStore>,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        let settings = Settings::load(store.as_ref());
        Ok(Self {
            geometry: TubeGeometry::new(viewport.x, viewport.y),
            phase: GamePhase::Idle,
            now_ms: 0,
            timers: Timers::new(),
            phase_timer: None,
            run_clock: None,
            time_left_ms: tuning.run_duration_ms,
            finish: None,
            tilt: TiltTracker::new(&tuning),
            gestures: GestureInterpreter::new(viewport.y),
            field: ObstacleField::new(&tuning, spawner),
            ledger: ScoreLedger::new(),
            store,
            events: Vec::new(),
            settings,
            tuning,
        })
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn time_left_ms(&self) -> u64 {
        self.time_left_ms
    }

    pub fn finish(&self) -> Option<FinishState> {
        self.finish
    }

    pub fn tilt(&self) -> f32 {
        self.tilt.tilt()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.field.obstacles()
    }

    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    pub fn geometry(&self) -> &TubeGeometry {
        &self.geometry
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Sensor interval the host should subscribe with, `None` to unsubscribe
    pub fn sensor_interval_ms(&self) -> Option<u32> {
        TiltTracker::subscription(self.phase)
    }

    /// Pending phase timers (never more than one)
    pub fn pending_phase_timers(&self) -> usize {
        self.timers.count(TimerKind::is_phase_timer)
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take only the pending haptic requests, leaving other events queued
    pub fn drain_haptics(&mut self) -> Vec<GameEvent> {
        let (haptics, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.events)
            .into_iter()
            .partition(|e| matches!(e, GameEvent::Haptic(_)));
        self.events = rest;
        haptics
    }

    // === Player commands ===

    /// Re-zero the tilt on the next sensor sample
    pub fn calibrate(&mut self) {
        self.tilt.calibrate();
    }

    /// Begin a new session (from `Idle` or `Finished`). Recalibrates the tilt.
    pub fn start(&mut self, now_ms: u64) -> bool {
        let now = self.clock(now_ms);
        if !matches!(self.phase, GamePhase::Idle | GamePhase::Finished) {
            log::debug!("start ignored in {}", self.phase.as_str());
            return false;
        }

        self.tilt.calibrate();
        self.run_clock = None;
        self.time_left_ms = self.tuning.run_duration_ms;
        self.finish = None;
        self.set_phase(GamePhase::Countdown);
        self.schedule_phase_timer(TimerKind::Countdown, now, self.tuning.countdown_ms);
        true
    }

    /// Hard cancel back to `Idle` from any phase
    pub fn reset(&mut self, now_ms: u64) {
        self.clock(now_ms);
        self.phase_timer = None;
        self.timers.cancel_all();
        self.field.clear(&mut self.timers);
        self.gestures.clear();
        self.run_clock = None;
        self.time_left_ms = self.tuning.run_duration_ms;
        self.finish = None;
        self.set_phase(GamePhase::Idle);
    }

    /// Bank the finished run and go again
    pub fn drop_again(&mut self, now_ms: u64) -> bool {
        if self.phase != GamePhase::Finished {
            return false;
        }
        self.commit_run();
        self.events.push(GameEvent::Haptic(HapticPulse::SUCCESS));
        self.start(now_ms)
    }

    /// Bank the run and return to the start screen
    pub fn exit(&mut self, now_ms: u64) {
        self.commit_run();
        self.reset(now_ms);
    }

    /// Connect (or disconnect) the identity that owns the persisted total
    pub fn connect_identity(&mut self, identity: Option<&str>) {
        self.ledger.load_score(identity, self.store.as_ref());
        match identity {
            Some(id) => log::info!("Identity {} loaded, total {}", id, self.ledger.total_points()),
            None => log::info!("Identity disconnected"),
        }
    }

    /// Replace the player's preferences and persist them
    pub fn set_settings(&mut self, settings: Settings) {
        if let Err(e) = settings.save(self.store.as_mut()) {
            log::warn!("failed to save settings: {}", e);
        }
        self.settings = settings;
    }

    // === Event sources ===

    /// Raw accelerometer reading. Returns the published tilt if it changed.
    pub fn sensor_sample(&mut self, now_ms: u64, sample: SensorSample) -> Option<f32> {
        self.clock(now_ms);
        self.tilt.on_sample(self.phase, sample.x)
    }

    /// End of a pan gesture
    pub fn pan_end(&mut self, now_ms: u64, pan: PanEnd) -> Option<Gesture> {
        let now = self.clock(now_ms);
        let gesture = self.gestures.on_pan_end(self.phase, pan, now)?;
        log::debug!("gesture {:?}", gesture);
        self.events.push(GameEvent::Gesture(gesture));
        self.events.push(GameEvent::Haptic(HapticPulse::MEDIUM));
        Some(gesture)
    }

    /// Crash signal. Only meaningful while `Playing`; ignored otherwise.
    pub fn crash(&mut self, now_ms: u64) -> bool {
        let now = self.clock(now_ms);
        if self.phase != GamePhase::Playing {
            log::debug!("crash ignored in {}", self.phase.as_str());
            return false;
        }
        if let Some(clock) = self.run_clock.take() {
            self.time_left_ms = clock.remaining(now);
        }
        self.set_phase(GamePhase::WipingOut);
        self.schedule_phase_timer(TimerKind::Wipeout, now, self.tuning.wipeout_ms);
        true
    }

    /// Display frame: fire due timers, step the simulation, publish a snapshot
    pub fn advance(&mut self, now_ms: u64) -> Frame {
        let now = self.clock(now_ms);

        while let Some(fired) = self.timers.pop_due(now, TimerKind::is_phase_timer) {
            self.on_phase_timer(fired);
        }

        if self.phase == GamePhase::Playing {
            if let Some(clock) = self.run_clock {
                self.time_left_ms = clock.remaining(now);
            }
            let outcome = self.field.step(now, self.tilt.tilt(), &mut self.events);
            if outcome.points > 0 {
                self.ledger.add_points(outcome.points);
            }
            if outcome.crashed {
                self.crash(now);
            }
        }

        while self.phase == GamePhase::Playing {
            let Some(fired) = self.timers.pop_due(now, |k| k == TimerKind::Spawn) else {
                break;
            };
            if let Some(obstacle) = self.field.on_spawn_timer(fired, &mut self.timers) {
                self.events.push(GameEvent::Spawned {
                    id: obstacle.id,
                    lane: obstacle.lane,
                    loot: obstacle.loot,
                });
            }
        }

        self.gestures.settle(now);
        self.frame()
    }

    /// Snapshot for the renderer at the latest known time
    pub fn frame(&self) -> Frame {
        let tilt = self.tilt.tilt();
        let mut gesture = self.gestures.offsets(self.now_ms);
        if self.settings.reduced_motion {
            gesture.flip_degrees = 0.0;
        }
        Frame {
            now_ms: self.now_ms,
            phase: self.phase,
            time_left_ms: self.time_left_ms,
            finish: self.finish,
            tilt,
            player: self.geometry.tilt_to_position(tilt),
            gesture,
            obstacles: self
                .field
                .obstacles()
                .iter()
                .map(|o| ObstacleView {
                    obstacle: *o,
                    screen: self.geometry.obstacle_screen_position(o.lane, o.depth),
                })
                .collect(),
            run_points: self.ledger.run_points(),
            total_points: self.ledger.total_points(),
        }
    }

    // === Internals ===

    /// Clamp backwards timestamps so time never runs in reverse
    fn clock(&mut self, now_ms: u64) -> u64 {
        self.now_ms = self.now_ms.max(now_ms);
        self.now_ms
    }

    fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("phase {} -> {}", from.as_str(), to.as_str());
        self.phase = to;
        self.tilt.on_phase(to);
        match to {
            GamePhase::Idle | GamePhase::Countdown => self.field.clear(&mut self.timers),
            GamePhase::Playing => {}
            _ => self.field.halt(&mut self.timers),
        }
        self.events.push(GameEvent::PhaseChanged { from, to });
    }

    fn schedule_phase_timer(&mut self, kind: TimerKind, from_ms: u64, delay_ms: u64) {
        if let Some(previous) = self.phase_timer.take() {
            self.timers.cancel(previous);
        }
        self.phase_timer = Some(self.timers.schedule(kind, from_ms, delay_ms));
    }

    fn on_phase_timer(&mut self, fired: Fired) {
        if self.phase_timer != Some(fired.handle) {
            log::debug!("ignoring stale {:?} timer", fired.handle.kind);
            return;
        }
        self.phase_timer = None;

        match (fired.handle.kind, self.phase) {
            (TimerKind::Countdown, GamePhase::Countdown) => self.enter_playing(fired.due_ms),
            (TimerKind::RunEnd, GamePhase::Playing) => {
                self.finish_run(FinishReason::TimeUp, fired.due_ms)
            }
            (TimerKind::Wipeout, GamePhase::WipingOut) => {
                self.finish_run(FinishReason::Wipeout, fired.due_ms)
            }
            (TimerKind::FinishBanner, GamePhase::Finished) => {
                if let Some(finish) = &mut self.finish {
                    finish.stage = FinishStage::Menu;
                }
            }
            (kind, phase) => {
                log::debug!("ignoring {:?} timer in {}", kind, phase.as_str());
            }
        }
    }

    /// Start the run clock at `at_ms` (the countdown's due time)
    fn enter_playing(&mut self, at_ms: u64) {
        let clock = SessionTimer::start(self.time_left_ms, at_ms);
        self.run_clock = Some(clock);
        self.ledger.begin_run();
        self.set_phase(GamePhase::Playing);

        let first = self.field.begin(at_ms, &mut self.timers);
        self.events.push(GameEvent::Spawned {
            id: first.id,
            lane: first.lane,
            loot: first.loot,
        });
        self.schedule_phase_timer(TimerKind::RunEnd, at_ms, clock.duration_ms);
    }

    fn finish_run(&mut self, reason: FinishReason, at_ms: u64) {
        if let Some(previous) = self.phase_timer.take() {
            self.timers.cancel(previous);
        }
        self.run_clock = None;
        self.time_left_ms = 0;
        self.set_phase(GamePhase::Finished);
        log::info!(
            "Run finished ({:?}) with {} points",
            reason,
            self.ledger.run_points()
        );

        match reason {
            FinishReason::TimeUp => {
                self.finish = Some(FinishState {
                    reason,
                    stage: FinishStage::Banner,
                });
                self.events.push(GameEvent::Haptic(HapticPulse::SUCCESS));
                self.schedule_phase_timer(
                    TimerKind::FinishBanner,
                    at_ms,
                    self.tuning.finish_banner_ms,
                );
            }
            FinishReason::Wipeout => {
                self.finish = Some(FinishState {
                    reason,
                    stage: FinishStage::Menu,
                });
            }
        }
    }

    fn commit_run(&mut self) {
        let points = self.ledger.run_points();
        if let Some(total) = self.ledger.commit_run(self.store.as_mut()) {
            self.events.push(GameEvent::RunCommitted { points, total });
        }
    }
}
