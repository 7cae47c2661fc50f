//! Browser bindings
//!
//! `WebGame` is the JS-facing wrapper: the page forwards animation frames,
//! accelerometer samples, pan gestures and button presses, and renders the
//! JSON snapshot each frame returns. Haptic requests are played through the
//! vibration API here so the page never sees them.

use glam::Vec2;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::haptics::{self, VibrationHaptics};
use crate::persistence::{KvStore, MemoryStore, StoreError};
use crate::platform::{init_logging, random_seed};
use crate::settings::Settings;
use crate::sim::{Frame, Game, GameEvent, PanEnd, SensorSample};
use crate::tuning::Tuning;

/// `window.localStorage`
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

impl LocalStorageStore {
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StoreError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KvStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Rejected(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // Quota errors surface here
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Rejected(format!("{:?}", e)))
    }
}

/// What the page receives once per animation frame
#[derive(Serialize)]
struct Tick<'a> {
    frame: &'a Frame,
    events: &'a [GameEvent],
}

fn to_ms(now: f64) -> u64 {
    // NaN and negatives saturate to 0
    now.max(0.0) as u64
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WebGame {
    game: Game,
    haptics: VibrationHaptics,
}

#[wasm_bindgen]
impl WebGame {
    /// `tuning` is an optional JSON override of the default balance
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, tuning: Option<String>) -> Result<WebGame, JsValue> {
        let tuning = match tuning {
            Some(json) => Tuning::from_json(&json).map_err(js_err)?,
            None => Tuning::default(),
        };
        let store: Box<dyn KvStore> = match LocalStorageStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("LocalStorage unavailable ({}), progress will not persist", e);
                Box::new(MemoryStore::new())
            }
        };
        let seed = random_seed();
        log::info!("Game initialized with seed: {}", seed);
        let game = Game::new(tuning, Vec2::new(width, height), seed, store).map_err(js_err)?;
        Ok(WebGame {
            game,
            haptics: VibrationHaptics,
        })
    }

    pub fn start(&mut self, now_ms: f64) -> bool {
        let started = self.game.start(to_ms(now_ms));
        self.flush_haptics();
        started
    }

    pub fn reset(&mut self, now_ms: f64) {
        self.game.reset(to_ms(now_ms));
    }

    pub fn calibrate(&mut self) {
        self.game.calibrate();
    }

    pub fn drop_again(&mut self, now_ms: f64) -> bool {
        let started = self.game.drop_again(to_ms(now_ms));
        self.flush_haptics();
        started
    }

    pub fn exit(&mut self, now_ms: f64) {
        self.game.exit(to_ms(now_ms));
    }

    /// Accelerometer x reading; returns the new tilt when it changed
    pub fn sensor(&mut self, now_ms: f64, x: f32) -> Option<f32> {
        self.game.sensor_sample(to_ms(now_ms), SensorSample { x })
    }

    /// Pan end velocities in px/s; returns whether a gesture was recognized
    pub fn pan_end(&mut self, now_ms: f64, velocity_x: f32, velocity_y: f32) -> bool {
        let pan = PanEnd {
            velocity_x,
            velocity_y,
        };
        let recognized = self.game.pan_end(to_ms(now_ms), pan).is_some();
        self.flush_haptics();
        recognized
    }

    /// Sensor interval to subscribe with, or `undefined` to unsubscribe
    pub fn sensor_interval_ms(&self) -> Option<u32> {
        self.game.sensor_interval_ms()
    }

    /// Step to `now_ms` and return `{ frame, events }` as JSON
    pub fn advance(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let frame = self.game.advance(to_ms(now_ms));
        let events = self.game.drain_events();
        haptics::dispatch(&events, &mut self.haptics, self.game.settings().haptics);
        serde_json::to_string(&Tick {
            frame: &frame,
            events: &events,
        })
        .map_err(js_err)
    }

    /// Connect a wallet address, or pass `undefined` to disconnect
    pub fn connect_identity(&mut self, identity: Option<String>) {
        self.game.connect_identity(identity.as_deref());
    }

    pub fn total_points(&self) -> f64 {
        self.game.ledger().total_points() as f64
    }

    pub fn set_settings(&mut self, haptics: bool, reduced_motion: bool) {
        self.game.set_settings(Settings {
            haptics,
            reduced_motion,
        });
    }

    /// Play pending haptics now; other events stay queued for `advance`
    fn flush_haptics(&mut self) {
        let pulses = self.game.drain_haptics();
        haptics::dispatch(&pulses, &mut self.haptics, self.game.settings().haptics);
    }
}

#[wasm_bindgen(start)]
pub fn wasm_main() {
    init_logging(log::LevelFilter::Info);
    log::info!("Extol starting...");
}
