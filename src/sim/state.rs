//! Game state and core simulation types
//!
//! Everything the renderer and the host exchange with the simulation lives
//! here: the phase vocabulary, obstacles, input events, the outbound event
//! stream and the per-frame snapshot.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{ScreenPlacement, TubePosition};
use crate::haptics::HapticPulse;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting on the start screen
    #[default]
    Idle,
    /// Short "get ready" lead-in before the run clock starts
    Countdown,
    /// Active run
    Playing,
    /// Crash animation after hitting an obstacle
    WipingOut,
    /// Getting back on the board. Part of the shared phase vocabulary; the
    /// state machine ends the run on wipeout and never enters it.
    Recovering,
    /// Run over
    Finished,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Countdown => "countdown",
            GamePhase::Playing => "playing",
            GamePhase::WipingOut => "wiping_out",
            GamePhase::Recovering => "recovering",
            GamePhase::Finished => "finished",
        }
    }

    /// Whether the phase freezes the sprite where it was
    pub fn is_frozen(&self) -> bool {
        matches!(self, GamePhase::WipingOut | GamePhase::Recovering)
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    TimeUp,
    Wipeout,
}

/// What the finish screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishStage {
    /// "Solid!" celebration after surviving the full run
    Banner,
    /// Drop-again / exit buttons
    Menu,
}

/// Outcome of the current session once it reaches `Finished`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishState {
    pub reason: FinishReason,
    pub stage: FinishStage,
}

/// An obstacle or loot item travelling down the tube
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Fixed lateral slot in [-1, 1]
    pub lane: f32,
    /// 0 = vanishing point, ~1 = player plane, beyond = passed
    pub depth: f32,
    /// Visual variant index
    pub kind: u8,
    /// Points awarded when caught; loot never causes a crash
    pub loot: Option<u32>,
}

impl Obstacle {
    pub fn is_loot(&self) -> bool {
        self.loot.is_some()
    }
}

/// Raw accelerometer reading (lateral axis)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub x: f32,
}

/// End of a pan gesture (px/s, screen axes: +y is down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanEnd {
    pub velocity_x: f32,
    pub velocity_y: f32,
}

/// Recognized swipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gesture {
    Hop,
    Dash { direction: f32 },
}

/// Notifications emitted by the simulation, drained by the host each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    Spawned { id: u32, lane: f32, loot: Option<u32> },
    LootCollected { id: u32, value: u32 },
    Crashed { id: u32, lane: f32, tilt: f32 },
    Gesture(Gesture),
    Haptic(HapticPulse),
    /// A run's points were folded into the persisted total
    RunCommitted { points: u64, total: u64 },
}

/// Read-only view of one obstacle for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub obstacle: Obstacle,
    pub screen: ScreenPlacement,
}

/// Transient gesture displacement (non-authoritative for collision)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureOffsets {
    /// Dash (x) and hop (y) offset in pixels
    pub offset: Vec2,
    /// Flip rotation added on top of the lean, degrees
    pub flip_degrees: f32,
}

/// Snapshot published once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub now_ms: u64,
    pub phase: GamePhase,
    pub time_left_ms: u64,
    pub finish: Option<FinishState>,
    pub tilt: f32,
    pub player: TubePosition,
    pub gesture: GestureOffsets,
    pub obstacles: Vec<ObstacleView>,
    pub run_points: u64,
    pub total_points: u64,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}
