//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes only from the caller (millisecond clock), never the system
//! - Randomness only through `SpawnSource` (seeded in production)
//! - Stable iteration order (obstacles oldest first)
//! - No rendering or platform dependencies

pub mod game;
pub mod geometry;
pub mod gesture;
pub mod obstacles;
pub mod state;
pub mod tilt;
pub mod timer;
pub mod tween;

pub use game::Game;
pub use geometry::{ScreenPlacement, TubeGeometry, TubePosition, check_collision};
pub use gesture::{GestureInterpreter, classify};
pub use obstacles::{ObstacleField, SeededSpawner, SpawnSource, StepOutcome};
pub use state::{
    FinishReason, FinishStage, FinishState, Frame, GameEvent, GamePhase, Gesture, GestureOffsets,
    Obstacle, ObstacleView, PanEnd, RngState, SensorSample,
};
pub use tilt::TiltTracker;
pub use timer::{Fired, SessionTimer, TimerHandle, TimerKind, Timers};
pub use tween::{Easing, Tween, TweenSequence, TweenStep};
