//! Cancellable timers on the injected millisecond clock
//!
//! Every scheduled timer gets a handle carrying a generation number. Handlers
//! compare the fired handle against the one they stored; anything else is a
//! stale fire from a superseded phase and must be ignored.

use serde::{Deserialize, Serialize};

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Countdown → Playing
    Countdown,
    /// Run clock expiry → Finished
    RunEnd,
    /// WipingOut → Finished
    Wipeout,
    /// Finish banner → menu
    FinishBanner,
    /// Next obstacle spawn
    Spawn,
}

impl TimerKind {
    /// Kinds that share the single phase-timer slot
    pub fn is_phase_timer(self) -> bool {
        !matches!(self, TimerKind::Spawn)
    }
}

/// Identifies one scheduled timer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle {
    pub kind: TimerKind,
    generation: u64,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    /// When it was due (may be earlier than the frame that delivered it)
    pub due_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pending {
    handle: TimerHandle,
    due_ms: u64,
}

/// Pending timers, fired in due order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timers {
    next_generation: u64,
    pending: Vec<Pending>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer `delay_ms` after `now_ms`
    pub fn schedule(&mut self, kind: TimerKind, now_ms: u64, delay_ms: u64) -> TimerHandle {
        self.next_generation += 1;
        let handle = TimerHandle {
            kind,
            generation: self.next_generation,
        };
        self.pending.push(Pending {
            handle,
            due_ms: now_ms.saturating_add(delay_ms),
        });
        handle
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    /// Cancel everything
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn due_at(&self, handle: TimerHandle) -> Option<u64> {
        self.pending
            .iter()
            .find(|p| p.handle == handle)
            .map(|p| p.due_ms)
    }

    /// Number of pending timers matching `filter`
    pub fn count(&self, filter: impl Fn(TimerKind) -> bool) -> usize {
        self.pending.iter().filter(|p| filter(p.handle.kind)).count()
    }

    /// Remove and return the earliest timer due at or before `now_ms` whose
    /// kind passes `filter`. Ties fire in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64, filter: impl Fn(TimerKind) -> bool) -> Option<Fired> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_ms <= now_ms && filter(p.handle.kind))
            .min_by_key(|(_, p)| (p.due_ms, p.handle.generation))
            .map(|(i, _)| i)?;
        let p = self.pending.remove(idx);
        Some(Fired {
            handle: p.handle,
            due_ms: p.due_ms,
        })
    }
}

/// Countdown toward zero measured against the injected clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimer {
    pub duration_ms: u64,
    pub started_at_ms: u64,
}

impl SessionTimer {
    pub fn start(duration_ms: u64, now_ms: u64) -> Self {
        Self {
            duration_ms,
            started_at_ms: now_ms,
        }
    }

    /// Time left, clamped at zero
    pub fn remaining(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        self.duration_ms.saturating_sub(elapsed)
    }

    /// Wall-clock time at which the timer reaches zero
    pub fn ends_at(&self) -> u64 {
        self.started_at_ms.saturating_add(self.duration_ms)
    }
}
