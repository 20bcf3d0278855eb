//! Session countdown.
//!
//! A wall-clock-based state machine with no internal thread; the caller is
//! responsible for calling `tick()` periodically. The five-minute warning is
//! raised when remaining time crosses the mark between two ticks, so a slow
//! or irregular tick cadence cannot skip it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Completed
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;

pub const FIVE_MINUTE_WARNING_MS: u64 = 5 * 60 * 1000;
pub const WARNING_TITLE: &str = "⏳ 5 minutes left";
pub const WARNING_BODY: &str = "Wrap it up strong!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Focus,
    Break,
}

impl SessionKind {
    pub fn default_minutes(&self) -> u32 {
        match self {
            SessionKind::Focus => 25,
            SessionKind::Break => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    kind: SessionKind,
    state: CountdownState,
    total_ms: u64,
    remaining_ms: u64,
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
    #[serde(default)]
    warned: bool,
}

impl Countdown {
    pub fn new(kind: SessionKind, minutes: u32) -> Self {
        let total_ms = u64::from(minutes) * 60 * 1000;
        Self {
            kind,
            state: CountdownState::Idle,
            total_ms,
            remaining_ms: total_ms,
            last_tick_epoch_ms: None,
            warned: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn warned(&self) -> bool {
        self.warned
    }

    /// 0.0 .. 1.0 progress.
    pub fn progress(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_ms as f64 / self.total_ms as f64)
    }

    pub fn snapshot(&self) -> Event {
        Event::CountdownSnapshot {
            state: self.state,
            kind: self.kind,
            remaining_ms: self.remaining_ms,
            total_ms: self.total_ms,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms())
    }

    pub fn start_at(&mut self, now_ms: u64) -> Option<Event> {
        match self.state {
            CountdownState::Idle | CountdownState::Completed => {
                if self.state == CountdownState::Completed {
                    self.remaining_ms = self.total_ms;
                    self.warned = false;
                }
                self.state = CountdownState::Running;
                self.last_tick_epoch_ms = Some(now_ms);
                Some(Event::CountdownStarted {
                    kind: self.kind,
                    duration_secs: self.total_ms / 1000,
                    at: Utc::now(),
                })
            }
            CountdownState::Paused => self.resume_at(now_ms),
            CountdownState::Running => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        // A warning crossed while pausing is picked up by the next tick.
        self.flush_elapsed(now_ms);
        self.state = CountdownState::Paused;
        self.last_tick_epoch_ms = None;
        Some(Event::CountdownPaused {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(now_ms())
    }

    pub fn resume_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != CountdownState::Paused {
            return None;
        }
        self.state = CountdownState::Running;
        self.last_tick_epoch_ms = Some(now_ms);
        Some(Event::CountdownResumed {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.state = CountdownState::Idle;
        self.remaining_ms = self.total_ms;
        self.last_tick_epoch_ms = None;
        self.warned = false;
        Some(Event::CountdownReset { at: Utc::now() })
    }

    /// Call periodically. Returns the completion event when time runs out,
    /// or the five-minute warning the first time the mark is passed.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.flush_elapsed(now_ms);

        if self.remaining_ms == 0 {
            self.state = CountdownState::Completed;
            self.last_tick_epoch_ms = None;
            // Running out also consumes the warning.
            self.warned = true;
            return Some(Event::CountdownCompleted {
                kind: self.kind,
                at: Utc::now(),
            });
        }

        if !self.warned
            && self.total_ms > FIVE_MINUTE_WARNING_MS
            && self.remaining_ms <= FIVE_MINUTE_WARNING_MS
        {
            self.warned = true;
            return Some(Event::FiveMinuteWarning {
                kind: self.kind,
                remaining_ms: self.remaining_ms,
                at: Utc::now(),
            });
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_elapsed(&mut self, now_ms: u64) {
        if let Some(last) = self.last_tick_epoch_ms {
            let elapsed = now_ms.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now_ms);
        }
    }
}

fn now_ms() -> u64 {
    let now = Utc::now().timestamp_millis();
    u64::try_from(now).unwrap_or_default()
}
