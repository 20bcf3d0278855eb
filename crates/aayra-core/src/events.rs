use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::{DisplayOutcome, Permission};
use crate::timer::{CountdownState, SessionKind};
use crate::worker::WorkerState;

/// Every observable state change produces an Event.
/// The CLI prints them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RemindersScheduled {
        count: usize,
        next_fire_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    ReminderFired {
        tag: String,
        title: String,
        outcome: DisplayOutcome,
        at: DateTime<Utc>,
    },
    /// Recurring reminder re-armed for the following week.
    ReminderRearmed {
        tag: String,
        fire_at: DateTime<Utc>,
    },
    RemindersCleared {
        count: usize,
        at: DateTime<Utc>,
    },
    PermissionResolved {
        permission: Permission,
        at: DateTime<Utc>,
    },
    WorkerStateChanged {
        state: WorkerState,
        at: DateTime<Utc>,
    },
    CountdownStarted {
        kind: SessionKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Remaining time crossed the five-minute mark.
    FiveMinuteWarning {
        kind: SessionKind,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownCompleted {
        kind: SessionKind,
        at: DateTime<Utc>,
    },
    CountdownReset {
        at: DateTime<Utc>,
    },
    CountdownSnapshot {
        state: CountdownState,
        kind: SessionKind,
        remaining_ms: u64,
        total_ms: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::RemindersScheduled { at, .. }
            | Event::ReminderFired { at, .. }
            | Event::RemindersCleared { at, .. }
            | Event::PermissionResolved { at, .. }
            | Event::WorkerStateChanged { at, .. }
            | Event::CountdownStarted { at, .. }
            | Event::CountdownPaused { at, .. }
            | Event::CountdownResumed { at, .. }
            | Event::FiveMinuteWarning { at, .. }
            | Event::CountdownCompleted { at, .. }
            | Event::CountdownReset { at }
            | Event::CountdownSnapshot { at, .. } => *at,
            Event::ReminderRearmed { fire_at, .. } => *fire_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_internally_tagged() {
        let at = DateTime::parse_from_rfc3339("2024-05-15T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = Event::ReminderFired {
            tag: "study-reminder-wednesday-15m".into(),
            title: "Study Time Reminder".into(),
            outcome: DisplayOutcome::Suppressed(Permission::Denied),
            at,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "ReminderFired");
        assert_eq!(value["outcome"]["outcome"], "suppressed");
        assert_eq!(value["outcome"]["permission"], "denied");
        let back: Event = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.at(), at);
    }
}
