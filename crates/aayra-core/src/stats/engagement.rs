//! Engagement statistics derived from completed-session history.
//!
//! Everything here is a pure function of its inputs: the same session list,
//! pending count, goal and `now` always produce the same [`EngagementStats`].
//! Calendar-day bucketing happens in the timezone of `now`.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// How far back the streak walk looks.
pub const MAX_STREAK_DAYS: u32 = 365;

/// Weekly goal used when the profile has none.
pub const DEFAULT_WEEKLY_GOAL: u32 = 10;

/// A completed study session as read from the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub session_id: String,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CompletedSession {
    /// The instant the session counts for: completion time, else creation time.
    pub fn activity_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at.or(self.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngagementStats {
    pub total_sessions: u32,
    pub pending_reviews: u32,
    pub streak_days: u32,
    pub weekly_sessions: u32,
    pub weekly_progress_percent: u32,
    pub completion_rate_percent: u32,
    pub sessions_to_goal: u32,
}

impl EngagementStats {
    /// Zero-state stats, used when the backend cannot be read.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn compute<Tz: TimeZone>(
        sessions: &[CompletedSession],
        pending_reviews: u32,
        weekly_goal: u32,
        now: &DateTime<Tz>,
    ) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let days: Vec<NaiveDate> = sessions
            .iter()
            .filter_map(CompletedSession::activity_at)
            .map(|at| at.with_timezone(&tz).date_naive())
            .collect();

        let total_sessions = sessions.len() as u32;
        let week_start = start_of_week(today);
        let weekly_sessions = days
            .iter()
            .filter(|d| (week_start..=today).contains(*d))
            .count() as u32;

        Self {
            total_sessions,
            pending_reviews,
            streak_days: streak_days(&days, today),
            weekly_sessions,
            weekly_progress_percent: weekly_progress(weekly_sessions, weekly_goal),
            completion_rate_percent: completion_rate(total_sessions, pending_reviews),
            sessions_to_goal: weekly_goal.saturating_sub(weekly_sessions),
        }
    }
}

/// Sunday of the week containing `day`.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_sunday() as i64)
}

/// Consecutive days with activity, walking back from `today`.
///
/// A missing session on `today` itself does not break the streak; any
/// earlier gap does.
pub fn streak_days(activity_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let active: HashSet<NaiveDate> = activity_days.iter().copied().collect();
    let mut streak = 0;
    for offset in 0..MAX_STREAK_DAYS {
        let day = today - Duration::days(offset as i64);
        if active.contains(&day) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

/// `round(this_week / goal * 100)`; a zero goal yields 0.
pub fn weekly_progress(weekly_sessions: u32, weekly_goal: u32) -> u32 {
    if weekly_goal == 0 {
        return 0;
    }
    (weekly_sessions as f64 / weekly_goal as f64 * 100.0).round() as u32
}

/// `round(completed / (completed + pending) * 100)`; 0 when both are 0.
pub fn completion_rate(completed: u32, pending: u32) -> u32 {
    let total = completed as u64 + pending as u64;
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}
