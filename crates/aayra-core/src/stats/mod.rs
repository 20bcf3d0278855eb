//! Statistics for personalizing reminder copy.

mod engagement;

pub use engagement::{
    completion_rate, start_of_week, streak_days, weekly_progress, CompletedSession,
    EngagementStats, DEFAULT_WEEKLY_GOAL, MAX_STREAK_DAYS,
};
