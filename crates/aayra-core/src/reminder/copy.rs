//! Personalized reminder text.

use crate::stats::EngagementStats;

pub const REMINDER_TITLE: &str = "Study Time Reminder";

/// Leads at or below this many minutes get the "final countdown" wording.
const FINAL_CALL_MINUTES: u32 = 5;

/// Compose the body for a reminder firing `lead_minutes` before study time.
///
/// Selection order: pending reviews, then streak, then sessions left to the
/// weekly goal. With none of those the line rotates on the session count, so
/// the same stats always give the same text.
pub fn compose_body(stats: &EngagementStats, lead_minutes: u32) -> String {
    if stats.is_empty() {
        return fallback_body(lead_minutes);
    }

    let lines = if lead_minutes <= FINAL_CALL_MINUTES {
        final_call_lines(stats, lead_minutes)
    } else {
        early_lines(stats, lead_minutes)
    };

    let idx = if stats.pending_reviews > 0 {
        0
    } else if stats.streak_days > 0 {
        1
    } else if stats.sessions_to_goal > 0 {
        2
    } else {
        stats.total_sessions as usize % lines.len()
    };
    lines[idx].clone()
}

pub fn fallback_body(lead_minutes: u32) -> String {
    if lead_minutes <= FINAL_CALL_MINUTES {
        format!("⏰ Your study session starts in {lead_minutes} minutes! Time to focus.")
    } else {
        format!("⏰ Your study session starts in {lead_minutes} minutes! Get ready to focus.")
    }
}

fn early_lines(s: &EngagementStats, lead: u32) -> Vec<String> {
    vec![
        format!(
            "📚 You've got {} sessions pending. Let's conquer them, study starts in {lead} minutes!",
            s.pending_reviews
        ),
        format!(
            "🔥 You're on a {}-day streak. Let's make it {}! Study starts in {lead} minutes.",
            s.streak_days,
            s.streak_days + 1
        ),
        format!(
            "🎯 Only {} more sessions to hit your weekly goal. Session starts in {lead} minutes.",
            s.sessions_to_goal
        ),
        format!(
            "⚡ Time to boost that {}% completion rate! Study starts in {lead} minutes.",
            s.completion_rate_percent
        ),
        format!(
            "🌟 {} sessions completed so far. Add another one in {lead} minutes!",
            s.total_sessions
        ),
    ]
}

fn final_call_lines(s: &EngagementStats, lead: u32) -> Vec<String> {
    vec![
        format!(
            "🚀 Final countdown: {lead} minutes! Time to tackle those {} pending reviews.",
            s.pending_reviews
        ),
        format!(
            "⏰ {lead} minutes to study time! Your {}-day streak is counting on you.",
            s.streak_days
        ),
        format!(
            "💪 {lead} minutes left to prepare. You're {}% towards your weekly goal!",
            s.weekly_progress_percent
        ),
        format!(
            "🎯 Almost time! {lead} minutes to show what {} sessions of experience can do.",
            s.total_sessions
        ),
    ]
}
