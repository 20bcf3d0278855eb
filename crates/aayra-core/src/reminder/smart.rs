//! Smart daily reminder content.
//!
//! Decides once a day whether a user warrants a reminder and what it should
//! say: a due review first, then a recap of something studied recently,
//! otherwise a motivational line or a study tip.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::preference::ReminderPreference;
use super::scheduler::ScheduledReminder;
use crate::stats::{CompletedSession, EngagementStats};

/// Smart reminders go out this many minutes before study time.
pub const SMART_LEAD_MINUTES: u32 = 10;

pub const SMART_REMINDER_TAG: &str = "smart-reminder";

/// Only sessions finished within this window are recap candidates.
const RECAP_WINDOW_DAYS: i64 = 3;

/// Probability of a study tip instead of a motivational line.
const TIP_PROBABILITY: f64 = 0.4;

/// A review-cycle entry waiting for the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingReview {
    pub entry_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    PendingReview,
    SmartRecap,
    Motivational,
    AiTip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub kind: ContentKind,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Picks message variants. Seeded so tests can pin the output.
pub struct SmartContentComposer {
    rng: Pcg32,
}

impl SmartContentComposer {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg32::from_entropy(),
        }
    }

    pub fn compose<Tz: TimeZone>(
        &mut self,
        pending: &[PendingReview],
        recent: &[CompletedSession],
        stats: &EngagementStats,
        now: &DateTime<Tz>,
    ) -> NotificationContent {
        let today = now.date_naive();
        if let Some(review) = pending.iter().find(|p| is_due_by(p, today)) {
            return self.pending_review(review);
        }
        if let Some(session) = most_recent_within(recent, now, RECAP_WINDOW_DAYS) {
            return self.smart_recap(session);
        }
        self.motivational(stats)
    }

    fn pick(&mut self, options: Vec<String>) -> String {
        let idx = self.rng.gen_range(0..options.len());
        options.into_iter().nth(idx).unwrap_or_default()
    }

    fn pending_review(&mut self, review: &PendingReview) -> NotificationContent {
        let subject = review.subject.as_deref().unwrap_or("your subject");
        let topic = review.topic.as_deref().unwrap_or("the topic");
        let lead = SMART_LEAD_MINUTES;
        let body = self.pick(vec![
            format!(
                "📚 Time to review {topic} in {subject}! Your study session starts in {lead} minutes."
            ),
            format!(
                "🔄 {topic} review is due! Get ready to reinforce your knowledge in {lead} minutes."
            ),
            format!(
                "⏰ Spaced repetition time! Review {topic} ({subject}), starting in {lead} minutes."
            ),
            format!(
                "🎯 Ready to tackle {topic}? Your {subject} review session begins in {lead} minutes."
            ),
            format!(
                "💡 {topic} review awaits! Strengthen your {subject} knowledge in {lead} minutes."
            ),
        ]);
        NotificationContent {
            title: "Review Time!".into(),
            body,
            kind: ContentKind::PendingReview,
            session_id: review.session_id.clone(),
        }
    }

    fn smart_recap(&mut self, session: &CompletedSession) -> NotificationContent {
        let subject = session.subject.as_deref().unwrap_or("your recent study");
        let topic = session.topic.as_deref().unwrap_or("the topic");
        let lead = SMART_LEAD_MINUTES;
        let body = self.pick(vec![
            format!(
                "🧠 Quick recap time! Test your knowledge of {topic} from {subject}, starting in {lead} minutes."
            ),
            format!(
                "⚡ Let's reinforce what you learned about {topic}! Quiz time in {lead} minutes."
            ),
            format!(
                "🎓 Ready for a smart recap of {topic}? Your {subject} review starts in {lead} minutes."
            ),
            format!(
                "💭 Time to consolidate your {topic} knowledge! Study session in {lead} minutes."
            ),
        ]);
        NotificationContent {
            title: "Smart Recap Time!".into(),
            body,
            kind: ContentKind::SmartRecap,
            session_id: Some(session.session_id.clone()),
        }
    }

    fn motivational(&mut self, stats: &EngagementStats) -> NotificationContent {
        let lead = SMART_LEAD_MINUTES;
        if self.rng.gen_bool(TIP_PROBABILITY) {
            let body = self.pick(vec![
                format!(
                    "💡 Tip: Study for 25 minutes, then take a 5-minute break. Starting in {lead} minutes!"
                ),
                format!(
                    "🧠 Tip: Active recall beats passive reading! Test yourself during your session in {lead} minutes."
                ),
                format!(
                    "🔄 Tip: Review material within 24 hours for better memory consolidation! Session in {lead} minutes."
                ),
                format!(
                    "🎯 Tip: Set a specific goal for each session! Your focused study starts in {lead} minutes."
                ),
            ]);
            return NotificationContent {
                title: "Study Tip!".into(),
                body,
                kind: ContentKind::AiTip,
                session_id: None,
            };
        }
        let body = self.pick(vec![
            format!(
                "🌟 You've completed {} sessions! Time to add another one in {lead} minutes.",
                stats.total_sessions
            ),
            format!(
                "🔥 Keep your {}-day streak alive! Study session starts in {lead} minutes.",
                stats.streak_days
            ),
            format!("💪 Every session counts! Your learning journey continues in {lead} minutes."),
            format!("⭐ Great learners study regularly! Your session starts in {lead} minutes."),
        ]);
        NotificationContent {
            title: "Study Time!".into(),
            body,
            kind: ContentKind::Motivational,
            session_id: None,
        }
    }
}

fn most_recent_within<'a, Tz: TimeZone>(
    sessions: &'a [CompletedSession],
    now: &DateTime<Tz>,
    days: i64,
) -> Option<&'a CompletedSession> {
    let cutoff = now.with_timezone(&Utc) - Duration::days(days);
    sessions
        .iter()
        .filter(|s| s.completed_at.is_some_and(|at| at >= cutoff))
        .max_by_key(|s| s.completed_at)
}

fn is_due_by(review: &PendingReview, day: NaiveDate) -> bool {
    review.due_date.map_or(true, |due| due <= day)
}

/// Reviews due on or before `day`. Undated entries count as due.
pub fn reviews_due_by(pending: &[PendingReview], day: NaiveDate) -> Vec<PendingReview> {
    pending
        .iter()
        .filter(|p| is_due_by(p, day))
        .cloned()
        .collect()
}

/// Whether any pending review is due by tomorrow. Undated entries count.
pub fn has_reviews_due_soon(pending: &[PendingReview], today: NaiveDate) -> bool {
    let horizon = today + Duration::days(1);
    pending.iter().any(|p| is_due_by(p, horizon))
}

/// Plan today's smart reminder, if the user warrants one.
///
/// Skips days outside the preference and users with nothing due by
/// tomorrow. Only reviews due today or earlier become review content. If
/// the fire time has already passed today, it moves to tomorrow when
/// tomorrow is also a study day.
pub fn plan_daily_reminder<Tz: TimeZone>(
    preference: &ReminderPreference,
    pending: &[PendingReview],
    recent: &[CompletedSession],
    stats: &EngagementStats,
    composer: &mut SmartContentComposer,
    now: &DateTime<Tz>,
) -> Option<ScheduledReminder> {
    let today = now.date_naive();
    if !preference.includes(today.weekday()) {
        tracing::debug!(weekday = %today.weekday(), "not a preferred study day");
        return None;
    }
    if !has_reviews_due_soon(pending, today) {
        tracing::debug!("no pending reviews due within a day");
        return None;
    }

    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let lead = Duration::minutes(SMART_LEAD_MINUTES as i64);
    let fire_at = [today, today + Duration::days(1)]
        .into_iter()
        .filter(|day| preference.includes(day.weekday()))
        .filter_map(|day| {
            tz.from_local_datetime(&(day.and_time(preference.start_time) - lead))
                .earliest()
        })
        .map(|at| at.with_timezone(&Utc))
        .find(|at| *at > now_utc)?;

    let content = composer.compose(pending, recent, stats, now);
    Some(ScheduledReminder::once(
        fire_at,
        content.title,
        content.body,
        SMART_REMINDER_TAG,
    ))
}
