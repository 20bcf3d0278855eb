//! Study reminder scheduler.
//!
//! Like the countdown timer, the scheduler has no internal thread. It keeps
//! the set of armed reminders and the caller asks it for due ones via
//! [`ReminderScheduler::take_due`] on its own cadence.
//!
//! ## Arming model
//!
//! ```text
//! schedule_reminders(pref) -> clear_all -> arm(one per weekday [and follow-up])
//! arm(reminder)            -> ReminderHandle   (supersedes same dedupe tag)
//! cancel(handle)           -> bool
//! take_due(now)            -> fired reminders, recurring ones re-armed +7d
//! ```
//!
//! At most one reminder is armed per dedupe tag at any time.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::copy::{compose_body, REMINDER_TITLE};
use super::preference::{ReminderPreference, StudyDay};
use crate::stats::EngagementStats;

/// Minutes before the preferred start time at which the reminder fires.
pub const DEFAULT_LEAD_MINUTES: u32 = 15;

pub const REMINDER_TAG_PREFIX: &str = "study-reminder";

/// How to compute the following occurrence once a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub weekday: StudyDay,
    pub start_time: NaiveTime,
    pub lead_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub fire_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub dedupe_tag: String,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

impl ScheduledReminder {
    /// A one-off reminder with no weekly recurrence.
    pub fn once(
        fire_at: DateTime<Utc>,
        title: impl Into<String>,
        body: impl Into<String>,
        dedupe_tag: impl Into<String>,
    ) -> Self {
        Self {
            fire_at,
            title: title.into(),
            body: body.into(),
            dedupe_tag: dedupe_tag.into(),
            recurrence: None,
        }
    }
}

/// Owned handle to an armed reminder. Pass it back to [`ReminderScheduler::cancel`].
#[derive(Debug, PartialEq, Eq)]
pub struct ReminderHandle {
    id: u64,
    tag: String,
}

impl ReminderHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub lead_minutes: u32,
    /// Second, closer reminder per weekday (e.g. 5 minutes). Off when `None`.
    pub follow_up_lead_minutes: Option<u32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lead_minutes: DEFAULT_LEAD_MINUTES,
            follow_up_lead_minutes: None,
        }
    }
}

impl SchedulerConfig {
    fn leads(&self) -> Vec<u32> {
        let mut leads = vec![self.lead_minutes];
        if let Some(follow_up) = self.follow_up_lead_minutes {
            if follow_up != self.lead_minutes {
                leads.push(follow_up);
            }
        }
        leads
    }
}

#[derive(Debug, Clone)]
struct Armed {
    id: u64,
    reminder: ScheduledReminder,
}

#[derive(Debug, Default)]
pub struct ReminderScheduler {
    config: SchedulerConfig,
    armed: BTreeMap<String, Armed>,
    next_id: u64,
    /// Stats used for the copy of re-armed reminders.
    stats: EngagementStats,
}

impl ReminderScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn is_armed(&self, tag: &str) -> bool {
        self.armed.contains_key(tag)
    }

    /// Armed reminders ordered by fire time.
    pub fn armed(&self) -> Vec<&ScheduledReminder> {
        let mut list: Vec<_> = self.armed.values().map(|a| &a.reminder).collect();
        list.sort_by_key(|r| r.fire_at);
        list
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.armed.values().map(|a| a.reminder.fire_at).min()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace every armed reminder with one per preferred weekday.
    pub fn schedule_reminders<Tz: TimeZone>(
        &mut self,
        preference: &ReminderPreference,
        stats: EngagementStats,
        now: &DateTime<Tz>,
    ) -> Vec<ReminderHandle> {
        self.clear_all_reminders();
        self.stats = stats;

        let mut handles = Vec::new();
        for &weekday in &preference.weekdays {
            for lead in self.config.leads() {
                let recurrence = Recurrence {
                    weekday,
                    start_time: preference.start_time,
                    lead_minutes: lead,
                };
                match self.build(recurrence, now) {
                    Some(reminder) => {
                        tracing::debug!(
                            tag = %reminder.dedupe_tag,
                            fire_at = %reminder.fire_at,
                            "scheduled study reminder"
                        );
                        handles.push(self.arm(reminder));
                    }
                    None => tracing::warn!(%weekday, "no valid fire time for reminder"),
                }
            }
        }
        handles
    }

    /// Arm a reminder. An armed reminder with the same tag is cancelled.
    pub fn arm(&mut self, reminder: ScheduledReminder) -> ReminderHandle {
        self.next_id += 1;
        let id = self.next_id;
        let tag = reminder.dedupe_tag.clone();
        if let Some(prev) = self.armed.insert(tag.clone(), Armed { id, reminder }) {
            tracing::debug!(%tag, superseded = prev.id, "reminder superseded");
        }
        ReminderHandle { id, tag }
    }

    /// Cancel the reminder behind `handle`. Returns false if it already
    /// fired, was cleared, or was superseded.
    pub fn cancel(&mut self, handle: ReminderHandle) -> bool {
        match self.armed.get(&handle.tag) {
            Some(armed) if armed.id == handle.id => {
                self.armed.remove(&handle.tag);
                true
            }
            _ => false,
        }
    }

    /// Cancel everything. Returns how many reminders were armed.
    pub fn clear_all_reminders(&mut self) -> usize {
        let count = self.armed.len();
        self.armed.clear();
        if count > 0 {
            tracing::debug!(count, "cleared armed reminders");
        }
        count
    }

    /// Remove and return every reminder due at `now`, oldest first.
    ///
    /// Recurring reminders are re-armed for the same weekday a week on,
    /// under the same tag.
    pub fn take_due<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<ScheduledReminder> {
        let now_utc = now.with_timezone(&Utc);
        let due_tags: Vec<String> = self
            .armed
            .iter()
            .filter(|(_, a)| a.reminder.fire_at <= now_utc)
            .map(|(tag, _)| tag.clone())
            .collect();

        let mut fired = Vec::with_capacity(due_tags.len());
        for tag in due_tags {
            let Some(armed) = self.armed.remove(&tag) else {
                continue;
            };
            if let Some(recurrence) = armed.reminder.recurrence {
                if let Some(next) = self.build(recurrence, now) {
                    self.arm(next);
                }
            }
            fired.push(armed.reminder);
        }
        fired.sort_by_key(|r| r.fire_at);
        fired
    }

    fn build<Tz: TimeZone>(
        &self,
        recurrence: Recurrence,
        now: &DateTime<Tz>,
    ) -> Option<ScheduledReminder> {
        let fire_at = next_fire_at(
            recurrence.weekday,
            recurrence.start_time,
            recurrence.lead_minutes,
            now,
        )?;
        Some(ScheduledReminder {
            fire_at,
            title: REMINDER_TITLE.to_string(),
            body: compose_body(&self.stats, recurrence.lead_minutes),
            dedupe_tag: dedupe_tag(recurrence.weekday, recurrence.lead_minutes),
            recurrence: Some(recurrence),
        })
    }
}

pub fn dedupe_tag(weekday: StudyDay, lead_minutes: u32) -> String {
    format!(
        "{REMINDER_TAG_PREFIX}-{}-{lead_minutes}m",
        weekday.name().to_ascii_lowercase()
    )
}

/// Next instant strictly after `now` that is `lead_minutes` before
/// `start_time` on `weekday`, in `now`'s timezone.
///
/// The lead may move the fire time onto the previous calendar day. Returns
/// `None` only if no representable local time exists in the next weeks.
pub fn next_fire_at<Tz: TimeZone>(
    weekday: StudyDay,
    start_time: NaiveTime,
    lead_minutes: u32,
    now: &DateTime<Tz>,
) -> Option<DateTime<Utc>> {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let today = now.date_naive();
    let days_ahead = (weekday.to_weekday().num_days_from_sunday() + 7
        - today.weekday().num_days_from_sunday())
        % 7;

    for week in 0..3 {
        let study_day = today + Duration::days(days_ahead as i64 + 7 * week);
        let local = study_day.and_time(start_time) - Duration::minutes(lead_minutes as i64);
        // DST gaps have no local mapping; try the following week.
        let Some(at) = tz.from_local_datetime(&local).earliest() else {
            continue;
        };
        let at = at.with_timezone(&Utc);
        if at > now_utc {
            return Some(at);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2024-05-15 is a Wednesday.
    #[test]
    fn fires_lead_minutes_before_start_on_the_weekday() {
        let now = at(2024, 5, 15, 9, 0);
        let fire = next_fire_at(StudyDay::Friday, time(18, 30), 15, &now).unwrap();
        assert_eq!(fire, at(2024, 5, 17, 18, 15));
        assert_eq!(fire.weekday(), Weekday::Fri);
    }

    #[test]
    fn same_day_later_fires_today() {
        let now = at(2024, 5, 15, 9, 0);
        let fire = next_fire_at(StudyDay::Wednesday, time(10, 0), 15, &now).unwrap();
        assert_eq!(fire, at(2024, 5, 15, 9, 45));
    }

    #[test]
    fn passed_fire_time_rolls_to_next_week() {
        // study at 10:00 but 09:45 has already gone
        let now = at(2024, 5, 15, 9, 50);
        let fire = next_fire_at(StudyDay::Wednesday, time(10, 0), 15, &now).unwrap();
        assert_eq!(fire, at(2024, 5, 22, 9, 45));
    }

    #[test]
    fn exact_fire_instant_is_not_upcoming() {
        let now = at(2024, 5, 15, 9, 45);
        let fire = next_fire_at(StudyDay::Wednesday, time(10, 0), 15, &now).unwrap();
        assert_eq!(fire, at(2024, 5, 22, 9, 45));
    }

    #[test]
    fn lead_can_cross_midnight() {
        let now = at(2024, 5, 15, 9, 0);
        let fire = next_fire_at(StudyDay::Thursday, time(0, 10), 15, &now).unwrap();
        assert_eq!(fire, at(2024, 5, 15, 23, 55));
    }

    #[test]
    fn schedules_one_per_weekday() {
        let mut scheduler = ReminderScheduler::default();
        let pref = ReminderPreference::new(
            [StudyDay::Monday, StudyDay::Wednesday, StudyDay::Friday],
            time(18, 0),
        );
        let handles =
            scheduler.schedule_reminders(&pref, EngagementStats::empty(), &at(2024, 5, 15, 9, 0));
        assert_eq!(handles.len(), 3);
        assert_eq!(scheduler.armed_count(), 3);
        assert!(scheduler.is_armed("study-reminder-monday-15m"));
        for r in scheduler.armed() {
            assert_eq!(r.fire_at.hour(), 17);
            assert_eq!(r.fire_at.minute(), 45);
            assert_eq!(r.title, REMINDER_TITLE);
        }
    }

    #[test]
    fn follow_up_lead_arms_a_second_tag() {
        let mut scheduler = ReminderScheduler::new(SchedulerConfig {
            lead_minutes: 15,
            follow_up_lead_minutes: Some(5),
        });
        let pref = ReminderPreference::new([StudyDay::Monday], time(18, 0));
        scheduler.schedule_reminders(&pref, EngagementStats::empty(), &at(2024, 5, 15, 9, 0));
        assert_eq!(scheduler.armed_count(), 2);
        assert!(scheduler.is_armed("study-reminder-monday-5m"));
        let times: Vec<_> = scheduler.armed().iter().map(|r| r.fire_at.minute()).collect();
        assert_eq!(times, vec![45, 55]);
    }

    #[test]
    fn rescheduling_supersedes_previous_reminders() {
        let mut scheduler = ReminderScheduler::default();
        let now = at(2024, 5, 15, 9, 0);
        let first = ReminderPreference::new([StudyDay::Monday, StudyDay::Tuesday], time(8, 0));
        let second = ReminderPreference::new([StudyDay::Saturday], time(20, 0));
        scheduler.schedule_reminders(&first, EngagementStats::empty(), &now);
        scheduler.schedule_reminders(&second, EngagementStats::empty(), &now);
        assert_eq!(scheduler.armed_count(), 1);
        assert!(scheduler.is_armed("study-reminder-saturday-15m"));
        assert!(!scheduler.is_armed("study-reminder-monday-15m"));
    }

    #[test]
    fn empty_preference_only_clears() {
        let mut scheduler = ReminderScheduler::default();
        let now = at(2024, 5, 15, 9, 0);
        scheduler.schedule_reminders(
            &ReminderPreference::new([StudyDay::Monday], time(8, 0)),
            EngagementStats::empty(),
            &now,
        );
        let handles = scheduler.schedule_reminders(
            &ReminderPreference::new([], time(8, 0)),
            EngagementStats::empty(),
            &now,
        );
        assert!(handles.is_empty());
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn arming_same_tag_supersedes_and_stale_handle_cannot_cancel() {
        let mut scheduler = ReminderScheduler::default();
        let fire = at(2024, 5, 15, 10, 0);
        let old = scheduler.arm(ScheduledReminder::once(fire, "a", "old", "tag"));
        let new = scheduler.arm(ScheduledReminder::once(fire, "a", "new", "tag"));
        assert_eq!(scheduler.armed_count(), 1);
        assert!(!scheduler.cancel(old));
        assert!(scheduler.is_armed("tag"));
        assert!(scheduler.cancel(new));
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn take_due_fires_once_and_rearms_next_week() {
        let mut scheduler = ReminderScheduler::default();
        let pref = ReminderPreference::new([StudyDay::Wednesday], time(10, 0));
        scheduler.schedule_reminders(&pref, EngagementStats::empty(), &at(2024, 5, 15, 9, 0));

        assert!(scheduler.take_due(&at(2024, 5, 15, 9, 44)).is_empty());

        let fired = scheduler.take_due(&at(2024, 5, 15, 9, 45));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].fire_at, at(2024, 5, 15, 9, 45));

        // consumed exactly once
        assert!(scheduler.take_due(&at(2024, 5, 15, 9, 46)).is_empty());
        assert_eq!(scheduler.next_fire_at(), Some(at(2024, 5, 22, 9, 45)));
        assert!(scheduler.is_armed("study-reminder-wednesday-15m"));
    }

    #[test]
    fn one_off_reminders_do_not_rearm() {
        let mut scheduler = ReminderScheduler::default();
        scheduler.arm(ScheduledReminder::once(at(2024, 5, 15, 9, 0), "t", "b", "test"));
        assert_eq!(scheduler.take_due(&at(2024, 5, 15, 9, 1)).len(), 1);
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[test]
    fn clear_all_leaves_nothing_to_fire() {
        let mut scheduler = ReminderScheduler::default();
        let pref = ReminderPreference::new(StudyDay::ALL, time(10, 0));
        scheduler.schedule_reminders(&pref, EngagementStats::empty(), &at(2024, 5, 15, 9, 0));
        assert_eq!(scheduler.clear_all_reminders(), 7);
        assert!(scheduler.take_due(&at(2025, 1, 1, 0, 0)).is_empty());
    }

    #[test]
    fn body_reflects_stats() {
        let mut scheduler = ReminderScheduler::default();
        let stats = EngagementStats {
            pending_reviews: 2,
            total_sessions: 1,
            ..Default::default()
        };
        let pref = ReminderPreference::new([StudyDay::Monday], time(10, 0));
        scheduler.schedule_reminders(&pref, stats, &at(2024, 5, 15, 9, 0));
        assert!(scheduler.armed()[0].body.contains("2 sessions pending"));
    }
}
