mod copy;
mod preference;
mod scheduler;
pub mod smart;

pub use copy::{compose_body, fallback_body, REMINDER_TITLE};
pub use preference::{parse_time_of_day, ReminderPreference, StudyDay};
pub use scheduler::{
    dedupe_tag, next_fire_at, Recurrence, ReminderHandle, ReminderScheduler, ScheduledReminder,
    SchedulerConfig, DEFAULT_LEAD_MINUTES, REMINDER_TAG_PREFIX,
};
pub use smart::{
    plan_daily_reminder, reviews_due_by, ContentKind, NotificationContent, PendingReview,
    SmartContentComposer,
};
