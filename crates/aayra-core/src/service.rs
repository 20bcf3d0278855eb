//! Reminder service.
//!
//! Ties the scheduler, dispatcher and backend together for one signed-in
//! user. This is the boundary where library errors stop: backend failures
//! degrade to zero-state stats or a skipped log entry, never to a crash.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as DateDuration, Local, NaiveDate, TimeZone, Utc};
use tokio::sync::watch;

use crate::backend::{Backend, NotificationEvent, NotificationEventType};
use crate::events::Event;
use crate::notify::{DisplayOutcome, NotificationDispatcher};
use crate::reminder::{
    plan_daily_reminder, reviews_due_by, ReminderPreference, ReminderScheduler, SchedulerConfig,
    SmartContentComposer,
};
use crate::stats::EngagementStats;
use crate::storage::UserSession;
use crate::worker::AppMessage;

pub struct ReminderService {
    scheduler: ReminderScheduler,
    dispatcher: NotificationDispatcher,
    backend: Option<Arc<dyn Backend>>,
    composer: SmartContentComposer,
    weekly_goal: u32,
    user_id: Option<String>,
    preference: Option<ReminderPreference>,
}

impl ReminderService {
    pub fn new(
        config: SchedulerConfig,
        weekly_goal: u32,
        dispatcher: NotificationDispatcher,
        backend: Option<Arc<dyn Backend>>,
    ) -> Self {
        Self {
            scheduler: ReminderScheduler::new(config),
            dispatcher,
            backend,
            composer: SmartContentComposer::from_entropy(),
            weekly_goal,
            user_id: None,
            preference: None,
        }
    }

    /// Pin the smart content generator, for reproducible output.
    pub fn with_composer(mut self, composer: SmartContentComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Re-plan after a sign-in, sign-out or preference change.
    ///
    /// Without a user or a preference every reminder is cleared. Without
    /// notification permission nothing is armed.
    pub async fn sync_identity<Tz: TimeZone>(
        &mut self,
        session: Option<&UserSession>,
        preference: Option<ReminderPreference>,
        now: &DateTime<Tz>,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        self.user_id = session.map(|s| s.user_id.clone());
        self.preference = preference;

        let preference = match (&self.user_id, &self.preference) {
            (Some(_), Some(pref)) if !pref.is_empty() => pref.clone(),
            (None, _) => {
                tracing::info!("signed out, clearing study reminders");
                events.push(self.clear());
                return events;
            }
            _ => {
                tracing::info!("no study preference set, clearing study reminders");
                events.push(self.clear());
                return events;
            }
        };

        let permission = self.dispatcher.request_permission().await;
        events.push(Event::PermissionResolved {
            permission,
            at: Utc::now(),
        });
        if !permission.is_granted() {
            tracing::info!(
                permission = permission.as_str(),
                "notification permission not granted, reminders not scheduled"
            );
            events.push(self.clear());
            return events;
        }

        let stats = self.load_stats(now).await;
        let handles = self.scheduler.schedule_reminders(&preference, stats, now);
        tracing::info!(count = handles.len(), "study reminders scheduled");
        events.push(Event::RemindersScheduled {
            count: handles.len(),
            next_fire_at: self.scheduler.next_fire_at(),
            at: Utc::now(),
        });
        events
    }

    /// Stats for the current user, or zero-state if anything is unavailable.
    pub async fn load_stats<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> EngagementStats {
        let (Some(backend), Some(user_id)) = (&self.backend, &self.user_id) else {
            return EngagementStats::empty();
        };
        let sessions = match backend.fetch_completed_sessions(user_id).await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "could not load study sessions, using empty stats");
                return EngagementStats::empty();
            }
        };
        let today = now.date_naive();
        let pending = match backend.fetch_pending_reviews(user_id, today).await {
            Ok(pending) => pending.len() as u32,
            Err(e) => {
                tracing::warn!(error = %e, "could not load pending reviews, using empty stats");
                return EngagementStats::empty();
            }
        };
        EngagementStats::compute(&sessions, pending, self.weekly_goal, now)
    }

    /// Arm today's smart reminder if the user has reviews waiting.
    /// Returns whether one was armed.
    pub async fn arm_smart_reminder<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        let (Some(backend), Some(user_id), Some(preference)) =
            (&self.backend, &self.user_id, &self.preference)
        else {
            return false;
        };
        let today = now.date_naive();
        let pending = match backend
            .fetch_pending_reviews(user_id, today + DateDuration::days(1))
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(error = %e, "could not load pending reviews");
                return false;
            }
        };
        let sessions = match backend.fetch_completed_sessions(user_id).await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "could not load recent sessions");
                Vec::new()
            }
        };
        let due_today = reviews_due_by(&pending, today).len() as u32;
        let stats = EngagementStats::compute(&sessions, due_today, self.weekly_goal, now);
        let plan = plan_daily_reminder(
            preference,
            &pending,
            &sessions,
            &stats,
            &mut self.composer,
            now,
        );
        match plan {
            Some(reminder) => {
                tracing::info!(fire_at = %reminder.fire_at, "smart reminder armed");
                self.scheduler.arm(reminder);
                true
            }
            None => false,
        }
    }

    /// Fire every due reminder exactly once.
    pub async fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Event> {
        let mut events = Vec::new();
        for reminder in self.scheduler.take_due(now) {
            let outcome = self
                .dispatcher
                .show_notification(&reminder.title, &reminder.body)
                .await;
            tracing::info!(tag = %reminder.dedupe_tag, ?outcome, "study reminder fired");
            if outcome == DisplayOutcome::Shown {
                self.log_event(NotificationEventType::Delivered).await;
            }
            events.push(Event::ReminderFired {
                tag: reminder.dedupe_tag.clone(),
                title: reminder.title.clone(),
                outcome,
                at: Utc::now(),
            });
            if let Some(next) = self
                .scheduler
                .armed()
                .into_iter()
                .find(|r| r.dedupe_tag == reminder.dedupe_tag)
            {
                events.push(Event::ReminderRearmed {
                    tag: next.dedupe_tag.clone(),
                    fire_at: next.fire_at,
                });
            }
        }
        events
    }

    /// Append an interaction record. Failures are logged and dropped.
    pub async fn log_event(&self, event_type: NotificationEventType) {
        let (Some(backend), Some(user_id)) = (&self.backend, &self.user_id) else {
            tracing::debug!(event = event_type.as_str(), "no signed-in user, event not logged");
            return;
        };
        let event = NotificationEvent::new(user_id.clone(), event_type);
        if let Err(e) = backend.append_event(&event).await {
            tracing::warn!(
                error = %e,
                event = event_type.as_str(),
                "failed to log notification event"
            );
        }
    }

    /// React to something the delivery worker relayed.
    pub async fn handle_app_message(&self, message: AppMessage) -> Option<Event> {
        match message {
            AppMessage::NotificationDelivered { .. } => {
                self.log_event(NotificationEventType::Delivered).await;
                None
            }
            AppMessage::NotificationClicked { .. } => {
                self.log_event(NotificationEventType::Clicked).await;
                None
            }
            AppMessage::StateChanged { state } => Some(Event::WorkerStateChanged {
                state,
                at: Utc::now(),
            }),
        }
    }

    pub fn clear(&mut self) -> Event {
        let count = self.scheduler.clear_all_reminders();
        Event::RemindersCleared {
            count,
            at: Utc::now(),
        }
    }

    /// Fire due reminders for `now`, first re-planning the smart reminder
    /// when `now` falls on a later day than `planned_on`.
    pub async fn tick_daily<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
        planned_on: &mut Option<NaiveDate>,
    ) -> Vec<Event> {
        let today = now.date_naive();
        if planned_on.map_or(true, |day| day < today) {
            *planned_on = Some(today);
            self.arm_smart_reminder(now).await;
        }
        self.tick(now).await
    }

    /// Tick on `interval` in local time until `shutdown` flips to true or
    /// its sender goes away, then clear everything. The smart reminder is
    /// planned again each new local day.
    pub async fn run<F>(
        &mut self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
        mut on_event: F,
    ) where
        F: FnMut(&Event),
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut planned_on = None;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for event in self.tick_daily(&Local::now(), &mut planned_on).await {
                        on_event(&event);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        let cleared = self.clear();
        on_event(&cleared);
        tracing::info!("reminder service stopped");
    }
}
