//! Reminder service wiring against in-memory platform and backend fakes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use aayra_core::backend::{Backend, NotificationEvent, NotificationEventType};
use aayra_core::error::{BackendError, Result};
use aayra_core::notify::{
    NotificationDispatcher, NotificationPayload, NotificationPlatform, Permission,
};
use aayra_core::reminder::{PendingReview, ReminderPreference, SchedulerConfig, StudyDay};
use aayra_core::stats::CompletedSession;
use aayra_core::{Event, ReminderService, UserSession};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

struct Screen {
    permission: Permission,
    shown: Mutex<Vec<NotificationPayload>>,
}

impl Screen {
    fn new(permission: Permission) -> Arc<Self> {
        Arc::new(Self {
            permission,
            shown: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NotificationPlatform for Screen {
    fn permission(&self) -> Permission {
        self.permission
    }

    async fn request_permission(&self) -> Result<Permission> {
        Ok(self.permission)
    }

    async fn show(&self, payload: &NotificationPayload) -> Result<()> {
        self.shown.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryBackend {
    sessions: Vec<CompletedSession>,
    pending: Vec<PendingReview>,
    offline: AtomicBool,
    events: Mutex<Vec<NotificationEvent>>,
    review_queries: Mutex<Vec<NaiveDate>>,
}

impl MemoryBackend {
    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                endpoint: "studysessions".into(),
                status: 503,
                body: String::new(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch_completed_sessions(&self, _user_id: &str) -> Result<Vec<CompletedSession>> {
        self.check()?;
        Ok(self.sessions.clone())
    }

    async fn fetch_pending_reviews(
        &self,
        _user_id: &str,
        due_by: NaiveDate,
    ) -> Result<Vec<PendingReview>> {
        self.check()?;
        self.review_queries.lock().unwrap().push(due_by);
        Ok(self
            .pending
            .iter()
            .filter(|p| p.due_date.map_or(true, |due| due <= due_by))
            .cloned()
            .collect())
    }

    async fn load_preference(&self, _user_id: &str) -> Result<Option<ReminderPreference>> {
        Ok(None)
    }

    async fn save_preference(&self, _user_id: &str, _pref: &ReminderPreference) -> Result<()> {
        Ok(())
    }

    async fn append_event(&self, event: &NotificationEvent) -> Result<()> {
        self.check()?;
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn wednesday(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, h, m, 0).unwrap()
}

fn evening_pref() -> ReminderPreference {
    ReminderPreference::new(
        [StudyDay::Wednesday, StudyDay::Friday],
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    )
}

fn service(screen: Arc<Screen>, backend: Arc<MemoryBackend>) -> ReminderService {
    ReminderService::new(
        SchedulerConfig::default(),
        10,
        NotificationDispatcher::new(screen),
        Some(backend),
    )
}

fn session() -> UserSession {
    UserSession::new("user-1", "token")
}

#[tokio::test]
async fn signed_in_user_gets_reminders_and_delivery_is_logged() {
    let screen = Screen::new(Permission::Granted);
    let backend = Arc::new(MemoryBackend {
        sessions: vec![CompletedSession {
            session_id: "s1".into(),
            completed_at: Some(wednesday(8, 0)),
            ..Default::default()
        }],
        ..Default::default()
    });
    let mut svc = service(screen.clone(), backend.clone());

    let events = svc
        .sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;
    assert!(matches!(
        events.last(),
        Some(Event::RemindersScheduled { count: 2, .. })
    ));
    assert_eq!(svc.scheduler().next_fire_at(), Some(wednesday(17, 45)));

    assert!(svc.tick(&wednesday(17, 44)).await.is_empty());
    let fired = svc.tick(&wednesday(17, 45)).await;
    assert!(matches!(fired.first(), Some(Event::ReminderFired { .. })));
    assert!(matches!(fired.get(1), Some(Event::ReminderRearmed { .. })));
    // Same instant again: nothing fires twice.
    assert!(svc.tick(&wednesday(17, 45)).await.is_empty());

    let shown = screen.shown.lock().unwrap();
    assert_eq!(shown.len(), 1);
    assert!(shown[0].body.contains("1-day streak"), "body: {}", shown[0].body);
    let logged = backend.events.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].event_type, NotificationEventType::Delivered);
    assert_eq!(logged[0].user_id, "user-1");
}

#[tokio::test]
async fn sign_out_clears_everything() {
    let screen = Screen::new(Permission::Granted);
    let mut svc = service(screen.clone(), Arc::new(MemoryBackend::default()));
    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;
    assert_eq!(svc.scheduler().armed_count(), 2);

    let events = svc.sync_identity(None, None, &wednesday(9, 1)).await;
    assert!(matches!(
        events.as_slice(),
        [Event::RemindersCleared { count: 2, .. }]
    ));
    assert!(svc.tick(&(wednesday(9, 0) + Duration::days(14))).await.is_empty());
    assert!(screen.shown.lock().unwrap().is_empty());
}

#[tokio::test]
async fn denied_permission_arms_nothing() {
    let screen = Screen::new(Permission::Denied);
    let mut svc = service(screen, Arc::new(MemoryBackend::default()));
    let events = svc
        .sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;
    assert!(matches!(
        events.first(),
        Some(Event::PermissionResolved {
            permission: Permission::Denied,
            ..
        })
    ));
    assert_eq!(svc.scheduler().armed_count(), 0);
}

#[tokio::test]
async fn backend_outage_degrades_to_plain_copy() {
    let screen = Screen::new(Permission::Granted);
    let backend = Arc::new(MemoryBackend::default());
    backend.offline.store(true, Ordering::SeqCst);
    let mut svc = service(screen.clone(), backend.clone());

    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;
    assert_eq!(svc.scheduler().armed_count(), 2);
    svc.tick(&wednesday(17, 45)).await;

    // Shown despite the failed stats read and the failed event append.
    assert_eq!(screen.shown.lock().unwrap().len(), 1);
    assert!(backend.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_preference_clears() {
    let screen = Screen::new(Permission::Granted);
    let mut svc = service(screen, Arc::new(MemoryBackend::default()));
    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;
    let empty = ReminderPreference::new(
        Vec::<StudyDay>::new(),
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    );
    svc.sync_identity(Some(&session()), Some(empty), &wednesday(9, 0))
        .await;
    assert_eq!(svc.scheduler().armed_count(), 0);
}

#[tokio::test]
async fn smart_reminder_needs_pending_reviews() {
    let screen = Screen::new(Permission::Granted);
    let mut svc = service(screen.clone(), Arc::new(MemoryBackend::default()));
    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;
    assert!(!svc.arm_smart_reminder(&wednesday(9, 0)).await);

    let backend = Arc::new(MemoryBackend {
        pending: vec![PendingReview {
            entry_id: "e1".into(),
            topic: Some("Photosynthesis".into()),
            ..Default::default()
        }],
        ..Default::default()
    });
    let mut svc = service(screen, backend);
    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;
    assert!(svc.arm_smart_reminder(&wednesday(9, 0)).await);
    assert!(svc.scheduler().is_armed("smart-reminder"));
}

fn review_due(topic: &str, due: NaiveDate) -> PendingReview {
    PendingReview {
        entry_id: format!("entry-{topic}"),
        topic: Some(topic.into()),
        due_date: Some(due),
        ..Default::default()
    }
}

#[tokio::test]
async fn future_reviews_do_not_count_as_pending() {
    let thursday = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
    let backend = Arc::new(MemoryBackend {
        sessions: vec![CompletedSession {
            session_id: "s1".into(),
            topic: Some("Optics".into()),
            completed_at: Some(wednesday(8, 0) - Duration::days(1)),
            ..Default::default()
        }],
        pending: vec![review_due("Mitosis", thursday)],
        ..Default::default()
    });
    let mut svc = service(Screen::new(Permission::Granted), backend.clone());
    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;

    let stats = svc.load_stats(&wednesday(9, 0)).await;
    assert_eq!(stats.pending_reviews, 0);
    assert_eq!(stats.completion_rate_percent, 100);

    // Due tomorrow is enough to plan, but the content is a recap.
    assert!(svc.arm_smart_reminder(&wednesday(9, 0)).await);
    let smart = svc
        .scheduler()
        .armed()
        .into_iter()
        .find(|r| r.dedupe_tag == "smart-reminder")
        .cloned()
        .unwrap();
    assert_eq!(smart.title, "Smart Recap Time!");
    assert!(smart.body.contains("Optics"));
    assert!(backend.review_queries.lock().unwrap().contains(&thursday));
}

#[tokio::test]
async fn smart_reminder_is_planned_again_on_a_new_day() {
    let backend = Arc::new(MemoryBackend {
        pending: vec![PendingReview {
            entry_id: "e1".into(),
            topic: Some("Photosynthesis".into()),
            ..Default::default()
        }],
        ..Default::default()
    });
    let screen = Screen::new(Permission::Granted);
    let mut svc = service(screen.clone(), backend);
    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;

    let mut planned_on = None;
    svc.tick_daily(&wednesday(9, 0), &mut planned_on).await;
    assert!(svc.scheduler().is_armed("smart-reminder"));

    let fired = svc.tick_daily(&wednesday(17, 50), &mut planned_on).await;
    assert!(fired
        .iter()
        .any(|e| matches!(e, Event::ReminderFired { tag, .. } if tag == "smart-reminder")));
    svc.tick_daily(&wednesday(18, 0), &mut planned_on).await;
    assert!(!svc.scheduler().is_armed("smart-reminder"));

    let friday = wednesday(9, 0) + Duration::days(2);
    svc.tick_daily(&friday, &mut planned_on).await;
    let smart = svc
        .scheduler()
        .armed()
        .into_iter()
        .find(|r| r.dedupe_tag == "smart-reminder")
        .cloned()
        .unwrap();
    assert_eq!(smart.fire_at, wednesday(17, 50) + Duration::days(2));
}

#[tokio::test]
async fn worker_clicks_are_logged() {
    let screen = Screen::new(Permission::Granted);
    let backend = Arc::new(MemoryBackend::default());
    let mut svc = service(screen, backend.clone());
    svc.sync_identity(Some(&session()), Some(evening_pref()), &wednesday(9, 0))
        .await;

    let event = svc
        .handle_app_message(aayra_core::worker::AppMessage::NotificationClicked {
            tag: "study-reminder".into(),
            action: Some("open".into()),
            url: "/".into(),
            timestamp: Utc::now(),
        })
        .await;
    assert!(event.is_none());
    let logged = backend.events.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].event_type, NotificationEventType::Clicked);
}
