//! Managed backend access.
//!
//! The backend is authoritative for sessions, reviews and preferences;
//! nothing read here is cached durably.

mod rest;

pub use rest::RestBackend;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::reminder::{PendingReview, ReminderPreference};
use crate::stats::CompletedSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationEventType {
    Delivered,
    Clicked,
}

impl NotificationEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationEventType::Delivered => "delivered",
            NotificationEventType::Clicked => "clicked",
        }
    }
}

/// Append-only interaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub user_id: String,
    pub event_type: NotificationEventType,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(user_id: impl Into<String>, event_type: NotificationEventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            event_type,
            timestamp: Utc::now(),
        }
    }
}

/// Everything the reminder subsystem reads from or writes to the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_completed_sessions(&self, user_id: &str) -> Result<Vec<CompletedSession>>;

    /// Pending review entries due on or before `due_by`, oldest first.
    async fn fetch_pending_reviews(
        &self,
        user_id: &str,
        due_by: NaiveDate,
    ) -> Result<Vec<PendingReview>>;

    /// `None` when the user has not set both weekdays and a start time.
    async fn load_preference(&self, user_id: &str) -> Result<Option<ReminderPreference>>;

    async fn save_preference(&self, user_id: &str, preference: &ReminderPreference) -> Result<()>;

    async fn append_event(&self, event: &NotificationEvent) -> Result<()>;
}
