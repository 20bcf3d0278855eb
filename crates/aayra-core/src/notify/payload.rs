//! Notification payloads.
//!
//! A push message carries a [`PushPayload`] where every field is optional.
//! Before anything is rendered it is merged with the defaults into a fully
//! populated [`NotificationPayload`], so render code never guesses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Aayra Study Reminder";
pub const DEFAULT_BODY: &str = "Time for your study session!";
pub const DEFAULT_ICON: &str = "/favicon.ico";
pub const DEFAULT_TAG: &str = "study-reminder";
pub const DEFAULT_URL: &str = "/";

pub const ACTION_OPEN: &str = "open";
pub const ACTION_DISMISS: &str = "dismiss";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationAction {
    pub fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
            icon: Some(DEFAULT_ICON.to_string()),
        }
    }
}

/// The `{open, dismiss}` pair shown on reminder notifications.
pub fn default_actions() -> Vec<NotificationAction> {
    vec![
        NotificationAction::new(ACTION_OPEN, "Start Studying"),
        NotificationAction::new(ACTION_DISMISS, "Dismiss"),
    ]
}

/// Push message body as sent by the server. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub require_interaction: Option<bool>,
    pub actions: Option<Vec<NotificationAction>>,
}

impl PushPayload {
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// Data attached to a rendered notification, handed back on click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

/// A notification with every field decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

impl NotificationPayload {
    /// The default study-reminder notification.
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body: DEFAULT_BODY.to_string(),
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
            tag: DEFAULT_TAG.to_string(),
            require_interaction: true,
            actions: default_actions(),
            data: NotificationData {
                url: DEFAULT_URL.to_string(),
                timestamp: now,
            },
        }
    }

    /// In-app reminder with the given text and no action buttons.
    pub fn reminder(title: &str, body: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            actions: Vec::new(),
            ..Self::defaults(now)
        }
    }

    /// Fill every field missing from `partial` with its default.
    ///
    /// An empty `actions` list counts as missing.
    pub fn merge_with_defaults(partial: PushPayload, now: DateTime<Utc>) -> Self {
        let defaults = Self::defaults(now);
        Self {
            title: partial.title.unwrap_or(defaults.title),
            body: partial.body.unwrap_or(defaults.body),
            icon: partial.icon.unwrap_or(defaults.icon),
            badge: partial.badge.unwrap_or(defaults.badge),
            tag: partial.tag.unwrap_or(defaults.tag),
            require_interaction: partial
                .require_interaction
                .unwrap_or(defaults.require_interaction),
            actions: partial
                .actions
                .filter(|a| !a.is_empty())
                .unwrap_or(defaults.actions),
            data: defaults.data,
        }
    }

    /// Build the payload for raw push data. Absent or malformed data yields
    /// the defaults.
    pub fn from_push_data(data: Option<&[u8]>, now: DateTime<Utc>) -> Self {
        let Some(bytes) = data else {
            return Self::defaults(now);
        };
        match PushPayload::from_bytes(bytes) {
            Ok(partial) => Self::merge_with_defaults(partial, now),
            Err(e) => {
                tracing::warn!(error = %e, "malformed push payload, using defaults");
                Self::defaults(now)
            }
        }
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a.action == action)
    }
}
