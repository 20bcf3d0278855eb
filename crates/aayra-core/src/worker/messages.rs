//! Messages crossing the worker boundary.
//!
//! The worker and the foreground app never share memory; everything goes
//! through these tagged enums over channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::WorkerState;
use crate::notify::NotificationPayload;

/// App → worker control messages, e.g. `{"type": "SKIP_WAITING"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
}

impl ControlMessage {
    /// Decode a posted message. Anything unrecognised yields `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Worker → app notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppMessage {
    NotificationDelivered {
        tag: String,
        timestamp: DateTime<Utc>,
    },
    NotificationClicked {
        tag: String,
        action: Option<String>,
        url: String,
        timestamp: DateTime<Utc>,
    },
    StateChanged {
        state: WorkerState,
    },
}

/// Everything the host can deliver to the worker.
#[derive(Debug, Clone)]
pub enum WorkerInbound {
    Install,
    Activate,
    Push {
        data: Option<Vec<u8>>,
    },
    NotificationClick {
        action: Option<String>,
        notification: NotificationPayload,
    },
    /// Raw posted message from the app.
    Message(serde_json::Value),
    Sync {
        tag: String,
    },
}
