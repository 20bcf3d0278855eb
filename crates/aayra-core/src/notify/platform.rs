//! Seams to the host notification and audio APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::payload::NotificationPayload;
use crate::error::Result;

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Never asked.
    Default,
    /// The platform has no notification support at all.
    Unsupported,
}

impl Permission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Permission::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Default => "default",
            Permission::Unsupported => "unsupported",
        }
    }
}

/// Host notification API (browser, OS, terminal...).
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Whether notifications exist at all on this host.
    fn is_supported(&self) -> bool {
        true
    }

    /// Current permission without prompting.
    fn permission(&self) -> Permission;

    /// Show the permission prompt and wait for the user's answer.
    async fn request_permission(&self) -> Result<Permission>;

    /// Render a notification.
    async fn show(&self, payload: &NotificationPayload) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneStep {
    pub frequency_hz: f32,
    /// Offset from the start of the pattern.
    pub offset_ms: u32,
}

/// A short oscillator pattern with an exponential fade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChimePattern {
    pub steps: Vec<ToneStep>,
    pub gain: f32,
    pub duration_ms: u32,
}

impl ChimePattern {
    /// Played with study reminders.
    pub fn reminder() -> Self {
        Self {
            steps: vec![
                ToneStep { frequency_hz: 800.0, offset_ms: 0 },
                ToneStep { frequency_hz: 600.0, offset_ms: 100 },
                ToneStep { frequency_hz: 800.0, offset_ms: 200 },
            ],
            gain: 0.3,
            duration_ms: 300,
        }
    }

    /// Played when a focus session is about to end.
    pub fn session_end() -> Self {
        Self {
            steps: vec![
                ToneStep { frequency_hz: 1000.0, offset_ms: 0 },
                ToneStep { frequency_hz: 800.0, offset_ms: 150 },
                ToneStep { frequency_hz: 1200.0, offset_ms: 300 },
                ToneStep { frequency_hz: 900.0, offset_ms: 450 },
            ],
            gain: 0.4,
            duration_ms: 600,
        }
    }
}

/// Audio output. Hosts without audio simply don't provide one.
pub trait ChimePlayer: Send + Sync {
    fn play(&self, pattern: &ChimePattern) -> Result<()>;
}
