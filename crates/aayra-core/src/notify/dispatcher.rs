//! Notification dispatcher.
//!
//! Wraps a [`NotificationPlatform`]: asks for permission at most once and
//! renders notifications only while permission is granted. Nothing here
//! returns an error to the caller; a notification that cannot be shown is
//! reported as an outcome and logged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::payload::NotificationPayload;
use super::platform::{ChimePattern, ChimePlayer, NotificationPlatform, Permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "permission", rename_all = "snake_case")]
pub enum DisplayOutcome {
    Shown,
    /// Permission not granted; nothing was rendered.
    Suppressed(Permission),
    /// The platform refused to render.
    Failed,
}

pub struct NotificationDispatcher {
    platform: Arc<dyn NotificationPlatform>,
    chime: Option<Arc<dyn ChimePlayer>>,
    sound_enabled: bool,
    icon: Option<String>,
    prompted: AtomicBool,
}

impl NotificationDispatcher {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self {
            platform,
            chime: None,
            sound_enabled: true,
            icon: None,
            prompted: AtomicBool::new(false),
        }
    }

    /// Attach an audio output for reminder chimes.
    pub fn with_chime(mut self, chime: Arc<dyn ChimePlayer>) -> Self {
        self.chime = Some(chime);
        self
    }

    /// Icon for notifications built from plain title/body text.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn sound_available(&self) -> bool {
        self.sound_enabled && self.chime.is_some()
    }

    pub fn permission(&self) -> Permission {
        if !self.platform.is_supported() {
            return Permission::Unsupported;
        }
        self.platform.permission()
    }

    /// Resolve the permission, prompting the user at most once.
    ///
    /// A decided permission is returned as is. After the one prompt, later
    /// calls report the platform's current state.
    pub async fn request_permission(&self) -> Permission {
        let current = self.permission();
        match current {
            Permission::Unsupported => {
                tracing::info!("notifications are not supported on this platform");
                return current;
            }
            Permission::Granted => return current,
            Permission::Denied => {
                tracing::info!("notifications are blocked by the user");
                return current;
            }
            Permission::Default => {}
        }

        if self.prompted.swap(true, Ordering::SeqCst) {
            return current;
        }

        match self.platform.request_permission().await {
            Ok(permission) => {
                tracing::info!(permission = permission.as_str(), "notification permission result");
                permission
            }
            Err(e) => {
                tracing::warn!(error = %e, "notification permission request failed");
                Permission::Denied
            }
        }
    }

    pub async fn show_notification(&self, title: &str, body: &str) -> DisplayOutcome {
        self.render(&self.text_payload(title, body), &ChimePattern::reminder())
            .await
    }

    /// Like [`show_notification`](Self::show_notification) with a different chime.
    pub async fn show_alert(
        &self,
        title: &str,
        body: &str,
        chime: &ChimePattern,
    ) -> DisplayOutcome {
        self.render(&self.text_payload(title, body), chime).await
    }

    pub async fn show_payload(&self, payload: &NotificationPayload) -> DisplayOutcome {
        self.render(payload, &ChimePattern::reminder()).await
    }

    fn text_payload(&self, title: &str, body: &str) -> NotificationPayload {
        let mut payload = NotificationPayload::reminder(title, body, Utc::now());
        if let Some(icon) = &self.icon {
            payload.icon = icon.clone();
        }
        payload
    }

    async fn render(
        &self,
        payload: &NotificationPayload,
        pattern: &ChimePattern,
    ) -> DisplayOutcome {
        let permission = self.permission();
        if !permission.is_granted() {
            tracing::debug!(
                permission = permission.as_str(),
                title = %payload.title,
                "notification suppressed"
            );
            return DisplayOutcome::Suppressed(permission);
        }

        if let Err(e) = self.platform.show(payload).await {
            tracing::warn!(error = %e, title = %payload.title, "failed to show notification");
            return DisplayOutcome::Failed;
        }

        if self.sound_enabled {
            if let Some(chime) = &self.chime {
                if let Err(e) = chime.play(pattern) {
                    tracing::warn!(error = %e, "failed to play notification sound");
                }
            }
        }
        DisplayOutcome::Shown
    }
}
