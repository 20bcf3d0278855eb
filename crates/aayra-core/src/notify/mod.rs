//! Notification rendering: payloads, the platform seam, and the dispatcher.

mod dispatcher;
mod payload;
mod platform;

pub use dispatcher::{DisplayOutcome, NotificationDispatcher};
pub use payload::{
    default_actions, NotificationAction, NotificationData, NotificationPayload, PushPayload,
    ACTION_DISMISS, ACTION_OPEN, DEFAULT_BODY, DEFAULT_ICON, DEFAULT_TAG, DEFAULT_TITLE,
    DEFAULT_URL,
};
pub use platform::{ChimePattern, ChimePlayer, NotificationPlatform, Permission, ToneStep};
