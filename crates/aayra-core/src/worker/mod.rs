//! Background delivery worker.
//!
//! Receives push payloads while the app is not in the foreground, renders
//! them, and relays interaction back to the app. It runs on its own task
//! and talks to the app only through [`WorkerInbound`] and [`AppMessage`].
//!
//! ## State Transitions
//!
//! ```text
//! Installing -> Activating -> Active            (fresh install)
//! Installing -> Installed --SKIP_WAITING--> Activating -> Active
//!                                               (replacing an active worker)
//! any -> Redundant                              (inbox closed)
//! ```

mod clients;
mod messages;

pub use clients::{WindowClient, WindowClients};
pub use messages::{AppMessage, ControlMessage, WorkerInbound};

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::notify::{NotificationPayload, NotificationPlatform, ACTION_DISMISS};

pub const BACKGROUND_SYNC_TAG: &str = "background-sync-notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    /// Installed but waiting for the previous version to let go.
    Installed,
    Activating,
    Active,
    Redundant,
}

/// What a notification click led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Dismissed,
    Focused(String),
    Opened(Url),
    /// No window matched and none could be opened.
    Unhandled,
}

pub struct DeliveryWorker {
    state: WorkerState,
    waiting_on_predecessor: bool,
    origin: Url,
    platform: Arc<dyn NotificationPlatform>,
    clients: Arc<dyn WindowClients>,
    outbox: Option<mpsc::Sender<AppMessage>>,
}

impl DeliveryWorker {
    pub fn new(
        origin: Url,
        platform: Arc<dyn NotificationPlatform>,
        clients: Arc<dyn WindowClients>,
    ) -> Self {
        Self {
            state: WorkerState::Installing,
            waiting_on_predecessor: false,
            origin,
            platform,
            clients,
            outbox: None,
        }
    }

    /// This worker is an update; it waits after install until told to skip.
    pub fn replacing_active(mut self) -> Self {
        self.waiting_on_predecessor = true;
        self
    }

    pub fn with_outbox(mut self, outbox: mpsc::Sender<AppMessage>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub async fn install(&mut self) {
        if self.state != WorkerState::Installing {
            return;
        }
        tracing::info!("delivery worker installing");
        if self.waiting_on_predecessor {
            self.set_state(WorkerState::Installed);
        } else {
            self.activate().await;
        }
    }

    pub async fn activate(&mut self) {
        if !matches!(self.state, WorkerState::Installing | WorkerState::Installed) {
            return;
        }
        self.set_state(WorkerState::Activating);
        if let Err(e) = self.clients.claim().await {
            tracing::warn!(error = %e, "failed to claim open windows");
        }
        self.set_state(WorkerState::Active);
    }

    /// Force activation of a waiting worker.
    pub async fn skip_waiting(&mut self) {
        self.waiting_on_predecessor = false;
        if self.state == WorkerState::Installed {
            self.activate().await;
        }
    }

    fn set_state(&mut self, state: WorkerState) {
        tracing::debug!(from = ?self.state, to = ?state, "delivery worker state");
        self.state = state;
        self.relay(AppMessage::StateChanged { state });
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Render a push message. Returns what was rendered, or `None` if the
    /// worker is not active or the platform refused.
    pub async fn push(&mut self, data: Option<&[u8]>) -> Option<NotificationPayload> {
        if self.state != WorkerState::Active {
            tracing::warn!(state = ?self.state, "push received before activation, ignored");
            return None;
        }
        let payload = NotificationPayload::from_push_data(data, Utc::now());
        if let Err(e) = self.platform.show(&payload).await {
            tracing::warn!(error = %e, "failed to show push notification");
            return None;
        }
        self.relay(AppMessage::NotificationDelivered {
            tag: payload.tag.clone(),
            timestamp: Utc::now(),
        });
        Some(payload)
    }

    pub async fn notification_click(
        &mut self,
        action: Option<&str>,
        notification: &NotificationPayload,
    ) -> ClickOutcome {
        if action == Some(ACTION_DISMISS) {
            return ClickOutcome::Dismissed;
        }

        self.relay(AppMessage::NotificationClicked {
            tag: notification.tag.clone(),
            action: action.map(str::to_string),
            url: notification.data.url.clone(),
            timestamp: Utc::now(),
        });

        match self.clients.match_all().await {
            Ok(windows) => {
                if let Some(window) = windows.iter().find(|w| w.same_origin(&self.origin)) {
                    match self.clients.focus(&window.id).await {
                        Ok(()) => return ClickOutcome::Focused(window.id.clone()),
                        Err(e) => tracing::warn!(error = %e, "failed to focus window"),
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to list windows"),
        }

        let target = self
            .origin
            .join(&notification.data.url)
            .unwrap_or_else(|_| self.origin.clone());
        match self.clients.open_window(&target).await {
            Ok(()) => ClickOutcome::Opened(target),
            Err(e) => {
                tracing::warn!(error = %e, "failed to open window");
                ClickOutcome::Unhandled
            }
        }
    }

    pub async fn handle_message(&mut self, value: &serde_json::Value) {
        match ControlMessage::from_value(value) {
            Some(ControlMessage::SkipWaiting) => self.skip_waiting().await,
            None => tracing::debug!(message = %value, "ignoring unknown worker message"),
        }
    }

    pub fn sync(&self, tag: &str) -> bool {
        if tag == BACKGROUND_SYNC_TAG {
            tracing::info!("background sync triggered for notifications");
            true
        } else {
            false
        }
    }

    pub async fn handle(&mut self, inbound: WorkerInbound) {
        match inbound {
            WorkerInbound::Install => self.install().await,
            WorkerInbound::Activate => self.activate().await,
            WorkerInbound::Push { data } => {
                self.push(data.as_deref()).await;
            }
            WorkerInbound::NotificationClick {
                action,
                notification,
            } => {
                self.notification_click(action.as_deref(), &notification)
                    .await;
            }
            WorkerInbound::Message(value) => self.handle_message(&value).await,
            WorkerInbound::Sync { tag } => {
                self.sync(&tag);
            }
        }
    }

    /// Run the worker on its own task until the inbox closes.
    pub fn spawn(mut self, mut inbox: mpsc::Receiver<WorkerInbound>) -> JoinHandle<WorkerState> {
        tokio::spawn(async move {
            while let Some(inbound) = inbox.recv().await {
                self.handle(inbound).await;
            }
            self.set_state(WorkerState::Redundant);
            self.state
        })
    }

    fn relay(&self, message: AppMessage) {
        if let Some(outbox) = &self.outbox {
            if let Err(e) = outbox.try_send(message) {
                tracing::debug!(error = %e, "app not listening, worker message dropped");
            }
        }
    }
}
