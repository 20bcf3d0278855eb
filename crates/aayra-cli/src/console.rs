//! Terminal stand-ins for the host notification, audio and window APIs.

use std::io::Write;

use aayra_core::error::{CoreError, Result};
use aayra_core::notify::{
    ChimePattern, ChimePlayer, NotificationPayload, NotificationPlatform, Permission,
};
use aayra_core::worker::{WindowClient, WindowClients};
use async_trait::async_trait;
use url::Url;

/// Prints notifications to stdout. Permission follows `notifications.enabled`.
pub struct ConsolePlatform {
    enabled: bool,
}

impl ConsolePlatform {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl NotificationPlatform for ConsolePlatform {
    fn permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn request_permission(&self) -> Result<Permission> {
        Ok(self.permission())
    }

    async fn show(&self, payload: &NotificationPayload) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "🔔 {}: {}", payload.title, payload.body)
            .map_err(|e| CoreError::Platform(e.to_string()))?;
        if !payload.actions.is_empty() {
            let actions: Vec<_> = payload
                .actions
                .iter()
                .map(|a| format!("[{}] {}", a.action, a.title))
                .collect();
            writeln!(out, "   {}", actions.join("  "))
                .map_err(|e| CoreError::Platform(e.to_string()))?;
        }
        Ok(())
    }
}

/// Rings the terminal bell once per tone step.
pub struct TerminalBell;

impl ChimePlayer for TerminalBell {
    fn play(&self, pattern: &ChimePattern) -> Result<()> {
        tracing::debug!(steps = pattern.steps.len(), "playing chime");
        let bells = "\x07".repeat(pattern.steps.len().max(1));
        let mut err = std::io::stderr().lock();
        err.write_all(bells.as_bytes())?;
        err.flush()?;
        Ok(())
    }
}

/// A single pretend browser window list for worker simulation.
pub struct ConsoleWindows {
    open: Vec<WindowClient>,
}

impl ConsoleWindows {
    pub fn new(open: Vec<WindowClient>) -> Self {
        Self { open }
    }
}

#[async_trait]
impl WindowClients for ConsoleWindows {
    async fn match_all(&self) -> Result<Vec<WindowClient>> {
        Ok(self.open.clone())
    }

    async fn focus(&self, id: &str) -> Result<()> {
        println!("focus window {id}");
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<()> {
        println!("open window {url}");
        Ok(())
    }
}
