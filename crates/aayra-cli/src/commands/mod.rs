pub mod auth;
pub mod config;
pub mod notify;
pub mod reminders;
pub mod stats;
pub mod timer;
pub mod worker;

use std::sync::Arc;

use aayra_core::error::BackendError;
use aayra_core::storage::credentials;
use aayra_core::{Config, Event, NotificationDispatcher, RestBackend, UserSession};

use crate::console::{ConsolePlatform, TerminalBell};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// The signed-in session. AAYRA_USER_ID + AAYRA_ACCESS_TOKEN take precedence
/// over the keyring.
pub fn current_session() -> Result<Option<UserSession>, Box<dyn std::error::Error>> {
    if let (Ok(user_id), Ok(token)) = (
        std::env::var("AAYRA_USER_ID"),
        std::env::var("AAYRA_ACCESS_TOKEN"),
    ) {
        return Ok(Some(UserSession::new(user_id, token)));
    }
    Ok(credentials::load_session()?)
}

pub fn signed_in_backend(
    config: &Config,
) -> Result<(UserSession, Arc<RestBackend>), Box<dyn std::error::Error>> {
    let session = current_session()?.ok_or(BackendError::NotAuthenticated)?;
    let backend = RestBackend::from_config(&config.backend, session.clone())?;
    Ok((session, Arc::new(backend)))
}

pub fn console_dispatcher(config: &Config) -> NotificationDispatcher {
    let mut dispatcher =
        NotificationDispatcher::new(Arc::new(ConsolePlatform::new(config.notifications.enabled)))
            .with_chime(Arc::new(TerminalBell))
            .with_icon(config.notifications.icon.clone());
    dispatcher.set_sound_enabled(config.notifications.sound);
    dispatcher
}

/// One JSON object per line on stdout.
pub fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "could not encode event"),
    }
}
