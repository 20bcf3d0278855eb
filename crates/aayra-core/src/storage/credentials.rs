//! Signed-in session kept in the OS keyring.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const SERVICE: &str = "aayra";
const SESSION_KEY: &str = "session";

/// Identity and bearer token for the managed backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub access_token: String,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for UserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSession")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

fn get(key: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    match entry.get_password() {
        Ok(pw) => Ok(Some(pw)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn set(key: &str, value: &str) -> Result<()> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

fn delete(key: &str) -> Result<()> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// The stored session, if any. A corrupt entry reads as signed out.
pub fn load_session() -> Result<Option<UserSession>> {
    let Some(raw) = get(SESSION_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable stored session");
            Ok(None)
        }
    }
}

pub fn save_session(session: &UserSession) -> Result<()> {
    if session.user_id.trim().is_empty() {
        return Err(CoreError::Custom("user id must not be empty".into()));
    }
    set(SESSION_KEY, &serde_json::to_string(session)?)
}

pub fn clear_session() -> Result<()> {
    delete(SESSION_KEY)
}
