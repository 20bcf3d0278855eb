mod config;
pub mod credentials;

pub use config::{BackendConfig, Config, NotificationsConfig, RemindersConfig, WorkerConfig};
pub use credentials::UserSession;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/aayra[-dev]/` based on AAYRA_ENV.
///
/// Set AAYRA_ENV=dev to use the development directory, or AAYRA_CONFIG_DIR
/// to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("AAYRA_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("AAYRA_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("aayra-dev")
            } else {
                base_dir.join("aayra")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
