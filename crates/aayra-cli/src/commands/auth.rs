use clap::Subcommand;
use aayra_core::storage::credentials;
use aayra_core::UserSession;

use super::{current_session, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the backend session for a user
    Login {
        /// Backend user id
        #[arg(long)]
        user_id: String,
        /// Access token (JWT) issued by the backend's auth service
        #[arg(long)]
        token: String,
    },
    /// Remove the stored session. A running reminder loop stops firing.
    Logout,
    /// Show who is signed in
    Status,
}

pub fn run(action: AuthAction) -> CmdResult {
    match action {
        AuthAction::Login { user_id, token } => {
            credentials::save_session(&UserSession::new(user_id.clone(), token))?;
            println!("signed in as {user_id}");
        }
        AuthAction::Logout => {
            credentials::clear_session()?;
            // Reminders live only inside a running loop; without a session
            // the next `reminders run` arms nothing.
            println!("signed out; study reminders cleared");
        }
        AuthAction::Status => match current_session()? {
            Some(session) => println!("signed in as {}", session.user_id),
            None => println!("not signed in"),
        },
    }
    Ok(())
}
