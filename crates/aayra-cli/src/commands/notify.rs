use aayra_core::notify::NotificationPayload;
use aayra_core::Config;
use chrono::Utc;
use clap::Subcommand;

use super::{console_dispatcher, runtime, CmdResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Ask for permission and show a notification right away
    Test {
        #[arg(long, default_value = "Study Time Reminder")]
        title: String,
        #[arg(
            long,
            default_value = "⏰ Your study session starts in 15 minutes! Get ready to focus."
        )]
        body: String,
    },
    /// Print the payload a push message would render as, defaults filled in
    Payload {
        /// Raw push data (JSON). Omit for an empty push.
        #[arg(long)]
        data: Option<String>,
    },
}

pub fn run(action: NotifyAction) -> CmdResult {
    match action {
        NotifyAction::Test { title, body } => {
            let config = Config::load_or_default();
            runtime()?.block_on(async {
                let dispatcher = console_dispatcher(&config);
                let permission = dispatcher.request_permission().await;
                let outcome = dispatcher.show_notification(&title, &body).await;
                println!(
                    "{}",
                    serde_json::json!({ "permission": permission, "result": outcome })
                );
            });
        }
        NotifyAction::Payload { data } => {
            let payload =
                NotificationPayload::from_push_data(data.as_deref().map(str::as_bytes), Utc::now());
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(())
}
