use std::sync::Arc;

use aayra_core::notify::NotificationPayload;
use aayra_core::worker::{AppMessage, DeliveryWorker, WindowClient, WorkerInbound};
use aayra_core::Config;
use chrono::Utc;
use clap::Subcommand;
use tokio::sync::mpsc;
use url::Url;

use super::{runtime, CmdResult};
use crate::console::{ConsolePlatform, ConsoleWindows};

#[derive(Subcommand)]
pub enum WorkerAction {
    /// Install a delivery worker, push one message to it and optionally click it
    Simulate {
        /// Raw push data (JSON). Omit for an empty push.
        #[arg(long)]
        data: Option<String>,
        /// Click the notification with this action ("" for the body)
        #[arg(long)]
        click: Option<String>,
        /// The worker is an update and waits for SKIP_WAITING
        #[arg(long)]
        replacing: bool,
        /// Post SKIP_WAITING after install
        #[arg(long)]
        skip_waiting: bool,
        /// Pretend this window is already open
        #[arg(long)]
        window: Vec<Url>,
    },
}

pub fn run(action: WorkerAction) -> CmdResult {
    match action {
        WorkerAction::Simulate {
            data,
            click,
            replacing,
            skip_waiting,
            window,
        } => runtime()?.block_on(simulate(data, click, replacing, skip_waiting, window)),
    }
}

async fn simulate(
    data: Option<String>,
    click: Option<String>,
    replacing: bool,
    skip_waiting: bool,
    windows: Vec<Url>,
) -> CmdResult {
    let config = Config::load_or_default();
    let origin = Url::parse(&config.worker.app_origin)?;
    let windows = windows
        .into_iter()
        .enumerate()
        .map(|(i, url)| WindowClient::new(format!("window-{}", i + 1), url))
        .collect();

    let (app_tx, mut app_rx) = mpsc::channel::<AppMessage>(32);
    let (inbox_tx, inbox_rx) = mpsc::channel::<WorkerInbound>(8);
    let mut worker = DeliveryWorker::new(
        origin,
        Arc::new(ConsolePlatform::new(config.notifications.enabled)),
        Arc::new(ConsoleWindows::new(windows)),
    )
    .with_outbox(app_tx);
    if replacing {
        worker = worker.replacing_active();
    }
    let handle = worker.spawn(inbox_rx);

    let push_data = data.map(String::into_bytes);
    let payload = NotificationPayload::from_push_data(push_data.as_deref(), Utc::now());

    inbox_tx.send(WorkerInbound::Install).await?;
    if skip_waiting {
        inbox_tx
            .send(WorkerInbound::Message(serde_json::json!({ "type": "SKIP_WAITING" })))
            .await?;
    }
    inbox_tx.send(WorkerInbound::Push { data: push_data }).await?;
    if let Some(action) = click {
        let action = (!action.is_empty()).then_some(action);
        inbox_tx
            .send(WorkerInbound::NotificationClick {
                action,
                notification: payload,
            })
            .await?;
    }
    drop(inbox_tx);

    let final_state = handle.await?;
    while let Ok(message) = app_rx.try_recv() {
        println!("{}", serde_json::to_string(&message)?);
    }
    tracing::debug!(state = ?final_state, "worker finished");
    Ok(())
}
