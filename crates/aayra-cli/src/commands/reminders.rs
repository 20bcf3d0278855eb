use std::time::Duration;

use aayra_core::backend::Backend;
use aayra_core::reminder::{ReminderPreference, ReminderScheduler, SchedulerConfig};
use aayra_core::stats::EngagementStats;
use aayra_core::{Config, ReminderService, UserSession};
use chrono::Local;
use clap::Subcommand;
use tokio::sync::watch;

use super::{
    console_dispatcher, current_session, print_event, runtime, signed_in_backend, CmdResult,
};

#[derive(Subcommand)]
pub enum RemindersAction {
    /// Show the reminders a preference would arm, without signing in
    Plan {
        /// Study weekdays, comma separated (e.g. "Monday,Wed")
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<String>,
        /// Study start time, HH:MM
        #[arg(long)]
        time: String,
        /// Minutes before start (defaults to reminders.lead_minutes)
        #[arg(long)]
        lead: Option<u32>,
        /// Second reminder this many minutes before start
        #[arg(long)]
        follow_up: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the reminder loop for the signed-in user until Ctrl-C or logout
    Run {
        /// Fire whatever is due now and exit
        #[arg(long)]
        once: bool,
    },
    /// Show or change the stored study preference
    Preference {
        #[command(subcommand)]
        action: PreferenceAction,
    },
}

#[derive(Subcommand)]
pub enum PreferenceAction {
    Show,
    Set {
        #[arg(long, value_delimiter = ',', required = true)]
        days: Vec<String>,
        #[arg(long)]
        time: String,
    },
}

pub fn run(action: RemindersAction) -> CmdResult {
    match action {
        RemindersAction::Plan {
            days,
            time,
            lead,
            follow_up,
            json,
        } => plan(&days, &time, lead, follow_up, json),
        RemindersAction::Run { once } => runtime()?.block_on(run_loop(once)),
        RemindersAction::Preference { action } => runtime()?.block_on(preference(action)),
    }
}

fn plan(
    days: &[String],
    time: &str,
    lead: Option<u32>,
    follow_up: Option<u32>,
    json: bool,
) -> CmdResult {
    let config = Config::load_or_default();
    let preference = ReminderPreference::parse(days, time)?;
    let mut scheduler = ReminderScheduler::new(SchedulerConfig {
        lead_minutes: lead.unwrap_or(config.reminders.lead_minutes),
        follow_up_lead_minutes: follow_up.or(config.reminders.follow_up_lead_minutes),
    });
    scheduler.schedule_reminders(&preference, EngagementStats::empty(), &Local::now());

    let armed = scheduler.armed();
    if json {
        println!("{}", serde_json::to_string_pretty(&armed)?);
        return Ok(());
    }
    if armed.is_empty() {
        println!("no reminders (no study days selected)");
    }
    for reminder in armed {
        println!(
            "{}  {}  {}",
            reminder.fire_at.with_timezone(&Local).format("%a %Y-%m-%d %H:%M"),
            reminder.dedupe_tag,
            reminder.body
        );
    }
    Ok(())
}

async fn run_loop(once: bool) -> CmdResult {
    let config = Config::load()?;
    let (session, backend) = signed_in_backend(&config)?;
    let preference = backend.load_preference(&session.user_id).await?;
    if preference.is_none() {
        tracing::warn!("no study preference on the profile; nothing to schedule");
    }

    let mut service = ReminderService::new(
        config.reminders.scheduler_config(),
        config.reminders.weekly_goal,
        console_dispatcher(&config),
        Some(backend),
    );
    for event in service
        .sync_identity(Some(&session), preference, &Local::now())
        .await
    {
        print_event(&event);
    }
    if once {
        for event in service.tick_daily(&Local::now(), &mut None).await {
            print_event(&event);
        }
        return Ok(());
    }

    let interval = Duration::from_secs(config.reminders.tick_interval_secs.max(1));
    let (stop_tx, stop_rx) = watch::channel(false);
    spawn_stop_watchers(stop_tx, session, interval);
    service.run(interval, stop_rx, print_event).await;
    Ok(())
}

/// Stop on Ctrl-C, or once the stored session disappears.
fn spawn_stop_watchers(stop: watch::Sender<bool>, session: UserSession, interval: Duration) {
    let on_signal = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = on_signal.send(true);
        }
    });
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let still_signed_in = matches!(
                current_session(),
                Ok(Some(ref current)) if current.user_id == session.user_id
            );
            if !still_signed_in {
                tracing::info!("session ended, stopping reminders");
                let _ = stop.send(true);
                break;
            }
        }
    });
}

async fn preference(action: PreferenceAction) -> CmdResult {
    let config = Config::load()?;
    let (session, backend) = signed_in_backend(&config)?;
    match action {
        PreferenceAction::Show => match backend.load_preference(&session.user_id).await? {
            Some(pref) => println!("{}", serde_json::to_string_pretty(&pref)?),
            None => println!("no study preference set"),
        },
        PreferenceAction::Set { days, time } => {
            let pref = ReminderPreference::parse(&days, &time)?;
            backend.save_preference(&session.user_id, &pref).await?;
            println!("ok");
        }
    }
    Ok(())
}
