use std::time::Duration;

use aayra_core::notify::ChimePattern;
use aayra_core::timer::{WARNING_BODY, WARNING_TITLE};
use aayra_core::{Config, Countdown, CountdownState, Event, SessionKind};
use chrono::Utc;
use clap::{Subcommand, ValueEnum};

use super::{console_dispatcher, print_event, runtime, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum Kind {
    Focus,
    Break,
}

impl From<Kind> for SessionKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Focus => SessionKind::Focus,
            Kind::Break => SessionKind::Break,
        }
    }
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Count a session down in real time, alerting five minutes before the end
    Run {
        #[arg(long, value_enum, default_value = "focus")]
        kind: Kind,
        /// Length in minutes (defaults to 25 for focus, 5 for break)
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Run a session on a synthetic clock and print its events
    Simulate {
        #[arg(long, value_enum, default_value = "focus")]
        kind: Kind,
        #[arg(long)]
        minutes: Option<u32>,
        /// Seconds the clock advances per tick
        #[arg(long, default_value = "30")]
        step_secs: u64,
    },
}

pub fn run(action: TimerAction) -> CmdResult {
    match action {
        TimerAction::Run { kind, minutes } => runtime()?.block_on(run_live(kind.into(), minutes)),
        TimerAction::Simulate {
            kind,
            minutes,
            step_secs,
        } => simulate(kind.into(), minutes, step_secs),
    }
}

fn countdown(kind: SessionKind, minutes: Option<u32>) -> Countdown {
    Countdown::new(kind, minutes.unwrap_or_else(|| kind.default_minutes()))
}

async fn run_live(kind: SessionKind, minutes: Option<u32>) -> CmdResult {
    let config = Config::load_or_default();
    let dispatcher = console_dispatcher(&config);
    dispatcher.request_permission().await;

    let mut timer = countdown(kind, minutes);
    if let Some(event) = timer.start() {
        print_event(&event);
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                if let Some(event) = timer.reset() {
                    print_event(&event);
                }
                break;
            }
        }
        let Some(event) = timer.tick() else { continue };
        print_event(&event);
        match event {
            Event::FiveMinuteWarning { .. } => {
                dispatcher
                    .show_alert(WARNING_TITLE, WARNING_BODY, &ChimePattern::session_end())
                    .await;
            }
            Event::CountdownCompleted { .. } => break,
            _ => {}
        }
    }
    Ok(())
}

fn simulate(kind: SessionKind, minutes: Option<u32>, step_secs: u64) -> CmdResult {
    if step_secs == 0 {
        return Err("--step-secs must be at least 1".into());
    }
    let mut timer = countdown(kind, minutes);
    let mut clock = Utc::now().timestamp_millis().max(0) as u64;
    if let Some(event) = timer.start_at(clock) {
        print_event(&event);
    }
    while timer.state() == CountdownState::Running {
        clock += step_secs * 1000;
        if let Some(event) = timer.tick_at(clock) {
            print_event(&event);
        }
    }
    Ok(())
}
