use aayra_core::backend::Backend;
use aayra_core::{Config, EngagementStats};
use chrono::Local;
use clap::Subcommand;

use super::{runtime, signed_in_backend, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Engagement stats for the signed-in user
    Show {
        /// Weekly goal (defaults to reminders.weekly_goal)
        #[arg(long)]
        goal: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> CmdResult {
    match action {
        StatsAction::Show { goal, json } => runtime()?.block_on(show(goal, json)),
    }
}

async fn show(goal: Option<u32>, json: bool) -> CmdResult {
    let config = Config::load()?;
    let (session, backend) = signed_in_backend(&config)?;
    let sessions = backend.fetch_completed_sessions(&session.user_id).await?;
    let now = Local::now();
    let pending = backend
        .fetch_pending_reviews(&session.user_id, now.date_naive())
        .await?;
    let goal = goal.unwrap_or(config.reminders.weekly_goal);
    let stats = EngagementStats::compute(&sessions, pending.len() as u32, goal, &now);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Sessions completed: {}", stats.total_sessions);
    println!("Pending reviews:    {}", stats.pending_reviews);
    println!("Streak:             {} day(s)", stats.streak_days);
    println!(
        "This week:          {}/{goal} ({}%)",
        stats.weekly_sessions, stats.weekly_progress_percent
    );
    println!("Completion rate:    {}%", stats.completion_rate_percent);
    if stats.sessions_to_goal > 0 {
        println!("{} more session(s) to reach this week's goal", stats.sessions_to_goal);
    }
    Ok(())
}
