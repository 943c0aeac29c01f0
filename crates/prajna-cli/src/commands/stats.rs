use clap::Subcommand;
use prajna_core::{Clock, Config, Database, SystemClock};

use super::print_json;
use crate::format::format_duration;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals, average and streaks
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Time per tag, largest first
    Tags {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Summary { json } => {
            let config = Config::load()?;
            let stats = db.session_stats(SystemClock.today(), config.stats.week_starts_on)?;
            if json {
                print_json(&stats)?;
            } else {
                println!("all time    {}", format_duration(stats.total_seconds_all_time));
                println!("this month  {}", format_duration(stats.total_seconds_this_month));
                println!("this week   {}", format_duration(stats.total_seconds_this_week));
                println!(
                    "sessions    {} (avg {})",
                    stats.total_sessions,
                    format_duration(stats.average_session_seconds)
                );
                println!(
                    "streak      {} days (longest {})",
                    stats.current_streak, stats.longest_streak
                );
            }
        }
        StatsAction::Tags { json } => {
            let breakdown = db.tag_breakdown()?;
            if json {
                print_json(&breakdown)?;
            } else if breakdown.is_empty() {
                println!("no tags");
            } else {
                for row in &breakdown {
                    println!("{:>8}  {}", format_duration(row.total_seconds), row.tag_name);
                }
            }
        }
    }
    Ok(())
}
