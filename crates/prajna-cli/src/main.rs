use clap::{Parser, Subcommand};

mod commands;
mod format;
mod logging;

#[derive(Parser)]
#[command(name = "prajna", version, about = "Prajna meditation timer and journal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or recover a meditation session
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Logged sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Session tags
    Tag {
        #[command(subcommand)]
        action: commands::tag::TagAction,
    },
    /// Practice goals
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    logging::enable_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Tag { action } => commands::tag::run(action),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
