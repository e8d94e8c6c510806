mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lifelevels::config::LifeLevelsConfig;
use lifelevels::engine::LifeEngine;

#[derive(Parser)]
#[command(name = "lifelevels", version, about = "What should you do next? Daily routine coach")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recommend the next action
    Next {
        /// Show which rule fired (rule table only, skips the remote coach)
        #[arg(long)]
        explain: bool,
        /// Print the action as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current context snapshot
    Context {
        /// Print the text block sent to the remote coach instead
        #[arg(long)]
        prompt: bool,
    },
    /// Mark an action as done for today
    Complete {
        /// Action id, e.g. `workout` or `supplement_Vitamin D`
        id: String,
        /// Free-form note, also logged as progress
        #[arg(long)]
        notes: Option<String>,
    },
    /// Clear today's completed actions
    ResetDay,
    /// Show streaks and today's progress
    Streaks,
    /// Manage supplements
    Supplement {
        #[command(subcommand)]
        action: cli::settings::SupplementAction,
    },
    /// Show or change the daily schedule
    Schedule {
        #[command(subcommand)]
        action: cli::settings::ScheduleAction,
    },
    /// Change routine preferences
    Prefs(cli::settings::PrefsArgs),
    /// Log a workout
    Workout(cli::settings::WorkoutArgs),
    /// Log a progress value for a category
    Progress(cli::settings::ProgressArgs),
    /// Set or replace a goal
    Goal(cli::settings::GoalArgs),
    /// Store the coach API key
    Key {
        /// API key sent to the coach endpoint
        api_key: String,
    },
    /// Ask the remote coach for advice
    Coach {
        /// Question for the coach
        message: Option<String>,
    },
    /// Keep recommending actions, resetting completions at midnight
    Watch,
    /// Check database health
    Doctor,
    /// Delete all stored memory and settings
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = LifeLevelsConfig::load()?;

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.log.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Doctor => return cli::doctor::doctor(&config),
        Command::Reset => return cli::reset::reset(&config),
        _ => {}
    }

    let mut engine = LifeEngine::open(&config)?;
    engine.reset_if_stale_at(chrono::Local::now());

    match cli.command {
        Command::Next { explain, json } => cli::next::next(&engine, explain, json).await?,
        Command::Context { prompt } => cli::next::context(&engine, prompt)?,
        Command::Complete { id, notes } => cli::complete::complete(&mut engine, &id, notes.as_deref())?,
        Command::ResetDay => cli::complete::reset_day(&mut engine),
        Command::Streaks => cli::stats::streaks(&engine),
        Command::Supplement { action } => cli::settings::supplement(&mut engine, action)?,
        Command::Schedule { action } => cli::settings::schedule(&mut engine, action)?,
        Command::Prefs(args) => cli::settings::prefs(&mut engine, args)?,
        Command::Workout(args) => cli::settings::workout(&mut engine, args)?,
        Command::Progress(args) => cli::settings::progress(&mut engine, args)?,
        Command::Goal(args) => cli::settings::goal(&mut engine, args)?,
        Command::Key { api_key } => cli::settings::key(&mut engine, &api_key)?,
        Command::Coach { message } => cli::coach::coach(&engine, message.as_deref()).await?,
        Command::Watch => cli::watch::watch(&mut engine, &config.watch).await?,
        Command::Doctor | Command::Reset => unreachable!("handled before opening the engine"),
    }

    Ok(())
}
