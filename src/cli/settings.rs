//! CLI settings and logging commands: supplements, schedule, preferences,
//! workouts, progress, goals, and the coach key.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use lifelevels::engine::LifeEngine;
use lifelevels::memory::settings::{PreferencesUpdate, ScheduleUpdate};
use lifelevels::memory::types::{Category, Goal};

#[derive(Subcommand)]
pub enum SupplementAction {
    /// Add a supplement to the routine
    Add {
        name: String,
        /// e.g. "2000 IU"
        #[arg(long)]
        dosage: String,
        /// Timing tag: "morning"/"am" or "evening"/"pm"
        #[arg(long)]
        timing: String,
    },
    /// List supplements
    List,
}

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Print the current schedule
    Show,
    /// Change parts of the schedule
    Set {
        #[arg(long)]
        wake: Option<String>,
        #[arg(long)]
        sleep: Option<String>,
        #[arg(long)]
        work_start: Option<String>,
        #[arg(long)]
        work_end: Option<String>,
        /// Comma-separated weekdays, e.g. "mon,tue,wed"
        #[arg(long, value_delimiter = ',')]
        work_days: Option<Vec<String>>,
    },
}

#[derive(Args)]
pub struct PrefsArgs {
    /// Preferred workout time, HH:MM
    #[arg(long)]
    pub workout_time: Option<String>,
    /// Meditation length in minutes
    #[arg(long)]
    pub meditation: Option<u32>,
    #[arg(long)]
    pub journal_frequency: Option<String>,
}

#[derive(Args)]
pub struct WorkoutArgs {
    /// Workout type, e.g. "run"
    pub workout_type: String,
    /// Minutes
    #[arg(long)]
    pub duration: u32,
    /// 1-10
    #[arg(long, default_value_t = 5)]
    pub intensity: u8,
}

#[derive(Args)]
pub struct ProgressArgs {
    /// Category, e.g. "fitness" or "money"
    pub category: String,
    pub value: f64,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct GoalArgs {
    pub name: String,
    /// Target value (JSON literal or plain text)
    #[arg(long)]
    pub target: String,
    /// Current value (JSON literal or plain text)
    #[arg(long, default_value = "0")]
    pub current: String,
    #[arg(long, default_value_t = 1)]
    pub priority: u32,
    /// RFC 3339 deadline
    #[arg(long)]
    pub deadline: Option<String>,
}

/// Numbers and other JSON literals stay typed; anything else is a string.
fn json_or_text(value: &str) -> serde_json::Value {
    serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()))
}

pub fn supplement(engine: &mut LifeEngine, action: SupplementAction) -> Result<()> {
    match action {
        SupplementAction::Add {
            name,
            dosage,
            timing,
        } => {
            engine.add_supplement(&name, &dosage, &timing)?;
            println!("Added {name} ({dosage}, {timing}).");
        }
        SupplementAction::List => {
            let supplements = &engine.memory().supplements;
            if supplements.is_empty() {
                println!("No supplements configured.");
            }
            for s in supplements {
                let last = s
                    .last_taken
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".into());
                println!("  {:<20} {:<12} {:<10} last taken: {last}", s.name, s.dosage, s.timing);
            }
        }
    }
    Ok(())
}

pub fn schedule(engine: &mut LifeEngine, action: ScheduleAction) -> Result<()> {
    match action {
        ScheduleAction::Show => {}
        ScheduleAction::Set {
            wake,
            sleep,
            work_start,
            work_end,
            work_days,
        } => {
            engine.update_schedule(ScheduleUpdate {
                wake_time: wake,
                sleep_time: sleep,
                work_start,
                work_end,
                work_days,
            })?;
            println!("Schedule updated.");
        }
    }

    let schedule = &engine.memory().schedule;
    println!("  Wake:       {}", schedule.wake_time);
    println!("  Sleep:      {}", schedule.sleep_time);
    println!("  Work hours: {} - {}", schedule.work_start, schedule.work_end);
    println!("  Work days:  {}", schedule.work_days.join(", "));
    Ok(())
}

pub fn prefs(engine: &mut LifeEngine, args: PrefsArgs) -> Result<()> {
    engine.update_preferences(PreferencesUpdate {
        workout_time: args.workout_time,
        meditation_duration: args.meditation,
        journal_frequency: args.journal_frequency,
    })?;
    let prefs = &engine.memory().preferences;
    println!(
        "Preferences: workout at {}, {} min meditation, journal {}",
        prefs.workout_time, prefs.meditation_duration, prefs.journal_frequency
    );
    Ok(())
}

pub fn workout(engine: &mut LifeEngine, args: WorkoutArgs) -> Result<()> {
    engine.log_workout(&args.workout_type, args.duration, args.intensity)?;
    println!(
        "Logged {} for {} min (intensity {}).",
        args.workout_type, args.duration, args.intensity
    );
    Ok(())
}

pub fn progress(engine: &mut LifeEngine, args: ProgressArgs) -> Result<()> {
    let category: Category = args.category.parse().map_err(anyhow::Error::msg)?;
    engine.log_progress(category, args.value, args.notes.as_deref());
    println!("Logged {} for {category}.", args.value);
    Ok(())
}

pub fn goal(engine: &mut LifeEngine, args: GoalArgs) -> Result<()> {
    let deadline = args
        .deadline
        .as_deref()
        .map(|d| {
            chrono::DateTime::parse_from_rfc3339(d)
                .map(|t| t.with_timezone(&chrono::Local))
                .with_context(|| format!("invalid deadline: {d}"))
        })
        .transpose()?;
    engine.set_goal(
        &args.name,
        Goal {
            target: json_or_text(&args.target),
            current: json_or_text(&args.current),
            deadline,
            priority: args.priority,
        },
    )?;
    println!("Goal '{}' saved.", args.name);
    Ok(())
}

pub fn key(engine: &mut LifeEngine, api_key: &str) -> Result<()> {
    engine.update_credential(api_key)?;
    println!("Coach API key saved.");
    Ok(())
}
