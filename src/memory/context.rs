//! Context builder: a snapshot of "now" derived from memory plus the clock.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local, Timelike};
use serde::Serialize;

use crate::config::RulesConfig;
use crate::memory::types::{
    Category, Goal, Preferences, ProgressEntry, Schedule, Streak, Supplement, TimeOfDay,
    UserMemory, Workout,
};

/// Everything the rule table and the remote coach see about the current moment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub current_time: DateTime<Local>,
    pub time_of_day: TimeOfDay,
    pub is_work_day: bool,
    pub completed_today: BTreeSet<String>,
    pub schedule: Schedule,
    pub preferences: Preferences,
    pub supplements: Vec<Supplement>,
    pub goals: BTreeMap<String, Goal>,
    pub streaks: BTreeMap<Category, Streak>,
    pub recent_workouts: Vec<Workout>,
    /// Latest entry per category, when it was logged today.
    pub todays_progress: BTreeMap<Category, ProgressEntry>,
}

impl ContextSnapshot {
    pub fn is_completed(&self, action_id: &str) -> bool {
        self.completed_today.contains(action_id)
    }
}

/// Bucket an hour of the day using the configured boundaries.
pub fn time_of_day(hour: u32, rules: &RulesConfig) -> TimeOfDay {
    if hour >= rules.morning_start_hour && hour < rules.afternoon_start_hour {
        TimeOfDay::Morning
    } else if hour >= rules.afternoon_start_hour && hour < rules.evening_start_hour {
        TimeOfDay::Afternoon
    } else if hour >= rules.evening_start_hour && hour < rules.night_start_hour {
        TimeOfDay::Evening
    } else {
        TimeOfDay::Night
    }
}

/// Build a snapshot. Pure: reads `memory` and `now`, touches nothing else.
pub fn build_context(
    memory: &UserMemory,
    now: DateTime<Local>,
    rules: &RulesConfig,
) -> ContextSnapshot {
    let weekday = now.format("%A").to_string();
    let is_work_day = memory
        .schedule
        .work_days
        .iter()
        .any(|day| day.eq_ignore_ascii_case(&weekday));

    let skip = memory.workouts.len().saturating_sub(rules.recent_workouts);
    let recent_workouts = memory.workouts[skip..].to_vec();

    let today = now.date_naive();
    let todays_progress = memory
        .progress
        .iter()
        .filter_map(|(category, entries)| {
            entries
                .last()
                .filter(|entry| entry.date.date_naive() == today)
                .map(|entry| (*category, entry.clone()))
        })
        .collect();

    ContextSnapshot {
        current_time: now,
        time_of_day: time_of_day(now.hour(), rules),
        is_work_day,
        completed_today: memory.completed_today.clone(),
        schedule: memory.schedule.clone(),
        preferences: memory.preferences.clone(),
        supplements: memory.supplements.clone(),
        goals: memory.goals.clone(),
        streaks: memory.streaks.clone(),
        recent_workouts,
        todays_progress,
    }
}

fn or_none(items: Vec<String>, none: &str) -> String {
    if items.is_empty() {
        none.to_string()
    } else {
        items.join(", ")
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render the snapshot as the plain-text block sent to the remote coach.
pub fn render_prompt(ctx: &ContextSnapshot) -> String {
    let completed = or_none(ctx.completed_today.iter().cloned().collect(), "None");
    let supplements = or_none(
        ctx.supplements
            .iter()
            .map(|s| format!("{} ({}) - {}", s.name, s.dosage, s.timing))
            .collect(),
        "None",
    );
    let skip = ctx.recent_workouts.len().saturating_sub(3);
    let workouts = or_none(
        ctx.recent_workouts[skip..]
            .iter()
            .map(|w| format!("{} for {}min", w.workout_type, w.duration))
            .collect(),
        "None",
    );
    let streaks = or_none(
        ctx.streaks
            .iter()
            .map(|(category, streak)| format!("{category}: {} days", streak.current))
            .collect(),
        "None",
    );
    let goals = or_none(
        ctx.goals
            .iter()
            .map(|(name, goal)| {
                format!(
                    "{name}: {}/{}",
                    display_value(&goal.current),
                    display_value(&goal.target)
                )
            })
            .collect(),
        "None set",
    );

    format!(
        "User Context:\n\
         - Current time: {time}\n\
         - Time of day: {tod}\n\
         - Is work day: {work_day}\n\
         - Completed today: {completed}\n\
         \n\
         Schedule:\n\
         - Wake time: {wake}\n\
         - Sleep time: {sleep}\n\
         - Work hours: {work_start} - {work_end}\n\
         - Work days: {work_days}\n\
         \n\
         Supplements: {supplements}\n\
         \n\
         Recent workouts: {workouts}\n\
         \n\
         Current streaks: {streaks}\n\
         \n\
         Goals: {goals}",
        time = ctx.current_time.format("%Y-%m-%d %H:%M"),
        tod = ctx.time_of_day,
        work_day = ctx.is_work_day,
        wake = ctx.schedule.wake_time,
        sleep = ctx.schedule.sleep_time,
        work_start = ctx.schedule.work_start,
        work_end = ctx.schedule.work_end,
        work_days = ctx.schedule.work_days.join(", "),
    )
}
