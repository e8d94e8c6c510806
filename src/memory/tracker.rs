//! Streak and progress bookkeeping applied when an action completes.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::memory::types::{Category, ProgressEntry, Streak, UserMemory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// The category already advanced today.
    AlreadyCounted,
    /// Last activity was yesterday.
    Continued,
    /// First activity ever recorded for the category.
    Started,
    /// The run was broken by a gap of two or more days.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub category: Category,
    pub change: StreakChange,
    pub current: u32,
    pub longest: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub action_id: String,
    /// `false` when the id was already in today's completed set.
    pub newly_completed: bool,
    pub streak: Option<StreakUpdate>,
}

/// Apply a completion to memory: completed set, streak, optional progress note.
pub fn record_completion(
    memory: &mut UserMemory,
    action_id: &str,
    streak_category: Option<Category>,
    notes: Option<&str>,
    now: DateTime<Local>,
    progress_cap: usize,
) -> CompletionOutcome {
    let newly_completed = memory.completed_today.insert(action_id.to_string());
    memory.completed_on = Some(now.date_naive());

    let streak = streak_category.map(|category| update_streak(&mut memory.streaks, category, now));

    if let Some(notes) = notes {
        push_progress(
            memory,
            streak_category.unwrap_or(Category::General),
            1.0,
            Some(notes.to_string()),
            now,
            progress_cap,
        );
    }

    CompletionOutcome {
        action_id: action_id.to_string(),
        newly_completed,
        streak,
    }
}

/// Advance a category's streak at most once per calendar day.
pub fn update_streak(
    streaks: &mut BTreeMap<Category, Streak>,
    category: Category,
    now: DateTime<Local>,
) -> StreakUpdate {
    let today = now.date_naive();

    let change = match streaks.get_mut(&category) {
        None => {
            streaks.insert(
                category,
                Streak {
                    current: 1,
                    longest: 1,
                    last_activity: now,
                },
            );
            StreakChange::Started
        }
        Some(streak) => {
            let last = streak.last_activity.date_naive();
            let change = if last >= today {
                StreakChange::AlreadyCounted
            } else if today.pred_opt() == Some(last) {
                streak.current += 1;
                StreakChange::Continued
            } else {
                streak.current = 1;
                StreakChange::Reset
            };
            if change != StreakChange::AlreadyCounted {
                streak.longest = streak.longest.max(streak.current);
                streak.last_activity = now;
            }
            change
        }
    };

    let streak = &streaks[&category];
    StreakUpdate {
        category,
        change,
        current: streak.current,
        longest: streak.longest,
    }
}

/// Append a progress entry, evicting the oldest entries beyond `cap`.
pub fn push_progress(
    memory: &mut UserMemory,
    category: Category,
    value: f64,
    notes: Option<String>,
    now: DateTime<Local>,
    cap: usize,
) {
    let entries = memory.progress.entry(category).or_default();
    entries.push(ProgressEntry {
        date: now,
        value,
        notes,
    });
    if entries.len() > cap {
        let excess = entries.len() - cap;
        entries.drain(..excess);
    }
}

/// Stamp `last_taken` on the first supplement with this name.
pub fn mark_supplement_taken(memory: &mut UserMemory, name: &str, now: DateTime<Local>) -> bool {
    match memory.supplements.iter_mut().find(|s| s.name == name) {
        Some(supplement) => {
            supplement.last_taken = Some(now);
            true
        }
        None => false,
    }
}
