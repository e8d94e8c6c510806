//! Core type definitions.
//!
//! Defines [`UserMemory`] (the single persisted aggregate) and its parts,
//! [`Category`] (the life categories), [`TimeOfDay`] buckets, and the
//! [`ActionDescriptor`] value returned by every recommendation.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Life categories a user is scored on, plus `General` for everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MindsetMaturity,
    FamilyRelationships,
    Money,
    Fitness,
    Health,
    SkillBuilding,
    FunJoy,
    /// Catch-all. Unknown category names decode to this.
    #[default]
    #[serde(other)]
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MindsetMaturity => "mindset_maturity",
            Self::FamilyRelationships => "family_relationships",
            Self::Money => "money",
            Self::Fitness => "fitness",
            Self::Health => "health",
            Self::SkillBuilding => "skill_building",
            Self::FunJoy => "fun_joy",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mindset_maturity" => Ok(Self::MindsetMaturity),
            "family_relationships" => Ok(Self::FamilyRelationships),
            "money" => Ok(Self::Money),
            "fitness" => Ok(Self::Fitness),
            "health" => Ok(Self::Health),
            "skill_building" => Ok(Self::SkillBuilding),
            "fun_joy" => Ok(Self::FunJoy),
            "general" => Ok(Self::General),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// Coarse bucket of the local wall-clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Urgent,
    Important,
    #[default]
    Routine,
}

/// The closed set of actions the engine knows how to recommend.
///
/// The kind fixes both the action id and the streak category, so completion
/// bookkeeping never has to guess from the id text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionKind {
    Supplement { name: String },
    MorningMeditation,
    Workout,
    HydrationCheck,
    DailyReflection,
    SleepPrep,
    GeneralCheckin,
    /// Produced by a remote suggestion provider.
    #[default]
    Suggested,
}

const SUPPLEMENT_PREFIX: &str = "supplement_";

impl ActionKind {
    /// Deterministic id. `None` for suggested actions, which carry their own.
    pub fn id(&self) -> Option<String> {
        let id = match self {
            Self::Supplement { name } => return Some(format!("{SUPPLEMENT_PREFIX}{name}")),
            Self::MorningMeditation => "morning_meditation",
            Self::Workout => "workout",
            Self::HydrationCheck => "hydration_check",
            Self::DailyReflection => "daily_reflection",
            Self::SleepPrep => "sleep_prep",
            Self::GeneralCheckin => "general_checkin",
            Self::Suggested => return None,
        };
        Some(id.to_string())
    }

    /// Category whose streak advances when this action completes.
    pub fn streak_category(&self) -> Option<Category> {
        match self {
            Self::Supplement { .. } | Self::HydrationCheck | Self::SleepPrep => {
                Some(Category::Health)
            }
            Self::Workout => Some(Category::Fitness),
            Self::MorningMeditation | Self::DailyReflection => Some(Category::MindsetMaturity),
            Self::GeneralCheckin | Self::Suggested => None,
        }
    }

    /// Resolve a bare id by exact match. Ids outside the built-in set are `Suggested`.
    pub fn from_id(id: &str) -> Self {
        match id {
            "morning_meditation" => Self::MorningMeditation,
            "workout" => Self::Workout,
            "hydration_check" => Self::HydrationCheck,
            "daily_reflection" => Self::DailyReflection,
            "sleep_prep" => Self::SleepPrep,
            "general_checkin" => Self::GeneralCheckin,
            _ => match id.strip_prefix(SUPPLEMENT_PREFIX) {
                Some(name) if !name.is_empty() => Self::Supplement {
                    name: name.to_string(),
                },
                _ => Self::Suggested,
            },
        }
    }
}

fn default_priority() -> u32 {
    3
}

/// A single recommended action. Produced fresh on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub action_type: ActionType,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub reasoning: String,
    #[serde(skip)]
    pub kind: ActionKind,
}

impl ActionDescriptor {
    /// Category whose streak this action advances, if any.
    pub fn streak_category(&self) -> Option<Category> {
        match self.kind {
            ActionKind::Suggested => {
                (self.category != Category::General).then_some(self.category)
            }
            ref kind => kind.streak_category(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplement {
    pub name: String,
    pub dosage: String,
    /// Free-form timing tag, e.g. "morning", "8am", "with dinner (pm)".
    pub timing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_taken: Option<DateTime<Local>>,
}

impl Supplement {
    pub fn is_morning(&self) -> bool {
        let timing = self.timing.to_lowercase();
        timing.contains("morning") || timing.contains("am")
    }

    pub fn is_evening(&self) -> bool {
        let timing = self.timing.to_lowercase();
        timing.contains("evening") || timing.contains("pm")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    #[serde(rename = "type")]
    pub workout_type: String,
    /// Minutes.
    pub duration: u32,
    pub date: DateTime<Local>,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub target: serde_json::Value,
    pub current: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Local>>,
    #[serde(default)]
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule {
    pub wake_time: String,
    pub sleep_time: String,
    pub work_start: String,
    pub work_end: String,
    /// Full English weekday names.
    pub work_days: Vec<String>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            wake_time: "06:00".into(),
            sleep_time: "22:00".into(),
            work_start: "09:00".into(),
            work_end: "17:00".into(),
            work_days: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// "HH:MM" local time.
    pub workout_time: String,
    /// Minutes.
    pub meditation_duration: u32,
    pub journal_frequency: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            workout_time: "07:00".into(),
            meditation_duration: 10,
            journal_frequency: "daily".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub date: DateTime<Local>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub current: u32,
    pub longest: u32,
    pub last_activity: DateTime<Local>,
}

/// Everything the engine remembers about one user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMemory {
    pub supplements: Vec<Supplement>,
    pub workouts: Vec<Workout>,
    pub goals: BTreeMap<String, Goal>,
    pub schedule: Schedule,
    pub preferences: Preferences,
    /// Chronological, capped per category.
    #[serde(deserialize_with = "merge_progress")]
    pub progress: BTreeMap<Category, Vec<ProgressEntry>>,
    pub completed_today: BTreeSet<String>,
    /// Local date the entries in `completed_today` belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
    #[serde(deserialize_with = "merge_streaks")]
    pub streaks: BTreeMap<Category, Streak>,
}

/// Unknown category keys collapse into `General`.
fn category_key(key: &str) -> Category {
    key.parse().unwrap_or_default()
}

/// Several unknown keys may land on `General`; their entries are merged in
/// date order instead of the last one winning.
fn merge_progress<'de, D>(deserializer: D) -> Result<BTreeMap<Category, Vec<ProgressEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<ProgressEntry>>::deserialize(deserializer)?;
    let mut merged: BTreeMap<Category, Vec<ProgressEntry>> = BTreeMap::new();
    for (key, entries) in raw {
        let category = category_key(&key);
        match merged.entry(category) {
            Entry::Vacant(slot) => {
                slot.insert(entries);
            }
            Entry::Occupied(mut slot) => {
                tracing::warn!(%key, %category, "merging progress history into an existing category");
                let series = slot.get_mut();
                series.extend(entries);
                series.sort_by_key(|entry| entry.date);
            }
        }
    }
    Ok(merged)
}

/// On collision the most recently active streak is kept, with the best `longest`.
fn merge_streaks<'de, D>(deserializer: D) -> Result<BTreeMap<Category, Streak>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Streak>::deserialize(deserializer)?;
    let mut merged: BTreeMap<Category, Streak> = BTreeMap::new();
    for (key, streak) in raw {
        let category = category_key(&key);
        match merged.entry(category) {
            Entry::Vacant(slot) => {
                slot.insert(streak);
            }
            Entry::Occupied(mut slot) => {
                tracing::warn!(%key, %category, "merging streak into an existing category");
                let kept = slot.get_mut();
                let longest = kept.longest.max(streak.longest);
                if streak.last_activity > kept.last_activity {
                    *kept = streak;
                }
                kept.longest = longest.max(kept.current);
            }
        }
    }
    Ok(merged)
}
