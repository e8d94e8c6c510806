//! The recommendation engine.
//!
//! [`LifeEngine`] is the single owner of a user's [`UserMemory`]. The host
//! constructs one at startup and passes it by reference; every mutation is
//! written through to the [`MemoryStore`] before the call returns.

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::coach::{self, CoachError, SuggestionProvider};
use crate::config::LifeLevelsConfig;
use crate::db;
use crate::memory::context::{build_context, render_prompt, ContextSnapshot};
use crate::memory::persist::MemoryStore;
use crate::memory::rules::{RuleSet, Selection};
use crate::memory::settings::{
    apply_preferences_update, apply_schedule_update, require_non_empty, require_range,
    PreferencesUpdate, ScheduleUpdate, SettingsError,
};
use crate::memory::tracker::{self, CompletionOutcome};
use crate::memory::types::{
    ActionDescriptor, ActionKind, Category, Goal, Supplement, UserMemory, Workout,
};

pub struct LifeEngine {
    memory: UserMemory,
    store: MemoryStore,
    coach: Box<dyn SuggestionProvider>,
    rules: RuleSet,
    /// Set when the last write failed; memory is ahead of the store.
    unsaved: bool,
}

impl LifeEngine {
    /// Load memory from `store` and wire up the collaborators.
    pub fn new(store: MemoryStore, coach: Box<dyn SuggestionProvider>, rules: RuleSet) -> Self {
        let memory = store.load();
        Self {
            memory,
            store,
            coach,
            rules,
            unsaved: false,
        }
    }

    /// Open the configured database and build an engine with the remote coach.
    pub fn open(config: &LifeLevelsConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();
        let conn = db::open_database(&db_path)?;
        let store = MemoryStore::new(conn, &config.storage);
        let stored_key = store.load_settings().api_key().map(String::from);
        let coach = coach::create_provider(&config.coach, stored_key)?;
        let rules = RuleSet::new(config.rules.clone());
        Ok(Self::new(store, coach, rules))
    }

    pub fn memory(&self) -> &UserMemory {
        &self.memory
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn is_coach_configured(&self) -> bool {
        self.coach.is_configured()
    }

    /// Re-read memory from the store, picking up writes from other processes.
    ///
    /// Skipped while a write is outstanding, since memory is then the only
    /// up-to-date copy. Returns `true` if memory was replaced.
    pub fn reload(&mut self) -> bool {
        if self.unsaved {
            self.persist();
            if self.unsaved {
                tracing::debug!("store is behind memory, skipping reload");
                return false;
            }
        }
        self.memory = self.store.load();
        true
    }

    fn persist(&mut self) {
        match self.store.save(&self.memory) {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist memory, keeping in-memory state");
                self.unsaved = true;
            }
        }
    }

    // ── Context ────────────────────────────────────────────────────────────

    pub fn current_context(&self) -> ContextSnapshot {
        self.context_at(Local::now())
    }

    pub fn context_at(&self, now: DateTime<Local>) -> ContextSnapshot {
        build_context(&self.memory, now, self.rules.settings())
    }

    /// The context as the text block sent to the remote coach.
    pub fn ai_context(&self) -> String {
        render_prompt(&self.current_context())
    }

    // ── Recommendation ─────────────────────────────────────────────────────

    pub fn rule_based_action_at(&self, now: DateTime<Local>) -> Selection {
        self.rules.explain(&self.context_at(now))
    }

    pub async fn determine_next_action(&self) -> ActionDescriptor {
        self.determine_next_action_at(Local::now()).await
    }

    /// Ask the remote coach when configured; otherwise, or on any failure, use the rules.
    pub async fn determine_next_action_at(&self, now: DateTime<Local>) -> ActionDescriptor {
        let ctx = self.context_at(now);

        if self.coach.is_configured() {
            match self.coach.generate_personalized_action(&render_prompt(&ctx)).await {
                Ok(action) => {
                    tracing::info!(id = %action.id, "using coach suggestion");
                    return action;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "failed to get coach suggestion, falling back to rule-based logic"
                    );
                }
            }
        }

        let selection = self.rules.explain(&ctx);
        tracing::debug!(
            rule = selection.rule.unwrap_or("fallback"),
            id = %selection.action.id,
            time_of_day = %ctx.time_of_day,
            "rule-based action selected"
        );
        selection.action
    }

    pub async fn coaching_advice(
        &self,
        current_action: Option<&ActionDescriptor>,
        user_message: Option<&str>,
    ) -> Result<String, CoachError> {
        if !self.coach.is_configured() {
            return Err(CoachError::NotConfigured);
        }
        self.coach
            .coaching_advice(&self.ai_context(), current_action, user_message)
            .await
    }

    // ── Completion ─────────────────────────────────────────────────────────

    pub fn complete_action(&mut self, action: &ActionDescriptor, notes: Option<&str>) -> CompletionOutcome {
        self.complete_action_at(action, notes, Local::now())
    }

    pub fn complete_action_at(
        &mut self,
        action: &ActionDescriptor,
        notes: Option<&str>,
        now: DateTime<Local>,
    ) -> CompletionOutcome {
        self.record(&action.id, &action.kind, action.streak_category(), notes, now)
    }

    /// Complete by bare id. Built-in ids resolve to their kind; anything else
    /// counts as done for today but advances no streak.
    pub fn complete_action_id(&mut self, action_id: &str, notes: Option<&str>) -> CompletionOutcome {
        self.complete_action_id_at(action_id, notes, Local::now())
    }

    pub fn complete_action_id_at(
        &mut self,
        action_id: &str,
        notes: Option<&str>,
        now: DateTime<Local>,
    ) -> CompletionOutcome {
        let kind = ActionKind::from_id(action_id);
        let category = kind.streak_category();
        self.record(action_id, &kind, category, notes, now)
    }

    fn record(
        &mut self,
        action_id: &str,
        kind: &ActionKind,
        category: Option<Category>,
        notes: Option<&str>,
        now: DateTime<Local>,
    ) -> CompletionOutcome {
        let outcome = tracker::record_completion(
            &mut self.memory,
            action_id,
            category,
            notes,
            now,
            self.rules.settings().progress_history_cap,
        );
        if let ActionKind::Supplement { name } = kind {
            tracker::mark_supplement_taken(&mut self.memory, name, now);
        }
        tracing::info!(
            id = %action_id,
            newly_completed = outcome.newly_completed,
            streak = ?outcome.streak.as_ref().map(|s| s.current),
            "action completed"
        );
        self.persist();
        outcome
    }

    /// Clear today's completions. Safe to call any number of times.
    pub fn reset_daily_actions(&mut self) {
        let cleared = self.memory.completed_today.len();
        self.memory.completed_today.clear();
        self.memory.completed_on = None;
        tracing::info!(cleared, "daily actions reset");
        self.persist();
    }

    /// Reset when today's completions were recorded on an earlier date, or
    /// carry no date at all (documents written before `completedOn` existed).
    /// Returns `true` if a reset happened.
    pub fn reset_if_stale_at(&mut self, now: DateTime<Local>) -> bool {
        match self.memory.completed_on {
            Some(date) if date < now.date_naive() => {
                tracing::info!(%date, "completions are from an earlier day");
            }
            None if !self.memory.completed_today.is_empty() => {
                tracing::info!(
                    count = self.memory.completed_today.len(),
                    "undated completions, treating them as stale"
                );
            }
            _ => return false,
        }
        self.reset_daily_actions();
        true
    }

    // ── Settings and logs ──────────────────────────────────────────────────

    pub fn update_schedule(&mut self, update: ScheduleUpdate) -> Result<(), SettingsError> {
        self.memory.schedule = apply_schedule_update(&self.memory.schedule, update)?;
        self.persist();
        Ok(())
    }

    pub fn update_preferences(&mut self, update: PreferencesUpdate) -> Result<(), SettingsError> {
        self.memory.preferences = apply_preferences_update(&self.memory.preferences, update)?;
        self.persist();
        Ok(())
    }

    pub fn add_supplement(&mut self, name: &str, dosage: &str, timing: &str) -> Result<(), SettingsError> {
        require_non_empty("supplement name", name)?;
        require_non_empty("supplement timing", timing)?;
        self.memory.supplements.push(Supplement {
            name: name.trim().to_string(),
            dosage: dosage.trim().to_string(),
            timing: timing.trim().to_string(),
            last_taken: None,
        });
        self.persist();
        Ok(())
    }

    /// Store a new API credential and hand it to the coach.
    pub fn update_credential(&mut self, api_key: &str) -> Result<(), SettingsError> {
        require_non_empty("API key", api_key)?;
        let mut settings = self.store.load_settings();
        settings.openai_api_key = Some(api_key.trim().to_string());
        if let Err(e) = self.store.save_settings(&settings) {
            tracing::warn!(error = %e, "failed to persist credential, using it for this session only");
        }
        self.coach.update_credential(api_key.trim().to_string());
        Ok(())
    }

    pub fn log_workout(&mut self, workout_type: &str, duration: u32, intensity: u8) -> Result<(), SettingsError> {
        self.log_workout_at(workout_type, duration, intensity, Local::now())
    }

    pub fn log_workout_at(
        &mut self,
        workout_type: &str,
        duration: u32,
        intensity: u8,
        now: DateTime<Local>,
    ) -> Result<(), SettingsError> {
        require_non_empty("workout type", workout_type)?;
        require_range("workout duration", duration, 1, 1440)?;
        require_range("workout intensity", u32::from(intensity), 1, 10)?;
        self.memory.workouts.push(Workout {
            workout_type: workout_type.trim().to_string(),
            duration,
            date: now,
            intensity,
        });
        self.persist();
        Ok(())
    }

    pub fn log_progress(&mut self, category: Category, value: f64, notes: Option<&str>) {
        self.log_progress_at(category, value, notes, Local::now());
    }

    pub fn log_progress_at(
        &mut self,
        category: Category,
        value: f64,
        notes: Option<&str>,
        now: DateTime<Local>,
    ) {
        tracker::push_progress(
            &mut self.memory,
            category,
            value,
            notes.map(String::from),
            now,
            self.rules.settings().progress_history_cap,
        );
        self.persist();
    }

    pub fn set_goal(&mut self, key: &str, goal: Goal) -> Result<(), SettingsError> {
        require_non_empty("goal name", key)?;
        self.memory.goals.insert(key.trim().to_string(), goal);
        self.persist();
        Ok(())
    }
}
