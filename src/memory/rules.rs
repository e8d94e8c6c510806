//! Rule-based action selector.
//!
//! Rules live in an ordered table of (predicate, action factory) pairs, each bound
//! to one [`TimeOfDay`] bucket. Selection walks the rules of the current bucket in
//! order and the first whose predicate holds produces the action. When nothing
//! matches, the general check-in is returned, so selection never fails.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::config::RulesConfig;
use crate::memory::context::ContextSnapshot;
use crate::memory::types::{
    ActionDescriptor, ActionKind, ActionType, Category, Supplement, TimeOfDay,
};

pub type Predicate = fn(&ContextSnapshot, &RulesConfig) -> bool;
pub type ActionFactory = fn(&ContextSnapshot, &RulesConfig) -> ActionDescriptor;

/// One row of the rule table.
pub struct Rule {
    pub name: &'static str,
    pub bucket: TimeOfDay,
    pub predicate: Predicate,
    pub action: ActionFactory,
}

/// Which rule fired (if any) and what it produced.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub rule: Option<&'static str>,
    pub action: ActionDescriptor,
}

pub struct RuleSet {
    rules: Vec<Rule>,
    settings: RulesConfig,
}

impl RuleSet {
    /// The standard daily routine table.
    pub fn new(settings: RulesConfig) -> Self {
        Self::with_rules(default_rules(), settings)
    }

    pub fn with_rules(rules: Vec<Rule>, settings: RulesConfig) -> Self {
        Self { rules, settings }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn settings(&self) -> &RulesConfig {
        &self.settings
    }

    pub fn first_match(&self, ctx: &ContextSnapshot) -> Option<&Rule> {
        self.rules
            .iter()
            .filter(|rule| rule.bucket == ctx.time_of_day)
            .find(|rule| (rule.predicate)(ctx, &self.settings))
    }

    pub fn explain(&self, ctx: &ContextSnapshot) -> Selection {
        match self.first_match(ctx) {
            Some(rule) => Selection {
                rule: Some(rule.name),
                action: (rule.action)(ctx, &self.settings),
            },
            None => Selection {
                rule: None,
                action: general_checkin(),
            },
        }
    }

    pub fn select(&self, ctx: &ContextSnapshot) -> ActionDescriptor {
        self.explain(ctx).action
    }
}

/// The built-in routine, in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "morning_supplements",
            bucket: TimeOfDay::Morning,
            predicate: |ctx, _| pending_supplement(ctx, Supplement::is_morning).is_some(),
            action: morning_supplement_action,
        },
        Rule {
            name: "morning_meditation",
            bucket: TimeOfDay::Morning,
            predicate: |ctx, _| !ctx.is_completed("morning_meditation"),
            action: meditation_action,
        },
        Rule {
            name: "scheduled_workout",
            bucket: TimeOfDay::Morning,
            predicate: workout_time_reached,
            action: workout_action,
        },
        Rule {
            name: "hydration_check",
            bucket: TimeOfDay::Afternoon,
            predicate: |ctx, _| !ctx.is_completed("hydration_check"),
            action: hydration_action,
        },
        Rule {
            name: "catch_up_workout",
            bucket: TimeOfDay::Afternoon,
            predicate: |ctx, settings| {
                !ctx.is_completed("workout")
                    && ctx.current_time.hour() >= settings.catch_up_workout_hour
            },
            action: catch_up_workout_action,
        },
        Rule {
            name: "daily_reflection",
            bucket: TimeOfDay::Evening,
            predicate: |ctx, _| !ctx.is_completed("daily_reflection"),
            action: reflection_action,
        },
        Rule {
            name: "evening_supplements",
            bucket: TimeOfDay::Evening,
            predicate: |ctx, _| pending_supplement(ctx, Supplement::is_evening).is_some(),
            action: evening_supplement_action,
        },
        Rule {
            name: "sleep_prep",
            bucket: TimeOfDay::Night,
            predicate: |ctx, _| !ctx.is_completed("sleep_prep"),
            action: sleep_prep_action,
        },
    ]
}

fn supplement_kind(supplement: &Supplement) -> ActionKind {
    ActionKind::Supplement {
        name: supplement.name.clone(),
    }
}

fn pending_supplement(ctx: &ContextSnapshot, tagged: fn(&Supplement) -> bool) -> Option<&Supplement> {
    ctx.supplements.iter().find(|supplement| {
        tagged(supplement)
            && supplement_kind(supplement)
                .id()
                .is_some_and(|id| !ctx.is_completed(&id))
    })
}

fn workout_time_reached(ctx: &ContextSnapshot, _: &RulesConfig) -> bool {
    if ctx.is_completed("workout") {
        return false;
    }
    match NaiveTime::parse_from_str(&ctx.preferences.workout_time, "%H:%M") {
        Ok(workout_time) => ctx.current_time.time() >= workout_time,
        Err(e) => {
            tracing::warn!(
                workout_time = %ctx.preferences.workout_time,
                error = %e,
                "unparseable workout time, skipping workout rule"
            );
            false
        }
    }
}

/// Display fields of an action; the kind supplies the id.
struct Template {
    title: String,
    description: String,
    action_type: ActionType,
    estimated_time: String,
    category: Category,
    priority: u32,
    reasoning: &'static str,
}

impl Template {
    fn build(self, kind: ActionKind) -> ActionDescriptor {
        ActionDescriptor {
            id: kind.id().unwrap_or_default(),
            title: self.title,
            description: self.description,
            action_type: self.action_type,
            estimated_time: self.estimated_time,
            category: self.category,
            priority: self.priority,
            reasoning: self.reasoning.to_string(),
            kind,
        }
    }
}

fn supplement_action(supplement: &Supplement, priority: u32, reasoning: &'static str) -> ActionDescriptor {
    Template {
        title: format!("Take {}", supplement.name),
        description: format!("Take your {} of {}", supplement.dosage, supplement.name),
        action_type: ActionType::Routine,
        estimated_time: "2 minutes".into(),
        category: Category::Health,
        priority,
        reasoning,
    }
    .build(supplement_kind(supplement))
}

// The supplement predicates guarantee a pending supplement; the check-in
// fallback only covers a factory invoked outside its rule.
fn morning_supplement_action(ctx: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    pending_supplement(ctx, Supplement::is_morning).map_or_else(general_checkin, |supplement| {
        supplement_action(
            supplement,
            1,
            "Morning supplements are important for starting your day with proper nutrition",
        )
    })
}

fn evening_supplement_action(ctx: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    pending_supplement(ctx, Supplement::is_evening).map_or_else(general_checkin, |supplement| {
        supplement_action(
            supplement,
            2,
            "Evening supplements support recovery and prepare your body for rest",
        )
    })
}

fn meditation_action(ctx: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    let minutes = ctx.preferences.meditation_duration;
    Template {
        title: "Morning Meditation".into(),
        description: format!("{minutes} minutes of mindfulness to center yourself"),
        action_type: ActionType::Important,
        estimated_time: format!("{minutes} minutes"),
        category: Category::MindsetMaturity,
        priority: 2,
        reasoning: "Starting your day with meditation improves focus and emotional regulation",
    }
    .build(ActionKind::MorningMeditation)
}

fn workout_action(_: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    Template {
        title: "Time for Your Workout".into(),
        description: "Complete your scheduled fitness session".into(),
        action_type: ActionType::Important,
        estimated_time: "45 minutes".into(),
        category: Category::Fitness,
        priority: 1,
        reasoning: "Consistent morning workouts boost energy and metabolism for the entire day",
    }
    .build(ActionKind::Workout)
}

fn hydration_action(_: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    Template {
        title: "Hydration Check".into(),
        description: "Drink a glass of water and log your hydration".into(),
        action_type: ActionType::Routine,
        estimated_time: "2 minutes".into(),
        category: Category::Health,
        priority: 2,
        reasoning: "Afternoon is when many people forget to stay hydrated",
    }
    .build(ActionKind::HydrationCheck)
}

fn catch_up_workout_action(_: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    Template {
        title: "Catch-up Workout".into(),
        description: "Complete your workout session - better late than never!".into(),
        action_type: ActionType::Important,
        estimated_time: "30 minutes".into(),
        category: Category::Fitness,
        priority: 1,
        reasoning: "Afternoon workouts can help break up the day and boost afternoon energy",
    }
    .build(ActionKind::Workout)
}

fn reflection_action(_: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    Template {
        title: "Daily Reflection".into(),
        description: "Review your day, celebrate wins, and plan tomorrow".into(),
        action_type: ActionType::Important,
        estimated_time: "10 minutes".into(),
        category: Category::MindsetMaturity,
        priority: 1,
        reasoning: "Evening reflection helps consolidate learning and maintain progress awareness",
    }
    .build(ActionKind::DailyReflection)
}

fn sleep_prep_action(_: &ContextSnapshot, _: &RulesConfig) -> ActionDescriptor {
    Template {
        title: "Prepare for Sleep".into(),
        description: "Wind down routine: dim lights, no screens, relaxation".into(),
        action_type: ActionType::Important,
        estimated_time: "15 minutes".into(),
        category: Category::Health,
        priority: 1,
        reasoning: "Good sleep preparation is crucial for recovery and tomorrow's performance",
    }
    .build(ActionKind::SleepPrep)
}

/// Returned when no rule matches.
pub fn general_checkin() -> ActionDescriptor {
    Template {
        title: "Quick Life Check-in".into(),
        description: "Rate your current state and energy levels".into(),
        action_type: ActionType::Routine,
        estimated_time: "3 minutes".into(),
        category: Category::General,
        priority: 3,
        reasoning: "Regular check-ins help maintain awareness of your overall well-being",
    }
    .build(ActionKind::GeneralCheckin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::context::build_context;
    use crate::memory::types::UserMemory;
    use chrono::{DateTime, Local, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 10, h, m, 0).single().unwrap()
    }

    fn supplement(name: &str, dosage: &str, timing: &str) -> Supplement {
        Supplement {
            name: name.into(),
            dosage: dosage.into(),
            timing: timing.into(),
            last_taken: None,
        }
    }

    fn select_at(memory: &UserMemory, now: DateTime<Local>) -> Selection {
        let rules = RuleSet::new(RulesConfig::default());
        let ctx = build_context(memory, now, rules.settings());
        rules.explain(&ctx)
    }

    fn completed(memory: &mut UserMemory, ids: &[&str]) {
        memory
            .completed_today
            .extend(ids.iter().map(|id| id.to_string()));
    }

    #[test]
    fn morning_supplement_comes_first() {
        let mut memory = UserMemory::default();
        memory.supplements.push(supplement("Omega 3", "1g", "evening"));
        memory.supplements.push(supplement("Vitamin D", "2000 IU", "Morning"));

        let selection = select_at(&memory, at(6, 30));
        assert_eq!(selection.rule, Some("morning_supplements"));
        let action = selection.action;
        assert_eq!(action.priority, 1);
        assert!(action.id.contains("Vitamin D"));
        assert_eq!(action.title, "Take Vitamin D");
        assert_eq!(action.description, "Take your 2000 IU of Vitamin D");
        assert_eq!(action.category, Category::Health);
        assert_eq!(action.action_type, ActionType::Routine);
    }

    #[test]
    fn supplements_taken_in_list_order() {
        let mut memory = UserMemory::default();
        memory.supplements.push(supplement("Creatine", "5g", "am"));
        memory.supplements.push(supplement("Vitamin D", "2000 IU", "morning"));
        completed(&mut memory, &["supplement_Creatine"]);

        let action = select_at(&memory, at(6, 30)).action;
        assert_eq!(action.id, "supplement_Vitamin D");
    }

    #[test]
    fn meditation_after_supplements_uses_configured_duration() {
        let mut memory = UserMemory::default();
        memory.supplements.push(supplement("Vitamin D", "2000 IU", "morning"));
        memory.preferences.meditation_duration = 15;
        completed(&mut memory, &["supplement_Vitamin D"]);

        let action = select_at(&memory, at(6, 30)).action;
        assert_eq!(action.id, "morning_meditation");
        assert_eq!(action.estimated_time, "15 minutes");
        assert_eq!(action.priority, 2);
        assert_eq!(action.category, Category::MindsetMaturity);
    }

    #[test]
    fn workout_waits_for_configured_time() {
        let mut memory = UserMemory::default();
        memory.preferences.workout_time = "07:30".into();
        completed(&mut memory, &["morning_meditation"]);

        assert_eq!(select_at(&memory, at(7, 29)).action.id, "general_checkin");

        let selection = select_at(&memory, at(7, 30));
        assert_eq!(selection.rule, Some("scheduled_workout"));
        assert_eq!(selection.action.id, "workout");
        assert_eq!(selection.action.estimated_time, "45 minutes");
        assert_eq!(selection.action.priority, 1);
    }

    #[test]
    fn unparseable_workout_time_skips_rule() {
        let mut memory = UserMemory::default();
        memory.preferences.workout_time = "after coffee".into();
        completed(&mut memory, &["morning_meditation"]);
        assert_eq!(select_at(&memory, at(10, 0)).action.id, "general_checkin");
    }

    #[test]
    fn afternoon_hydration_then_catch_up() {
        let mut memory = UserMemory::default();
        let action = select_at(&memory, at(12, 15)).action;
        assert_eq!(action.id, "hydration_check");
        assert_eq!(action.priority, 2);

        completed(&mut memory, &["hydration_check"]);
        assert_eq!(select_at(&memory, at(13, 59)).action.id, "general_checkin");

        let action = select_at(&memory, at(14, 0)).action;
        assert_eq!(action.id, "workout");
        assert_eq!(action.title, "Catch-up Workout");
        assert_eq!(action.priority, 1);

        completed(&mut memory, &["workout"]);
        assert_eq!(select_at(&memory, at(15, 0)).action.id, "general_checkin");
    }

    #[test]
    fn catch_up_hour_is_configurable() {
        let mut memory = UserMemory::default();
        completed(&mut memory, &["hydration_check"]);
        let rules = RuleSet::new(RulesConfig {
            catch_up_workout_hour: 16,
            ..RulesConfig::default()
        });
        let ctx = build_context(&memory, at(15, 0), rules.settings());
        assert_eq!(rules.select(&ctx).id, "general_checkin");
    }

    #[test]
    fn evening_reflection_then_supplements() {
        let mut memory = UserMemory::default();
        memory.supplements.push(supplement("Vitamin D", "2000 IU", "morning"));
        memory.supplements.push(supplement("Magnesium", "400mg", "PM"));

        let action = select_at(&memory, at(18, 0)).action;
        assert_eq!(action.id, "daily_reflection");
        assert_eq!(action.priority, 1);

        completed(&mut memory, &["daily_reflection"]);
        let action = select_at(&memory, at(18, 0)).action;
        assert_eq!(action.id, "supplement_Magnesium");
        assert_eq!(action.priority, 2);
    }

    #[test]
    fn night_sleep_prep() {
        let mut memory = UserMemory::default();
        let action = select_at(&memory, at(22, 0)).action;
        assert_eq!(action.id, "sleep_prep");
        assert_eq!(action.priority, 1);

        completed(&mut memory, &["sleep_prep"]);
        assert_eq!(select_at(&memory, at(2, 0)).action.id, "general_checkin");
    }

    #[test]
    fn fallback_when_nothing_matches() {
        let mut memory = UserMemory::default();
        completed(&mut memory, &["morning_meditation", "workout"]);

        let selection = select_at(&memory, at(9, 0));
        assert_eq!(selection.rule, None);
        assert_eq!(selection.action.id, "general_checkin");
        assert_eq!(selection.action.priority, 3);
        assert_eq!(selection.action.category, Category::General);
    }

    #[test]
    fn rules_only_fire_in_their_bucket() {
        // Pending evening supplement must not surface in the morning.
        let mut memory = UserMemory::default();
        memory.supplements.push(supplement("Magnesium", "400mg", "evening"));
        completed(&mut memory, &["morning_meditation", "workout"]);
        assert_eq!(select_at(&memory, at(8, 0)).action.id, "general_checkin");
    }

    #[test]
    fn custom_table_order_decides() {
        let rules = RuleSet::with_rules(
            vec![
                Rule {
                    name: "always_reflect",
                    bucket: TimeOfDay::Morning,
                    predicate: |_, _| true,
                    action: reflection_action,
                },
                Rule {
                    name: "always_hydrate",
                    bucket: TimeOfDay::Morning,
                    predicate: |_, _| true,
                    action: hydration_action,
                },
            ],
            RulesConfig::default(),
        );
        let ctx = build_context(&UserMemory::default(), at(8, 0), rules.settings());
        assert_eq!(rules.first_match(&ctx).map(|r| r.name), Some("always_reflect"));
    }

    #[test]
    fn built_in_actions_carry_their_kind() {
        let memory = UserMemory::default();
        let action = select_at(&memory, at(22, 0)).action;
        assert_eq!(action.kind, ActionKind::SleepPrep);
        assert_eq!(action.streak_category(), Some(Category::Health));
        assert_eq!(general_checkin().streak_category(), None);
    }

    #[test]
    fn every_factory_fills_id_from_kind() {
        let mut memory = UserMemory::default();
        memory.supplements.push(supplement("Iron", "18 mg", "morning"));
        memory.supplements.push(supplement("Zinc", "15 mg", "pm"));
        let rules = RuleSet::new(RulesConfig::default());
        let ctx = build_context(&memory, at(8, 0), rules.settings());

        for rule in rules.rules() {
            let action = (rule.action)(&ctx, rules.settings());
            assert_eq!(Some(action.id.clone()), action.kind.id(), "rule {}", rule.name);
            assert!(!action.reasoning.is_empty(), "rule {}", rule.name);
            assert!((1..=3).contains(&action.priority), "rule {}", rule.name);
        }
    }
}
