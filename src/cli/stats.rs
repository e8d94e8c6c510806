use lifelevels::engine::LifeEngine;
use lifelevels::memory::types::Category;

const CATEGORIES: [Category; 8] = [
    Category::Health,
    Category::Fitness,
    Category::MindsetMaturity,
    Category::Money,
    Category::FamilyRelationships,
    Category::SkillBuilding,
    Category::FunJoy,
    Category::General,
];

/// Display streaks and today's progress in the terminal.
pub fn streaks(engine: &LifeEngine) {
    let ctx = engine.current_context();

    println!("Streaks");
    println!("{}", "=".repeat(40));
    if ctx.streaks.is_empty() {
        println!("  No streaks yet. Complete an action to start one.");
    }
    for category in CATEGORIES {
        if let Some(streak) = ctx.streaks.get(&category) {
            println!(
                "  {:<22} {:>3} day(s)   best {:>3}   last {}",
                category.as_str(),
                streak.current,
                streak.longest,
                streak.last_activity.format("%Y-%m-%d")
            );
        }
    }
    println!();

    println!("Today ({}, {})", ctx.current_time.format("%A"), ctx.time_of_day);
    println!("{}", "=".repeat(40));
    if ctx.completed_today.is_empty() {
        println!("  Nothing completed yet.");
    }
    for id in &ctx.completed_today {
        println!("  ✓ {id}");
    }
    for (category, entry) in &ctx.todays_progress {
        println!(
            "  {:<22} {}{}",
            category.as_str(),
            entry.value,
            entry.notes.as_deref().map(|n| format!("  ({n})")).unwrap_or_default()
        );
    }
}
