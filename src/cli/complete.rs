//! CLI `complete` and `reset-day` commands.

use anyhow::Result;

use lifelevels::engine::LifeEngine;
use lifelevels::memory::tracker::StreakChange;

pub fn complete(engine: &mut LifeEngine, id: &str, notes: Option<&str>) -> Result<()> {
    let outcome = engine.complete_action_id(id, notes);

    if outcome.newly_completed {
        println!("Completed: {}", outcome.action_id);
    } else {
        println!("Already completed today: {}", outcome.action_id);
    }

    if let Some(streak) = outcome.streak {
        let note = match streak.change {
            StreakChange::AlreadyCounted => "already counted today",
            StreakChange::Continued => "streak continues",
            StreakChange::Started => "new streak",
            StreakChange::Reset => "streak restarted",
        };
        println!(
            "{} streak: {} day(s), best {} ({note})",
            streak.category, streak.current, streak.longest
        );
    }
    Ok(())
}

pub fn reset_day(engine: &mut LifeEngine) {
    engine.reset_daily_actions();
    println!("Today's completed actions cleared.");
}
