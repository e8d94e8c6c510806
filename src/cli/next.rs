//! CLI `next` and `context` commands.

use anyhow::Result;

use lifelevels::engine::LifeEngine;

use super::print_action;

/// Print the recommended next action.
pub async fn next(engine: &LifeEngine, explain: bool, json: bool) -> Result<()> {
    if explain {
        let selection = engine.rule_based_action_at(chrono::Local::now());
        if json {
            println!("{}", serde_json::to_string_pretty(&selection)?);
        } else {
            print_action(&selection.action);
            println!();
            println!("Rule:  {}", selection.rule.unwrap_or("none matched (fallback)"));
        }
        return Ok(());
    }

    let action = engine.determine_next_action().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&action)?);
    } else {
        print_action(&action);
    }
    Ok(())
}

/// Print the context snapshot as JSON, or the coach prompt text.
pub fn context(engine: &LifeEngine, prompt: bool) -> Result<()> {
    if prompt {
        println!("{}", engine.ai_context());
    } else {
        println!("{}", serde_json::to_string_pretty(&engine.current_context())?);
    }
    Ok(())
}
