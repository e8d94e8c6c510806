//! CLI `coach` command: free-text advice from the remote coach.

use anyhow::{Context, Result};

use lifelevels::engine::LifeEngine;

pub async fn coach(engine: &LifeEngine, message: Option<&str>) -> Result<()> {
    if !engine.is_coach_configured() {
        println!("No coach API key configured. Run `lifelevels key <API_KEY>` first.");
        return Ok(());
    }

    let current = engine.determine_next_action().await;
    let advice = engine
        .coaching_advice(Some(&current), message)
        .await
        .context("coach request failed")?;
    println!("{advice}");
    Ok(())
}
