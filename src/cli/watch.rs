//! CLI `watch` command: re-evaluate the next action on a fixed interval.
//!
//! Each tick first clears completions left over from an earlier day, so a
//! long-running session rolls over at local midnight. Memory is re-read from
//! the store so completions made from another terminal are seen, unless a
//! failed write left memory ahead of the store.

use std::time::Duration;

use anyhow::Result;
use chrono::Local;

use lifelevels::config::WatchConfig;
use lifelevels::engine::LifeEngine;

use super::print_action;

pub async fn watch(engine: &mut LifeEngine, config: &WatchConfig) -> Result<()> {
    let period = Duration::from_secs(config.poll_interval_secs.max(1));
    let mut tick = tokio::time::interval(period);
    let mut last_id: Option<String> = None;

    tracing::info!(interval_secs = period.as_secs(), "watching for the next action");

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = Local::now();
                engine.reload();
                if engine.reset_if_stale_at(now) {
                    println!("New day: completed actions cleared.");
                }
                let action = engine.determine_next_action_at(now).await;
                if last_id.as_deref() != Some(action.id.as_str()) {
                    println!("[{}]", now.format("%H:%M"));
                    print_action(&action);
                    println!();
                    last_id = Some(action.id);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}
