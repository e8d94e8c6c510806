//! CLI `reset` command: delete all stored memory after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use lifelevels::config::LifeLevelsConfig;

/// Delete the memory document and settings after user confirmation.
pub fn reset(config: &LifeLevelsConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete your routine, streaks, progress, and coach key.");
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let conn = lifelevels::db::open_database(&db_path)?;
    lifelevels::db::delete_value(&conn, &config.storage.memory_key)?;
    lifelevels::db::delete_value(&conn, &config.storage.settings_key)?;

    println!("All memory deleted. Reset complete.");
    Ok(())
}
