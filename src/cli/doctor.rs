//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use lifelevels::config::LifeLevelsConfig;
use lifelevels::db;
use lifelevels::memory::persist::{decode_document, Settings};

/// Run database diagnostics and print a health report.
pub fn doctor(config: &LifeLevelsConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run any command (e.g. `lifelevels next`) to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("LifeLevels Health Report");
    println!("========================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {file_size} bytes");
    println!("Schema version:    {}", report.schema_version);
    println!("Stored keys:       {}", report.key_count);

    let memory_status = match db::get_value(&conn, &config.storage.memory_key)? {
        None => "not stored yet".to_string(),
        Some(raw) => match decode_document(&raw) {
            Ok(memory) => format!(
                "OK ({} supplements, {} workouts, {} streaks)",
                memory.supplements.len(),
                memory.workouts.len(),
                memory.streaks.len()
            ),
            Err(e) => format!("UNREADABLE ({e}), it will be reset on next use"),
        },
    };
    println!("Memory document:   {memory_status}");

    let stored_key = db::get_value(&conn, &config.storage.settings_key)?
        .and_then(|raw| serde_json::from_str::<Settings>(&raw).ok())
        .is_some_and(|settings| settings.api_key().is_some());
    let coach_key = config.coach.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) || stored_key;
    println!("Coach endpoint:    {}", config.coach.endpoint);
    println!("Coach key:         {}", if coach_key { "set" } else { "not set" });
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery: delete {} and re-enter your settings.", db_path.display());
    }

    Ok(())
}
