use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LifeLevelsConfig {
    pub log: LogConfig,
    pub storage: StorageConfig,
    pub rules: RulesConfig,
    pub coach: CoachConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub memory_key: String,
    pub settings_key: String,
}

/// Hour boundaries and thresholds used by the context builder and the rule table.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    pub morning_start_hour: u32,
    pub afternoon_start_hour: u32,
    pub evening_start_hour: u32,
    pub night_start_hour: u32,
    /// Earliest afternoon hour at which a missed workout is suggested again.
    pub catch_up_workout_hour: u32,
    pub progress_history_cap: usize,
    pub recent_workouts: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CoachConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_secs: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_lifelevels_dir()
            .join("lifelevels.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            memory_key: "lifelevels-ai-memory".into(),
            settings_key: "lifelevels-settings".into(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            morning_start_hour: 5,
            afternoon_start_hour: 12,
            evening_start_hour: 17,
            night_start_hour: 21,
            catch_up_workout_hour: 14,
            progress_history_cap: 30,
            recent_workouts: 7,
        }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/ai-coach".into(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
        }
    }
}

impl RulesConfig {
    /// Boundaries must be strictly increasing hours of the day.
    pub fn validate(&self) -> Result<()> {
        let hours = [
            self.morning_start_hour,
            self.afternoon_start_hour,
            self.evening_start_hour,
            self.night_start_hour,
        ];
        if hours.iter().any(|h| *h >= 24) {
            bail!("time-of-day boundaries must be hours in 0..24, got {hours:?}");
        }
        if !hours.windows(2).all(|w| w[0] < w[1]) {
            bail!("time-of-day boundaries must be strictly increasing, got {hours:?}");
        }
        if self.catch_up_workout_hour >= 24 {
            bail!(
                "catch_up_workout_hour must be in 0..24, got {}",
                self.catch_up_workout_hour
            );
        }
        if self.progress_history_cap == 0 {
            bail!("progress_history_cap must be at least 1");
        }
        Ok(())
    }
}

impl CoachConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("coach timeout_secs must be at least 1");
        }
        Ok(())
    }
}

/// Returns `~/.lifelevels/`
pub fn default_lifelevels_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lifelevels")
}

/// Returns the default config file path: `~/.lifelevels/config.toml`
pub fn default_config_path() -> PathBuf {
    default_lifelevels_dir().join("config.toml")
}

impl LifeLevelsConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LifeLevelsConfig::default()
        };

        config.apply_env_overrides();
        config.rules.validate().context("invalid [rules] section")?;
        config.coach.validate().context("invalid [coach] section")?;
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (LIFELEVELS_DB, LIFELEVELS_LOG_LEVEL, LIFELEVELS_API_KEY, LIFELEVELS_COACH_URL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LIFELEVELS_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LIFELEVELS_LOG_LEVEL") {
            self.log.level = val;
        }
        if let Ok(val) = std::env::var("LIFELEVELS_API_KEY") {
            self.coach.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("LIFELEVELS_COACH_URL") {
            self.coach.endpoint = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
