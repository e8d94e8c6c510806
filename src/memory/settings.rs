//! Validation for settings coming from outside: schedule, preferences,
//! supplements, workouts and goals.

use chrono::{NaiveTime, Weekday};
use serde::Deserialize;
use thiserror::Error;

use crate::memory::types::{Preferences, Schedule};

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("invalid clock time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
}

/// Partial schedule change; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleUpdate {
    pub wake_time: Option<String>,
    pub sleep_time: Option<String>,
    pub work_start: Option<String>,
    pub work_end: Option<String>,
    pub work_days: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub workout_time: Option<String>,
    pub meditation_duration: Option<u32>,
    pub journal_frequency: Option<String>,
}

/// Parse "HH:MM" and return it zero-padded.
pub fn normalize_clock_time(value: &str) -> Result<String, SettingsError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| SettingsError::InvalidTime(value.to_string()))
}

/// Accepts "mon", "Monday", "MONDAY", ...; returns the full English name.
pub fn normalize_weekday(value: &str) -> Result<String, SettingsError> {
    let weekday: Weekday = value
        .trim()
        .parse()
        .map_err(|_| SettingsError::UnknownWeekday(value.to_string()))?;
    let name = match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    };
    Ok(name.to_string())
}

pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), SettingsError> {
    if value.trim().is_empty() {
        return Err(SettingsError::Empty { field });
    }
    Ok(())
}

pub fn require_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), SettingsError> {
    if !(min..=max).contains(&value) {
        return Err(SettingsError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Apply an update to a copy of `current`. Nothing changes unless every field validates.
pub fn apply_schedule_update(current: &Schedule, update: ScheduleUpdate) -> Result<Schedule, SettingsError> {
    let mut next = current.clone();
    if let Some(t) = update.wake_time {
        next.wake_time = normalize_clock_time(&t)?;
    }
    if let Some(t) = update.sleep_time {
        next.sleep_time = normalize_clock_time(&t)?;
    }
    if let Some(t) = update.work_start {
        next.work_start = normalize_clock_time(&t)?;
    }
    if let Some(t) = update.work_end {
        next.work_end = normalize_clock_time(&t)?;
    }
    if let Some(days) = update.work_days {
        let mut normalized = Vec::with_capacity(days.len());
        for day in &days {
            let name = normalize_weekday(day)?;
            if !normalized.contains(&name) {
                normalized.push(name);
            }
        }
        next.work_days = normalized;
    }
    Ok(next)
}

pub fn apply_preferences_update(
    current: &Preferences,
    update: PreferencesUpdate,
) -> Result<Preferences, SettingsError> {
    let mut next = current.clone();
    if let Some(t) = update.workout_time {
        next.workout_time = normalize_clock_time(&t)?;
    }
    if let Some(minutes) = update.meditation_duration {
        require_range("meditation duration", minutes, 1, 240)?;
        next.meditation_duration = minutes;
    }
    if let Some(freq) = update.journal_frequency {
        require_non_empty("journal frequency", &freq)?;
        next.journal_frequency = freq;
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_times_are_normalized() {
        assert_eq!(normalize_clock_time("7:05").unwrap(), "07:05");
        assert_eq!(normalize_clock_time(" 22:00 ").unwrap(), "22:00");
        assert!(normalize_clock_time("25:00").is_err());
        assert!(normalize_clock_time("noon").is_err());
    }

    #[test]
    fn weekdays_accept_short_and_long_names() {
        assert_eq!(normalize_weekday("mon").unwrap(), "Monday");
        assert_eq!(normalize_weekday("SATURDAY").unwrap(), "Saturday");
        assert_eq!(
            normalize_weekday("Funday"),
            Err(SettingsError::UnknownWeekday("Funday".into()))
        );
    }

    #[test]
    fn schedule_update_is_partial() {
        let update = ScheduleUpdate {
            wake_time: Some("5:30".into()),
            work_days: Some(vec!["sat".into(), "Sunday".into(), "sat".into()]),
            ..Default::default()
        };
        let next = apply_schedule_update(&Schedule::default(), update).unwrap();
        assert_eq!(next.wake_time, "05:30");
        assert_eq!(next.sleep_time, "22:00");
        assert_eq!(next.work_days, vec!["Saturday", "Sunday"]);
    }

    #[test]
    fn invalid_update_changes_nothing() {
        let current = Schedule::default();
        let update = ScheduleUpdate {
            wake_time: Some("05:00".into()),
            work_end: Some("5pm".into()),
            ..Default::default()
        };
        assert!(apply_schedule_update(&current, update).is_err());
        assert_eq!(current, Schedule::default());
    }

    #[test]
    fn meditation_duration_range() {
        let update = PreferencesUpdate {
            meditation_duration: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            apply_preferences_update(&Preferences::default(), update),
            Err(SettingsError::OutOfRange { .. })
        ));
    }
}
