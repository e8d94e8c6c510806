//! Context-aware next-action engine for LifeLevels.
//!
//! LifeLevels keeps a small memory of one user's routine (supplements, workouts,
//! goals, schedule, streaks) and answers a single question: what should they do
//! next? An ordered rule table keyed on the time of day produces the answer; an
//! optional remote coach can personalize it, and any failure there falls back to
//! the rules.
//!
//! | Bucket | Rules, in order |
//! |--------|-----------------|
//! | **Morning** (5–12) | morning supplements → meditation → scheduled workout |
//! | **Afternoon** (12–17) | hydration check → catch-up workout (from 14:00) |
//! | **Evening** (17–21) | daily reflection → evening supplements |
//! | **Night** (21–5) | sleep preparation |
//!
//! Nothing matching yields a general check-in. Hour boundaries are configurable.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite key-value store, schema, and migrations
//! - [`memory`]: Memory types, persistence, context builder, rule table, and streak tracker
//! - [`coach`]: Remote suggestion provider
//! - [`engine`]: [`engine::LifeEngine`], the owner of a user's memory

pub mod coach;
pub mod config;
pub mod db;
pub mod engine;
pub mod memory;
