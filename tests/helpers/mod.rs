#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};

use lifelevels::coach::{CoachError, SuggestionProvider};
use lifelevels::config::{RulesConfig, StorageConfig};
use lifelevels::db;
use lifelevels::engine::LifeEngine;
use lifelevels::memory::persist::MemoryStore;
use lifelevels::memory::rules::RuleSet;
use lifelevels::memory::types::{ActionDescriptor, ActionKind, ActionType, Category};

/// Local time on 2026-04-`day` (April 2026: the 6th is a Monday).
pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 4, day, hour, minute, 0)
        .single()
        .unwrap()
}

/// A store over a fresh in-memory database.
pub fn test_store() -> MemoryStore {
    let conn = db::open_memory_database().unwrap();
    MemoryStore::new(conn, &StorageConfig::default())
}

pub fn test_engine(coach: impl SuggestionProvider + 'static) -> LifeEngine {
    LifeEngine::new(test_store(), Box::new(coach), RuleSet::new(RulesConfig::default()))
}

/// Local endpoint that accepts connections and never answers.
pub async fn silent_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/api/ai-coach")
}

/// Engine with no coach credential: rule table only.
pub fn rules_only_engine() -> LifeEngine {
    test_engine(StubCoach::unconfigured())
}

pub fn suggested_action(id: &str, category: Category) -> ActionDescriptor {
    ActionDescriptor {
        id: id.to_string(),
        title: "Call a friend".into(),
        description: "Reach out to someone you have not talked to this week".into(),
        action_type: ActionType::Important,
        estimated_time: "15 minutes".into(),
        category,
        priority: 2,
        reasoning: "Relationships need regular attention".into(),
        kind: ActionKind::Suggested,
    }
}

#[derive(Clone)]
pub enum Reply {
    Action(ActionDescriptor),
    Fail,
}

/// Scripted provider that counts how often it is asked.
pub struct StubCoach {
    configured: bool,
    reply: Reply,
    calls: Arc<AtomicUsize>,
}

impl StubCoach {
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            reply: Reply::Fail,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            configured: true,
            reply: Reply::Fail,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fixed(action: ActionDescriptor) -> Self {
        Self {
            configured: true,
            reply: Reply::Action(action),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `generate_personalized_action` calls.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SuggestionProvider for StubCoach {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn update_credential(&mut self, api_key: String) {
        self.configured = !api_key.is_empty();
    }

    async fn generate_personalized_action(&self, _context: &str) -> Result<ActionDescriptor, CoachError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Action(action) => Ok(action.clone()),
            Reply::Fail => Err(CoachError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }

    async fn coaching_advice(
        &self,
        _context: &str,
        current_action: Option<&ActionDescriptor>,
        _user_message: Option<&str>,
    ) -> Result<String, CoachError> {
        match &self.reply {
            Reply::Action(_) => Ok(format!(
                "Focus on: {}",
                current_action.map(|a| a.title.as_str()).unwrap_or("anything")
            )),
            Reply::Fail => Err(CoachError::InvalidReply("no advice".into())),
        }
    }
}
