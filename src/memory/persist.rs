//! Persistence adapter: versioned JSON documents in the key-value store.
//!
//! The memory document is stored as `{"version": N, "memory": {...}}`. Loading
//! runs an explicit migration chain up to [`CURRENT_DOCUMENT_VERSION`] and then a
//! typed decode; anything that fails along the way is discarded and replaced with
//! a default [`UserMemory`]. Version 0 is the bare, unversioned object written by
//! earlier releases.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::StorageConfig;
use crate::db;
use crate::memory::types::UserMemory;

/// The document version this build writes.
pub const CURRENT_DOCUMENT_VERSION: u64 = 1;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("stored document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored document is not a JSON object")]
    NotAnObject,
    #[error("document version field is not a non-negative integer")]
    BadVersion,
    #[error("unsupported document version {0} (newest readable is {CURRENT_DOCUMENT_VERSION})")]
    UnsupportedVersion(u64),
    #[error("document has no `memory` payload")]
    MissingPayload,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u64,
    memory: &'a UserMemory,
}

/// Serialize memory into the current envelope.
pub fn encode_document(memory: &UserMemory) -> Result<String, serde_json::Error> {
    serde_json::to_string(&DocumentRef {
        version: CURRENT_DOCUMENT_VERSION,
        memory,
    })
}

/// Parse, migrate and decode a stored document.
pub fn decode_document(raw: &str) -> Result<UserMemory, DocumentError> {
    let doc: Value = serde_json::from_str(raw)?;
    let mut doc = migrate_document(doc)?;
    let payload = doc
        .get_mut("memory")
        .map(Value::take)
        .ok_or(DocumentError::MissingPayload)?;
    Ok(serde_json::from_value(payload)?)
}

fn document_version(doc: &Value) -> Result<u64, DocumentError> {
    let obj = doc.as_object().ok_or(DocumentError::NotAnObject)?;
    match obj.get("version") {
        None => Ok(0),
        Some(v) => v.as_u64().ok_or(DocumentError::BadVersion),
    }
}

/// Bring a raw document up to [`CURRENT_DOCUMENT_VERSION`], one step at a time.
pub fn migrate_document(mut doc: Value) -> Result<Value, DocumentError> {
    let mut version = document_version(&doc)?;
    if version > CURRENT_DOCUMENT_VERSION {
        return Err(DocumentError::UnsupportedVersion(version));
    }

    while version < CURRENT_DOCUMENT_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "migrating memory document");
        doc = match next {
            1 => migrate_v0_to_v1(doc),
            other => return Err(DocumentError::UnsupportedVersion(other)),
        };
        version = next;
    }

    Ok(doc)
}

/// v0 → v1: wrap the bare memory object in the versioned envelope.
fn migrate_v0_to_v1(doc: Value) -> Value {
    json!({ "version": 1, "memory": doc })
}

/// Non-memory settings. Unknown keys written by other tools are preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Settings {
    /// The stored credential, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Reads and writes the memory document and the settings blob.
pub struct MemoryStore {
    conn: Connection,
    memory_key: String,
    settings_key: String,
}

impl MemoryStore {
    pub fn new(conn: Connection, storage: &StorageConfig) -> Self {
        Self {
            conn,
            memory_key: storage.memory_key.clone(),
            settings_key: storage.settings_key.clone(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Load the stored memory. Never fails: missing, unreadable or corrupt
    /// records yield the default memory, and corrupt records are deleted.
    pub fn load(&self) -> UserMemory {
        let raw = match db::get_value(&self.conn, &self.memory_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(key = %self.memory_key, "no stored memory, starting fresh");
                return UserMemory::default();
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored memory, using defaults");
                return UserMemory::default();
            }
        };

        match decode_document(&raw) {
            Ok(memory) => {
                tracing::debug!(key = %self.memory_key, "memory loaded");
                memory
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %self.memory_key, "discarding corrupt memory record");
                if let Err(e) = db::delete_value(&self.conn, &self.memory_key) {
                    tracing::warn!(error = %e, "failed to delete corrupt memory record");
                }
                UserMemory::default()
            }
        }
    }

    pub fn save(&self, memory: &UserMemory) -> Result<()> {
        let raw = encode_document(memory).context("failed to serialize memory")?;
        db::put_value(&self.conn, &self.memory_key, &raw).context("failed to write memory")?;
        Ok(())
    }

    pub fn load_settings(&self) -> Settings {
        match db::get_value(&self.conn, &self.settings_key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to parse stored settings, ignoring");
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored settings");
                Settings::default()
            }
        }
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let raw = serde_json::to_string(settings).context("failed to serialize settings")?;
        db::put_value(&self.conn, &self.settings_key, &raw)
            .context("failed to write settings")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{Category, Supplement};

    fn test_store() -> MemoryStore {
        let conn = db::open_memory_database().unwrap();
        MemoryStore::new(conn, &StorageConfig::default())
    }

    #[test]
    fn load_without_record_returns_defaults() {
        let store = test_store();
        assert_eq!(store.load(), UserMemory::default());
    }

    #[test]
    fn save_then_load() {
        let store = test_store();
        let mut memory = UserMemory::default();
        memory.supplements.push(Supplement {
            name: "Magnesium".into(),
            dosage: "200mg".into(),
            timing: "evening".into(),
            last_taken: None,
        });
        memory.completed_today.insert("workout".into());

        store.save(&memory).unwrap();
        assert_eq!(store.load(), memory);
    }

    #[test]
    fn saved_document_is_versioned() {
        let store = test_store();
        store.save(&UserMemory::default()).unwrap();
        let raw = db::get_value(store.connection(), "lifelevels-ai-memory")
            .unwrap()
            .unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["version"], json!(CURRENT_DOCUMENT_VERSION));
        assert!(doc["memory"]["schedule"]["workDays"].is_array());
    }

    #[test]
    fn legacy_unversioned_document_is_migrated() {
        let legacy = r#"{
            "supplements": [{"name": "Fish Oil", "dosage": "1g", "timing": "morning"}],
            "workouts": [{"type": "run", "duration": 30, "date": "2025-03-02T07:15:00.000Z", "intensity": 6}],
            "goals": {"weight": {"target": 180, "current": 192, "priority": 1}},
            "progress": {"fitness": [{"date": "2025-03-02T07:50:00.000Z", "value": 1, "notes": "5k"}]},
            "completedToday": ["supplement_Fish Oil"],
            "streaks": {"fitness": {"current": 4, "longest": 9, "lastActivity": "2025-03-02T07:50:00.000Z"}}
        }"#;

        let memory = decode_document(legacy).unwrap();
        assert_eq!(memory.supplements[0].name, "Fish Oil");
        assert_eq!(memory.workouts[0].duration, 30);
        assert_eq!(memory.goals["weight"].target, json!(180));
        assert_eq!(memory.progress[&Category::Fitness].len(), 1);
        assert_eq!(memory.streaks[&Category::Fitness].longest, 9);
        assert!(memory.completed_today.contains("supplement_Fish Oil"));
        // fields absent from the legacy blob take defaults
        assert_eq!(memory.preferences.workout_time, "07:00");
    }

    #[test]
    fn future_version_is_rejected() {
        let err = decode_document(r#"{"version": 7, "memory": {}}"#).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion(7)));
    }

    #[test]
    fn date_like_strings_stay_strings() {
        let doc = r#"{"version": 1, "memory": {"supplements": [
            {"name": "2025-01-01T00:00:00Z", "dosage": "1", "timing": "am"}
        ]}}"#;
        let memory = decode_document(doc).unwrap();
        assert_eq!(memory.supplements[0].name, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn corrupt_record_is_discarded() {
        let store = test_store();
        db::put_value(store.connection(), "lifelevels-ai-memory", "{not json").unwrap();

        assert_eq!(store.load(), UserMemory::default());
        assert_eq!(
            db::get_value(store.connection(), "lifelevels-ai-memory").unwrap(),
            None
        );
    }

    #[test]
    fn wrong_shape_is_discarded() {
        let store = test_store();
        db::put_value(
            store.connection(),
            "lifelevels-ai-memory",
            r#"{"version": 1, "memory": {"supplements": "lots"}}"#,
        )
        .unwrap();
        assert_eq!(store.load(), UserMemory::default());
    }

    #[test]
    fn settings_preserve_unknown_keys() {
        let store = test_store();
        db::put_value(
            store.connection(),
            "lifelevels-settings",
            r#"{"theme": "dark", "openaiApiKey": "sk-old"}"#,
        )
        .unwrap();

        let mut settings = store.load_settings();
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-old"));
        settings.openai_api_key = Some("sk-new".into());
        store.save_settings(&settings).unwrap();

        let reloaded = store.load_settings();
        assert_eq!(reloaded.openai_api_key.as_deref(), Some("sk-new"));
        assert_eq!(reloaded.extra["theme"], json!("dark"));
    }

    #[test]
    fn blank_stored_key_is_not_a_credential() {
        let blank: Settings = serde_json::from_str(r#"{"openaiApiKey": ""}"#).unwrap();
        assert_eq!(blank.api_key(), None);
        let spaces: Settings = serde_json::from_str(r#"{"openaiApiKey": "  "}"#).unwrap();
        assert_eq!(spaces.api_key(), None);
        let set: Settings = serde_json::from_str(r#"{"openaiApiKey": "sk-1"}"#).unwrap();
        assert_eq!(set.api_key(), Some("sk-1"));
    }
}
