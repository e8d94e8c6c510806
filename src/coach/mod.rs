//! Remote suggestion providers.
//!
//! Provides the [`SuggestionProvider`] trait and a remote HTTP implementation
//! ([`remote::RemoteCoach`]). A provider is advisory: the engine only asks it
//! when [`SuggestionProvider::is_configured`] holds, and any error falls back to
//! the rule table.

pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::CoachConfig;
use crate::memory::types::ActionDescriptor;

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("no API key configured")]
    NotConfigured,
    #[error("request to coach endpoint failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("coach endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid coach reply: {0}")]
    InvalidReply(String),
}

/// Source of personalized suggestions and free-text coaching.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Whether a credential is present. Callers skip the provider otherwise.
    fn is_configured(&self) -> bool;

    /// Replace the credential used for subsequent calls.
    fn update_credential(&mut self, api_key: String);

    /// Ask for one next action given the rendered context. Single attempt.
    async fn generate_personalized_action(
        &self,
        context: &str,
    ) -> Result<ActionDescriptor, CoachError>;

    /// Free-text advice about the current context and suggested action.
    async fn coaching_advice(
        &self,
        context: &str,
        current_action: Option<&ActionDescriptor>,
        user_message: Option<&str>,
    ) -> Result<String, CoachError>;
}

/// Create the provider from config. `stored_key` is the credential saved through
/// the settings store; a key from the config file or environment takes precedence.
pub fn create_provider(
    config: &CoachConfig,
    stored_key: Option<String>,
) -> anyhow::Result<Box<dyn SuggestionProvider>> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .or(stored_key);
    let provider = remote::RemoteCoach::new(config, api_key)?;
    Ok(Box::new(provider))
}
