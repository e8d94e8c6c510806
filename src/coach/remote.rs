//! HTTP coach endpoint client.
//!
//! `PUT {endpoint}` with `{"context": ..}` returns `{"action": {..}}`;
//! `POST {endpoint}` with `{"context", "currentAction", "userMessage"}` returns
//! `{"response": ".."}`. The credential travels in the `x-openai-key` header.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CoachError, SuggestionProvider};
use crate::config::CoachConfig;
use crate::memory::types::{ActionDescriptor, ActionKind};

const API_KEY_HEADER: &str = "x-openai-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct ActionRequest<'a> {
    context: &'a str,
}

#[derive(Deserialize)]
struct ActionReply {
    action: ActionDescriptor,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdviceRequest<'a> {
    context: &'a str,
    current_action: Option<&'a ActionDescriptor>,
    user_message: Option<&'a str>,
}

#[derive(Deserialize)]
struct AdviceReply {
    response: String,
}

pub struct RemoteCoach {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteCoach {
    pub fn new(config: &CoachConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(Duration::from_secs(config.timeout_secs)))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    fn api_key(&self) -> Result<&str, CoachError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(CoachError::NotConfigured)
    }

    /// Send a request and return the body of a 2xx reply.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, CoachError> {
        let response = request.header(API_KEY_HEADER, self.api_key()?).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CoachError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Parse the action reply. A reply without a usable id is rejected.
fn parse_action_reply(body: &str) -> Result<ActionDescriptor, CoachError> {
    let reply: ActionReply =
        serde_json::from_str(body).map_err(|e| CoachError::InvalidReply(e.to_string()))?;
    let mut action = reply.action;
    if action.id.trim().is_empty() {
        return Err(CoachError::InvalidReply("action has an empty id".into()));
    }
    action.kind = ActionKind::Suggested;
    Ok(action)
}

#[async_trait]
impl SuggestionProvider for RemoteCoach {
    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    fn update_credential(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    async fn generate_personalized_action(
        &self,
        context: &str,
    ) -> Result<ActionDescriptor, CoachError> {
        tracing::debug!(endpoint = %self.endpoint, "requesting personalized action");
        let body = self
            .send(self.client.put(&self.endpoint).json(&ActionRequest { context }))
            .await?;
        parse_action_reply(&body)
    }

    async fn coaching_advice(
        &self,
        context: &str,
        current_action: Option<&ActionDescriptor>,
        user_message: Option<&str>,
    ) -> Result<String, CoachError> {
        tracing::debug!(endpoint = %self.endpoint, "requesting coaching advice");
        let request = AdviceRequest {
            context,
            current_action,
            user_message,
        };
        let body = self
            .send(self.client.post(&self.endpoint).json(&request))
            .await?;
        let reply: AdviceReply =
            serde_json::from_str(&body).map_err(|e| CoachError::InvalidReply(e.to_string()))?;
        Ok(reply.response)
    }
}
