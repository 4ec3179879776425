use async_trait::async_trait;
use rig::completion::{Chat, Message};
use rig::providers::openai::Client as OpenAiClient;
use serde_json::{from_str, Value};
use tracing::{debug, error, info};

use super::model::{ParsedIntent, REQUIRED_KEYS};
use crate::error::{language_model_error, AppResult};

/// A chat model that answers a user message under a system instruction
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Return the model's raw text reply
    async fn complete(&self, system_prompt: &str, user_text: &str) -> AppResult<String>;
}

/// OpenAI chat completions through rig
pub struct OpenAiModel {
    client: OpenAiClient,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: OpenAiClient::new(api_key),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> AppResult<String> {
        info!("Requesting intent extraction from {}", self.model);

        let agent = self
            .client
            .agent(&self.model)
            .preamble(system_prompt)
            .temperature(0.0)
            .build();

        let response = agent
            .chat(user_text.to_string(), Vec::<Message>::new())
            .await
            .map_err(|e| language_model_error(&format!("OpenAI request failed: {}", e)))?;

        debug!("Model reply: {}", response);
        Ok(response)
    }
}

/// Parse a model reply into a [`ParsedIntent`].
///
/// The reply must hold one JSON object with every key in [`REQUIRED_KEYS`];
/// text around the object (code fences, chatter) is ignored.
pub fn parse_intent_reply(reply: &str) -> Result<ParsedIntent, String> {
    let value = extract_json_object(reply)?;

    let object = value
        .as_object()
        .ok_or_else(|| "Model reply is not a JSON object".to_string())?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(format!("Model reply is missing keys: {}", missing.join(", ")));
    }

    serde_json::from_value(value).map_err(|e| format!("Model reply has unexpected field types: {}", e))
}

/// Find the JSON object inside a model reply
fn extract_json_object(reply: &str) -> Result<Value, String> {
    // Try the outermost braces first
    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            match from_str::<Value>(&reply[start..=end]) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!("Failed to parse JSON from model reply: {}", e);
                }
            }
        }
    }

    // Fall back to the whole reply
    match from_str::<Value>(reply.trim()) {
        Ok(value) => Ok(value),
        Err(e) => {
            error!("Could not extract valid JSON from model reply: {}", reply);
            Err(format!("Model reply is not valid JSON: {}", e))
        }
    }
}
