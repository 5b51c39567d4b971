use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::types::{AgentError, decode_json, ensure_ok};
use crate::config::LlmConfig;

/// Sends a system + user chat pair to a completion provider and returns the
/// assistant's text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError>;
}

/// Chat completion client for an Azure OpenAI deployment
pub struct AzureOpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl AzureOpenAiClient {
    pub fn new(config: &LlmConfig, timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
            max_tokens: 150,
            temperature: 0.7,
            top_p: 0.95,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    fn build_payload(&self, system_prompt: &str, user_prompt: &str) -> Value {
        json!({
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt
                },
                {
                    "role": "user",
                    "content": user_prompt
                }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "top_p": self.top_p,
            "frequency_penalty": 0,
            "presence_penalty": 0,
            "stop": null
        })
    }
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError> {
        let payload = self.build_payload(system_prompt, user_prompt);
        debug!("Requesting completion from deployment {}", self.deployment);

        let response = self.client
            .post(self.completions_url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let response = ensure_ok(response, "Azure OpenAI").await?;
        let json: Value = decode_json(response).await?;
        first_choice_content(&json)
    }
}

/// Pull the first choice's message text out of a chat completion body
fn first_choice_content(json: &Value) -> Result<String, AgentError> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or(AgentError::EmptyCompletion)
}
