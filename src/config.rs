use async_openai::{Client, config::OpenAIConfig};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Connection settings for the text-generation endpoint. The API key comes
/// from `OPENAI_API_KEY`; base url and model fall back to the Deepseek
/// defaults when `OPENAI_BASE_URL` / `AI_MODEL` are unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl LlmConfig {
    /// Missing credential is a request-time failure for the generation
    /// endpoint only, never a process-level one.
    pub fn from_env() -> Result<Self, GenerateError> {
        let api_key = dotenvy::var("OPENAI_API_KEY").map_err(|_| GenerateError::MissingCredential)?;
        let base_url = dotenvy::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = dotenvy::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }

    pub fn client(&self) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::default()
            .with_api_base(&self.base_url)
            .with_api_key(&self.api_key);
        Client::with_config(config)
    }
}
