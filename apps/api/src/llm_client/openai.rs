//! OpenAI chat completions adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompts::{MAX_OUTPUT_TOKENS, SYSTEM_INSTRUCTION, TEMPERATURE};
use super::{error_message, Backend, BackendError, ProviderKind};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const PROVIDER: &str = "openai";

// Chat completion wire types. LM Studio speaks the same dialect.

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl<'a> ChatRequest<'a> {
    /// System instruction plus one user turn.
    pub fn tailoring(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

impl ChatResponse {
    /// Content of the first choice.
    pub fn into_text(self, provider: &'static str) -> Result<String, BackendError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::Response {
                provider,
                message: "no choices in response".to_string(),
            })
    }
}

pub struct OpenAiBackend {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(client: Client, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(BackendError::MissingCredential { provider: PROVIDER })
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        self.api_key().map(|_| ())
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&ChatRequest::tailoring(&self.model, prompt))
            .send()
            .await
            .map_err(|e| BackendError::transport(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| BackendError::Response {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        body.into_text(PROVIDER)
    }
}
