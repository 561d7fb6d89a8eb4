//! LM Studio adapter (OpenAI-compatible local server).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::openai::{ChatRequest, ChatResponse};
use super::{error_message, Backend, BackendError, ProviderKind};

const PROVIDER: &str = "lmstudio";

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

pub struct LmStudioBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl LmStudioBackend {
    pub fn new(client: Client, base_url: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait]
impl Backend for LmStudioBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::LmStudio
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    /// Ready when `/v1/models` answers with at least one loaded model.
    async fn initialize(&self) -> Result<(), BackendError> {
        let not_ready = |reason: String| BackendError::NotReady {
            provider: PROVIDER,
            reason,
        };

        let response = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .send()
            .await
            .map_err(|e| not_ready(format!("server unreachable at {}: {e}", self.base_url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(not_ready(format!("/v1/models returned status {status}")));
        }

        let models: ModelsResponse = response.json().await.map_err(|e| BackendError::Response {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        if models.data.is_empty() {
            return Err(not_ready("no model loaded".to_string()));
        }

        let ids: Vec<&str> = models.data.iter().map(|m| m.id.as_str()).collect();
        debug!("LM Studio models loaded: {}", ids.join(", "));
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
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
