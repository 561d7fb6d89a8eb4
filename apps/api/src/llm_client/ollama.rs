//! Ollama local daemon adapter.
//!
//! Readiness means the daemon answers `/api/tags` and the configured model is
//! listed there. A missing model triggers exactly one `/api/pull`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::prompts::{MAX_OUTPUT_TOKENS, STOP_SEQUENCES, SYSTEM_INSTRUCTION, TEMPERATURE, TOP_P};
use super::{error_message, Backend, BackendError, ProviderKind};

const PROVIDER: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    stop: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(client: Client, base_url: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_INSTRUCTION,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                num_predict: MAX_OUTPUT_TOKENS,
                stop: STOP_SEQUENCES.to_vec(),
            },
        }
    }

    /// `llama2` matches a listed `llama2:latest`.
    fn is_listed(&self, tags: &TagsResponse) -> bool {
        tags.models.iter().any(|m| {
            m.name == self.model
                || m.name
                    .split_once(':')
                    .is_some_and(|(base, tag)| base == self.model && tag == "latest")
        })
    }

    async fn list_models(&self) -> Result<TagsResponse, BackendError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| BackendError::NotReady {
                provider: PROVIDER,
                reason: format!("daemon unreachable at {}: {e}", self.base_url),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::NotReady {
                provider: PROVIDER,
                reason: format!("/api/tags returned status {status}"),
            });
        }

        response.json().await.map_err(|e| BackendError::Response {
            provider: PROVIDER,
            message: e.to_string(),
        })
    }

    async fn pull_model(&self) -> Result<(), BackendError> {
        info!("Pulling Ollama model '{}'", self.model);

        let unavailable = |reason: String| BackendError::ModelUnavailable {
            provider: PROVIDER,
            model: self.model.clone(),
            reason,
        };

        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .json(&PullRequest {
                name: &self.model,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(error_message(response).await));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        let tags = self.list_models().await?;
        if self.is_listed(&tags) {
            return Ok(());
        }

        warn!("Ollama model '{}' not present locally", self.model);
        self.pull_model().await
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.build_request(prompt))
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

        let body: GenerateResponse =
            response.json().await.map_err(|e| BackendError::Response {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        Ok(body.response)
    }
}
