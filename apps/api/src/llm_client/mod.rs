//! LLM Client: the single point of entry for all text-generation backends.
//!
//! ARCHITECTURAL RULE: No other module may talk to a provider directly.
//! The tailoring engine only sees `dyn Backend`; every provider-specific
//! failure is converted to a `BackendError` before it leaves this module.
//!
//! The provider is chosen once, at construction, from a `ProviderKind`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::TailorConfig;

pub mod anthropic;
pub mod in_process;
pub mod lmstudio;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompts;

pub use anthropic::AnthropicBackend;
pub use in_process::{InProcessBackend, LlamaCppLoader};
pub use lmstudio::LmStudioBackend;
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

/// Per-call timeout applied by every HTTP adapter.
const HTTP_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no backend configured")]
    NoBackend,

    #[error("{provider}: no API key configured")]
    MissingCredential { provider: &'static str },

    #[error("{provider}: backend not ready: {reason}")]
    NotReady {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider}: transport error: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: API error (status {status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider}: malformed provider response: {message}")]
    Response {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: model '{model}' unavailable: {reason}")]
    ModelUnavailable {
        provider: &'static str,
        model: String,
        reason: String,
    },

    #[error("internal backend error: {0}")]
    Internal(String),
}

impl BackendError {
    fn transport(provider: &'static str, err: reqwest::Error) -> Self {
        BackendError::Transport {
            provider,
            message: err.to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider identifiers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Ollama,
    #[serde(rename = "lmstudio")]
    LmStudio,
    InProcess,
    Mock,
}

impl ProviderKind {
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
            ProviderKind::LmStudio => "lmstudio",
            ProviderKind::InProcess => "in_process",
            ProviderKind::Mock => "mock",
        }
    }

    /// Hosted providers are rate limited; batch runs pause between their calls.
    pub fn is_hosted(self) -> bool {
        matches!(self, ProviderKind::OpenAi | ProviderKind::Anthropic)
    }

    pub fn is_local(self) -> bool {
        matches!(
            self,
            ProviderKind::Ollama | ProviderKind::LmStudio | ProviderKind::InProcess
        )
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Error)]
#[error("unknown provider '{0}' (expected one of: auto, mock, openai, anthropic, ollama, lmstudio, in_process)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "ollama" => Ok(ProviderKind::Ollama),
            "lmstudio" | "lm_studio" => Ok(ProviderKind::LmStudio),
            "in_process" | "transformers" => Ok(ProviderKind::InProcess),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Provider requested by configuration. `Auto` is resolved once, at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderSelection {
    #[default]
    Auto,
    Fixed(ProviderKind),
}

impl FromStr for ProviderSelection {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(ProviderSelection::Auto)
        } else {
            s.parse().map(ProviderSelection::Fixed)
        }
    }
}

/// Resolves `auto` local-first: a configured local provider wins over hosted
/// ones, and with nothing configured the mock backend forces fallback synthesis.
pub fn resolve_provider(config: &TailorConfig) -> ProviderKind {
    match config.provider {
        ProviderSelection::Fixed(kind) => kind,
        ProviderSelection::Auto => {
            if let Some(local) = config.local_provider {
                local
            } else if config.openai_api_key.is_some() {
                ProviderKind::OpenAi
            } else if config.anthropic_api_key.is_some() {
                ProviderKind::Anthropic
            } else {
                ProviderKind::Mock
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend trait
// ────────────────────────────────────────────────────────────────────────────

/// Uniform generation contract shared by every provider.
///
/// `generate` returns raw text that the caller must still validate as
/// structured output. Implementations never panic on provider failures.
#[async_trait]
pub trait Backend: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn model_name(&self) -> &str;

    /// One-time setup (credential check, daemon reachability, model load).
    /// The engine calls this at most once and remembers the outcome.
    async fn initialize(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Builds the adapter for `kind` from configuration.
pub fn build_backend(
    kind: ProviderKind,
    config: &TailorConfig,
) -> Result<Arc<dyn Backend>, BackendError> {
    let backend: Arc<dyn Backend> = match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiBackend::new(
            http_client()?,
            config.openai_api_key.clone(),
            config.openai_model.clone(),
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicBackend::new(
            http_client()?,
            config.anthropic_api_key.clone(),
            config.anthropic_model.clone(),
        )),
        ProviderKind::Ollama => Arc::new(OllamaBackend::new(
            http_client()?,
            config.ollama_url.clone(),
            config.local_model.clone(),
        )),
        ProviderKind::LmStudio => Arc::new(LmStudioBackend::new(
            http_client()?,
            config.lmstudio_url.clone(),
            config.local_model.clone(),
        )),
        ProviderKind::InProcess => Arc::new(InProcessBackend::new(
            config.local_model.clone(),
            Arc::new(LlamaCppLoader::new(config.llama_cli_path.clone())),
        )),
        ProviderKind::Mock => Arc::new(MockBackend),
    };
    Ok(backend)
}

fn http_client() -> Result<Client, BackendError> {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .map_err(|e| BackendError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Reads a non-success body, preferring a provider `{"error": ...}` message.
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    extract_error_message(&body).unwrap_or(body)
}

/// Pulls the message out of `{"error": "..."}` or `{"error": {"message": "..."}}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .as_str()
        .or_else(|| error.get("message").and_then(|m| m.as_str()))
        .map(str::to_string)
}
