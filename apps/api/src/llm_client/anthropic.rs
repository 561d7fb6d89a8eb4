//! Anthropic Messages API adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prompts::{MAX_OUTPUT_TOKENS, SYSTEM_INSTRUCTION, TEMPERATURE};
use super::{error_message, Backend, BackendError, ProviderKind};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Text of the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

pub struct AnthropicBackend {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AnthropicBackend {
    pub fn new(client: Client, api_key: Option<String>, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(BackendError::MissingCredential { provider: PROVIDER })
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            system: SYSTEM_INSTRUCTION,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
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
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
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

        let body: AnthropicResponse =
            response.json().await.map_err(|e| BackendError::Response {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        if let Some(usage) = &body.usage {
            debug!(
                "Anthropic call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        body.text()
            .map(str::to_string)
            .ok_or_else(|| BackendError::Response {
                provider: PROVIDER,
                message: "no text block in response".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(key: Option<&str>) -> AnthropicBackend {
        AnthropicBackend::new(
            Client::new(),
            key.map(str::to_string),
            "claude-3-sonnet-20240229".to_string(),
        )
    }

    #[test]
    fn test_request_carries_system_and_parameters() {
        let backend = backend(Some("ant-test"));
        let value = serde_json::to_value(backend.build_request("tailor this")).unwrap();

        assert_eq!(value["model"], "claude-3-sonnet-20240229");
        assert_eq!(value["max_tokens"], 2000);
        assert_eq!(value["system"], SYSTEM_INSTRUCTION);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "tailor this");
        let temperature = value["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_response_text_skips_non_text_blocks() {
        let body = r#"{
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "{\"tailored_summary\": \"x\"}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text(), Some("{\"tailored_summary\": \"x\"}"));
    }

    #[tokio::test]
    async fn test_initialize_requires_key() {
        assert!(matches!(
            backend(None).initialize().await,
            Err(BackendError::MissingCredential { provider: "anthropic" })
        ));
        assert!(backend(Some("   ")).initialize().await.is_err());
        assert!(backend(Some("ant-test")).initialize().await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let backend = backend(Some("ant-test")).with_base_url("http://127.0.0.1:9/v1/messages");
        let err = backend.generate("prompt").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport { .. }), "got {err:?}");
    }
}
