use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::{ProviderKind, ProviderSelection};

/// Application configuration loaded from environment variables.
/// Every variable is optional; an unparseable value fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub tailor: TailorConfig,
    pub port: u16,
    pub rust_log: String,
}

/// Everything the tailoring engine needs to pick and drive a backend.
#[derive(Debug, Clone)]
pub struct TailorConfig {
    pub provider: ProviderSelection,
    /// Local provider preferred by `auto` resolution.
    pub local_provider: Option<ProviderKind>,
    pub master_resume_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_model: String,
    /// Model for local providers. For `in_process` this is a GGUF file path.
    pub local_model: String,
    pub ollama_url: String,
    pub lmstudio_url: String,
    pub llama_cli_path: PathBuf,
    /// Pause between consecutive hosted calls in a batch.
    pub batch_pause: Duration,
    pub output_dir: PathBuf,
}

impl Default for TailorConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSelection::Auto,
            local_provider: None,
            master_resume_path: PathBuf::from("config/master_resume.json"),
            openai_api_key: None,
            anthropic_api_key: None,
            openai_model: "gpt-3.5-turbo".to_string(),
            anthropic_model: "claude-3-sonnet-20240229".to_string(),
            local_model: "llama2".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            lmstudio_url: "http://localhost:1234".to_string(),
            llama_cli_path: PathBuf::from("llama-cli"),
            batch_pause: Duration::from_secs(2),
            output_dir: PathBuf::from("data/output"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = TailorConfig::default();

        let provider = match get("TAILOR_PROVIDER") {
            Some(raw) => raw
                .parse::<ProviderSelection>()
                .context("TAILOR_PROVIDER is not a known provider")?,
            None => ProviderSelection::Auto,
        };

        let local_provider = match get("LOCAL_LLM_PROVIDER") {
            Some(raw) => {
                let kind = raw
                    .parse::<ProviderKind>()
                    .context("LOCAL_LLM_PROVIDER is not a known provider")?;
                if !kind.is_local() {
                    bail!("LOCAL_LLM_PROVIDER must be ollama, lmstudio or in_process (got '{raw}')");
                }
                Some(kind)
            }
            None => None,
        };

        let batch_pause = match get("BATCH_PAUSE_SECS") {
            Some(raw) => Duration::from_secs_f64(
                raw.parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .with_context(|| format!("BATCH_PAUSE_SECS must be a non-negative number (got '{raw}')"))?,
            ),
            None => defaults.batch_pause,
        };

        let tailor = TailorConfig {
            provider,
            local_provider,
            master_resume_path: get("MASTER_RESUME_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.master_resume_path),
            openai_api_key: get("OPENAI_API_KEY"),
            anthropic_api_key: get("ANTHROPIC_API_KEY").or_else(|| get("CLAUDE_API_KEY")),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            anthropic_model: get("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            local_model: get("LOCAL_LLM_MODEL").unwrap_or(defaults.local_model),
            ollama_url: get("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            lmstudio_url: get("LMSTUDIO_URL").unwrap_or(defaults.lmstudio_url),
            llama_cli_path: get("LLAMA_CLI_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.llama_cli_path),
            batch_pause,
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        };

        Ok(Config {
            tailor,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.tailor.provider, ProviderSelection::Auto);
        assert_eq!(
            config.tailor.master_resume_path,
            PathBuf::from("config/master_resume.json")
        );
        assert_eq!(config.tailor.batch_pause, Duration::from_secs(2));
        assert!(config.tailor.openai_api_key.is_none());
    }

    #[test]
    fn test_claude_key_alias() {
        let config = config_from(&[("CLAUDE_API_KEY", "ant-123")]).unwrap();
        assert_eq!(config.tailor.anthropic_api_key.as_deref(), Some("ant-123"));

        let both = config_from(&[("ANTHROPIC_API_KEY", "primary"), ("CLAUDE_API_KEY", "alias")])
            .unwrap();
        assert_eq!(both.tailor.anthropic_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config_from(&[("OPENAI_API_KEY", "  "), ("TAILOR_PROVIDER", "")]).unwrap();
        assert!(config.tailor.openai_api_key.is_none());
        assert_eq!(config.tailor.provider, ProviderSelection::Auto);
    }

    #[test]
    fn test_unknown_provider_fails_startup() {
        assert!(config_from(&[("TAILOR_PROVIDER", "gemini")]).is_err());
    }

    #[test]
    fn test_local_provider_must_be_local() {
        let ok = config_from(&[("LOCAL_LLM_PROVIDER", "lmstudio")]).unwrap();
        assert_eq!(ok.tailor.local_provider, Some(ProviderKind::LmStudio));

        assert!(config_from(&[("LOCAL_LLM_PROVIDER", "openai")]).is_err());
    }

    #[test]
    fn test_batch_pause_accepts_fractions_and_rejects_negatives() {
        let config = config_from(&[("BATCH_PAUSE_SECS", "0.5")]).unwrap();
        assert_eq!(config.tailor.batch_pause, Duration::from_millis(500));

        assert!(config_from(&[("BATCH_PAUSE_SECS", "-1")]).is_err());
        assert!(config_from(&[("BATCH_PAUSE_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_invalid_port_fails() {
        assert!(config_from(&[("PORT", "99999")]).is_err());
    }
}
