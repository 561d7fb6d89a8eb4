//! In-process model adapter.
//!
//! The model is loaded at most once per backend. The outcome of that first
//! load, success or failure, is remembered: a failed load is never retried and
//! every later call reports the same error.
//!
//! Loading and inference are blocking and run on tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::prompts::{PROMPT_CLOSING, TEMPERATURE};
use super::{Backend, BackendError, ProviderKind};

const PROVIDER: &str = "in_process";

/// Prompts longer than this (in characters) are cut before inference.
///
/// The tailoring instruction block alone is longer than this, so a full
/// tailoring prompt reaches the model without the resume or the job
/// description and the reply almost always ends in fallback synthesis.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// New tokens generated past the prompt.
pub const MAX_NEW_TOKENS: u32 = 500;

/// Inserted between the cut prompt and the re-appended closing line.
const TRUNCATION_MARKER: &str = "...\n\n";

/// A loaded, ready-to-run model.
pub trait GenerationPipeline: Send + Sync {
    fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String, BackendError>;
}

/// Produces a pipeline for a model identifier.
pub trait PipelineLoader: Send + Sync {
    fn load(&self, model: &str) -> Result<Arc<dyn GenerationPipeline>, BackendError>;
}

type LoadOutcome = Result<Arc<dyn GenerationPipeline>, String>;

pub struct InProcessBackend {
    model: String,
    loader: Arc<dyn PipelineLoader>,
    pipeline: OnceCell<LoadOutcome>,
}

impl InProcessBackend {
    pub fn new(model: String, loader: Arc<dyn PipelineLoader>) -> Self {
        Self {
            model,
            loader,
            pipeline: OnceCell::new(),
        }
    }

    async fn pipeline(&self) -> Result<Arc<dyn GenerationPipeline>, BackendError> {
        let outcome = self
            .pipeline
            .get_or_init(|| async {
                info!("Loading in-process model '{}'", self.model);
                let loader = self.loader.clone();
                let model = self.model.clone();
                let loaded = tokio::task::spawn_blocking(move || loader.load(&model))
                    .await
                    .map_err(|e| format!("model load task failed: {e}"))
                    .and_then(|r| r.map_err(|e| e.to_string()));
                if let Err(reason) = &loaded {
                    warn!("In-process model '{}' failed to load: {reason}", self.model);
                }
                loaded
            })
            .await;

        outcome
            .as_ref()
            .map(Arc::clone)
            .map_err(|reason| BackendError::ModelUnavailable {
                provider: PROVIDER,
                model: self.model.clone(),
                reason: reason.clone(),
            })
    }
}

/// Cuts a long prompt and re-appends the closing request line.
pub fn truncate_prompt(prompt: &str) -> String {
    match prompt.char_indices().nth(MAX_PROMPT_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}{PROMPT_CLOSING}", &prompt[..cut]),
        None => prompt.to_string(),
    }
}

/// Causal models echo their input; keep only the continuation.
fn strip_echo(output: &str, prompt: &str) -> String {
    output
        .strip_prefix(prompt)
        .unwrap_or(output)
        .trim()
        .to_string()
}

#[async_trait]
impl Backend for InProcessBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::InProcess
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        self.pipeline().await.map(|_| ())
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let pipeline = self.pipeline().await?;
        let prompt = truncate_prompt(prompt);

        let output = {
            let prompt = prompt.clone();
            tokio::task::spawn_blocking(move || pipeline.generate(&prompt, MAX_NEW_TOKENS))
                .await
                .map_err(|e| BackendError::Internal(format!("inference task failed: {e}")))??
        };

        Ok(strip_echo(&output, &prompt))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// llama.cpp loader
// ────────────────────────────────────────────────────────────────────────────

/// Runs GGUF models through the `llama-cli` binary from llama.cpp.
/// The model identifier is the path to the model file.
pub struct LlamaCppLoader {
    cli_path: PathBuf,
}

impl LlamaCppLoader {
    pub fn new(cli_path: impl Into<PathBuf>) -> Self {
        Self {
            cli_path: cli_path.into(),
        }
    }
}

impl PipelineLoader for LlamaCppLoader {
    fn load(&self, model: &str) -> Result<Arc<dyn GenerationPipeline>, BackendError> {
        let model_path = Path::new(model);
        if !model_path.is_file() {
            return Err(BackendError::ModelUnavailable {
                provider: PROVIDER,
                model: model.to_string(),
                reason: "model file not found".to_string(),
            });
        }

        // Probe the binary once so a missing install fails here, not per call.
        Command::new(&self.cli_path)
            .arg("--version")
            .output()
            .map_err(|e| BackendError::ModelUnavailable {
                provider: PROVIDER,
                model: model.to_string(),
                reason: format!("cannot run {}: {e}", self.cli_path.display()),
            })?;

        Ok(Arc::new(LlamaCppPipeline {
            cli_path: self.cli_path.clone(),
            model_path: model_path.to_path_buf(),
        }))
    }
}

struct LlamaCppPipeline {
    cli_path: PathBuf,
    model_path: PathBuf,
}

impl GenerationPipeline for LlamaCppPipeline {
    fn generate(&self, prompt: &str, max_new_tokens: u32) -> Result<String, BackendError> {
        let output = Command::new(&self.cli_path)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-p")
            .arg(prompt)
            .arg("-n")
            .arg(max_new_tokens.to_string())
            .arg("--temp")
            .arg(TEMPERATURE.to_string())
            .arg("--no-display-prompt")
            .output()
            .map_err(|e| BackendError::Internal(format!("failed to run llama-cli: {e}")))?;

        if !output.status.success() {
            return Err(BackendError::Internal(format!(
                "llama-cli exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    struct EchoPipeline {
        seen: Mutex<Vec<String>>,
    }

    impl GenerationPipeline for EchoPipeline {
        fn generate(&self, prompt: &str, _max_new_tokens: u32) -> Result<String, BackendError> {
            self.seen.lock().unwrap().push(prompt.to_string());
            Ok(format!("{prompt}  {{\"answer\": 1}}"))
        }
    }

    struct CountingLoader {
        loads: AtomicUsize,
        fail: bool,
        pipeline: Arc<EchoPipeline>,
    }

    impl CountingLoader {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                loads: AtomicUsize::new(0),
                fail,
                pipeline: Arc::new(EchoPipeline {
                    seen: Mutex::new(Vec::new()),
                }),
            })
        }
    }

    impl PipelineLoader for CountingLoader {
        fn load(&self, model: &str) -> Result<Arc<dyn GenerationPipeline>, BackendError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BackendError::ModelUnavailable {
                    provider: PROVIDER,
                    model: model.to_string(),
                    reason: "out of memory".to_string(),
                });
            }
            Ok(self.pipeline.clone())
        }
    }

    #[tokio::test]
    async fn test_model_loads_once_across_calls() {
        let loader = CountingLoader::new(false);
        let backend = InProcessBackend::new("tiny".to_string(), loader.clone());

        backend.initialize().await.unwrap();
        backend.generate("a").await.unwrap();
        backend.generate("b").await.unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_sticky() {
        let loader = CountingLoader::new(true);
        let backend = InProcessBackend::new("huge".to_string(), loader.clone());

        let first = backend.initialize().await.unwrap_err();
        let second = backend.generate("prompt").await.unwrap_err();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1, "load must not be retried");
        assert_eq!(first.to_string(), second.to_string());
        assert!(second.to_string().contains("out of memory"));
    }

    #[tokio::test]
    async fn test_generate_strips_echoed_prompt() {
        let backend = InProcessBackend::new("tiny".to_string(), CountingLoader::new(false));
        let out = backend.generate("Tailor:").await.unwrap();
        assert_eq!(out, "{\"answer\": 1}");
    }

    #[tokio::test]
    async fn test_long_prompt_is_truncated_before_inference() {
        let loader = CountingLoader::new(false);
        let backend = InProcessBackend::new("tiny".to_string(), loader.clone());

        let long = "x".repeat(MAX_PROMPT_CHARS + 250);
        backend.generate(&long).await.unwrap();

        let seen = loader.pipeline.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with(&"x".repeat(MAX_PROMPT_CHARS)));
        assert!(seen[0].ends_with(&format!("{TRUNCATION_MARKER}{PROMPT_CLOSING}")));
        assert_eq!(
            seen[0].chars().count(),
            MAX_PROMPT_CHARS + TRUNCATION_MARKER.chars().count() + PROMPT_CLOSING.chars().count()
        );
    }

    #[test]
    fn test_tailoring_prompt_is_cut_inside_instructions() {
        use crate::generation::prompts::{build_prompt, TAILORING_INSTRUCTIONS};
        use crate::models::resume::MasterResume;

        assert!(TAILORING_INSTRUCTIONS.chars().count() > MAX_PROMPT_CHARS);

        let prompt = build_prompt(&MasterResume::default(), "Distinctive SQL role").unwrap();
        let cut = truncate_prompt(&prompt);
        assert!(!cut.contains("**My Master Resume:**"));
        assert!(!cut.contains("Distinctive SQL role"));
        assert!(cut.ends_with(PROMPT_CLOSING));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let prompt = "é".repeat(MAX_PROMPT_CHARS + 1);
        let cut = truncate_prompt(&prompt);
        assert!(cut.starts_with(&"é".repeat(MAX_PROMPT_CHARS)));

        assert_eq!(truncate_prompt("short"), "short");
    }

    #[test]
    fn test_llama_loader_rejects_missing_model_file() {
        let loader = LlamaCppLoader::new("llama-cli");
        let err = match loader.load("/definitely/not/here.gguf") {
            Err(e) => e,
            Ok(_) => panic!("missing model file must not load"),
        };
        assert!(matches!(err, BackendError::ModelUnavailable { .. }));
    }
}
