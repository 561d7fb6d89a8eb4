//! Tailoring Engine: turns the master resume plus a job description into a
//! tailored resume.
//!
//! Flow: guard (resume loaded, backend ready) → build prompt → one backend
//! call → locate JSON span → parse → reconcile against master → metadata.
//!
//! One-shot policy: the backend is called at most once per `tailor`. Any
//! backend failure, empty reply, or malformed reply goes to fallback synthesis
//! instead of a retry.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::config::TailorConfig;
use crate::generation::fallback;
use crate::generation::prompts::build_prompt;
use crate::llm_client::{build_backend, resolve_provider, Backend, ProviderKind};
use crate::models::resume::{
    ContentSource, JobPosting, MasterResume, TailoredContent, TailoredExperience, TailoredResume,
    TailoringMetadata, MAX_RELEVANT_SKILLS,
};
use crate::resume::store;

#[derive(Debug, Error)]
pub enum TailorError {
    #[error("Master resume not loaded")]
    ResumeNotLoaded,

    #[error("Backend '{provider}' not initialized: {reason}")]
    BackendNotInitialized { provider: ProviderKind, reason: String },

    #[error("Error tailoring resume: {0}")]
    Internal(String),
}

/// Snapshot of the engine's backend for callers and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub provider: ProviderKind,
    pub model_name: String,
    pub is_local: bool,
    /// `None` until initialization has been attempted.
    pub ready: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobInfo {
    pub title: String,
    pub company: String,
    pub url: String,
}

/// Result of tailoring one posting in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub job_info: JobInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tailored: Option<TailoredResume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct TailoringEngine {
    master: MasterResume,
    master_resume_path: String,
    provider: ProviderKind,
    backend: Option<Arc<dyn Backend>>,
    /// Sticky outcome of `Backend::initialize`.
    readiness: OnceCell<Result<(), String>>,
    batch_pause: Duration,
}

impl TailoringEngine {
    /// Loads the master resume and builds the configured backend.
    /// Never fails: problems surface later as `TailorError`s.
    pub fn new(config: &TailorConfig) -> Self {
        let master = store::load(&config.master_resume_path);
        let provider = resolve_provider(config);

        let backend = match build_backend(provider, config) {
            Ok(backend) => Some(backend),
            Err(e) => {
                error!("Failed to build {provider} backend: {e}");
                None
            }
        };

        Self::from_parts(
            master,
            &config.master_resume_path,
            provider,
            backend,
            config.batch_pause,
        )
    }

    /// Assembles an engine from an already loaded resume and backend.
    pub fn with_backend(
        master: MasterResume,
        master_resume_path: impl AsRef<Path>,
        backend: Arc<dyn Backend>,
        batch_pause: Duration,
    ) -> Self {
        let provider = backend.provider();
        Self::from_parts(master, master_resume_path, provider, Some(backend), batch_pause)
    }

    fn from_parts(
        master: MasterResume,
        master_resume_path: impl AsRef<Path>,
        provider: ProviderKind,
        backend: Option<Arc<dyn Backend>>,
        batch_pause: Duration,
    ) -> Self {
        info!(
            "Tailoring engine using provider '{provider}' (model: {})",
            backend.as_ref().map_or("none", |b| b.model_name())
        );

        Self {
            master,
            master_resume_path: master_resume_path.as_ref().display().to_string(),
            provider,
            backend,
            readiness: OnceCell::new(),
            batch_pause,
        }
    }

    pub fn master(&self) -> &MasterResume {
        &self.master
    }

    pub fn master_resume_path(&self) -> &str {
        &self.master_resume_path
    }

    pub fn backend_info(&self) -> BackendInfo {
        BackendInfo {
            provider: self.provider,
            model_name: self.model_name().to_string(),
            is_local: self.provider.is_local(),
            ready: self.readiness.get().map(Result::is_ok),
        }
    }

    fn model_name(&self) -> &str {
        self.backend.as_ref().map_or("none", |b| b.model_name())
    }

    /// Runs backend initialization once; later calls return the stored outcome.
    pub async fn initialize(&self) -> Result<(), TailorError> {
        let Some(backend) = &self.backend else {
            return Err(TailorError::BackendNotInitialized {
                provider: self.provider,
                reason: "no backend configured".to_string(),
            });
        };

        let outcome = self
            .readiness
            .get_or_init(|| async {
                match backend.initialize().await {
                    Ok(()) => {
                        info!("Backend '{}' ready", self.provider);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("Backend '{}' failed to initialize: {e}", self.provider);
                        Err(e.to_string())
                    }
                }
            })
            .await;

        outcome
            .clone()
            .map_err(|reason| TailorError::BackendNotInitialized {
                provider: self.provider,
                reason,
            })
    }

    /// Tailors the master resume to one job description.
    pub async fn tailor(
        &self,
        job_description: &str,
        job_title: &str,
    ) -> Result<TailoredResume, TailorError> {
        if self.master.is_empty() {
            return Err(TailorError::ResumeNotLoaded);
        }

        let ready = self.initialize().await;
        if let Err(e) = ready {
            if self.provider != ProviderKind::Mock {
                return Err(e);
            }
        }

        let display_title = if job_title.trim().is_empty() {
            "Unknown Position"
        } else {
            job_title
        };
        info!("Tailoring resume using {} for: {display_title}", self.provider);

        let prompt = build_prompt(&self.master, job_description)
            .map_err(|e| TailorError::Internal(format!("failed to serialize master resume: {e}")))?;

        let (content, source) = self.generate_content(&prompt, job_description, job_title).await;

        Ok(TailoredResume {
            content,
            metadata: TailoringMetadata {
                tailored_at: Utc::now(),
                job_title: job_title.to_string(),
                provider: self.provider.id().to_string(),
                model_name: self.model_name().to_string(),
                master_resume_path: self.master_resume_path.clone(),
                source,
            },
        })
    }

    async fn generate_content(
        &self,
        prompt: &str,
        job_description: &str,
        job_title: &str,
    ) -> (TailoredContent, ContentSource) {
        let fallback = || {
            (
                fallback::synthesize(&self.master, job_description, job_title),
                ContentSource::Fallback,
            )
        };

        let Some(backend) = &self.backend else {
            info!("No backend available, using fallback synthesis");
            return fallback();
        };

        let text = match backend.generate(prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Backend '{}' returned empty output, using fallback synthesis", self.provider);
                return fallback();
            }
            Err(e) => {
                warn!("Backend '{}' failed: {e}. Using fallback synthesis", self.provider);
                return fallback();
            }
        };

        match parse_tailored(&text) {
            Some(content) => (reconcile(content, &self.master), ContentSource::Backend),
            None => {
                warn!("Invalid JSON response from backend '{}', using fallback synthesis", self.provider);
                fallback()
            }
        }
    }

    /// Tailors each posting in order. Hosted providers get a pause between calls.
    pub async fn tailor_batch(&self, jobs: &[JobPosting]) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(jobs.len());

        for (i, job) in jobs.iter().enumerate() {
            if i > 0 && self.provider.is_hosted() && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }

            info!("Batch job {}/{}: {}", i + 1, jobs.len(), job.title);
            let result = self.tailor(&job.description, &job.title).await;

            let job_info = JobInfo {
                title: job.title.clone(),
                company: job.company.clone(),
                url: job.url.clone(),
            };
            outcomes.push(match result {
                Ok(tailored) => BatchOutcome {
                    job_info,
                    tailored: Some(tailored),
                    error: None,
                },
                Err(e) => {
                    warn!("Batch job '{}' failed: {e}", job.title);
                    BatchOutcome {
                        job_info,
                        tailored: None,
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        outcomes
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend output handling
// ────────────────────────────────────────────────────────────────────────────

/// The substring from the first `{` to the last `}`, if any.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_tailored(text: &str) -> Option<TailoredContent> {
    let span = extract_json_span(text)?;
    serde_json::from_str(span).ok()
}

/// Forces backend output back within the master resume's facts: identity
/// fields restored by position, experience count matched, skills limited to
/// the master list.
fn reconcile(mut content: TailoredContent, master: &MasterResume) -> TailoredContent {
    if content.tailored_experience.len() != master.experience.len() {
        warn!(
            "Backend returned {} experience entries, master has {}",
            content.tailored_experience.len(),
            master.experience.len()
        );
    }
    content
        .tailored_experience
        .truncate(master.experience.len());

    for (i, source) in master.experience.iter().enumerate() {
        match content.tailored_experience.get_mut(i) {
            Some(entry) => {
                if entry.title != source.title
                    || entry.company != source.company
                    || entry.dates != source.dates
                {
                    warn!("Backend altered identity fields of experience entry {i}; restoring");
                    entry.title = source.title.clone();
                    entry.company = source.company.clone();
                    entry.dates = source.dates.clone();
                }
            }
            None => content
                .tailored_experience
                .push(TailoredExperience::from(source)),
        }
    }

    content.relevant_skills = reconcile_skills(&content.relevant_skills, &master.skills);
    content
}

fn reconcile_skills(proposed: &[String], master_skills: &[String]) -> Vec<String> {
    let by_lower: HashMap<String, &String> = master_skills
        .iter()
        .map(|s| (s.trim().to_lowercase(), s))
        .collect();

    let mut kept: Vec<String> = Vec::new();
    for skill in proposed {
        match by_lower.get(&skill.trim().to_lowercase()) {
            Some(master_spelling) => {
                if !kept.contains(*master_spelling) {
                    kept.push((*master_spelling).clone());
                }
            }
            None => warn!("Dropping skill not in master resume: '{skill}'"),
        }
    }
    kept.truncate(MAX_RELEVANT_SKILLS);

    if kept.is_empty() {
        master_skills.iter().take(MAX_RELEVANT_SKILLS).cloned().collect()
    } else {
        kept
    }
}
