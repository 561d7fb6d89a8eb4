//! Axum route handlers for the Tailoring API.

use std::path::{Path, PathBuf};

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::generator::{BackendInfo, BatchOutcome};
use crate::models::resume::{JobPosting, TailoredResume};
use crate::resume::store;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TailorRequest {
    pub job_description: String,
    #[serde(default)]
    pub job_title: String,
    /// Persist the result under the configured output directory.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    #[serde(flatten)]
    pub tailored: TailoredResume,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub jobs: Vec<JobPosting>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/backend
pub async fn handle_backend_info(State(state): State<AppState>) -> Json<BackendInfo> {
    Json(state.engine.backend_info())
}

/// POST /api/v1/tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }

    let tailored = state
        .engine
        .tailor(&request.job_description, &request.job_title)
        .await?;

    let saved_to = if request.save {
        let path = output_path(
            &state.config.output_dir,
            &request.job_title,
            tailored.metadata.tailored_at,
        );
        store::save_tailored(&tailored, &path)?;
        Some(path.display().to_string())
    } else {
        None
    };

    Ok(Json(TailorResponse { tailored, saved_to }))
}

/// POST /api/v1/tailor/batch
///
/// Sequential; per-job failures are reported inside each outcome.
pub async fn handle_tailor_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<Vec<BatchOutcome>>, AppError> {
    if request.jobs.is_empty() {
        return Err(AppError::Validation("jobs must not be empty".to_string()));
    }

    info!("Batch tailoring {} jobs", request.jobs.len());
    Ok(Json(state.engine.tailor_batch(&request.jobs).await))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// `<output_dir>/tailored_<slug>_<YYYYmmdd_HHMMSS>.json`. When that file
/// already exists (same title saved within the same second) a `_2`, `_3`, ...
/// suffix picks the first free name, so earlier output is never overwritten.
fn output_path(output_dir: &Path, job_title: &str, at: DateTime<Utc>) -> PathBuf {
    let stem = format!("tailored_{}_{}", slugify(job_title), at.format("%Y%m%d_%H%M%S"));

    let mut path = output_dir.join(format!("{stem}.json"));
    let mut attempt = 1;
    while path.exists() {
        attempt += 1;
        path = output_dir.join(format!("{stem}_{attempt}.json"));
    }
    path
}

fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if slug.is_empty() {
        "resume".to_string()
    } else {
        slug
    }
}
