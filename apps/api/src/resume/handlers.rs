//! Axum route handlers for the Validation API.

use std::path::PathBuf;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::resume::TailoredContent;
use crate::resume::store;
use crate::resume::validation::{self, ValidationReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub document: Value,
}

/// Exactly one of `tailored` or `path` must be given.
#[derive(Debug, Deserialize)]
pub struct ValidateTailoredRequest {
    /// A full tailored resume also parses here; `metadata` is ignored.
    #[serde(default)]
    pub tailored: Option<TailoredContent>,
    /// A file previously written by `POST /api/v1/tailor` with `save: true`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct MasterValidationResponse {
    pub path: String,
    #[serde(flatten)]
    pub report: ValidationReport,
    pub rendered: String,
}

/// POST /api/v1/validate
pub async fn handle_validate(Json(request): Json<ValidateRequest>) -> Json<ValidationReport> {
    Json(validation::validate(&request.document))
}

/// GET /api/v1/validate/master
///
/// Re-reads the configured master file so edits show up without a restart.
pub async fn handle_validate_master(
    State(state): State<AppState>,
) -> Json<MasterValidationResponse> {
    let path = state.config.master_resume_path.display().to_string();
    let report = validation::validate_file(&state.config.master_resume_path);
    let rendered = report.render(&path);

    Json(MasterValidationResponse {
        path,
        report,
        rendered,
    })
}

/// POST /api/v1/validate/tailored
///
/// Checks tailored content, inline or from a saved file, against the master
/// resume the engine loaded.
pub async fn handle_validate_tailored(
    State(state): State<AppState>,
    Json(request): Json<ValidateTailoredRequest>,
) -> Result<Json<ValidationReport>, AppError> {
    let master = state.engine.master();
    if master.is_empty() {
        return Err(crate::generation::generator::TailorError::ResumeNotLoaded.into());
    }

    let tailored = match (request.tailored, request.path) {
        (Some(tailored), None) => tailored,
        (None, Some(path)) => {
            store::load_tailored(&path)
                .map_err(|e| AppError::Validation(format!("cannot read tailored resume: {e}")))?
                .content
        }
        _ => {
            return Err(AppError::Validation(
                "provide exactly one of 'tailored' or 'path'".to_string(),
            ))
        }
    };

    Ok(Json(validation::validate_tailored(&tailored, master)))
}
