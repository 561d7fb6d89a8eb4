//! Resume Store: loads the master resume and persists tailored output.
//!
//! Loading fails softly: a missing or malformed master file is logged and an
//! empty `MasterResume` is returned. Persistence of tailored output is strict
//! and reports a `StoreError`.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::models::resume::{MasterResume, TailoredResume};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the master resume from `path`. Never fails; see module docs.
pub fn load(path: impl AsRef<Path>) -> MasterResume {
    let path = path.as_ref();

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            error!("Master resume not found at {}: {e}", path.display());
            return MasterResume::default();
        }
    };

    match serde_json::from_str::<MasterResume>(&raw) {
        Ok(resume) => {
            info!(
                "Loaded master resume from {} ({} skills, {} experience entries)",
                path.display(),
                resume.skills.len(),
                resume.experience.len()
            );
            resume
        }
        Err(e) => {
            error!("Error parsing master resume JSON at {}: {e}", path.display());
            MasterResume::default()
        }
    }
}

/// Writes a tailored resume as pretty JSON, creating parent directories as needed.
pub fn save_tailored(resume: &TailoredResume, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(resume).map_err(|source| StoreError::Json {
        path: display.clone(),
        source,
    })?;

    fs::write(path, json).map_err(|source| StoreError::Io {
        path: display.clone(),
        source,
    })?;

    info!("Tailored resume saved to {}", path.display());
    Ok(())
}

/// Reads back a tailored resume previously written by [`save_tailored`].
pub fn load_tailored(path: impl AsRef<Path>) -> Result<TailoredResume, StoreError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: display.clone(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{
        ContentSource, TailoredContent, TailoredExperience, TailoringMetadata,
    };
    use chrono::Utc;

    fn sample_tailored() -> TailoredResume {
        TailoredResume {
            content: TailoredContent {
                tailored_summary: "Results-driven Data Analyst.".to_string(),
                tailored_experience: vec![TailoredExperience {
                    title: "Data Analyst".to_string(),
                    company: "Acme".to_string(),
                    dates: "2021 - 2023".to_string(),
                    bullet_points: vec!["Built interactive dashboards.".to_string()],
                }],
                relevant_skills: vec!["Python".to_string(), "SQL".to_string()],
                cover_letter_points: vec!["Point one.".to_string()],
            },
            metadata: TailoringMetadata {
                tailored_at: Utc::now(),
                job_title: "Senior Analyst".to_string(),
                provider: "ollama".to_string(),
                model_name: "llama2".to_string(),
                master_resume_path: "config/master_resume.json".to_string(),
                source: ContentSource::Backend,
            },
        }
    }

    #[test]
    fn test_load_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let resume = load(dir.path().join("nope.json"));
        assert!(resume.is_empty());
    }

    #[test]
    fn test_load_malformed_json_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load(&path).is_empty());
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.json");
        fs::write(
            &path,
            r#"{"professional_summary": "Analyst", "skills": ["Python", "SQL"]}"#,
        )
        .unwrap();

        let resume = load(&path);
        assert!(!resume.is_empty());
        assert_eq!(resume.skills, vec!["Python", "SQL"]);
        assert!(resume.experience.is_empty());
    }

    #[test]
    fn test_load_tolerates_null_sections_and_numeric_phone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.json");
        fs::write(
            &path,
            r#"{
                "personal_details": {"name": "Ada", "email": "ada@example.com", "phone": 5551234567},
                "professional_summary": "Analyst",
                "skills": ["Python", "SQL"],
                "experience": [{"title": "Analyst", "company": "Acme", "dates": null,
                                "bullet_points": ["Built reports."]}],
                "education": null
            }"#,
        )
        .unwrap();

        let resume = load(&path);
        assert!(!resume.is_empty(), "lenient shapes must not read as an unloaded resume");
        assert_eq!(resume.personal_details.phone, "5551234567");
        assert!(resume.education.is_empty());
        assert_eq!(resume.experience[0].dates, "");
        assert_eq!(resume.skills, vec!["Python", "SQL"]);
    }

    #[test]
    fn test_save_creates_parent_dirs_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("output").join("tailored.json");
        let original = sample_tailored();

        save_tailored(&original, &path).unwrap();
        let reloaded = load_tailored(&path).unwrap();

        assert_eq!(reloaded, original);
    }

    #[test]
    fn test_load_tailored_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tailored(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
