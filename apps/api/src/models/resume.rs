use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Maximum number of skills carried into a tailored resume.
pub const MAX_RELEVANT_SKILLS: usize = 8;

/// An explicit `null` reads as the field's default, like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Contact fields are often hand-written as bare numbers (`"phone": 5551234567`).
fn contact_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!(
            "invalid contact field {other}, expected a string or number"
        ))),
    }
}

fn optional_contact_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => contact_text(value).map(Some).map_err(D::Error::custom),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Master resume (source of truth, read-only during tailoring)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalDetails {
    #[serde(default, deserialize_with = "contact_text")]
    pub name: String,
    #[serde(default, deserialize_with = "contact_text")]
    pub email: String,
    #[serde(default, deserialize_with = "contact_text")]
    pub phone: String,
    #[serde(
        default,
        deserialize_with = "optional_contact_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub linkedin: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_contact_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub portfolio: Option<String>,
    /// Any other contact fields (location, github, ...) are carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PersonalDetails {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
            && self.linkedin.is_none()
            && self.portfolio.is_none()
            && self.extra.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    /// Free-text range, e.g. "May 2023 - Current".
    #[serde(default, deserialize_with = "null_as_default")]
    pub dates: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bullet_points: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub university: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The structured master resume. Loaded once per engine and never mutated.
///
/// A missing or unparseable source yields `MasterResume::default()`, which
/// callers must treat as "not loaded" via [`MasterResume::is_empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterResume {
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_details: PersonalDetails,
    #[serde(default, deserialize_with = "null_as_default")]
    pub professional_summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
}

impl MasterResume {
    pub fn is_empty(&self) -> bool {
        self.personal_details.is_empty()
            && self.professional_summary.trim().is_empty()
            && self.skills.is_empty()
            && self.experience.is_empty()
            && self.education.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tailored resume (per-job output)
// ────────────────────────────────────────────────────────────────────────────

/// An experience entry in a tailored resume. Identity fields mirror the master.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TailoredExperience {
    pub title: String,
    pub company: String,
    pub dates: String,
    pub bullet_points: Vec<String>,
}

impl From<&ExperienceEntry> for TailoredExperience {
    fn from(entry: &ExperienceEntry) -> Self {
        Self {
            title: entry.title.clone(),
            company: entry.company.clone(),
            dates: entry.dates.clone(),
            bullet_points: entry.bullet_points.clone(),
        }
    }
}

/// Which path produced the tailored content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Backend,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoringMetadata {
    pub tailored_at: DateTime<Utc>,
    pub job_title: String,
    /// The configured provider, even when the content came from the fallback path.
    pub provider: String,
    pub model_name: String,
    pub master_resume_path: String,
    pub source: ContentSource,
}

/// Content body of a tailored resume, as produced by a backend or the fallback.
///
/// All four fields are required when parsing backend output: a JSON object
/// missing any of them is treated as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredContent {
    pub tailored_summary: String,
    pub tailored_experience: Vec<TailoredExperience>,
    pub relevant_skills: Vec<String>,
    pub cover_letter_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailoredResume {
    #[serde(flatten)]
    pub content: TailoredContent,
    pub metadata: TailoringMetadata,
}

// ────────────────────────────────────────────────────────────────────────────
// Job postings (batch input)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub url: String,
}
