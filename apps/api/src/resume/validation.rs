//! Validation Engine: structural and content-quality checks for resume documents.
//!
//! Errors block validity; warnings are advisory. A report is valid iff it
//! carries zero errors. Every call builds its own report, so the engine holds
//! no state between calls.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::resume::{MasterResume, TailoredContent, MAX_RELEVANT_SKILLS};

const REQUIRED_SECTIONS: &[&str] = &[
    "personal_details",
    "professional_summary",
    "skills",
    "experience",
    "education",
];

const REQUIRED_PERSONAL_FIELDS: &[&str] = &["name", "email", "phone"];

const REQUIRED_EXPERIENCE_FIELDS: &[&str] = &["title", "company", "dates", "bullet_points"];

const REQUIRED_EDUCATION_FIELDS: &[&str] = &["degree", "university"];

const PLACEHOLDER_PHRASES: &[&str] = &["your name", "your email", "company name", "your degree"];

const SUMMARY_MIN_WORDS: usize = 20;
const SUMMARY_MAX_WORDS: usize = 150;
const SKILLS_MIN: usize = 5;
const SKILLS_MAX: usize = 20;
const BULLET_MIN_WORDS: usize = 5;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static PHONE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-\(\)\+\.]").expect("valid phone separator regex"));

static FOUR_DIGIT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));

static TWO_DIGIT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}").expect("valid short year regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Renders a human-readable report for `source` (usually a file path).
    pub fn render(&self, source: &str) -> String {
        let mut lines = vec![
            "Resume Validation Report".to_string(),
            "=".repeat(50),
            format!("File: {source}"),
            format!("Status: {}", if self.is_valid { "VALID" } else { "INVALID" }),
            String::new(),
        ];

        if !self.errors.is_empty() {
            lines.push("Errors (must fix):".to_string());
            lines.extend(self.errors.iter().map(|e| format!("  - {e}")));
            lines.push(String::new());
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings (should consider):".to_string());
            lines.extend(self.warnings.iter().map(|w| format!("  - {w}")));
            lines.push(String::new());
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            lines.push("No issues found. Resume is well-formatted.".to_string());
            lines.push(String::new());
        }

        lines.push("Tips:".to_string());
        lines.push("  - Use action verbs in bullet points".to_string());
        lines.push("  - Include quantified achievements".to_string());
        lines.push("  - Keep the professional summary concise (50-100 words)".to_string());
        lines.push("  - Keep date formats consistent across entries".to_string());

        lines.join("\n")
    }
}

/// Per-call accumulator.
#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn into_report(self) -> ValidationReport {
        ValidationReport {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Master-shaped documents
// ────────────────────────────────────────────────────────────────────────────

/// Validates a resume document shaped like the master resume.
pub fn validate(document: &Value) -> ValidationReport {
    let mut findings = Findings::default();

    if !document.is_object() {
        findings.error("Resume document must be a JSON object");
        return findings.into_report();
    }

    check_structure(document, &mut findings);
    check_personal_details(section(document, "personal_details"), &mut findings);
    check_professional_summary(section(document, "professional_summary"), &mut findings);
    check_skills(section(document, "skills"), &mut findings);
    check_experience(section(document, "experience"), &mut findings);
    check_education(section(document, "education"), &mut findings);
    check_content_quality(document, &mut findings);

    findings.into_report()
}

/// Loads a JSON file and validates it. Load problems are reported as errors.
pub fn validate_file(path: impl AsRef<Path>) -> ValidationReport {
    let path = path.as_ref();
    let mut findings = Findings::default();

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) if !path.exists() => {
            findings.error(format!("Resume file not found: {}", path.display()));
            return findings.into_report();
        }
        Err(e) => {
            findings.error(format!("Error loading resume file: {e}"));
            return findings.into_report();
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(document) => validate(&document),
        Err(e) => {
            findings.error(format!("Invalid JSON format: {e}"));
            findings.into_report()
        }
    }
}

fn section<'a>(document: &'a Value, name: &str) -> &'a Value {
    document.get(name).unwrap_or(&Value::Null)
}

/// Mirrors "falsy" semantics for JSON values: null, empty text, empty list or
/// object, `false` and zero all count as blank.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn check_structure(document: &Value, findings: &mut Findings) {
    for name in REQUIRED_SECTIONS {
        match document.get(*name) {
            None => findings.error(format!("Missing required section: {name}")),
            Some(value) if is_blank(value) => findings.warn(format!("Empty section: {name}")),
            Some(_) => {}
        }
    }
}

fn check_personal_details(details: &Value, findings: &mut Findings) {
    if is_blank(details) {
        findings.error("Personal details section is empty");
        return;
    }
    let Some(details) = details.as_object() else {
        findings.error("Personal details must be an object");
        return;
    };

    for field in REQUIRED_PERSONAL_FIELDS {
        match details.get(*field) {
            None => findings.error(format!("Missing personal detail: {field}")),
            Some(value) if is_blank(value) => {
                findings.error(format!("Empty personal detail: {field}"))
            }
            Some(_) => {}
        }
    }

    if let Some(email) = details.get("email").and_then(Value::as_str) {
        if !email.is_empty() && !is_valid_email(email) {
            findings.error(format!("Invalid email format: {email}"));
        }
    }

    if let Some(phone) = details.get("phone").and_then(Value::as_str) {
        if !phone.is_empty() && !is_valid_phone(phone) {
            findings.warn(format!("Phone format may be invalid: {phone}"));
        }
    }

    if details.get("linkedin").map_or(true, is_blank) {
        findings.warn("LinkedIn profile not provided");
    }
    if details.get("portfolio").map_or(true, is_blank) {
        findings.warn("Portfolio/website not provided");
    }
}

fn check_professional_summary(summary: &Value, findings: &mut Findings) {
    let text = match summary {
        Value::Null => "",
        Value::String(s) => s.as_str(),
        _ => {
            findings.error("Professional summary must be text");
            return;
        }
    };

    if text.trim().is_empty() {
        findings.error("Professional summary is empty");
        return;
    }

    let word_count = text.split_whitespace().count();
    if word_count < SUMMARY_MIN_WORDS {
        findings.warn(format!(
            "Professional summary is very short ({word_count} words)"
        ));
    } else if word_count > SUMMARY_MAX_WORDS {
        findings.warn(format!(
            "Professional summary is very long ({word_count} words)"
        ));
    }

    let lower = text.to_lowercase();
    if !lower.contains("experience") && !lower.contains("skilled") {
        findings.warn("Professional summary should mention experience or skills");
    }
}

fn check_skills(skills: &Value, findings: &mut Findings) {
    if is_blank(skills) {
        findings.error("Skills section is empty");
        return;
    }
    let Some(skills) = skills.as_array() else {
        findings.error("Skills section must be a list");
        return;
    };

    if skills.len() < SKILLS_MIN {
        findings.warn(format!(
            "Only {} skills listed, consider adding more",
            skills.len()
        ));
    } else if skills.len() > SKILLS_MAX {
        findings.warn(format!(
            "Many skills listed ({}), consider grouping",
            skills.len()
        ));
    }

    for (i, skill) in skills.iter().enumerate() {
        let text = skill.as_str().unwrap_or("");
        if text.trim().is_empty() {
            findings.error(format!("Empty skill at position {}", i + 1));
        } else if text.trim().chars().count() < 2 {
            findings.warn(format!("Very short skill: '{text}'"));
        }
    }
}

fn check_experience(experience: &Value, findings: &mut Findings) {
    if is_blank(experience) {
        findings.error("Experience section is empty");
        return;
    }
    let Some(entries) = experience.as_array() else {
        findings.error("Experience section must be a list");
        return;
    };

    for (i, entry) in entries.iter().enumerate() {
        let prefix = format!("Experience entry {}", i + 1);
        let Some(job) = entry.as_object() else {
            findings.error(format!("{prefix}: Entry must be an object"));
            continue;
        };

        for field in REQUIRED_EXPERIENCE_FIELDS {
            match job.get(*field) {
                None => findings.error(format!("{prefix}: Missing field '{field}'")),
                Some(value) if is_blank(value) => {
                    findings.error(format!("{prefix}: Empty field '{field}'"))
                }
                Some(_) => {}
            }
        }

        let bullets = job
            .get("bullet_points")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if bullets.is_empty() {
            findings.error(format!("{prefix}: No bullet points provided"));
        } else if bullets.len() < 2 {
            findings.warn(format!("{prefix}: Only {} bullet point(s)", bullets.len()));
        }

        for (j, bullet) in bullets.iter().enumerate() {
            let text = bullet.as_str().unwrap_or("").trim();
            if text.is_empty() {
                findings.error(format!("{prefix}, bullet {}: Empty bullet point", j + 1));
            } else if text.split_whitespace().count() < BULLET_MIN_WORDS {
                findings.warn(format!("{prefix}, bullet {}: Very short bullet point", j + 1));
            } else if !text.ends_with('.') {
                findings.warn(format!("{prefix}, bullet {}: Should end with period", j + 1));
            }
        }
    }
}

fn check_education(education: &Value, findings: &mut Findings) {
    if is_blank(education) {
        findings.warn("Education section is empty");
        return;
    }
    let Some(entries) = education.as_array() else {
        findings.error("Education section must be a list");
        return;
    };

    for (i, entry) in entries.iter().enumerate() {
        let prefix = format!("Education entry {}", i + 1);
        for field in REQUIRED_EDUCATION_FIELDS {
            match entry.get(*field) {
                None => findings.error(format!("{prefix}: Missing field '{field}'")),
                Some(value) if is_blank(value) => {
                    findings.error(format!("{prefix}: Empty field '{field}'"))
                }
                Some(_) => {}
            }
        }
    }
}

fn check_content_quality(document: &Value, findings: &mut Findings) {
    let text = document.to_string().to_lowercase();
    for placeholder in PLACEHOLDER_PHRASES {
        if text.contains(placeholder) {
            findings.warn(format!("Possible placeholder text found: '{placeholder}'"));
        }
    }

    let families: BTreeSet<DateFamily> = section(document, "experience")
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|job| job.get("dates").and_then(Value::as_str))
        .filter(|dates| !dates.is_empty())
        .map(date_family)
        .collect();

    if families.len() > 1 {
        findings.warn("Inconsistent date formats in experience section");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DateFamily {
    FourDigitYear,
    TwoDigitYear,
    Other,
}

fn date_family(dates: &str) -> DateFamily {
    if FOUR_DIGIT_YEAR.is_match(dates) {
        DateFamily::FourDigitYear
    } else if TWO_DIGIT_YEAR.is_match(dates) {
        DateFamily::TwoDigitYear
    } else {
        DateFamily::Other
    }
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn is_valid_phone(phone: &str) -> bool {
    let digits = PHONE_SEPARATORS.replace_all(phone, "");
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && (10..=15).contains(&digits.len())
}

// ────────────────────────────────────────────────────────────────────────────
// Tailored output against its master
// ────────────────────────────────────────────────────────────────────────────

/// Checks a tailored resume against the master it was derived from.
///
/// Identity fields that drift from the master and skills absent from the
/// master list are errors: both would mean facts were invented or altered.
pub fn validate_tailored(tailored: &TailoredContent, master: &MasterResume) -> ValidationReport {
    let mut findings = Findings::default();

    if tailored.tailored_summary.trim().is_empty() {
        findings.warn("Tailored summary is empty");
    }

    if tailored.tailored_experience.len() != master.experience.len() {
        findings.error(format!(
            "Tailored experience has {} entries, master resume has {}",
            tailored.tailored_experience.len(),
            master.experience.len()
        ));
    }

    for (i, (out, src)) in tailored
        .tailored_experience
        .iter()
        .zip(&master.experience)
        .enumerate()
    {
        let prefix = format!("Experience entry {}", i + 1);
        if out.title != src.title {
            findings.error(format!("{prefix}: title altered ('{}' -> '{}')", src.title, out.title));
        }
        if out.company != src.company {
            findings.error(format!(
                "{prefix}: company altered ('{}' -> '{}')",
                src.company, out.company
            ));
        }
        if out.dates != src.dates {
            findings.error(format!("{prefix}: dates altered ('{}' -> '{}')", src.dates, out.dates));
        }
    }

    for skill in &tailored.relevant_skills {
        if !master.skills.iter().any(|s| s == skill) {
            findings.error(format!("Skill not in master resume: '{skill}'"));
        }
    }
    if tailored.relevant_skills.len() > MAX_RELEVANT_SKILLS {
        findings.warn(format!(
            "Too many relevant skills ({}), at most {MAX_RELEVANT_SKILLS} expected",
            tailored.relevant_skills.len()
        ));
    }

    let points = tailored.cover_letter_points.len();
    if !(3..=4).contains(&points) {
        findings.warn(format!("Expected 3-4 cover letter points, found {points}"));
    }

    findings.into_report()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceEntry, TailoredExperience};
    use serde_json::json;

    fn valid_document() -> Value {
        json!({
            "personal_details": {
                "name": "Jordan Reyes",
                "email": "jordan.reyes@example.com",
                "phone": "+1 (555) 123-4567",
                "linkedin": "linkedin.com/in/jreyes",
                "portfolio": "jreyes.dev"
            },
            "professional_summary": "Data analyst with five years of experience turning raw \
                operational data into dashboards, forecasts and automated reports that \
                help finance and operations teams make faster decisions.",
            "skills": ["Python", "SQL", "Power BI", "Excel", "Statistics"],
            "experience": [
                {
                    "title": "Data Analyst",
                    "company": "Northwind",
                    "dates": "May 2021 - Current",
                    "bullet_points": [
                        "Automated weekly revenue reporting with Python and SQL.",
                        "Built dashboards tracking occupancy across 40 properties."
                    ]
                },
                {
                    "title": "Financial Analyst",
                    "company": "Contoso",
                    "dates": "Jan 2018 - Apr 2021",
                    "bullet_points": [
                        "Prepared monthly variance analysis for senior leadership.",
                        "Maintained forecasting models in Excel and VBA."
                    ]
                }
            ],
            "education": [{"degree": "BSc Economics", "university": "State University"}]
        })
    }

    #[test]
    fn test_valid_document_has_no_findings() {
        let report = validate(&valid_document());
        assert!(report.is_valid, "errors: {:?}", report.errors);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn test_missing_skills_is_invalid() {
        let mut doc = valid_document();
        doc.as_object_mut().unwrap().remove("skills");
        let report = validate(&doc);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("skills")));
    }

    #[test]
    fn test_four_skills_is_valid_with_count_warning() {
        let mut doc = valid_document();
        doc["skills"] = json!(["Python", "SQL", "Power BI", "Excel"]);
        let report = validate(&doc);
        assert!(report.is_valid, "errors: {:?}", report.errors);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("4 skills")));
    }

    #[test]
    fn test_empty_experience_is_error() {
        let mut doc = valid_document();
        doc["experience"] = json!([]);
        let report = validate(&doc);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Experience section is empty")));
        assert!(report.warnings.contains(&"Empty section: experience".to_string()));
    }

    #[test]
    fn test_empty_education_is_only_a_warning() {
        let mut doc = valid_document();
        doc["education"] = json!([]);
        let report = validate(&doc);
        assert!(report.is_valid);
        assert!(report
            .warnings
            .contains(&"Education section is empty".to_string()));
    }

    #[test]
    fn test_personal_detail_rules() {
        let mut doc = valid_document();
        doc["personal_details"] = json!({
            "name": "",
            "email": "not-an-email",
            "phone": "12-34"
        });
        let report = validate(&doc);
        assert!(!report.is_valid);
        assert!(report.errors.contains(&"Empty personal detail: name".to_string()));
        assert!(report
            .errors
            .contains(&"Invalid email format: not-an-email".to_string()));
        assert!(report
            .warnings
            .contains(&"Phone format may be invalid: 12-34".to_string()));
        assert!(report
            .warnings
            .contains(&"LinkedIn profile not provided".to_string()));
        assert!(report
            .warnings
            .contains(&"Portfolio/website not provided".to_string()));
    }

    #[test]
    fn test_missing_personal_section_reports_both_errors() {
        let mut doc = valid_document();
        doc.as_object_mut().unwrap().remove("personal_details");
        let report = validate(&doc);
        assert!(report
            .errors
            .contains(&"Missing required section: personal_details".to_string()));
        assert!(report
            .errors
            .contains(&"Personal details section is empty".to_string()));
    }

    #[test]
    fn test_summary_rules() {
        let mut doc = valid_document();
        doc["professional_summary"] = json!("Analyst who likes data.");
        let report = validate(&doc);
        assert!(report.is_valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("very short (4 words)")));
        assert!(report
            .warnings
            .contains(&"Professional summary should mention experience or skills".to_string()));

        doc["professional_summary"] = json!("   ");
        let report = validate(&doc);
        assert!(report
            .errors
            .contains(&"Professional summary is empty".to_string()));
    }

    #[test]
    fn test_skill_entry_rules() {
        let mut doc = valid_document();
        doc["skills"] = json!(["Python", "", "R", "SQL", "Excel"]);
        let report = validate(&doc);
        assert!(report.errors.contains(&"Empty skill at position 2".to_string()));
        assert!(report.warnings.contains(&"Very short skill: 'R'".to_string()));
    }

    #[test]
    fn test_too_many_skills_warns() {
        let mut doc = valid_document();
        let skills: Vec<String> = (0..21).map(|i| format!("Skill {i}")).collect();
        doc["skills"] = json!(skills);
        let report = validate(&doc);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("Many skills listed (21)")));
    }

    #[test]
    fn test_experience_entry_rules() {
        let mut doc = valid_document();
        doc["experience"] = json!([
            {"title": "Analyst", "company": "", "dates": "2020 - 2021", "bullet_points": []},
            {"title": "Analyst", "dates": "2019 - 2020", "bullet_points": [
                "",
                "Too short.",
                "Wrote five reports without a period"
            ]}
        ]);
        let report = validate(&doc);
        assert!(!report.is_valid);
        assert!(report
            .errors
            .contains(&"Experience entry 1: Empty field 'company'".to_string()));
        assert!(report
            .errors
            .contains(&"Experience entry 1: No bullet points provided".to_string()));
        assert!(report
            .errors
            .contains(&"Experience entry 2: Missing field 'company'".to_string()));
        assert!(report
            .errors
            .contains(&"Experience entry 2, bullet 1: Empty bullet point".to_string()));
        assert!(report
            .warnings
            .contains(&"Experience entry 2, bullet 2: Very short bullet point".to_string()));
        assert!(report
            .warnings
            .contains(&"Experience entry 2, bullet 3: Should end with period".to_string()));
    }

    #[test]
    fn test_single_bullet_warns() {
        let mut doc = valid_document();
        doc["experience"][0]["bullet_points"] =
            json!(["Automated weekly revenue reporting with Python and SQL."]);
        let report = validate(&doc);
        assert!(report.is_valid);
        assert!(report
            .warnings
            .contains(&"Experience entry 1: Only 1 bullet point(s)".to_string()));
    }

    #[test]
    fn test_education_entry_missing_degree_is_error() {
        let mut doc = valid_document();
        doc["education"] = json!([{"university": "State University"}]);
        let report = validate(&doc);
        assert!(report
            .errors
            .contains(&"Education entry 1: Missing field 'degree'".to_string()));
    }

    #[test]
    fn test_placeholder_phrases_warn_once_each() {
        let mut doc = valid_document();
        doc["personal_details"]["name"] = json!("Your Name");
        doc["experience"][1]["company"] = json!("Company Name");
        let report = validate(&doc);
        assert!(report
            .warnings
            .contains(&"Possible placeholder text found: 'your name'".to_string()));
        assert!(report
            .warnings
            .contains(&"Possible placeholder text found: 'company name'".to_string()));
        assert!(!report.warnings.iter().any(|w| w.contains("'your email'")));
    }

    #[test]
    fn test_mixed_date_formats_warn() {
        let mut doc = valid_document();
        doc["experience"][1]["dates"] = json!("Spring to Fall");
        let report = validate(&doc);
        assert!(report
            .warnings
            .contains(&"Inconsistent date formats in experience section".to_string()));
    }

    #[test]
    fn test_date_families() {
        assert_eq!(date_family("May 2023 - Current"), DateFamily::FourDigitYear);
        assert_eq!(date_family("05/21 - 08/23"), DateFamily::TwoDigitYear);
        assert_eq!(date_family("Summer"), DateFamily::Other);
    }

    #[test]
    fn test_phone_and_email_helpers() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("555.123.4567"));
        assert!(!is_valid_phone("555-1234"));
        assert!(!is_valid_phone("555-CALL-NOW"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn test_non_object_document() {
        let report = validate(&json!(["not", "a", "resume"]));
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_validate_file_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = validate_file(dir.path().join("missing.json"));
        assert!(!missing.is_valid);
        assert!(missing.errors[0].starts_with("Resume file not found"));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{").unwrap();
        let malformed = validate_file(&bad);
        assert!(malformed.errors[0].starts_with("Invalid JSON format"));

        let good = dir.path().join("good.json");
        fs::write(&good, valid_document().to_string()).unwrap();
        assert!(validate_file(&good).is_valid);
    }

    #[test]
    fn test_each_call_starts_fresh() {
        let mut broken = valid_document();
        broken["skills"] = json!([]);
        assert!(!validate(&broken).is_valid);
        assert!(validate(&valid_document()).is_valid);
    }

    #[test]
    fn test_render_includes_status_and_findings() {
        let mut doc = valid_document();
        doc["experience"] = json!([]);
        let text = validate(&doc).render("config/master_resume.json");
        assert!(text.contains("Status: INVALID"));
        assert!(text.contains("Experience section is empty"));
        assert!(text.contains("File: config/master_resume.json"));

        let clean = validate(&valid_document()).render("ok.json");
        assert!(clean.contains("No issues found"));
    }

    fn master_for_tailored() -> MasterResume {
        MasterResume {
            skills: vec!["Python".to_string(), "SQL".to_string()],
            experience: vec![ExperienceEntry {
                title: "Data Analyst".to_string(),
                company: "Northwind".to_string(),
                dates: "2021 - 2023".to_string(),
                bullet_points: vec!["Built dashboards.".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_tailored_flags_altered_identity_and_invented_skills() {
        let tailored = TailoredContent {
            tailored_summary: "Summary.".to_string(),
            tailored_experience: vec![TailoredExperience {
                title: "Senior Data Analyst".to_string(),
                company: "Northwind".to_string(),
                dates: "2021 - 2023".to_string(),
                bullet_points: vec![],
            }],
            relevant_skills: vec!["Python".to_string(), "Kubernetes".to_string()],
            cover_letter_points: vec!["a".into(), "b".into(), "c".into()],
        };
        let report = validate_tailored(&tailored, &master_for_tailored());
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("title altered")));
        assert!(report
            .errors
            .contains(&"Skill not in master resume: 'Kubernetes'".to_string()));
    }

    #[test]
    fn test_validate_tailored_accepts_faithful_output() {
        let master = master_for_tailored();
        let tailored = TailoredContent {
            tailored_summary: "Summary.".to_string(),
            tailored_experience: master.experience.iter().map(TailoredExperience::from).collect(),
            relevant_skills: vec!["SQL".to_string()],
            cover_letter_points: vec!["a".into(), "b".into()],
        };
        let report = validate_tailored(&tailored, &master);
        assert!(report.is_valid);
        assert!(report
            .warnings
            .contains(&"Expected 3-4 cover letter points, found 2".to_string()));
    }
}
