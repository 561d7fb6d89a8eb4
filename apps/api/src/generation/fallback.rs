//! Fallback Synthesizer: deterministic, backend-free tailoring.
//!
//! Only rearranges or rephrases material already in the master resume:
//! identity fields are copied verbatim, skills are a filtered subset of the
//! master list, and bullet rewrites are fixed phrase expansions. The same
//! (resume, job description, job title) always yields the same output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::generation::jd_parser::JobSignals;
use crate::models::resume::{
    MasterResume, TailoredContent, TailoredExperience, MAX_RELEVANT_SKILLS,
};

/// Builds tailored content without a backend. Never fails.
pub fn synthesize(master: &MasterResume, job_description: &str, job_title: &str) -> TailoredContent {
    let signals = JobSignals::from_description(job_description);
    let job_lower = job_description.to_lowercase();

    TailoredContent {
        tailored_summary: summary(&signals),
        tailored_experience: master
            .experience
            .iter()
            .map(|entry| TailoredExperience {
                bullet_points: entry
                    .bullet_points
                    .iter()
                    .map(|b| rewrite_bullet(b, &signals))
                    .collect(),
                ..TailoredExperience::from(entry)
            })
            .collect(),
        relevant_skills: select_skills(&master.skills, &job_lower),
        cover_letter_points: cover_letter_points(master, &signals, job_title),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

pub fn summary(signals: &JobSignals) -> String {
    let mut parts = Vec::with_capacity(5);

    parts.push(if signals.analyst {
        "Results-driven Data Analyst"
    } else {
        "Detail-oriented Financial & Data Professional"
    });
    parts.push("with proven expertise in business intelligence and analytics");

    match (signals.python, signals.sql) {
        (true, true) => parts.push("Skilled in Python, SQL, and advanced data processing"),
        (false, true) => parts.push("Proficient in SQL and database management"),
        (true, false) => parts.push("Experienced in Python programming and automation"),
        (false, false) => {}
    }

    if signals.bi_tools {
        parts.push("Expert in Power BI dashboard development and data visualization");
    }

    parts.push(
        "to deliver actionable insights that drive business decisions and operational efficiency",
    );

    format!("{}.", parts.join(" "))
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// Master skills with any word appearing in the job text, in master order,
/// capped at `MAX_RELEVANT_SKILLS`. No match at all falls back to the first
/// `MAX_RELEVANT_SKILLS` skills.
pub fn select_skills(skills: &[String], job_lower: &str) -> Vec<String> {
    let matched: Vec<String> = skills
        .iter()
        .filter(|skill| {
            skill
                .to_lowercase()
                .split_whitespace()
                .any(|word| job_lower.contains(word))
        })
        .take(MAX_RELEVANT_SKILLS)
        .cloned()
        .collect();

    if matched.is_empty() {
        skills.iter().take(MAX_RELEVANT_SKILLS).cloned().collect()
    } else {
        matched
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bullet rewriting
// ────────────────────────────────────────────────────────────────────────────

/// Phrase expansions applied when the job mentions `job_cue` and the bullet
/// (lowercased) mentions any of `bullet_cues`. Each `(phrase, expansion)` pair
/// covers one inflection of the phrase.
struct RewriteRule {
    job_cue: fn(&JobSignals) -> bool,
    bullet_cues: &'static [&'static str],
    expansions: &'static [(&'static str, &'static str)],
}

const REWRITE_RULES: [RewriteRule; 4] = [
    RewriteRule {
        job_cue: |s| s.automation,
        bullet_cues: &["automat"],
        expansions: &[
            ("automated", "streamlined and automated"),
            ("automates", "streamlines and automates"),
            ("automate", "streamline and automate"),
        ],
    },
    RewriteRule {
        job_cue: |s| s.dashboard,
        bullet_cues: &["dashboard"],
        expansions: &[
            ("dashboards", "interactive business intelligence dashboards"),
            ("dashboard", "interactive business intelligence dashboard"),
        ],
    },
    RewriteRule {
        job_cue: |s| s.stakeholder,
        bullet_cues: &["report", "insight"],
        expansions: &[("insights", "stakeholder-focused insights")],
    },
    RewriteRule {
        job_cue: |s| s.stakeholder,
        bullet_cues: &["report"],
        expansions: &[("reports", "stakeholder reports")],
    },
];

/// Per rule, one matcher per expansion pair. The expansion is tried before
/// the bare phrase so text that is already expanded matches as a whole.
static EXPANSION_PATTERNS: Lazy<Vec<Vec<Regex>>> = Lazy::new(|| {
    REWRITE_RULES
        .iter()
        .map(|rule| {
            rule.expansions
                .iter()
                .map(|(phrase, expansion)| {
                    Regex::new(&format!(
                        r"(?i)\b(?:{}|{})\b",
                        regex::escape(expansion),
                        regex::escape(phrase)
                    ))
                    .expect("escaped literal pattern")
                })
                .collect()
        })
        .collect()
});

/// Applies every matching rule once. Applying it again is a no-op.
pub fn rewrite_bullet(bullet: &str, signals: &JobSignals) -> String {
    REWRITE_RULES
        .iter()
        .zip(EXPANSION_PATTERNS.iter())
        .fold(bullet.to_string(), |text, (rule, patterns)| {
            let lower = text.to_lowercase();
            if !(rule.job_cue)(signals) || !rule.bullet_cues.iter().any(|cue| lower.contains(cue)) {
                return text;
            }
            rule.expansions
                .iter()
                .zip(patterns)
                .fold(text, |text, ((_, expansion), pattern)| {
                    expand_phrase(&text, pattern, expansion)
                })
        })
}

/// Replaces every whole-word, case-insensitive match of the phrase with
/// `expansion`, keeping the case of the first letter. Matches that already
/// are the expansion are left alone.
fn expand_phrase(text: &str, pattern: &Regex, expansion: &str) -> String {
    pattern
        .replace_all(text, |caps: &Captures| {
            let found = &caps[0];
            if found.to_lowercase() == expansion.to_lowercase() {
                found.to_string()
            } else {
                with_leading_case(found, expansion)
            }
        })
        .into_owned()
}

fn with_leading_case(found: &str, expansion: &str) -> String {
    let mut chars = expansion.chars();
    match (found.chars().next(), chars.next()) {
        (Some(lead), Some(first)) if lead.is_uppercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => expansion.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter
// ────────────────────────────────────────────────────────────────────────────

pub fn cover_letter_points(master: &MasterResume, signals: &JobSignals, job_title: &str) -> Vec<String> {
    let need = if signals.analyst {
        "advanced analytics"
    } else {
        "data-driven insights"
    };
    let role = match job_title.trim() {
        "" => String::new(),
        title => format!(" in the {title} role"),
    };
    let background = master
        .experience
        .iter()
        .find(|e| !e.title.trim().is_empty() && !e.company.trim().is_empty())
        .map(|e| format!("My experience as {} at {}", e.title.trim(), e.company.trim()))
        .unwrap_or_else(|| "My professional experience".to_string());

    let tools = match (signals.python, signals.sql) {
        (true, true) => "Python and SQL",
        (false, true) => "SQL",
        (true, false) => "Python",
        (false, false) => "analytical tools",
    };
    let tool_use = if signals.python {
        "build data pipelines and perform statistical analysis"
    } else {
        "analyze business data and generate reports"
    };

    let efficiency_focus = if signals.automation {
        "automating manual workflows and improving processes"
    } else {
        "accuracy and continuous process improvement"
    };

    let partnership = if signals.stakeholder {
        "business partnership"
    } else {
        "team collaboration"
    };

    vec![
        format!("{background} directly aligns with your need for {need}{role}."),
        format!("I have used {tools} to {tool_use}, matching your technical requirements."),
        format!(
            "My focus on {efficiency_focus} supports the operational efficiency you are seeking."
        ),
        format!(
            "My ability to collaborate with cross-functional teams and deliver actionable insights \
             aligns with your need for {partnership} skills."
        ),
    ]
}
