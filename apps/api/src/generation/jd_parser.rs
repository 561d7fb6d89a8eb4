//! JD Parser: classifies a raw job description into keyword families.
//!
//! Matching is plain case-insensitive substring search. The resulting
//! `JobSignals` vector drives every template choice in fallback synthesis,
//! so identical descriptions always produce identical signals.

use serde::Serialize;

const ANALYST_CUES: [&str; 3] = ["analyst", "analytics", "analysis"];
const BI_TOOL_CUES: [&str; 3] = ["power bi", "powerbi", "tableau"];

/// Keyword-family matches for one job description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobSignals {
    pub analyst: bool,
    pub python: bool,
    pub sql: bool,
    pub bi_tools: bool,
    pub automation: bool,
    pub dashboard: bool,
    pub stakeholder: bool,
}

impl JobSignals {
    pub fn from_description(job_description: &str) -> Self {
        let text = job_description.to_lowercase();
        let any = |cues: &[&str]| cues.iter().any(|cue| text.contains(cue));

        Self {
            analyst: any(&ANALYST_CUES[..]),
            python: text.contains("python"),
            sql: text.contains("sql"),
            bi_tools: any(&BI_TOOL_CUES[..]),
            automation: text.contains("automation"),
            dashboard: text.contains("dashboard"),
            stakeholder: text.contains("stakeholder"),
        }
    }
}
