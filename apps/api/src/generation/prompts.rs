// Prompt text for the tailoring call.
// The system instruction and sampling parameters live in llm_client::prompts.

use crate::llm_client::prompts::PROMPT_CLOSING;
use crate::models::resume::MasterResume;

/// Fixed instruction block sent with every tailoring request, unchanged per call.
pub const TAILORING_INSTRUCTIONS: &str = r#"INSTRUCTIONS
Analyze: Read the entire job description carefully. Identify the top 5-7 most important keywords, skills, and qualifications the employer is looking for.
Match: Compare these required qualifications with the information in my master resume.
Rewrite: Rewrite the professional_summary and the bullet_points within the experience section. Do not change titles, companies, or dates.
Tailor Bullet Points: For each job in my experience, rephrase the bullet points to use action verbs and directly reflect the language and priorities found in the job description. Quantify achievements with metrics (like percentages or numbers) only where my master resume already provides them.
Select Skills: From my master list of skills, create a new, targeted list of the most relevant skills for this specific job.
Generate Cover Letter Points: Create a short list of 3-4 bullet points I can use to build a compelling cover letter. Each point should connect one of my key experiences or skills directly to a stated need in the job description.

CONSTRAINTS
DO NOT invent or exaggerate any skills, experiences, or metrics. You must only use information present in my master resume.
DO NOT change my personal details, job titles, company names, or employment dates.
The tone must be professional and confident. Avoid cliches and buzzwords.
Your final output MUST BE a single, valid JSON object and nothing else. Do not include any explanatory text before or after the JSON block.

OUTPUT FORMAT
Your entire response must be a single JSON object with the following structure:

{
  "tailored_summary": "...",
  "tailored_experience": [
    {
      "title": "Data Analyst",
      "company": "Acme Analytics",
      "dates": "May 2023 - Current",
      "bullet_points": [
        "...",
        "..."
      ]
    }
  ],
  "relevant_skills": [
    "...",
    "..."
  ],
  "cover_letter_points": [
    "...",
    "..."
  ]
}"#;

/// Assembles the full prompt: instructions, the master resume as pretty JSON,
/// then the raw job description.
pub fn build_prompt(
    master: &MasterResume,
    job_description: &str,
) -> Result<String, serde_json::Error> {
    let resume_json = serde_json::to_string_pretty(master)?;

    Ok(format!(
        "{TAILORING_INSTRUCTIONS}\n\n\
         **My Master Resume:**\n{resume_json}\n\n\
         **Job Description:**\n{job_description}\n\n\
         {PROMPT_CLOSING}"
    ))
}
