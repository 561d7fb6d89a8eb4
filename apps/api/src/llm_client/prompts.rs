// Generation parameters and the system instruction shared by every backend.
// The tailoring prompt body itself lives in generation/prompts.rs.

/// System instruction sent with every request that supports one.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert resume writer who tailors resumes \
    for specific job descriptions. Always respond with valid JSON only.";

/// Output token cap for a single tailoring call.
pub const MAX_OUTPUT_TOKENS: u32 = 2000;

/// Low temperature keeps rewrites close to the source material.
pub const TEMPERATURE: f32 = 0.3;

/// Nucleus sampling for backends that accept it (Ollama).
pub const TOP_P: f32 = 0.9;

/// Chat-turn markers some local models emit when they run past their answer.
pub const STOP_SEQUENCES: [&str; 2] = ["Human:", "Assistant:"];

/// Closing line of every tailoring prompt. The in-process backend re-appends
/// it after truncation.
pub const PROMPT_CLOSING: &str = "Please provide the tailored resume JSON:";
