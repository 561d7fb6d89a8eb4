// Tailoring Engine
// Implements: keyword signals, prompt assembly, backend dispatch, fallback synthesis.
// All backend calls go through llm_client; nothing here talks to a provider directly.

pub mod fallback;
pub mod generator;
pub mod handlers;
pub mod jd_parser;
pub mod prompts;
