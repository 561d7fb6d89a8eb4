use std::sync::Arc;

use crate::config::TailorConfig;
use crate::generation::generator::TailoringEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Holds the master resume, loaded once at startup and never mutated.
    pub engine: Arc<TailoringEngine>,
    pub config: TailorConfig,
}
