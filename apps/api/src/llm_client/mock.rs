use async_trait::async_trait;

use super::{Backend, BackendError, ProviderKind};

/// Placeholder backend used when no real provider is configured.
///
/// It never produces content, so every request goes through fallback synthesis.
pub struct MockBackend;

#[async_trait]
impl Backend for MockBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    fn model_name(&self) -> &str {
        "none"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
        Err(BackendError::NoBackend)
    }
}
