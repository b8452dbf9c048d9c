// ABOUTME: Narrow generation trait isolating the language-model provider
// ABOUTME: Everything outside this trait is deterministic and testable offline

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// Provider signalled rate limiting. Retryable by the caller; the
    /// pipeline surfaces it and never retries internally.
    #[error("Provider rate limit hit{}", retry_after.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    /// Any other provider failure. Terminal for the current stage.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider returned a payload that could not be read as text.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

pub type GenerateResult = Result<String, GenerateError>;

/// The single seam through which the pipeline talks to a language model.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates text for a prompt under an optional system instruction.
    async fn generate(&self, prompt: &str, system: Option<&str>) -> GenerateResult;
}
