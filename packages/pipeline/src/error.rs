// ABOUTME: Error taxonomy for the pipeline
// ABOUTME: Every variant carries a stable kind tag and a retry recommendation

use thiserror::Error;

use promptforge_ai::GenerateError;
use promptforge_core::ValidationError;
use promptforge_storage::StorageError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input outside accepted bounds. Rejected before any model call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Rate ceiling exceeded, either by the governor or the provider.
    #[error("Rate limit exceeded{}", retry_after_secs.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    /// Model call failed for reasons other than rate limiting. Terminal
    /// for the current request; no automatic cross-pipeline retry.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Model output never matched the section template, even after the
    /// in-stage retry.
    #[error("Could not parse model output: missing sections {0:?}")]
    Parse(Vec<String>),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The end-to-end wall-clock budget expired.
    #[error("Pipeline exceeded its {budget_secs}s budget")]
    Timeout { budget_secs: u64 },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Stable machine-readable tag for the HTTP boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation_error",
            PipelineError::RateLimited { .. } => "rate_limit_denied",
            PipelineError::Provider(_) => "provider_error",
            PipelineError::Parse(_) => "parse_error",
            PipelineError::Storage(_) => "storage_error",
            PipelineError::Timeout { .. } => "timeout",
        }
    }

    pub fn retry_recommended(&self) -> bool {
        matches!(
            self,
            PipelineError::RateLimited { .. } | PipelineError::Timeout { .. }
        )
    }
}

impl From<GenerateError> for PipelineError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::RateLimited { retry_after } => PipelineError::RateLimited {
                retry_after_secs: retry_after,
            },
            GenerateError::Provider(msg) => PipelineError::Provider(msg),
            GenerateError::InvalidResponse(msg) => PipelineError::Provider(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_hints_by_kind() {
        assert!(!PipelineError::Validation(ValidationError::TooShort(3)).retry_recommended());
        assert!(PipelineError::RateLimited {
            retry_after_secs: Some(30)
        }
        .retry_recommended());
        assert!(!PipelineError::Provider("down".to_string()).retry_recommended());
        assert!(PipelineError::Timeout { budget_secs: 300 }.retry_recommended());
    }

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(
            PipelineError::Validation(ValidationError::Empty).kind(),
            "validation_error"
        );
        assert_eq!(
            PipelineError::RateLimited {
                retry_after_secs: None
            }
            .kind(),
            "rate_limit_denied"
        );
        assert_eq!(PipelineError::Parse(vec![]).kind(), "parse_error");
    }
}
