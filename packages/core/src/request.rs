// ABOUTME: Validated engineering request accepted by the pipeline
// ABOUTME: Length bounds are enforced before any model call is made

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DocumentMode, OutputStyle};

pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Description must be at least {MIN_DESCRIPTION_LEN} characters, got {0}")]
    TooShort(usize),

    #[error("Description must be at most {MAX_DESCRIPTION_LEN} characters, got {0}")]
    TooLong(usize),

    #[error("Description must not be empty")]
    Empty,
}

/// A request accepted by the pipeline. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineeringRequest {
    pub description: String,
    #[serde(default)]
    pub style: OutputStyle,
    #[serde(default)]
    pub mode: DocumentMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchaser_id: Option<String>,
}

impl EngineeringRequest {
    /// Validates and constructs a request. Rejection happens here, before
    /// any external call is issued.
    pub fn new(
        description: impl Into<String>,
        style: OutputStyle,
        mode: DocumentMode,
        purchaser_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        let description = description.into();
        let trimmed = description.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = trimmed.chars().count();
        if len < MIN_DESCRIPTION_LEN {
            return Err(ValidationError::TooShort(len));
        }
        if len > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong(len));
        }

        Ok(Self {
            description: trimmed.to_string(),
            style,
            mode,
            purchaser_id,
        })
    }

    /// Identity used for rate accounting; anonymous requests share a bucket.
    pub fn identity(&self) -> &str {
        self.purchaser_id.as_deref().unwrap_or("anonymous")
    }
}
