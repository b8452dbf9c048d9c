// ABOUTME: Core domain types for PromptForge
// ABOUTME: Defines requests, drafts, section templates, quality scores, and thinking analyses

pub mod request;
pub mod score;
pub mod types;

pub use request::{EngineeringRequest, ValidationError, MAX_DESCRIPTION_LEN, MIN_DESCRIPTION_LEN};
pub use score::{Grade, QualityScore};
pub use types::{
    Checkpoint, ContextMessage, DocumentMode, Draft, OutputStyle, Section, ThinkingAnalysis,
    ThinkingMode, PRD_SECTIONS, PROMPT_SECTIONS,
};
