// ABOUTME: The PromptForge engineering pipeline
// ABOUTME: Sequential stages threading a draft: thinking, structuring, refinement, formatting

pub mod engine;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod prompts;
pub mod refinement;
pub mod scoring;
pub mod structuring;
pub mod thinking;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use engine::{PipelineConfig, PipelineEngine, PipelineOutcome, DEFAULT_BUDGET_SECS};
pub use error::{PipelineError, PipelineResult};
pub use refinement::{PassReport, RefinementEngine, REFINEMENT_PASSES};
