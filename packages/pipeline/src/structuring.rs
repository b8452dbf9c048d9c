// ABOUTME: Single generation call that turns analysis into a sectioned draft
// ABOUTME: One strict retry on malformed output, then the request fails as a parse error

use promptforge_ai::Generator;
use promptforge_core::{ContextMessage, Draft, EngineeringRequest, ThinkingAnalysis};
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::{parser, prompts};

// Context lines carried into the structuring prompt; older history is
// summarized by its absence.
const HISTORY_WINDOW: usize = 6;

/// Produces the first full draft. The model gets one chance to follow the
/// section contract and one stricter retry; a second malformed output is
/// surfaced as [`PipelineError::Parse`] with the problems from both
/// attempts. Provider rate limiting aborts the whole request here, before
/// refinement spends more calls.
pub async fn structure(
    generator: &dyn Generator,
    request: &EngineeringRequest,
    analysis: &ThinkingAnalysis,
    history: &[ContextMessage],
) -> PipelineResult<Draft> {
    let history_lines: Vec<String> = history
        .iter()
        .rev()
        .take(HISTORY_WINDOW)
        .rev()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect();

    let mut problems = Vec::new();
    for attempt in 0..2 {
        let strict = attempt == 1;
        let prompt = prompts::structuring_prompt(request, analysis, &history_lines, strict);
        let raw = generator
            .generate(&prompt, Some(prompts::SYSTEM_PROMPT))
            .await
            .map_err(PipelineError::from)?;

        match parser::parse_draft(request.mode, &raw) {
            Ok(draft) => {
                info!(
                    mode = %request.mode,
                    sections = draft.sections.len(),
                    words = draft.word_count(),
                    strict_retry = strict,
                    "structuring produced a draft"
                );
                return Ok(draft);
            }
            Err(mut errors) => {
                warn!(attempt, ?errors, "structuring output malformed");
                problems.append(&mut errors);
            }
        }
    }

    Err(PipelineError::Parse(problems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_prompt_document, FakeGenerator};
    use promptforge_core::{DocumentMode, OutputStyle};

    fn request() -> EngineeringRequest {
        EngineeringRequest::new(
            "Build a task management app for remote teams",
            OutputStyle::Structured,
            DocumentMode::Prompt,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn well_formed_output_parses_first_try() {
        let generator =
            FakeGenerator::new().respond_when("Produce the document now", &sample_prompt_document());

        let draft = structure(&generator, &request(), &ThinkingAnalysis::default(), &[])
            .await
            .unwrap();
        assert_eq!(draft.sections.len(), 4);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_output_triggers_one_strict_retry() {
        let generator = FakeGenerator::new()
            .respond_when("Produce the document now", "no headers at all")
            .then_respond_when("Produce the document now", &sample_prompt_document());

        let draft = structure(&generator, &request(), &ThinkingAnalysis::default(), &[])
            .await
            .unwrap();
        assert_eq!(draft.sections.len(), 4);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn two_malformed_outputs_fail_as_parse_error() {
        let generator =
            FakeGenerator::new().respond_when("Produce the document now", "still no headers");

        let error = structure(&generator, &request(), &ThinkingAnalysis::default(), &[])
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::Parse(_)));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn provider_rate_limit_aborts_immediately() {
        let generator =
            FakeGenerator::new().rate_limit_when("Produce the document now", Some(30));

        let error = structure(&generator, &request(), &ThinkingAnalysis::default(), &[])
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            PipelineError::RateLimited {
                retry_after_secs: Some(30)
            }
        ));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn recent_history_lands_in_the_prompt() {
        // Routed by a marker that only appears when history is included.
        let generator = FakeGenerator::new()
            .respond_when("Earlier conversation", &sample_prompt_document());

        let history = vec![ContextMessage::new("user", "I prefer terse prompts")];
        let draft = structure(&generator, &request(), &ThinkingAnalysis::default(), &history)
            .await
            .unwrap();
        assert_eq!(draft.sections.len(), 4);
    }
}
