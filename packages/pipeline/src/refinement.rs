// ABOUTME: The two-pass refinement loop, each pass one scored rewrite
// ABOUTME: Always exactly two passes, and a pass can never make the draft worse

use promptforge_ai::Generator;
use promptforge_core::{Draft, QualityScore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PipelineResult;
use crate::{parser, prompts, scoring};

/// The loop runs this many passes, no early exit, no extra pass.
pub const REFINEMENT_PASSES: u8 = 2;

/// How many dimensions each rewrite targets.
const FOCUS_DIMENSIONS: usize = 2;

/// A draft at or above this overall score is left untouched by a pass;
/// the pass still runs and is recorded, but no rewrite is requested.
const REWRITE_THRESHOLD: f32 = 90.0;

/// Record of one refinement pass, kept in the run trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    pub pass: u8,
    /// Score of the draft entering the pass.
    pub entry_score: QualityScore,
    /// Score of the draft leaving the pass.
    pub exit_score: QualityScore,
    /// The dimensions the rewrite targeted, lowest first.
    pub focus: Vec<String>,
    /// False when both rewrite attempts were malformed and the pass fell
    /// back to the draft it started with.
    pub rewrite_accepted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RefinementEngine;

impl RefinementEngine {
    /// Runs both passes back to back. Prefer [`run_pass`] when the caller
    /// needs to checkpoint between passes.
    ///
    /// [`run_pass`]: RefinementEngine::run_pass
    pub async fn refine(
        &self,
        generator: &dyn Generator,
        mut draft: Draft,
    ) -> PipelineResult<(Draft, Vec<PassReport>)> {
        let mut reports = Vec::with_capacity(REFINEMENT_PASSES as usize);
        for pass in 1..=REFINEMENT_PASSES {
            let (next, report) = self.run_pass(generator, draft, pass).await?;
            draft = next;
            reports.push(report);
        }
        Ok((draft, reports))
    }

    /// One pass: score the draft, pick its two weakest dimensions, ask for
    /// one rewrite aimed at them, and keep whichever draft scores higher.
    /// A draft already at [`REWRITE_THRESHOLD`] skips the rewrite entirely.
    /// A malformed rewrite gets one repeat attempt; two malformed rewrites
    /// leave the incoming draft untouched. Provider failures propagate.
    pub async fn run_pass(
        &self,
        generator: &dyn Generator,
        draft: Draft,
        pass: u8,
    ) -> PipelineResult<(Draft, PassReport)> {
        let entry_score = scoring::evaluate(&draft);
        let focus: Vec<&'static str> = entry_score
            .ranked_dimensions()
            .into_iter()
            .take(FOCUS_DIMENSIONS)
            .map(|(name, _)| name)
            .collect();

        if entry_score.overall >= REWRITE_THRESHOLD {
            info!(
                pass,
                overall = entry_score.overall,
                "draft already meets the quality bar, skipping rewrite"
            );
            let report = PassReport {
                pass,
                entry_score: entry_score.clone(),
                exit_score: entry_score,
                focus: focus.into_iter().map(String::from).collect(),
                rewrite_accepted: false,
            };
            return Ok((draft, report));
        }

        debug!(pass, overall = entry_score.overall, ?focus, "refinement pass starting");

        let mut rewrite = None;
        for attempt in 0..2 {
            let prompt = prompts::refinement_prompt(draft.mode, &draft.to_text(), &focus, pass);
            let raw = generator
                .generate(&prompt, Some(prompts::SYSTEM_PROMPT))
                .await?;
            match parser::parse_draft(draft.mode, &raw) {
                Ok(parsed) => {
                    rewrite = Some(parsed);
                    break;
                }
                Err(errors) => {
                    warn!(pass, attempt, ?errors, "refinement rewrite malformed");
                }
            }
        }

        let (final_draft, exit_score, rewrite_accepted) = match rewrite {
            Some(candidate) => {
                let candidate_score = scoring::evaluate(&candidate);
                if candidate_score.overall >= entry_score.overall {
                    (candidate, candidate_score, true)
                } else {
                    debug!(
                        pass,
                        entry = entry_score.overall,
                        candidate = candidate_score.overall,
                        "rewrite scored lower, keeping incoming draft"
                    );
                    (draft, entry_score.clone(), false)
                }
            }
            None => {
                warn!(pass, "both rewrite attempts malformed, keeping incoming draft");
                (draft, entry_score.clone(), false)
            }
        };

        info!(
            pass,
            entry = entry_score.overall,
            exit = exit_score.overall,
            rewrite_accepted,
            "refinement pass complete"
        );

        let report = PassReport {
            pass,
            entry_score,
            exit_score,
            focus: focus.into_iter().map(String::from).collect(),
            rewrite_accepted,
        };
        Ok((final_draft, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::test_utils::{
        draft_prompt_document, sample_prompt_document, weak_prompt_document, FakeGenerator,
    };
    use promptforge_core::DocumentMode;

    fn weak_draft() -> Draft {
        parser::parse_draft(DocumentMode::Prompt, &weak_prompt_document()).unwrap()
    }

    #[tokio::test]
    async fn runs_exactly_two_passes() {
        let generator =
            FakeGenerator::new().respond_when("Rewrite the document", &draft_prompt_document());

        let engine = RefinementEngine;
        let (_, reports) = engine.refine(&generator, weak_draft()).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].pass, 1);
        assert_eq!(reports[1].pass, 2);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn higher_scoring_rewrite_is_adopted() {
        let generator =
            FakeGenerator::new().respond_when("Rewrite the document", &sample_prompt_document());

        let engine = RefinementEngine;
        let (final_draft, reports) = engine.refine(&generator, weak_draft()).await.unwrap();
        assert!(reports[0].rewrite_accepted);
        assert!(reports[0].exit_score.overall > reports[0].entry_score.overall);
        assert!(final_draft
            .section("Role")
            .unwrap()
            .content
            .contains("data analyst"));
    }

    #[tokio::test]
    async fn lower_scoring_rewrite_is_rejected() {
        let generator =
            FakeGenerator::new().respond_when("Rewrite the document", &weak_prompt_document());

        let entry =
            parser::parse_draft(DocumentMode::Prompt, &draft_prompt_document()).unwrap();
        let engine = RefinementEngine;
        let (final_draft, report) = engine.run_pass(&generator, entry.clone(), 1).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert!(!report.rewrite_accepted);
        assert_eq!(final_draft, entry);
    }

    #[tokio::test]
    async fn draft_at_the_quality_bar_skips_the_rewrite_call() {
        // No scripted rule: any generation attempt would panic the double.
        let generator = FakeGenerator::new();

        let strong = parser::parse_draft(DocumentMode::Prompt, &sample_prompt_document()).unwrap();
        let engine = RefinementEngine;
        let (final_draft, reports) = engine.refine(&generator, strong.clone()).await.unwrap();

        assert_eq!(generator.calls(), 0);
        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert!(!report.rewrite_accepted);
            assert_eq!(report.exit_score, report.entry_score);
        }
        assert_eq!(final_draft, strong);
    }

    #[tokio::test]
    async fn malformed_rewrites_keep_incoming_draft() {
        let generator = FakeGenerator::new().respond_when("Rewrite the document", "no headers");

        let entry = weak_draft();
        let engine = RefinementEngine;
        let (final_draft, report) = engine.run_pass(&generator, entry.clone(), 1).await.unwrap();
        assert_eq!(final_draft, entry);
        assert!(!report.rewrite_accepted);
        // Rewrite plus one repeat attempt.
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let generator =
            FakeGenerator::new().fail_when("Rewrite the document", "model unavailable");

        let engine = RefinementEngine;
        let error = engine.refine(&generator, weak_draft()).await.unwrap_err();
        assert!(matches!(error, PipelineError::Provider(_)));
    }

    #[tokio::test]
    async fn focus_names_the_two_weakest_dimensions() {
        let generator =
            FakeGenerator::new().respond_when("Rewrite the document", &sample_prompt_document());

        let entry = weak_draft();
        let ranked = scoring::evaluate(&entry).ranked_dimensions();
        let engine = RefinementEngine;
        let (_, report) = engine.run_pass(&generator, entry, 1).await.unwrap();
        assert_eq!(report.focus, vec![ranked[0].0, ranked[1].0]);
    }
}
