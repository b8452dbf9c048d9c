// ABOUTME: The pipeline orchestrator, sequential stages threading one draft value
// ABOUTME: Owns admission, caching, checkpointing and the end-to-end wall-clock budget

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use promptforge_ai::Generator;
use promptforge_core::{ContextMessage, Draft, EngineeringRequest, QualityScore};
use promptforge_governor::{fingerprint, Admission, RateGovernor, ResponseCache};
use promptforge_storage::{CheckpointLog, ContextStore};

use crate::error::{PipelineError, PipelineResult};
use crate::refinement::{PassReport, RefinementEngine};
use crate::{formatter, scoring, structuring, thinking};

/// Default end-to-end budget for one request, model calls included.
pub const DEFAULT_BUDGET_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Wall-clock ceiling for the model-calling stages of one run.
    pub budget_secs: u64,
    /// Directory holding one checkpoint file per run.
    pub checkpoint_dir: PathBuf,
}

impl PipelineConfig {
    pub fn new(checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            budget_secs: DEFAULT_BUDGET_SECS,
            checkpoint_dir: checkpoint_dir.into(),
        }
    }

    pub fn with_budget_secs(mut self, budget_secs: u64) -> Self {
        self.budget_secs = budget_secs;
        self
    }
}

/// Everything a completed run hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub run_id: String,
    /// Final document rendered in the requested style.
    pub document: String,
    pub draft: Draft,
    /// Score of the draft leaving the second refinement pass.
    pub score: QualityScore,
    pub passes: Vec<PassReport>,
    /// True when the outcome came from the response cache.
    #[serde(default)]
    pub cached: bool,
}

/// The orchestrator. All collaborators are injected; the engine holds no
/// global state and can be constructed freely in tests.
pub struct PipelineEngine {
    generator: Arc<dyn Generator>,
    governor: Arc<RateGovernor>,
    cache: Arc<ResponseCache>,
    context: ContextStore,
    refinement: RefinementEngine,
    config: PipelineConfig,
}

impl PipelineEngine {
    pub fn new(
        generator: Arc<dyn Generator>,
        governor: Arc<RateGovernor>,
        cache: Arc<ResponseCache>,
        context: ContextStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            governor,
            cache,
            context,
            refinement: RefinementEngine,
            config,
        }
    }

    /// Runs the full pipeline for one validated request.
    pub async fn run(&self, request: &EngineeringRequest) -> PipelineResult<PipelineOutcome> {
        let identity = request.identity();

        match self.governor.admit(identity) {
            Admission::Allowed => {}
            Admission::Denied {
                retry_after,
                window,
            } => {
                warn!(identity, window, ?retry_after, "request denied by rate governor");
                return Err(PipelineError::RateLimited {
                    retry_after_secs: Some(retry_after.as_secs().max(1)),
                });
            }
        }

        let key = fingerprint(
            &request.description,
            &request.mode.to_string(),
            &request.style.to_string(),
        );
        if let Some(hit) = self.cache.get(&key) {
            match serde_json::from_str::<PipelineOutcome>(&hit) {
                Ok(mut outcome) => {
                    info!(identity, run_id = %outcome.run_id, "serving cached outcome");
                    outcome.cached = true;
                    return Ok(outcome);
                }
                Err(error) => {
                    // Stale entry from an older serialization; regenerate.
                    warn!(%error, "cached outcome unreadable, regenerating");
                }
            }
        }

        let run_id = Uuid::new_v4().to_string();
        let history = self.context.load(identity).await?;
        let mut log = CheckpointLog::new(&self.config.checkpoint_dir, &run_id);
        log.snapshot(
            "received",
            None,
            None,
            format!("mode={} style={} identity={}", request.mode, request.style, identity),
        )
        .await?;

        let budget = Duration::from_secs(self.config.budget_secs);
        let staged = timeout(budget, self.execute(request, &history, &mut log)).await;

        let (draft, passes) = match staged {
            Err(_elapsed) => {
                warn!(identity, run_id = %run_id, budget_secs = self.config.budget_secs, "run exceeded budget");
                self.governor.record_failure(identity);
                return Err(PipelineError::Timeout {
                    budget_secs: self.config.budget_secs,
                });
            }
            Ok(Err(error)) => {
                self.governor.record_failure(identity);
                return Err(error);
            }
            Ok(Ok(staged)) => staged,
        };

        let score = passes
            .last()
            .map(|pass| pass.exit_score.clone())
            .unwrap_or_else(|| scoring::evaluate(&draft));
        let document = formatter::format(&draft, request.style);

        log.snapshot("formatted", Some(draft.clone()), Some(score.clone()), "")
            .await?;

        // History writes are best-effort; a failed append never fails the run.
        if let Err(error) = self.append_history(identity, request, &document).await {
            warn!(identity, %error, "context append failed, continuing");
        }

        let outcome = PipelineOutcome {
            run_id: run_id.clone(),
            document,
            draft,
            score,
            passes,
            cached: false,
        };

        match serde_json::to_string(&outcome) {
            Ok(serialized) => self.cache.put(key, serialized),
            Err(error) => warn!(%error, "outcome not cacheable"),
        }
        self.governor.record_success(identity);

        info!(
            identity,
            run_id = %run_id,
            overall = outcome.score.overall,
            grade = %outcome.score.grade(),
            "run complete"
        );
        Ok(outcome)
    }

    /// The model-calling stages, run inside the wall-clock budget.
    async fn execute(
        &self,
        request: &EngineeringRequest,
        history: &[ContextMessage],
        log: &mut CheckpointLog,
    ) -> PipelineResult<(Draft, Vec<PassReport>)> {
        let analysis = thinking::analyze(self.generator.as_ref(), &request.description).await;
        log.snapshot(
            "analysis",
            None,
            None,
            format!("modes_available={}", analysis.available()),
        )
        .await?;

        let draft =
            structuring::structure(self.generator.as_ref(), request, &analysis, history).await?;
        log.snapshot("draft", Some(draft.clone()), None, "").await?;

        let mut current = draft;
        let mut passes = Vec::new();
        for pass in 1..=crate::refinement::REFINEMENT_PASSES {
            let (next, report) = self
                .refinement
                .run_pass(self.generator.as_ref(), current, pass)
                .await?;
            log.snapshot(
                &format!("refinement_{}", pass),
                Some(next.clone()),
                Some(report.exit_score.clone()),
                "",
            )
            .await?;
            current = next;
            passes.push(report);
        }

        Ok((current, passes))
    }

    async fn append_history(
        &self,
        identity: &str,
        request: &EngineeringRequest,
        document: &str,
    ) -> PipelineResult<()> {
        self.context
            .append(identity, ContextMessage::new("user", &request.description))
            .await?;
        self.context
            .append(identity, ContextMessage::new("assistant", document))
            .await?;
        Ok(())
    }
}
