// ABOUTME: Runs the four thinking-mode analyses concurrently over one request
// ABOUTME: Individual mode failures degrade to absent analyses, never abort the request

use futures::future::join_all;
use promptforge_core::{ThinkingAnalysis, ThinkingMode};
use tracing::{debug, warn};

use crate::prompts;
use promptforge_ai::Generator;

/// Applies all four thinking modes to the request description. Each mode
/// is one generation call; the four run concurrently. A failed mode is
/// recorded as `None` and the pipeline continues with whatever analyses
/// succeeded.
pub async fn analyze(generator: &dyn Generator, description: &str) -> ThinkingAnalysis {
    let calls = ThinkingMode::ALL.map(|mode| {
        let prompt = prompts::thinking_prompt(mode, description);
        async move {
            let result = generator
                .generate(&prompt, Some(prompts::SYSTEM_PROMPT))
                .await;
            (mode, result)
        }
    });

    let mut analysis = ThinkingAnalysis::default();
    for (mode, result) in join_all(calls).await {
        match result {
            Ok(text) => {
                debug!(mode = mode.as_str(), chars = text.len(), "thinking mode completed");
                analysis.set(mode, Some(text));
            }
            Err(error) => {
                warn!(mode = mode.as_str(), %error, "thinking mode failed, continuing without it");
                analysis.set(mode, None);
            }
        }
    }
    analysis
}
