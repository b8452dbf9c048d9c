// ABOUTME: Deterministic generator double for pipeline tests
// ABOUTME: Routes on prompt substrings so concurrent calls stay order-independent

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use promptforge_ai::{GenerateError, GenerateResult, Generator};

enum Scripted {
    Ok(String),
    Fail(String),
    RateLimited(Option<u64>),
}

/// A scripted [`Generator`]. Rules match on a substring of the prompt,
/// first match wins, and matched `Ok` rules can carry follow-up responses
/// consumed in order on repeated hits (for retry scenarios).
pub struct FakeGenerator {
    rules: Mutex<Vec<(String, Vec<Scripted>)>>,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn respond_when(self, marker: &str, response: &str) -> Self {
        self.push(marker, Scripted::Ok(response.to_string()));
        self
    }

    /// Queues an additional response behind an existing marker; each hit on
    /// the marker consumes the next queued response, repeating the last one
    /// once the queue runs dry.
    pub fn then_respond_when(self, marker: &str, response: &str) -> Self {
        self.push(marker, Scripted::Ok(response.to_string()));
        self
    }

    pub fn fail_when(self, marker: &str, message: &str) -> Self {
        self.push(marker, Scripted::Fail(message.to_string()));
        self
    }

    pub fn rate_limit_when(self, marker: &str, retry_after: Option<u64>) -> Self {
        self.push(marker, Scripted::RateLimited(retry_after));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn push(&self, marker: &str, scripted: Scripted) {
        let mut rules = self.rules.lock().unwrap();
        if let Some((_, queue)) = rules.iter_mut().find(|(m, _)| m == marker) {
            queue.push(scripted);
        } else {
            rules.push((marker.to_string(), vec![scripted]));
        }
    }
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str, _system: Option<&str>) -> GenerateResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut rules = self.rules.lock().unwrap();
        let (_, queue) = rules
            .iter_mut()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .unwrap_or_else(|| panic!("no scripted response matches prompt:\n{prompt}"));

        let scripted = if queue.len() > 1 {
            queue.remove(0)
        } else {
            match &queue[0] {
                Scripted::Ok(text) => Scripted::Ok(text.clone()),
                Scripted::Fail(msg) => Scripted::Fail(msg.clone()),
                Scripted::RateLimited(retry) => Scripted::RateLimited(*retry),
            }
        };

        match scripted {
            Scripted::Ok(text) => Ok(text),
            Scripted::Fail(message) => Err(GenerateError::Provider(message)),
            Scripted::RateLimited(retry_after) => Err(GenerateError::RateLimited { retry_after }),
        }
    }
}

/// A four-section prompt document with strong scoring signal, usable as a
/// scripted structuring response.
pub fn sample_prompt_document() -> String {
    "## Role\nYou are a data analyst specializing in product metrics.\n\n\
     ## Context\nContext: the team ships a task management app for remote teams of 5 to 50 people.\n\n\
     ## Task\nTask: analyze the idea and extract 3 core workflows. You must not invent features.\n\n\
     ## Output Format\nOutput: valid JSON array of workflow objects, e.g. {\"name\": \"string\"}."
        .to_string()
}

/// A workable but unpolished four-section document, scoring below the
/// refinement quality bar so rewrite calls actually happen.
pub fn draft_prompt_document() -> String {
    "## Role\nYou are a product analyst helping a small team.\n\n\
     ## Context\nThe team ships a task management app for remote teams.\n\n\
     ## Task\nAnalyze the idea and extract the core workflows.\n\n\
     ## Output Format\nA short list of workflows with one line each."
        .to_string()
}

/// Like [`sample_prompt_document`] but with weaker wording, so refinement
/// rewrites measurably improve the score.
pub fn weak_prompt_document() -> String {
    "## Role\nSomeone helpful.\n\n## Context\nStuff about things.\n\n\
     ## Task\nMaybe look at it.\n\n## Output Format\nWhatever seems right."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_on_marker_and_counts_calls() {
        let generator = FakeGenerator::new().respond_when("alpha", "one");
        assert_eq!(generator.generate("has alpha inside", None).await.unwrap(), "one");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn queued_responses_consumed_in_order() {
        let generator = FakeGenerator::new()
            .respond_when("alpha", "first")
            .then_respond_when("alpha", "second");
        assert_eq!(generator.generate("alpha", None).await.unwrap(), "first");
        assert_eq!(generator.generate("alpha", None).await.unwrap(), "second");
        // Last response repeats.
        assert_eq!(generator.generate("alpha", None).await.unwrap(), "second");
    }
}
