// ABOUTME: Deterministic six-dimension quality heuristics over draft text
// ABOUTME: Pure function of the draft, no model call, identical input gives identical score

use promptforge_core::{Draft, QualityScore};

const INSTRUCTION_VERBS: [&str; 10] = [
    "analyze", "extract", "summarize", "classify", "generate", "identify", "evaluate", "compare",
    "explain", "create",
];

const AMBIGUOUS_WORDS: [&str; 8] = [
    "stuff",
    "things",
    "it",
    "that",
    "this",
    "something",
    "maybe",
    "probably",
];

const FORMAT_MARKERS: [&str; 6] = ["json", "xml", "format:", "output:", "return:", "structure:"];
const EXAMPLE_MARKERS: [&str; 4] = ["example:", "e.g.", "for instance", "such as"];
const CONSTRAINT_MARKERS: [&str; 6] = ["must", "required", "should", "do not", "avoid", "limit"];
const VAGUE_QUANTITIES: [&str; 5] = ["some", "few", "many", "several", "various"];
const DEFINITION_MARKERS: [&str; 3] = ["means", "defined as", "refers to"];
const VALIDATION_MARKERS: [&str; 5] = ["valid", "validate", "check", "verify", "ensure"];
const TYPE_MARKERS: [&str; 6] = ["string", "number", "boolean", "array", "object", "type:"];
const ERROR_MARKERS: [&str; 4] = ["error", "invalid", "failure", "exception"];
const AGENT_MARKERS: [&str; 7] = [
    "agent", "from:", "to:", "message", "protocol", "request", "response",
];

/// Scores a draft across the six quality dimensions.
pub fn evaluate(draft: &Draft) -> QualityScore {
    let text = draft.to_text();
    let lower = text.to_lowercase();

    let dimensions = [
        clarity(&text, &lower),
        specificity(&text, &lower),
        completeness(&lower),
        structure(&text),
        efficiency(&text, &lower),
        agent_readiness(&text, &lower),
    ];

    let strengths = identify_strengths(&lower, &dimensions);
    let improvements = suggest_improvements(&dimensions);
    QualityScore::from_dimensions(dimensions, strengths, improvements)
}

fn contains_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

fn contains_any(lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| lower.contains(m))
}

fn clamp(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}

fn clarity(text: &str, lower: &str) -> u8 {
    let mut score: i32 = 100;

    if !INSTRUCTION_VERBS.iter().any(|v| lower.contains(v)) {
        score -= 20;
    }

    let ambiguity = AMBIGUOUS_WORDS
        .iter()
        .filter(|w| contains_word(lower, w))
        .count() as i32;
    score -= (ambiguity * 5).min(25);

    let sentence_count = text.matches(['.', '!', '?']).count().max(1);
    let avg_sentence_len = text.split_whitespace().count() / sentence_count;
    if avg_sentence_len > 40 {
        score -= 15;
    }

    if contains_any(lower, &DEFINITION_MARKERS) {
        score += 5;
    }

    clamp(score)
}

fn specificity(text: &str, lower: &str) -> u8 {
    let mut score: i32 = 100;

    if !contains_any(lower, &FORMAT_MARKERS) {
        score -= 25;
    }
    if !contains_any(lower, &EXAMPLE_MARKERS) {
        score -= 15;
    }
    if !contains_any(lower, &CONSTRAINT_MARKERS) {
        score -= 20;
    }

    let vagueness = VAGUE_QUANTITIES
        .iter()
        .filter(|w| contains_word(lower, w))
        .count() as i32;
    score -= vagueness * 5;

    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 10;
    }

    clamp(score)
}

fn completeness(lower: &str) -> u8 {
    let components: [&[&str]; 6] = [
        &["you are", "acting as", "role:", "as a"],
        &["task:", "objective:", "goal:", "do the following"],
        &["context:", "background:", "given that", "considering"],
        &["constraint:", "limitation:", "do not", "must not"],
        &["output:", "return:", "provide:", "format:"],
        &["example:", "e.g.", "for instance"],
    ];

    let present = components
        .iter()
        .filter(|markers| contains_any(lower, markers))
        .count() as i32;

    let mut score = present * 100 / components.len() as i32;
    if present >= 5 {
        score += 10;
    }
    clamp(score)
}

fn structure(text: &str) -> u8 {
    let mut score: i32 = 100;

    let has_headers = text.lines().any(|l| l.trim_start().starts_with('#'))
        || text.lines().any(|l| {
            let t = l.trim();
            t.ends_with(':') && t.len() > 1 && t.chars().all(|c| c.is_uppercase() || c.is_whitespace() || c == ':')
        });
    if !has_headers {
        score -= 20;
    }

    let has_numbered_list = text.lines().any(|l| {
        let t = l.trim_start();
        t.chars().next().is_some_and(|c| c.is_ascii_digit()) && t.contains(". ")
    });
    if has_numbered_list {
        score += 10;
    }

    let has_bullets = text
        .lines()
        .any(|l| l.trim_start().starts_with("- ") || l.trim_start().starts_with("* "));
    if has_bullets {
        score += 5;
    }

    if ["\"\"\"", "---", "===", "```"].iter().any(|s| text.contains(s)) {
        score += 10;
    }

    if text.lines().any(|l| l.len() > 150) {
        score -= 15;
    }

    if has_headers && (has_numbered_list || has_bullets) {
        score += 10;
    }

    clamp(score)
}

fn efficiency(text: &str, lower: &str) -> u8 {
    let mut score: i32 = 100;

    let word_count = text.split_whitespace().count();
    if word_count > 500 {
        score -= 20;
    } else if word_count > 300 {
        score -= 10;
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    if !words.is_empty() {
        let unique: std::collections::HashSet<&&str> = words.iter().collect();
        let unique_ratio = unique.len() as f32 / words.len() as f32;
        if unique_ratio < 0.5 {
            score -= 20;
        } else if unique_ratio < 0.7 {
            score -= 10;
        }
    }

    if lower.matches("example").count() > 5 {
        score -= 15;
    }

    if word_count > 50 && word_count < 200 && completeness(lower) > 70 {
        score += 15;
    }

    clamp(score)
}

fn agent_readiness(text: &str, lower: &str) -> u8 {
    let mut score: i32 = 100;

    let has_structured = lower.contains("json") || (text.contains('{') && text.contains('}'));
    if !has_structured {
        score -= 25;
    }

    if !contains_any(lower, &ERROR_MARKERS) {
        score -= 20;
    }
    if contains_any(lower, &VALIDATION_MARKERS) {
        score += 10;
    }
    if contains_any(lower, &TYPE_MARKERS) {
        score += 15;
    }

    let agent_count = AGENT_MARKERS.iter().filter(|m| lower.contains(*m)).count();
    if agent_count >= 3 {
        score += 15;
    }

    clamp(score)
}

fn identify_strengths(lower: &str, dims: &[u8; 6]) -> Vec<String> {
    let labels = [
        "Clear and unambiguous instructions",
        "Well-defined output format and constraints",
        "Comprehensive coverage of all key components",
        "Well-organized with clear hierarchy",
        "Concise and token-efficient",
        "Ready for agent-to-agent communication",
    ];

    let mut strengths: Vec<String> = dims
        .iter()
        .zip(labels.iter())
        .filter(|(score, _)| **score >= 80)
        .map(|(_, label)| (*label).to_string())
        .collect();

    if lower.contains("json") {
        strengths.push("Uses structured JSON format".to_string());
    }
    if contains_any(lower, &EXAMPLE_MARKERS[..2]) {
        strengths.push("Includes helpful examples".to_string());
    }

    if strengths.is_empty() {
        strengths.push("Document is functional".to_string());
    }
    strengths
}

fn suggest_improvements(dims: &[u8; 6]) -> Vec<String> {
    let mut improvements = Vec::new();
    let [clarity, specificity, completeness, structure, efficiency, agent_readiness] = dims;

    if *clarity < 70 {
        improvements.push("Add clearer instruction verbs (analyze, extract, summarize)".to_string());
        improvements.push("Remove ambiguous words (it, that, stuff, things)".to_string());
    }
    if *specificity < 70 {
        improvements.push("Specify exact output format".to_string());
        improvements.push("Add concrete examples of expected output".to_string());
    }
    if *completeness < 70 {
        improvements.push("Add missing components: role, task, context, constraints, format".to_string());
    }
    if *structure < 70 {
        improvements.push("Organize with clear sections and lists".to_string());
    }
    if *efficiency < 70 {
        improvements.push("Remove redundant or repetitive text".to_string());
    }
    if *agent_readiness < 70 {
        improvements.push("Define error handling and validation rules".to_string());
    }

    if improvements.is_empty() {
        improvements.push("No major improvements needed".to_string());
    }
    improvements
}
