// ABOUTME: Document modes, section templates, drafts, and thinking analyses
// ABOUTME: A Draft always carries the full section set mandated by its mode

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::score::QualityScore;

/// Section set for "prompt" mode, in fixed order.
pub const PROMPT_SECTIONS: [&str; 4] = ["Role", "Context", "Task", "Output Format"];

/// Section set for "prd" mode, in fixed order.
pub const PRD_SECTIONS: [&str; 8] = [
    "Overview",
    "Core Features",
    "User Experience",
    "Technical Architecture",
    "Development Roadmap",
    "Logical Dependency Chain",
    "Risks and Mitigations",
    "Appendix",
];

/// What kind of document the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentMode {
    /// Four-section professional prompt
    #[default]
    Prompt,
    /// Eight-section Product Requirements Document
    Prd,
}

impl DocumentMode {
    /// Mandated section names for this mode, in order.
    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            DocumentMode::Prompt => &PROMPT_SECTIONS,
            DocumentMode::Prd => &PRD_SECTIONS,
        }
    }

    /// Per-section word ceiling enforced by the structuring instructions.
    pub fn section_word_limit(&self) -> usize {
        match self {
            DocumentMode::Prompt => 150,
            DocumentMode::Prd => 100,
        }
    }
}

impl std::fmt::Display for DocumentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentMode::Prompt => write!(f, "prompt"),
            DocumentMode::Prd => write!(f, "prd"),
        }
    }
}

/// Presentation style for the final document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Numbered headers and full section scaffolding
    #[default]
    Structured,
    /// Bare section bodies, no headers
    Minimal,
    /// Section breaks rewritten as prose connectors
    Conversational,
}

impl std::fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputStyle::Structured => write!(f, "structured"),
            OutputStyle::Minimal => write!(f, "minimal"),
            OutputStyle::Conversational => write!(f, "conversational"),
        }
    }
}

impl std::str::FromStr for OutputStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" => Ok(OutputStyle::Structured),
            "minimal" => Ok(OutputStyle::Minimal),
            "conversational" => Ok(OutputStyle::Conversational),
            other => Err(format!("Unknown output style: {}", other)),
        }
    }
}

impl std::str::FromStr for DocumentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prompt" => Ok(DocumentMode::Prompt),
            "prd" => Ok(DocumentMode::Prd),
            other => Err(format!("Unknown document mode: {}", other)),
        }
    }
}

/// One named section of a structured document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub content: String,
}

/// The structured document under construction.
///
/// Invariant: `sections` holds exactly `mode.sections()` in order. Use
/// [`Draft::from_sections`] to construct one; it rejects partial documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub mode: DocumentMode,
    pub sections: Vec<Section>,
}

impl Draft {
    /// Builds a draft, verifying the full mandated section set is present
    /// and non-empty. Returns the names of missing or empty sections on
    /// failure.
    pub fn from_sections(
        mode: DocumentMode,
        mut sections: Vec<Section>,
    ) -> Result<Self, Vec<String>> {
        let mut ordered = Vec::with_capacity(mode.sections().len());
        let mut missing = Vec::new();

        for name in mode.sections() {
            match sections
                .iter()
                .position(|s| s.name.eq_ignore_ascii_case(name))
            {
                Some(idx) => {
                    let mut section = sections.remove(idx);
                    section.name = (*name).to_string();
                    if section.content.trim().is_empty() {
                        missing.push((*name).to_string());
                    } else {
                        ordered.push(section);
                    }
                }
                None => missing.push((*name).to_string()),
            }
        }

        if missing.is_empty() {
            Ok(Draft {
                mode,
                sections: ordered,
            })
        } else {
            Err(missing)
        }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Total word count across all section bodies.
    pub fn word_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| s.content.split_whitespace().count())
            .sum()
    }

    /// Plain-text rendering used for scoring and as rewrite input.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str("## ");
            out.push_str(&section.name);
            out.push('\n');
            out.push_str(section.content.trim());
            out.push_str("\n\n");
        }
        out.trim_end().to_string()
    }
}

/// The four thinking modes applied to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingMode {
    Logical,
    Analytical,
    Computational,
    Outcome,
}

impl ThinkingMode {
    pub const ALL: [ThinkingMode; 4] = [
        ThinkingMode::Logical,
        ThinkingMode::Analytical,
        ThinkingMode::Computational,
        ThinkingMode::Outcome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThinkingMode::Logical => "logical",
            ThinkingMode::Analytical => "analytical",
            ThinkingMode::Computational => "computational",
            ThinkingMode::Outcome => "outcome",
        }
    }
}

/// Four independent analyses of the input. A failed mode is `None`, never
/// a request-level failure; downstream stages treat all four as optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingAnalysis {
    pub logical: Option<String>,
    pub analytical: Option<String>,
    pub computational: Option<String>,
    pub outcome: Option<String>,
}

impl ThinkingAnalysis {
    pub fn get(&self, mode: ThinkingMode) -> Option<&str> {
        match mode {
            ThinkingMode::Logical => self.logical.as_deref(),
            ThinkingMode::Analytical => self.analytical.as_deref(),
            ThinkingMode::Computational => self.computational.as_deref(),
            ThinkingMode::Outcome => self.outcome.as_deref(),
        }
    }

    pub fn set(&mut self, mode: ThinkingMode, analysis: Option<String>) {
        let slot = match mode {
            ThinkingMode::Logical => &mut self.logical,
            ThinkingMode::Analytical => &mut self.analytical,
            ThinkingMode::Computational => &mut self.computational,
            ThinkingMode::Outcome => &mut self.outcome,
        };
        *slot = analysis;
    }

    /// Number of modes that produced an analysis.
    pub fn available(&self) -> usize {
        ThinkingMode::ALL
            .iter()
            .filter(|m| self.get(**m).is_some())
            .count()
    }
}

/// One message in a conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ContextMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Immutable snapshot of pipeline state after a stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: u32,
    pub stage: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<Draft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<QualityScore>,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_prompt_sections() -> Vec<Section> {
        PROMPT_SECTIONS
            .iter()
            .map(|name| Section {
                name: (*name).to_string(),
                content: format!("Content for {}", name),
            })
            .collect()
    }

    #[test]
    fn draft_requires_full_section_set() {
        let mut sections = full_prompt_sections();
        sections.pop();

        let err = Draft::from_sections(DocumentMode::Prompt, sections).unwrap_err();
        assert_eq!(err, vec!["Output Format".to_string()]);
    }

    #[test]
    fn draft_rejects_empty_sections() {
        let mut sections = full_prompt_sections();
        sections[1].content = "   ".to_string();

        let err = Draft::from_sections(DocumentMode::Prompt, sections).unwrap_err();
        assert_eq!(err, vec!["Context".to_string()]);
    }

    #[test]
    fn draft_orders_sections_by_template() {
        let mut sections = full_prompt_sections();
        sections.reverse();

        let draft = Draft::from_sections(DocumentMode::Prompt, sections).unwrap();
        let names: Vec<&str> = draft.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, PROMPT_SECTIONS.to_vec());
    }

    #[test]
    fn draft_normalizes_header_case() {
        let sections = vec![
            Section {
                name: "role".to_string(),
                content: "An assistant".to_string(),
            },
            Section {
                name: "CONTEXT".to_string(),
                content: "Some context".to_string(),
            },
            Section {
                name: "task".to_string(),
                content: "Do the thing".to_string(),
            },
            Section {
                name: "output format".to_string(),
                content: "Markdown".to_string(),
            },
        ];

        let draft = Draft::from_sections(DocumentMode::Prompt, sections).unwrap();
        assert_eq!(draft.sections[3].name, "Output Format");
    }

    #[test]
    fn prd_mode_has_eight_sections() {
        assert_eq!(DocumentMode::Prd.sections().len(), 8);
        assert_eq!(DocumentMode::Prompt.sections().len(), 4);
    }
}
