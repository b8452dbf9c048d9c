// ABOUTME: Six-dimension quality score with weighted overall and letter grade
// ABOUTME: Produced fresh each refinement pass, never merged across passes

use serde::{Deserialize, Serialize};

/// Letter grade derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Quality rubric result across the six scored dimensions, each 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub clarity: u8,
    pub specificity: u8,
    pub completeness: u8,
    pub structure: u8,
    pub efficiency: u8,
    pub agent_readiness: u8,
    pub overall: f32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Dimension weights: clarity and specificity carry the most.
const WEIGHTS: [(f32, &str); 6] = [
    (0.20, "clarity"),
    (0.20, "specificity"),
    (0.15, "completeness"),
    (0.15, "structure"),
    (0.15, "efficiency"),
    (0.15, "agent_readiness"),
];

impl QualityScore {
    pub fn from_dimensions(
        dimensions: [u8; 6],
        strengths: Vec<String>,
        improvements: Vec<String>,
    ) -> Self {
        let overall = dimensions
            .iter()
            .zip(WEIGHTS.iter())
            .map(|(score, (weight, _))| f32::from(*score) * weight)
            .sum();

        let [clarity, specificity, completeness, structure, efficiency, agent_readiness] =
            dimensions;

        Self {
            clarity,
            specificity,
            completeness,
            structure,
            efficiency,
            agent_readiness,
            overall,
            strengths,
            improvements,
        }
    }

    pub fn grade(&self) -> Grade {
        if self.overall >= 90.0 {
            Grade::A
        } else if self.overall >= 80.0 {
            Grade::B
        } else if self.overall >= 70.0 {
            Grade::C
        } else if self.overall >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    /// Dimension names paired with scores, lowest first. Refinement targets
    /// the head of this list.
    pub fn ranked_dimensions(&self) -> Vec<(&'static str, u8)> {
        let mut ranked = vec![
            ("clarity", self.clarity),
            ("specificity", self.specificity),
            ("completeness", self.completeness),
            ("structure", self.structure),
            ("efficiency", self.efficiency),
            ("agent_readiness", self.agent_readiness),
        ];
        ranked.sort_by_key(|(_, score)| *score);
        ranked
    }

    /// Human-readable evaluation report.
    pub fn report(&self) -> String {
        let mut out = format!(
            "# EVALUATION REPORT\n\n\
             Overall: {:.1}/100 (Grade: {})\n\n\
             - Clarity: {}/100\n\
             - Specificity: {}/100\n\
             - Completeness: {}/100\n\
             - Structure: {}/100\n\
             - Efficiency: {}/100\n\
             - Agent-Readiness: {}/100\n",
            self.overall,
            self.grade(),
            self.clarity,
            self.specificity,
            self.completeness,
            self.structure,
            self.efficiency,
            self.agent_readiness,
        );

        if !self.strengths.is_empty() {
            out.push_str("\nStrengths:\n");
            for s in &self.strengths {
                out.push_str(&format!("- {}\n", s));
            }
        }
        if !self.improvements.is_empty() {
            out.push_str("\nSuggested improvements:\n");
            for i in &self.improvements {
                out.push_str(&format!("- {}\n", i));
            }
        }
        out
    }
}
