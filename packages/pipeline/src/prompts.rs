// ABOUTME: Instruction templates for every generation call in the pipeline
// ABOUTME: Templates carry the loop-prevention constraints as first-class instructions

use promptforge_core::{DocumentMode, EngineeringRequest, ThinkingAnalysis, ThinkingMode};

/// System instruction shared by all generation calls.
pub const SYSTEM_PROMPT: &str = "You are PromptForge, a document engineering service. \
You write precise, well-structured text and follow formatting instructions exactly. \
You never add meta-commentary about your own process and never repeat yourself.";

/// Constraints appended to any call whose output is parsed by section
/// header. Runaway repetition is a known failure mode of unbounded
/// generation; forbidding it up front is part of the template contract.
const LOOP_PREVENTION: &str = "Do not add commentary before or after the document. \
Do not restate instructions. Do not write phrases like \"final answer\" or \
\"here is the document\". Each section appears exactly once.";

fn mode_goal(mode: ThinkingMode) -> &'static str {
    match mode {
        ThinkingMode::Logical => {
            "identify cause-and-effect relationships, contradictions, and unstated assumptions"
        }
        ThinkingMode::Analytical => {
            "break the request into its components: action, subject, constraints, context, output format"
        }
        ThinkingMode::Computational => {
            "identify structured patterns: sequential steps, conditions, iteration, parallelism"
        }
        ThinkingMode::Outcome => {
            "focus on the end result: target audience, use case, success criteria, consumption method"
        }
    }
}

/// One of the four independent analysis calls.
pub fn thinking_prompt(mode: ThinkingMode, description: &str) -> String {
    format!(
        "Thinking mode: {mode}\n\n\
         Analyze the following product idea. Your job is to {goal}.\n\n\
         Idea:\n{description}\n\n\
         Reply with a short analysis (at most 120 words), as plain prose. \
         No headers, no lists of more than five items.",
        mode = mode.as_str(),
        goal = mode_goal(mode),
    )
}

fn section_instructions(mode: DocumentMode) -> String {
    let headers: Vec<String> = mode
        .sections()
        .iter()
        .map(|name| format!("## {}", name))
        .collect();
    format!(
        "The document has exactly these sections, in this order, each introduced \
         by its markdown header on its own line:\n{}\n\n\
         Every section must be non-empty and at most {} words.",
        headers.join("\n"),
        mode.section_word_limit(),
    )
}

fn analysis_context(analysis: &ThinkingAnalysis) -> String {
    let mut lines = Vec::new();
    for mode in ThinkingMode::ALL {
        if let Some(text) = analysis.get(mode) {
            lines.push(format!("[{}] {}", mode.as_str(), text.trim()));
        }
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("Analyst notes on the idea:\n{}\n\n", lines.join("\n"))
    }
}

/// The single structuring call. `strict` is the one-shot retry issued when
/// the first generation omitted a mandated header.
pub fn structuring_prompt(
    request: &EngineeringRequest,
    analysis: &ThinkingAnalysis,
    history: &[String],
    strict: bool,
) -> String {
    let document_kind = match request.mode {
        DocumentMode::Prompt => "a professional prompt for a language model",
        DocumentMode::Prd => "a Product Requirements Document",
    };

    let history_block = if history.is_empty() {
        String::new()
    } else {
        format!(
            "Earlier conversation with this user:\n{}\n\n",
            history.join("\n")
        )
    };

    let strictness = if strict {
        "\n\nYour previous output omitted required section headers. This time, \
         reproduce every header from the list verbatim, each on its own line, \
         before its section body."
    } else {
        ""
    };

    format!(
        "Write {document_kind} from this idea:\n{description}\n\n\
         {history}{analysis}{sections}\n\n{loop_prevention}{strictness}\n\n\
         Produce the document now.",
        document_kind = document_kind,
        description = request.description,
        history = history_block,
        analysis = analysis_context(analysis),
        sections = section_instructions(request.mode),
        loop_prevention = LOOP_PREVENTION,
        strictness = strictness,
    )
}

/// The rewrite call issued by a refinement pass, aimed at the
/// lowest-scoring dimensions.
pub fn refinement_prompt(
    mode: DocumentMode,
    draft_text: &str,
    focus_dimensions: &[&str],
    pass: u8,
) -> String {
    let focus = focus_dimensions.join(" and ");
    let emphasis = if pass == 1 {
        "Focus on structural improvements."
    } else {
        "Focus on fine-tuning and polish."
    };

    format!(
        "Rewrite the document below to improve its {focus}. {emphasis}\n\n\
         Current document:\n{draft}\n\n\
         {sections}\n\n{loop_prevention}",
        focus = focus,
        emphasis = emphasis,
        draft = draft_text,
        sections = section_instructions(mode),
        loop_prevention = LOOP_PREVENTION,
    )
}
