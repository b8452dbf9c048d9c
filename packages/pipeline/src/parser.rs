// ABOUTME: Extracts section-structured drafts from raw model output
// ABOUTME: Tolerant of heading level and case, strict about the section set

use promptforge_core::{DocumentMode, Draft, Section};

/// Splits raw model text into sections and validates them against the
/// mandated set for `mode`. Returns the problems found when the output
/// is unusable, so the caller can decide between retry and fallback.
pub fn parse_draft(mode: DocumentMode, raw: &str) -> Result<Draft, Vec<String>> {
    let sections = split_sections(raw);
    if sections.is_empty() {
        return Err(vec!["no section headers found in output".to_string()]);
    }
    Draft::from_sections(mode, sections)
}

/// Scans for markdown headers and collects the body under each. Headers
/// of any level are accepted; models drift between `##` and `#`.
fn split_sections(raw: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in raw.lines() {
        if let Some(name) = header_name(line) {
            if let Some((name, body)) = current.take() {
                sections.push(Section {
                    name,
                    content: body.join("\n").trim().to_string(),
                });
            }
            current = Some((name, Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
        // Prose before the first header is discarded.
    }
    if let Some((name, body)) = current {
        sections.push(Section {
            name,
            content: body.join("\n").trim().to_string(),
        });
    }
    sections
}

fn header_name(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }
    let mut name = trimmed.trim_start_matches('#').trim();
    // Numbered headers ("## 1. Role") carry the same name.
    if let Some(dot) = name.find(". ") {
        if name[..dot].chars().all(|c| c.is_ascii_digit()) && dot > 0 {
            name = name[dot + 2..].trim();
        }
    }
    if name.is_empty() {
        None
    } else {
        // Bold markers around headers are another common drift.
        Some(name.trim_matches('*').trim().to_string())
    }
}
