// ABOUTME: Renders a finished draft into the requested output style
// ABOUTME: Pure text assembly, deterministic, section content passes through untouched

use promptforge_core::{Draft, OutputStyle};

/// Connectors used between sections in the conversational style, cycled
/// in order so rendering stays deterministic.
const CONNECTORS: [&str; 3] = ["Building on that,", "With that in place,", "Finally,"];

/// Renders `draft` in `style`. Never mutates section content and never
/// calls a model; the same draft and style always give the same string.
pub fn format(draft: &Draft, style: OutputStyle) -> String {
    match style {
        OutputStyle::Structured => structured(draft),
        OutputStyle::Minimal => minimal(draft),
        OutputStyle::Conversational => conversational(draft),
    }
}

fn structured(draft: &Draft) -> String {
    let blocks: Vec<String> = draft
        .sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            format!("## {}. {}\n{}", i + 1, section.name, section.content.trim())
        })
        .collect();
    blocks.join("\n\n")
}

fn minimal(draft: &Draft) -> String {
    let bodies: Vec<&str> = draft
        .sections
        .iter()
        .map(|section| section.content.trim())
        .collect();
    bodies.join("\n\n")
}

fn conversational(draft: &Draft) -> String {
    let mut out = String::new();
    for (i, section) in draft.sections.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
            out.push_str(CONNECTORS[(i - 1) % CONNECTORS.len()]);
            out.push(' ');
        }
        out.push_str(section.content.trim());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::test_utils::sample_prompt_document;
    use pretty_assertions::assert_eq;
    use promptforge_core::{DocumentMode, Section};

    fn draft() -> Draft {
        parser::parse_draft(DocumentMode::Prompt, &sample_prompt_document()).unwrap()
    }

    #[test]
    fn structured_numbers_every_header() {
        let rendered = format(&draft(), OutputStyle::Structured);
        assert!(rendered.contains("## 1. Role"));
        assert!(rendered.contains("## 4. Output Format"));
    }

    #[test]
    fn structured_round_trips_through_the_parser() {
        let original = draft();
        let rendered = format(&original, OutputStyle::Structured);
        let reparsed = parser::parse_draft(DocumentMode::Prompt, &rendered).unwrap();
        assert_eq!(reparsed, original);
        // And the re-render is a fixpoint.
        assert_eq!(format(&reparsed, OutputStyle::Structured), rendered);
    }

    #[test]
    fn minimal_drops_headers_but_keeps_every_body() {
        let original = draft();
        let rendered = format(&original, OutputStyle::Minimal);
        assert!(!rendered.contains("##"));
        for section in &original.sections {
            assert!(rendered.contains(section.content.trim()));
        }
    }

    #[test]
    fn conversational_keeps_content_and_adds_connectors() {
        let original = draft();
        let rendered = format(&original, OutputStyle::Conversational);
        for section in &original.sections {
            assert!(rendered.contains(section.content.trim()));
        }
        assert!(rendered.contains("Building on that,"));
        assert!(rendered.contains("Finally,"));
    }

    /// Rebuilds a draft from section bodies that already went through a
    /// render, so re-rendering can be checked for byte identity.
    fn reassemble(bodies: Vec<&str>) -> Draft {
        let sections = DocumentMode::Prompt
            .sections()
            .iter()
            .zip(bodies)
            .map(|(name, body)| Section {
                name: (*name).to_string(),
                content: body.to_string(),
            })
            .collect();
        Draft::from_sections(DocumentMode::Prompt, sections).unwrap()
    }

    #[test]
    fn minimal_render_is_a_fixpoint() {
        let rendered = format(&draft(), OutputStyle::Minimal);
        let reassembled = reassemble(rendered.split("\n\n").collect());
        assert_eq!(format(&reassembled, OutputStyle::Minimal), rendered);
    }

    #[test]
    fn conversational_render_is_a_fixpoint() {
        let rendered = format(&draft(), OutputStyle::Conversational);

        let bodies: Vec<&str> = rendered
            .split("\n\n")
            .enumerate()
            .map(|(i, segment)| {
                if i == 0 {
                    segment
                } else {
                    // Strip the connector the renderer prepended.
                    let connector = CONNECTORS[(i - 1) % CONNECTORS.len()];
                    segment
                        .strip_prefix(connector)
                        .expect("segment should open with its connector")
                        .trim_start()
                }
            })
            .collect();
        let reassembled = reassemble(bodies);
        assert_eq!(format(&reassembled, OutputStyle::Conversational), rendered);
    }

    #[test]
    fn rendering_is_deterministic_per_style() {
        let original = draft();
        for style in [
            OutputStyle::Structured,
            OutputStyle::Minimal,
            OutputStyle::Conversational,
        ] {
            assert_eq!(format(&original, style), format(&original, style));
        }
    }
}
