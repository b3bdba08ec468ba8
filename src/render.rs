//! Materializes workflows for AI tooling and for people.
//!
//! The prompt form is XML-tagged so a model can tell instructions, steps and
//! examples apart; every user-supplied value is escaped. Steps are emitted in
//! position order, which is the order the sequence already stores them in.

use crate::domain::{Workflow, WorkflowView};
use std::fmt::Write;

/// Wraps content in an XML tag with the given name.
///
/// # Example
/// ```
/// use directive_studio::render::xml_tag;
/// assert_eq!(xml_tag("name", "deploy"), "<name>deploy</name>");
/// ```
pub fn xml_tag(name: &str, content: &str) -> String {
    format!("<{}>{}</{}>", name, content, name)
}

/// Wraps multi-line content in an XML tag on its own lines (no escaping).
pub fn xml_tag_raw(name: &str, content: &str) -> String {
    format!("<{}>\n{}\n</{}>", name, content.trim(), name)
}

/// Escapes XML special characters in user-supplied values.
///
/// # Example
/// ```
/// use directive_studio::render::xml_escape;
/// assert_eq!(xml_escape("a < b & c"), "a &lt; b &amp; c");
/// ```
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Renders a workflow as an XML-tagged prompt fragment.
pub fn render_prompt(workflow: &Workflow) -> String {
    let mut sections = vec![
        xml_tag("name", &xml_escape(workflow.name())),
        xml_tag("description", &xml_escape(workflow.description())),
    ];

    if let Some(content) = workflow.content() {
        sections.push(xml_tag_raw("instructions", &xml_escape(content)));
    }

    if !workflow.steps().is_empty() {
        let steps: Vec<String> = workflow
            .steps()
            .iter()
            .map(|step| {
                format!(
                    "<step position=\"{}\">{}</step>",
                    step.position(),
                    xml_escape(step.content())
                )
            })
            .collect();
        sections.push(xml_tag_raw("steps", &steps.join("\n")));
    }

    if !workflow.examples().is_empty() {
        let examples: Vec<String> = workflow
            .examples()
            .iter()
            .map(|example| {
                let mut fields = vec![
                    xml_tag("scenario", &xml_escape(example.scenario())),
                    xml_tag("input", &xml_escape(example.input())),
                    xml_tag("output", &xml_escape(example.output())),
                ];
                if let Some(explanation) = example.explanation() {
                    fields.push(xml_tag("explanation", &xml_escape(explanation)));
                }
                xml_tag_raw("example", &fields.join("\n"))
            })
            .collect();
        sections.push(xml_tag_raw("examples", &examples.join("\n")));
    }

    format!(
        "<workflow id=\"{}\">\n{}\n</workflow>",
        xml_escape(workflow.id().as_str()),
        sections.join("\n")
    )
}

/// Human-readable dump of one workflow, ids included so they can be
/// passed back to the CLI.
pub fn render_text(workflow: &Workflow) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", workflow.name(), workflow.state());
    let _ = writeln!(out, "id: {}", workflow.id());
    let _ = writeln!(out, "updated: {}", workflow.updated_at());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", workflow.description());

    if let Some(content) = workflow.content() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", content);
    }

    let _ = writeln!(out);
    if workflow.steps().is_empty() {
        let _ = writeln!(out, "Steps: (none)");
    } else {
        let _ = writeln!(out, "Steps:");
        for step in workflow.steps() {
            let _ = writeln!(out, "  {}. {}  ({})", step.position(), step.content(), step.id());
        }
    }

    if !workflow.examples().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Examples:");
        for example in workflow.examples() {
            let _ = writeln!(out, "  - {}  ({})", example.scenario(), example.id());
            let _ = writeln!(out, "    input:  {}", example.input());
            let _ = writeln!(out, "    output: {}", example.output());
            if let Some(explanation) = example.explanation() {
                let _ = writeln!(out, "    why:    {}", explanation);
            }
        }
    }

    out
}

/// One line per workflow summary.
pub fn render_listing(views: &[WorkflowView]) -> String {
    if views.is_empty() {
        return "No workflows.\n".to_string();
    }

    let mut out = String::new();
    for view in views {
        let id = view.directive_id().map(|id| id.as_str()).unwrap_or("?");
        let state = view
            .state()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let _ = writeln!(
            out,
            "{:<32} {:<10} {:>3} steps {:>3} examples  {}",
            id,
            state,
            view.step_count(),
            view.example_count(),
            view.name().unwrap_or("")
        );
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
