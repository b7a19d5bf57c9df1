//! CLI output formatting for all pipeline stages.
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Export
//!
//! ```text
//! [1/2] 1AbC...xyz
//! [2/2] 1DeF...uvw
//! ```
//!
//! ## Index
//!
//! ```text
//! Technologies
//! 001 bigquery (1 lesson)
//!     001 Intro to BigQuery → learnings/bigquery-intro
//! 002 gcp (2 lessons)
//!     001 Intro to BigQuery → learnings/bigquery-intro
//!     002 Compute Engine Basics → learnings/gce-basics
//!
//! Untagged
//!     Draft Lesson → learnings/draft
//! ```
//!
//! ## Build summary
//!
//! ```text
//! Exported 2 documents
//! Indexed 2 lessons under 2 technologies
//! Rendered build/index.html
//! Copied 3 static files (css, favicon.ico)
//! ```

use crate::aggregate::{Catalog, LessonWarning};
use crate::export::ExportEvent;
use crate::pipeline::BuildReport;
use crate::render::Templates;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Lessons without a title are shown by id.
fn lesson_label(title: &str, id: &str) -> String {
    if title.trim().is_empty() {
        format!("({id})")
    } else {
        title.to_string()
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format a single export progress event. Only starts are shown; the
/// converter prints its own output for the rest.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Started {
            index,
            total,
            document,
        } => vec![format!("[{}/{}] {}", index + 1, total, document)],
        ExportEvent::Finished { .. } => Vec::new(),
    }
}

pub fn print_export_event(event: &ExportEvent) {
    for line in format_export_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Index
// ============================================================================

/// Format the tag index: each technology with the lessons filed under it,
/// then any lessons that carry no tag at all.
pub fn format_catalog(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Technologies".to_string());
    let mut techs = catalog.technologies();
    techs.sort_unstable();
    if techs.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, tech) in techs.iter().enumerate() {
        let lessons = catalog.bucket(tech);
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            tech,
            plural(lessons.len(), "lesson", "lessons")
        ));
        for (j, lesson) in lessons.iter().enumerate() {
            lines.push(format!(
                "{}{} {} → {}",
                indent(1),
                format_index(j + 1),
                lesson_label(&lesson.title, &lesson.id),
                lesson.url
            ));
        }
    }

    let untagged: Vec<_> = catalog
        .lessons()
        .iter()
        .filter(|l| l.tags.is_empty())
        .collect();
    if !untagged.is_empty() {
        lines.push(String::new());
        lines.push("Untagged".to_string());
        for lesson in untagged {
            lines.push(format!(
                "{}{} → {}",
                indent(1),
                lesson_label(&lesson.title, &lesson.id),
                lesson.url
            ));
        }
    }

    lines
}

pub fn print_catalog(catalog: &Catalog) {
    for line in format_catalog(catalog) {
        println!("{}", line);
    }
}

pub fn format_warnings(warnings: &[LessonWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Warnings".to_string()];
    for w in warnings {
        lines.push(format!("{}{}: {}", indent(1), w.lesson, w.message));
    }
    lines
}

pub fn print_warnings(warnings: &[LessonWarning]) {
    for line in format_warnings(warnings) {
        println!("{}", line);
    }
}

// ============================================================================
// Build summary
// ============================================================================

/// Format the end-of-build summary, with paths shown relative to `root`.
pub fn format_build_report(report: &BuildReport, root: &Path) -> Vec<String> {
    let landing = report
        .landing
        .strip_prefix(root)
        .unwrap_or(&report.landing)
        .display()
        .to_string();

    let mut lines = vec![
        format!(
            "Exported {}",
            plural(report.export.documents.len(), "document", "documents")
        ),
        format!(
            "Indexed {} under {}",
            plural(report.catalog.lessons().len(), "lesson", "lessons"),
            plural(
                report.catalog.index().len(),
                "technology",
                "technologies"
            )
        ),
        format!("Rendered {}", landing),
    ];

    let copied = plural(report.statics.files, "static file", "static files");
    if report.statics.entries.is_empty() {
        lines.push(format!("Copied {}", copied));
    } else {
        lines.push(format!(
            "Copied {} ({})",
            copied,
            report.statics.entries.join(", ")
        ));
    }

    if !report.warnings.is_empty() {
        lines.push(format!(
            "{} (listed above)",
            plural(report.warnings.len(), "warning", "warnings")
        ));
    }
    lines
}

pub fn print_build_report(report: &BuildReport, root: &Path) {
    for line in format_build_report(report, root) {
        println!("{}", line);
    }
}

/// Format the result of `check`: source count and loaded templates with
/// their minified sizes.
pub fn format_check(documents: usize, templates: &Templates) -> Vec<String> {
    let mut lines = vec![format!(
        "Sources: {}",
        plural(documents, "document", "documents")
    )];
    lines.push("Templates".to_string());
    for (i, name) in templates.names().iter().enumerate() {
        let size = templates.source(name).map(|s| s.len()).unwrap_or(0);
        lines.push(format!(
            "{}{} {} ({})",
            indent(1),
            format_index(i + 1),
            name,
            plural(size, "byte", "bytes")
        ));
    }
    lines
}

pub fn print_check(documents: usize, templates: &Templates) {
    for line in format_check(documents, templates) {
        println!("{}", line);
    }
}
