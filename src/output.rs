//! CLI output formatting for the build.
//!
//! # Output Format
//!
//! ```text
//! vendor/ → 3 files
//! public/ → 2 files
//! No assets directory found
//! Found 2 locales: en fr
//!
//! Pages (2 pages × 2 locales)
//! 001 blog/first-post.html → en/blog/first-post.html
//! 002 blog/first-post.html → fr/blog/first-post.html
//! 003 index.html → en/index.html
//!     FAILED index.html [fr]: Could not render page ...
//!
//! Rendered 2 pages (3 outputs), 1 failed
//! ==> Build complete: build
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Build events
//! arrive from worker threads in completion order; [`EventFormatter`]
//! numbers page outputs as they come.

use crate::assets::CopyStats;
use crate::pages::PageEvent;
use crate::site::{BuildEvent, BuildSummary, StaticOutcome};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn copy_detail(stats: &CopyStats) -> String {
    let mut detail = plural(stats.files, "file", "files");
    if stats.failed > 0 {
        detail.push_str(&format!(", {} failed", stats.failed));
    }
    detail
}

// ============================================================================
// Static trees
// ============================================================================

/// Format the result of copying one static tree.
pub fn format_static_outcome(outcome: &StaticOutcome) -> Vec<String> {
    let line = match outcome {
        StaticOutcome::Copied { name, stats } => {
            format!("{}/ \u{2192} {}", name, copy_detail(stats))
        }
        StaticOutcome::Missing { name } => format!("No {} directory found", name),
        StaticOutcome::Failed { name, error } => format!("{}/ FAILED: {}", name, error),
    };
    vec![line]
}

// ============================================================================
// Locales
// ============================================================================

pub fn format_locales(codes: &[String]) -> Vec<String> {
    if codes.is_empty() {
        vec!["No locales found, building single language version".to_string()]
    } else {
        vec![format!(
            "Found {}: {}",
            plural(codes.len(), "locale", "locales"),
            codes.join(" ")
        )]
    }
}

// ============================================================================
// Page events
// ============================================================================

/// Stateful formatter for the build event stream.
///
/// Keeps the running output index so page lines are numbered in arrival
/// order.
#[derive(Debug, Default)]
pub struct EventFormatter {
    rendered: usize,
}

impl EventFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(&mut self, event: &BuildEvent) -> Vec<String> {
        match event {
            BuildEvent::Static(outcome) => format_static_outcome(outcome),
            BuildEvent::Locales(codes) => format_locales(codes),
            BuildEvent::Page(page) => self.format_page(page),
        }
    }

    fn format_page(&mut self, event: &PageEvent) -> Vec<String> {
        match event {
            PageEvent::Started { pages, locales } => {
                let header = if locales.is_empty() {
                    format!("Pages ({})", plural(*pages, "page", "pages"))
                } else {
                    format!(
                        "Pages ({} \u{d7} {})",
                        plural(*pages, "page", "pages"),
                        plural(locales.len(), "locale", "locales")
                    )
                };
                vec![String::new(), header]
            }
            PageEvent::Rendered { page, output, .. } => {
                self.rendered += 1;
                vec![format!(
                    "{} {} \u{2192} {}",
                    format_index(self.rendered),
                    page.display(),
                    output.display()
                )]
            }
            PageEvent::Failed {
                page,
                locale,
                error,
            } => {
                let tag = locale
                    .as_ref()
                    .map(|code| format!(" [{code}]"))
                    .unwrap_or_default();
                vec![format!("    FAILED {}{}: {}", page.display(), tag, error)]
            }
        }
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the end-of-build summary line(s).
pub fn format_summary(summary: &BuildSummary) -> Vec<String> {
    let mut lines = vec![String::new()];
    match &summary.pages {
        Some(report) => lines.push(format!(
            "Rendered {} ({}), {} failed",
            plural(report.pages, "page", "pages"),
            plural(report.outputs, "output", "outputs"),
            report.failures.len()
        )),
        None => lines.push("No pages directory found".to_string()),
    }
    lines.push(format!(
        "==> Build complete: {}",
        summary.output.display()
    ));
    lines
}

pub fn print_summary(summary: &BuildSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::PipelineReport;
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
        assert_eq!(plural(3, "page", "pages"), "3 pages");
    }

    // =========================================================================
    // Static / locale sections
    // =========================================================================

    #[test]
    fn format_static_lines() {
        let copied = StaticOutcome::Copied {
            name: "vendor".to_string(),
            stats: CopyStats {
                files: 3,
                dirs: 1,
                bytes: 10,
                failed: 0,
            },
        };
        let missing = StaticOutcome::Missing {
            name: "public".to_string(),
        };
        let partial = StaticOutcome::Copied {
            name: "assets".to_string(),
            stats: CopyStats {
                files: 1,
                dirs: 0,
                bytes: 1,
                failed: 2,
            },
        };
        assert_eq!(format_static_outcome(&copied), vec!["vendor/ \u{2192} 3 files"]);
        assert_eq!(
            format_static_outcome(&missing),
            vec!["No public directory found"]
        );
        assert_eq!(
            format_static_outcome(&partial),
            vec!["assets/ \u{2192} 1 file, 2 failed"]
        );
    }

    #[test]
    fn format_locales_lists_codes() {
        let codes = vec!["en".to_string(), "fr".to_string()];
        assert_eq!(format_locales(&codes), vec!["Found 2 locales: en fr"]);
    }

    #[test]
    fn format_locale_event() {
        let mut f = EventFormatter::new();
        let lines = f.format(&BuildEvent::Locales(vec!["de".to_string()]));
        assert_eq!(lines, vec!["Found 1 locale: de"]);
    }

    #[test]
    fn format_locales_none() {
        assert_eq!(
            format_locales(&[]),
            vec!["No locales found, building single language version"]
        );
    }

    // =========================================================================
    // Page event formatting
    // =========================================================================

    #[test]
    fn format_started_with_locales() {
        let mut f = EventFormatter::new();
        let lines = f.format(&BuildEvent::Page(PageEvent::Started {
            pages: 2,
            locales: vec!["en".to_string(), "fr".to_string()],
        }));
        assert_eq!(lines, vec!["", "Pages (2 pages \u{d7} 2 locales)"]);
    }

    #[test]
    fn format_started_unlocalized() {
        let mut f = EventFormatter::new();
        let lines = f.format(&BuildEvent::Page(PageEvent::Started {
            pages: 1,
            locales: vec![],
        }));
        assert_eq!(lines[1], "Pages (1 page)");
    }

    #[test]
    fn format_rendered_numbers_in_arrival_order() {
        let mut f = EventFormatter::new();
        let event = |locale: &str| {
            BuildEvent::Page(PageEvent::Rendered {
                page: PathBuf::from("a/b.html"),
                locale: Some(locale.to_string()),
                output: PathBuf::from(format!("{locale}/a/b.html")),
                bytes: 2,
            })
        };
        assert_eq!(
            f.format(&event("en")),
            vec!["001 a/b.html \u{2192} en/a/b.html"]
        );
        assert_eq!(
            f.format(&event("fr")),
            vec!["002 a/b.html \u{2192} fr/a/b.html"]
        );
    }

    #[test]
    fn format_failed_includes_locale() {
        let mut f = EventFormatter::new();
        let lines = f.format(&BuildEvent::Page(PageEvent::Failed {
            page: PathBuf::from("loop.html"),
            locale: Some("fr".to_string()),
            error: "boom".to_string(),
        }));
        assert_eq!(lines, vec!["    FAILED loop.html [fr]: boom"]);
    }

    // =========================================================================
    // Summary
    // =========================================================================

    #[test]
    fn format_summary_with_pages() {
        let summary = BuildSummary {
            output: PathBuf::from("build"),
            statics: vec![],
            locales: vec![],
            pages: Some(PipelineReport {
                pages: 2,
                outputs: 4,
                failures: vec![],
            }),
        };
        assert_eq!(
            format_summary(&summary),
            vec![
                "",
                "Rendered 2 pages (4 outputs), 0 failed",
                "==> Build complete: build",
            ]
        );
    }

    #[test]
    fn format_summary_without_pages() {
        let summary = BuildSummary {
            output: PathBuf::from("build"),
            statics: vec![],
            locales: vec![],
            pages: None,
        };
        assert_eq!(format_summary(&summary)[1], "No pages directory found");
    }
}
