//! Page pipeline: renders every page template once per locale.
//!
//! ## Fan-Out
//!
//! With locales `en` and `fr`, one source page produces one output per
//! locale, namespaced by locale code:
//!
//! ```text
//! src/pages/                 build/
//! ├── index.html       →     ├── en/index.html
//! └── blog/post.html         ├── en/blog/post.html
//!                            ├── fr/index.html
//!                            └── fr/blog/post.html
//! ```
//!
//! With no locales, each page is rendered once without a locale table and
//! written to `build/<relative path>`.
//!
//! Files without the page extension are ignored.
//!
//! ## Failure Isolation
//!
//! A page that cannot be read, a render that fails, or an output that
//! cannot be written is recorded in the [`PipelineReport`] and logged; every
//! other page and locale still renders. Only failures at the roots (page
//! directory not walkable, output root not creatable) abort the run.
//!
//! ## Parallel Processing
//!
//! Pages are rendered in parallel with [rayon](https://docs.rs/rayon), and
//! each page fans out across its locales in parallel too. Renders share no
//! mutable state: the locale set is read-only, partials are only read, and
//! every (page, locale) pair owns a distinct output path. Progress is
//! streamed as [`PageEvent`]s over an optional channel.

use crate::locale::{LocaleSet, LocaleTable};
use crate::partials::PartialSource;
use crate::render::{RenderError, Renderer};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Failure of one page, or one (page, locale) output.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Could not read page {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not render page {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure that stops the whole pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not create output root {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not walk page directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Progress events emitted while rendering.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// Rendering of all discovered pages is about to start.
    Started { pages: usize, locales: Vec<String> },
    /// One page was rendered and written for one locale (or unlocalized).
    Rendered {
        page: PathBuf,
        locale: Option<String>,
        output: PathBuf,
        bytes: usize,
    },
    /// One page, or one locale of a page, failed.
    Failed {
        page: PathBuf,
        locale: Option<String>,
        error: String,
    },
}

/// A recorded per-page failure.
#[derive(Debug)]
pub struct PageFailure {
    /// Page path relative to the page root.
    pub page: PathBuf,
    /// Locale being rendered, `None` for unlocalized builds or read failures.
    pub locale: Option<String>,
    pub error: PageError,
}

/// Outcome of a pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Number of page templates discovered.
    pub pages: usize,
    /// Number of outputs written (pages × locales, minus failures).
    pub outputs: usize,
    pub failures: Vec<PageFailure>,
}

impl PipelineReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Page discovery and rendering settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub page_root: PathBuf,
    pub output_root: PathBuf,
    /// Extension (without the dot) identifying page templates.
    pub extension: String,
}

/// Output path for a page: `<output>/<code>/<rel>` or `<output>/<rel>`.
pub fn output_path(output_root: &Path, locale: Option<&LocaleTable>, rel: &Path) -> PathBuf {
    match locale {
        Some(table) => output_root.join(table.code()).join(rel),
        None => output_root.join(rel),
    }
}

/// Find every page template under `root`, as paths relative to `root`,
/// sorted.
pub fn discover_pages(root: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(PipelineError::Walk {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                warn!("Skipping unreadable page path: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let is_page = entry
            .path()
            .extension()
            .map(|e| e == extension)
            .unwrap_or(false);
        if !is_page {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            pages.push(rel.to_path_buf());
        }
    }
    pages.sort();
    Ok(pages)
}

/// Render every page under the page root into the output root.
///
/// Creates the output root first; failing to do so is the only write error
/// that aborts the run.
///
/// Progress is sent as [`PageEvent`]s converted into the channel's event
/// type, so callers can merge page progress into a wider event stream.
pub fn run<P, E>(
    config: &PipelineConfig,
    renderer: &Renderer<'_, P>,
    locales: &LocaleSet,
    events: Option<Sender<E>>,
) -> Result<PipelineReport, PipelineError>
where
    P: PartialSource + ?Sized,
    E: From<PageEvent> + Send,
{
    fs::create_dir_all(&config.output_root).map_err(|source| PipelineError::OutputRoot {
        path: config.output_root.clone(),
        source,
    })?;

    let pages = discover_pages(&config.page_root, &config.extension)?;

    if let Some(tx) = &events {
        tx.send(
            PageEvent::Started {
                pages: pages.len(),
                locales: locales.codes().iter().map(|c| c.to_string()).collect(),
            }
            .into(),
        )
        .ok();
    }

    let results: Vec<PageOutcome> = pages
        .par_iter()
        .map_with(events, |tx, rel| {
            render_page(config, renderer, locales, rel, tx.as_ref())
        })
        .collect();

    let mut report = PipelineReport {
        pages: pages.len(),
        ..Default::default()
    };
    for outcome in results {
        report.outputs += outcome.written;
        report.failures.extend(outcome.failures);
    }
    Ok(report)
}

#[derive(Debug, Default)]
struct PageOutcome {
    written: usize,
    failures: Vec<PageFailure>,
}

/// Read one page and render it for every locale (or once, unlocalized).
fn render_page<P, E>(
    config: &PipelineConfig,
    renderer: &Renderer<'_, P>,
    locales: &LocaleSet,
    rel: &Path,
    events: Option<&Sender<E>>,
) -> PageOutcome
where
    P: PartialSource + ?Sized,
    E: From<PageEvent> + Send,
{
    let source_path = config.page_root.join(rel);
    let text = match fs::read_to_string(&source_path) {
        Ok(text) => text,
        Err(source) => {
            let error = PageError::Read {
                path: source_path,
                source,
            };
            return PageOutcome {
                written: 0,
                failures: vec![record_failure(rel, None, error, events)],
            };
        }
    };

    let targets: Vec<Option<&LocaleTable>> = if locales.is_empty() {
        vec![None]
    } else {
        locales.tables().iter().map(Some).collect()
    };

    let results: Vec<Result<(), PageFailure>> = targets
        .par_iter()
        .map(|&locale| {
            render_one(config, renderer, &text, rel, locale, events)
                .map_err(|error| record_failure(rel, locale, error, events))
        })
        .collect();

    let mut outcome = PageOutcome::default();
    for result in results {
        match result {
            Ok(()) => outcome.written += 1,
            Err(failure) => outcome.failures.push(failure),
        }
    }
    outcome
}

fn render_one<P, E>(
    config: &PipelineConfig,
    renderer: &Renderer<'_, P>,
    text: &str,
    rel: &Path,
    locale: Option<&LocaleTable>,
    events: Option<&Sender<E>>,
) -> Result<(), PageError>
where
    P: PartialSource + ?Sized,
    E: From<PageEvent> + Send,
{
    let rendered = renderer
        .render(text, locale)
        .map_err(|source| PageError::Render {
            path: config.page_root.join(rel),
            source,
        })?;

    let out_path = output_path(&config.output_root, locale, rel);
    if let Some(parent) = out_path.parent() {
        // create_dir_all tolerates a sibling worker creating the same
        // directory concurrently.
        fs::create_dir_all(parent).map_err(|source| PageError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&out_path, &rendered).map_err(|source| PageError::Write {
        path: out_path.clone(),
        source,
    })?;

    if let Some(tx) = events {
        let output = out_path
            .strip_prefix(&config.output_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| out_path.clone());
        tx.send(
            PageEvent::Rendered {
                page: rel.to_path_buf(),
                locale: locale.map(|l| l.code().to_string()),
                output,
                bytes: rendered.len(),
            }
            .into(),
        )
        .ok();
    }
    Ok(())
}

fn record_failure<E: From<PageEvent>>(
    rel: &Path,
    locale: Option<&LocaleTable>,
    error: PageError,
    events: Option<&Sender<E>>,
) -> PageFailure {
    let locale = locale.map(|l| l.code().to_string());
    match &locale {
        Some(code) => warn!("[{code}] {error}"),
        None => warn!("{error}"),
    }
    if let Some(tx) = events {
        tx.send(
            PageEvent::Failed {
                page: rel.to_path_buf(),
                locale: locale.clone(),
                error: error.to_string(),
            }
            .into(),
        )
        .ok();
    }
    PageFailure {
        page: rel.to_path_buf(),
        locale,
        error,
    }
}
