//! Build orchestration.
//!
//! One build runs these steps in order:
//!
//! ```text
//! 1. Create the output root           (fatal if it fails)
//! 2. Copy vendor/  → build/vendor/    (skipped with a notice if absent)
//! 3. Copy public/* → build/*          (contents, not the directory)
//! 4. Copy assets/  → build/assets/
//! 5. Load locale/*.json
//! 6. Render src/pages/** once per locale
//! ```
//!
//! Missing optional directories are notices, not errors. Per-file failures
//! are reported in the returned [`BuildSummary`].

use crate::assets::{self, AssetError, CopyStats};
use crate::config::{SiteConfig, SitePaths};
use crate::locale::{self, LocaleError, LocaleSet};
use crate::pages::{self, PageEvent, PipelineConfig, PipelineError, PipelineReport};
use crate::partials::DirPartials;
use crate::render::{RenderLimits, Renderer};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Could not create output directory {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Locale loading failed: {0}")]
    Locale(#[from] LocaleError),
    #[error("Page processing failed: {0}")]
    Pages(#[from] PipelineError),
}

/// How one static tree is placed into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticMode {
    /// `src/` → `<output>/<name>/`
    Tree,
    /// `src/*` → `<output>/*`
    Contents,
}

/// Result of copying one static tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticOutcome {
    Copied { name: String, stats: CopyStats },
    Missing { name: String },
    Failed { name: String, error: String },
}

/// Progress of a build, in the order steps happen.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    Static(StaticOutcome),
    Locales(Vec<String>),
    Page(PageEvent),
}

impl From<PageEvent> for BuildEvent {
    fn from(event: PageEvent) -> Self {
        BuildEvent::Page(event)
    }
}

/// Everything a build produced, for reporting.
#[derive(Debug)]
pub struct BuildSummary {
    pub output: PathBuf,
    pub statics: Vec<StaticOutcome>,
    pub locales: Vec<String>,
    /// `None` when there was no page directory.
    pub pages: Option<PipelineReport>,
}

impl BuildSummary {
    /// Number of individual failures across static copies and pages.
    pub fn failure_count(&self) -> usize {
        let statics: usize = self
            .statics
            .iter()
            .map(|s| match s {
                StaticOutcome::Copied { stats, .. } => stats.failed,
                StaticOutcome::Failed { .. } => 1,
                StaticOutcome::Missing { .. } => 0,
            })
            .sum();
        let pages = self.pages.as_ref().map_or(0, |r| r.failures.len());
        statics + pages
    }
}

/// Build the site rooted at `root` into the configured output directory.
///
/// Progress is streamed as [`BuildEvent`]s when a channel is given; the
/// sender is dropped before returning, so a receiver loop ends with the build.
pub fn build(
    config: &SiteConfig,
    root: &Path,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, BuildError> {
    let paths = config.resolve(root);

    fs::create_dir_all(&paths.output).map_err(|source| BuildError::OutputRoot {
        path: paths.output.clone(),
        source,
    })?;

    let statics = copy_statics(config, &paths);
    if let Some(tx) = &events {
        for outcome in &statics {
            tx.send(BuildEvent::Static(outcome.clone())).ok();
        }
    }

    let locales = locale::load_all(&paths.locales)?;
    let codes: Vec<String> = locales.codes().iter().map(|c| c.to_string()).collect();
    if locales.is_empty() {
        info!("No locales found, building single language version");
    } else {
        info!("Found {} locales: {}", codes.len(), codes.join(" "));
    }
    if let Some(tx) = &events {
        tx.send(BuildEvent::Locales(codes.clone())).ok();
    }

    let pages = if paths.pages.is_dir() {
        Some(render_pages(config, &paths, &locales, events)?)
    } else {
        info!("No pages directory found at {}", paths.pages.display());
        None
    };

    Ok(BuildSummary {
        output: paths.output,
        statics,
        locales: codes,
        pages,
    })
}

fn copy_statics(config: &SiteConfig, paths: &SitePaths) -> Vec<StaticOutcome> {
    let p = &config.paths;
    [
        (p.vendor.as_str(), &paths.vendor, StaticMode::Tree),
        (p.public.as_str(), &paths.public, StaticMode::Contents),
        (p.assets.as_str(), &paths.assets, StaticMode::Tree),
    ]
    .into_iter()
    .map(|(name, src, mode)| copy_static(name, src, &paths.output, mode))
    .collect()
}

/// Copy one optional static tree into the output root.
pub fn copy_static(name: &str, src: &Path, output: &Path, mode: StaticMode) -> StaticOutcome {
    let name = name.to_string();
    if !src.is_dir() {
        info!("No {} directory found", name);
        return StaticOutcome::Missing { name };
    }
    let result: Result<CopyStats, AssetError> = match mode {
        StaticMode::Tree => {
            let target = Path::new(&name)
                .file_name()
                .map(|n| output.join(n))
                .unwrap_or_else(|| output.to_path_buf());
            assets::copy_tree(src, &target)
        }
        StaticMode::Contents => assets::copy_contents(src, output),
    };
    match result {
        Ok(stats) => StaticOutcome::Copied { name, stats },
        Err(e) => {
            warn!("Copying {} failed: {e}", name);
            StaticOutcome::Failed {
                name,
                error: e.to_string(),
            }
        }
    }
}

fn render_pages(
    config: &SiteConfig,
    paths: &SitePaths,
    locales: &LocaleSet,
    events: Option<Sender<BuildEvent>>,
) -> Result<PipelineReport, PipelineError> {
    let partials = DirPartials::new(&paths.partials);
    let renderer = Renderer::new(&partials, RenderLimits::from_config(&config.render));
    let pipeline = PipelineConfig {
        page_root: paths.pages.clone(),
        output_root: paths.output.clone(),
        extension: config.render.page_extension.clone(),
    };
    pages::run(&pipeline, &renderer, locales, events)
}
