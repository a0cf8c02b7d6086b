//! Site configuration module.
//!
//! Handles loading, validating, and merging the optional `site.toml` in the
//! project root. Stock defaults are the base layer; the user file only needs
//! the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! output = "build"          # Output root, created on every build
//! locales = "locale"        # Directory of <code>.json locale files
//! partials = "src/partials" # Partials resolved as <partials>/<name>.html
//! pages = "src/pages"       # Page templates, discovered recursively
//! vendor = "vendor"         # Copied to <output>/vendor
//! public = "public"         # Contents copied to the output root
//! assets = "assets"         # Copied to <output>/assets
//!
//! [render]
//! max_output_bytes = 1048576 # Ceiling for one rendered page, per locale
//! max_include_depth = 32     # Maximum nesting of partial includes (1..=256)
//! page_extension = "html"    # Only files with this extension are pages
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Relative paths are resolved against the project root passed to
//! [`SiteConfig::resolve`], never against the process working directory
//! implicitly.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the project configuration, looked up in the project root.
pub const CONFIG_FILE: &str = "site.toml";

/// Upper bound for `render.max_include_depth`. Every include level is a
/// native stack frame pair, so the depth must stay well inside the stack of
/// a rayon worker.
pub const HARD_MAX_INCLUDE_DEPTH: usize = 256;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Source and output directory layout.
    pub paths: PathsConfig,
    /// Template rendering limits.
    pub render: RenderConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.max_output_bytes == 0 {
            return Err(ConfigError::Validation(
                "render.max_output_bytes must be greater than 0".into(),
            ));
        }
        if self.render.max_include_depth == 0
            || self.render.max_include_depth > HARD_MAX_INCLUDE_DEPTH
        {
            return Err(ConfigError::Validation(format!(
                "render.max_include_depth must be between 1 and {}",
                HARD_MAX_INCLUDE_DEPTH
            )));
        }
        let ext = &self.render.page_extension;
        if ext.is_empty() || ext.starts_with('.') {
            return Err(ConfigError::Validation(
                "render.page_extension must be non-empty and without a leading dot".into(),
            ));
        }
        if self.paths.output.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.output must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolve every configured directory against the project root.
    pub fn resolve(&self, root: &Path) -> SitePaths {
        let p = &self.paths;
        SitePaths {
            output: root.join(&p.output),
            locales: root.join(&p.locales),
            partials: root.join(&p.partials),
            pages: root.join(&p.pages),
            vendor: root.join(&p.vendor),
            public: root.join(&p.public),
            assets: root.join(&p.assets),
        }
    }
}

/// Directory layout, as written in `site.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub output: String,
    pub locales: String,
    pub partials: String,
    pub pages: String,
    pub vendor: String,
    pub public: String,
    pub assets: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: "build".to_string(),
            locales: "locale".to_string(),
            partials: "src/partials".to_string(),
            pages: "src/pages".to_string(),
            vendor: "vendor".to_string(),
            public: "public".to_string(),
            assets: "assets".to_string(),
        }
    }
}

/// [`PathsConfig`] resolved against a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub output: PathBuf,
    pub locales: PathBuf,
    pub partials: PathBuf,
    pub pages: PathBuf,
    pub vendor: PathBuf,
    pub public: PathBuf,
    pub assets: PathBuf,
}

/// Limits applied to every top-level render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Maximum size in bytes of one rendered output (one page for one locale).
    pub max_output_bytes: usize,
    /// Maximum nesting depth of partial includes.
    pub max_include_depth: usize,
    /// Extension (without the dot) identifying page templates.
    pub page_extension: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: 1024 * 1024,
            max_include_depth: 32,
            page_extension: "html".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `n` clamped to `1..=cores`, so `0` still runs one
///   worker and values above the core count are reduced to it
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `site.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the given project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}
