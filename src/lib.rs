//! # Jelly
//!
//! A minimal static site generator. Page templates are plain HTML files with
//! two directives: partial includes and locale variables. One source page
//! fans out into one output per locale.
//!
//! # Project Layout
//!
//! ```text
//! project/
//! ├── site.toml                 # Optional overrides (paths, limits, threads)
//! ├── locale/
//! │   ├── en.json               # { "title": "Welcome" }  → locale "en"
//! │   └── fr.json               # { "title": "Bienvenue" } → locale "fr"
//! ├── src/
//! │   ├── partials/
//! │   │   └── header.html       # <!-- %include.header% -->
//! │   └── pages/
//! │       ├── index.html        # → build/en/index.html, build/fr/index.html
//! │       └── blog/post.html    # → build/en/blog/post.html, ...
//! ├── vendor/                   # → build/vendor/
//! ├── public/                   # contents → build/
//! └── assets/                   # → build/assets/
//! ```
//!
//! Without a `locale/` directory (or with no usable locale files), every page
//! is rendered once and written to `build/<relative path>`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`render`] | Template renderer: directive scanning, bounded output, include depth guard |
//! | [`pages`] | Page pipeline: discovery, per-locale fan-out, parallel rendering |
//! | [`locale`] | Locale store: flat quote-scan of `*.json` into lookup tables |
//! | [`partials`] | Partial loader: `PartialSource` trait and the filesystem source |
//! | [`assets`] | Byte-for-byte static tree copying |
//! | [`site`] | Build orchestration across all of the above |
//! | [`config`] | `site.toml` loading, merging onto stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Lexical Directives, No AST
//!
//! Templates are never parsed into a tree. The renderer scans left to right,
//! copies literal text, and expands a directive wherever a marker starts.
//! Malformed directives degrade to literal text instead of failing the page.
//!
//! ## Bounded Renders
//!
//! Include graphs come from user files and may cycle. Every render carries an
//! include depth counter and an output ceiling (`[render]` in `site.toml`);
//! crossing either fails that one render with a typed error, and the rest of
//! the build carries on.
//!
//! ## Explicit Directories
//!
//! Every directory the build reads or writes comes from [`config::SitePaths`],
//! resolved against the project root once. Nothing below `main` looks at
//! the process working directory.

pub mod assets;
pub mod config;
pub mod locale;
pub mod output;
pub mod pages;
pub mod partials;
pub mod render;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
