//! Template rendering.
//!
//! Templates are plain text with two directives:
//!
//! ```text
//! <!-- %include.header% -->   → fully rendered contents of partial "header"
//! %locale.title%              → value of "title" in the active locale, or ""
//! ```
//!
//! Rendering is a single left-to-right scan. Literal text is copied through;
//! whenever the remaining input starts with a directive marker the directive
//! is expanded instead. There is no escaping: a marker in literal text is
//! always read as a directive.
//!
//! ## Edge Cases
//!
//! - **Unterminated directive**: the marker's first character is emitted as
//!   literal text and scanning resumes one character later.
//! - **Missing partial**: the include expands to nothing.
//! - **Missing key, or no active locale**: the variable expands to nothing.
//!
//! ## Limits
//!
//! Each top-level render is bounded by [`RenderLimits`]. Exceeding the output
//! ceiling fails the render with [`RenderError::ContentTooLarge`]; nothing is
//! ever truncated. Includes nested deeper than the depth limit fail with
//! [`RenderError::RecursionLimitExceeded`], which is how include cycles
//! (`a → b → a`) terminate.
//!
//! The active locale is threaded unchanged through every nested include, so a
//! partial expanded inside a French page resolves its variables in French.

use crate::config::{HARD_MAX_INCLUDE_DEPTH, RenderConfig};
use crate::locale::LocaleTable;
use crate::partials::PartialSource;
use thiserror::Error;
use tracing::{debug, warn};

pub const INCLUDE_OPEN: &str = "<!-- %include.";
pub const INCLUDE_CLOSE: &str = "% -->";
pub const LOCALE_OPEN: &str = "%locale.";
pub const LOCALE_CLOSE: char = '%';

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Rendered content exceeds {limit} bytes")]
    ContentTooLarge { limit: usize },
    #[error("Include depth limit of {limit} exceeded while including {name:?}")]
    RecursionLimitExceeded { name: String, limit: usize },
}

/// Per-render resource ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    /// Maximum output size in bytes.
    pub max_output_bytes: usize,
    /// Maximum include nesting. The page itself is depth 0; a partial it
    /// includes is depth 1.
    pub max_include_depth: usize,
}

impl RenderLimits {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            max_output_bytes: config.max_output_bytes,
            max_include_depth: config.max_include_depth,
        }
    }
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

/// A directive recognized at the current scan position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    Include(&'a str),
    LocaleVar(&'a str),
}

/// Recognize a directive at the start of `rest`.
///
/// Returns the directive and the number of bytes it spans, or `None` when
/// `rest` does not start with a complete directive (including the
/// unterminated case).
pub fn scan_directive(rest: &str) -> Option<(Directive<'_>, usize)> {
    if let Some(after) = rest.strip_prefix(INCLUDE_OPEN) {
        let end = after.find(INCLUDE_CLOSE)?;
        let consumed = INCLUDE_OPEN.len() + end + INCLUDE_CLOSE.len();
        return Some((Directive::Include(&after[..end]), consumed));
    }
    if let Some(after) = rest.strip_prefix(LOCALE_OPEN) {
        let end = after.find(LOCALE_CLOSE)?;
        let consumed = LOCALE_OPEN.len() + end + LOCALE_CLOSE.len_utf8();
        return Some((Directive::LocaleVar(&after[..end]), consumed));
    }
    None
}

/// Output accumulator with a hard size ceiling.
///
/// Appends are all-or-nothing, so the buffer never holds half a character
/// or half an expansion.
#[derive(Debug)]
struct OutputBuffer {
    buf: String,
    limit: usize,
}

impl OutputBuffer {
    fn new(limit: usize, hint: usize) -> Self {
        Self {
            buf: String::with_capacity(hint.min(limit)),
            limit,
        }
    }

    fn push_str(&mut self, s: &str) -> Result<(), RenderError> {
        if self.buf.len() + s.len() > self.limit {
            return Err(RenderError::ContentTooLarge { limit: self.limit });
        }
        self.buf.push_str(s);
        Ok(())
    }

    fn into_string(self) -> String {
        self.buf
    }
}

/// Expands templates against a partial source.
///
/// A renderer holds no per-render state; one instance is shared by every
/// worker thread.
pub struct Renderer<'p, P: PartialSource + ?Sized> {
    partials: &'p P,
    limits: RenderLimits,
}

impl<'p, P: PartialSource + ?Sized> Renderer<'p, P> {
    /// Include depth is capped at [`HARD_MAX_INCLUDE_DEPTH`] whatever the
    /// given limits say.
    pub fn new(partials: &'p P, mut limits: RenderLimits) -> Self {
        limits.max_include_depth = limits.max_include_depth.min(HARD_MAX_INCLUDE_DEPTH);
        Self { partials, limits }
    }

    /// Render `text`, resolving variables against `locale` if one is given.
    pub fn render(&self, text: &str, locale: Option<&LocaleTable>) -> Result<String, RenderError> {
        let mut out = OutputBuffer::new(self.limits.max_output_bytes, text.len());
        self.render_into(text, locale, 0, &mut out)?;
        Ok(out.into_string())
    }

    fn render_into(
        &self,
        text: &str,
        locale: Option<&LocaleTable>,
        depth: usize,
        out: &mut OutputBuffer,
    ) -> Result<(), RenderError> {
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];

            // Copy the literal run up to the next possible marker in one go.
            let next = rest.find(['<', '%']).unwrap_or(rest.len());
            if next > 0 {
                out.push_str(&rest[..next])?;
                pos += next;
                continue;
            }

            match scan_directive(rest) {
                Some((Directive::Include(name), consumed)) => {
                    self.expand_include(name, locale, depth, out)?;
                    pos += consumed;
                }
                Some((Directive::LocaleVar(key), consumed)) => {
                    expand_locale_var(key, locale, out)?;
                    pos += consumed;
                }
                None => {
                    // Not a directive, or an unterminated one: the marker
                    // character is literal. Both '<' and '%' are one byte.
                    out.push_str(&rest[..1])?;
                    pos += 1;
                }
            }
        }
        Ok(())
    }

    fn expand_include(
        &self,
        name: &str,
        locale: Option<&LocaleTable>,
        depth: usize,
        out: &mut OutputBuffer,
    ) -> Result<(), RenderError> {
        let child_depth = depth + 1;
        if child_depth > self.limits.max_include_depth {
            return Err(RenderError::RecursionLimitExceeded {
                name: name.to_string(),
                limit: self.limits.max_include_depth,
            });
        }
        match self.partials.load(name) {
            Ok(Some(partial)) => self.render_into(&partial, locale, child_depth, out),
            Ok(None) => {
                debug!("Partial {:?} not found, include dropped", name);
                Ok(())
            }
            Err(e) => {
                warn!("{e}; include dropped");
                Ok(())
            }
        }
    }
}

fn expand_locale_var(
    key: &str,
    locale: Option<&LocaleTable>,
    out: &mut OutputBuffer,
) -> Result<(), RenderError> {
    match locale.and_then(|table| table.lookup(key)) {
        Some(value) => out.push_str(value),
        None => {
            if let Some(table) = locale {
                debug!("Key {:?} missing in locale {}", key, table.code());
            }
            Ok(())
        }
    }
}
