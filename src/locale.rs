//! Locale store: loading `<code>.json` files into lookup tables.
//!
//! Each file directly inside the locale directory whose extension is `json`
//! becomes one [`LocaleTable`], named by the file stem:
//!
//! ```text
//! locale/
//! ├── en.json     → locale "en"
//! ├── fr.json     → locale "fr"
//! └── notes.txt   (ignored)
//! ```
//!
//! ## File Format
//!
//! Only flat string-to-string pairs are extracted:
//!
//! ```json
//! { "title": "Welcome", "cta": "Sign \"up\"" }
//! ```
//!
//! This is a quote scan, not a JSON parser. Pairs are taken only at the top
//! object level; a value that is an object, array, number, boolean, or null
//! is skipped along with everything nested inside it. Each quoted string is
//! decoded with `serde_json`, so escapes such as `\u00e9` come out as the
//! characters they name. Malformed input never fails the load: scanning
//! simply stops at the first unterminated string.
//!
//! An absent locale directory is not an error. It yields an empty
//! [`LocaleSet`], which the page pipeline treats as "build one unlocalized
//! version".

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Locale file is empty: {0}")]
    Empty(PathBuf),
}

/// One locale: a code and its key → string table.
///
/// Entries keep their file order. When a key occurs twice the first value
/// wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTable {
    code: String,
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl LocaleTable {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a table from pairs, in order. Duplicate keys keep the first value.
    pub fn from_pairs<K, V>(code: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new(code);
        for (key, value) in pairs {
            table.insert(key.into(), value.into());
        }
        table
    }

    /// Insert a pair unless the key is already present.
    ///
    /// Returns `false` when the key was a duplicate and the value was dropped.
    pub fn insert(&mut self, key: String, value: String) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        true
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Every loaded locale, in load order. Codes are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleSet {
    tables: Vec<LocaleTable>,
}

impl LocaleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. A table whose code is already present is rejected.
    pub fn push(&mut self, table: LocaleTable) -> bool {
        if self.get(table.code()).is_some() {
            return false;
        }
        self.tables.push(table);
        true
    }

    pub fn get(&self, code: &str) -> Option<&LocaleTable> {
        self.tables.iter().find(|t| t.code == code)
    }

    pub fn tables(&self) -> &[LocaleTable] {
        &self.tables
    }

    pub fn codes(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.code()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// No locales means pages are rendered once, without a locale table.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<LocaleTable> for LocaleSet {
    fn from_iter<I: IntoIterator<Item = LocaleTable>>(iter: I) -> Self {
        let mut set = LocaleSet::new();
        for table in iter {
            set.push(table);
        }
        set
    }
}

/// Load every `*.json` file in `dir` into a [`LocaleSet`].
///
/// - Missing directory → `Ok` with an empty set.
/// - Directory present but not listable → `Err`.
/// - A single unreadable or empty file is logged and skipped.
///
/// Files are loaded in file-name order so reporting is stable across
/// filesystems.
pub fn load_all(dir: &Path) -> Result<LocaleSet, LocaleError> {
    if !dir.is_dir() {
        info!("No locale directory found at {}", dir.display());
        return Ok(LocaleSet::new());
    }

    let read_dir = fs::read_dir(dir).map_err(|source| LocaleError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut set = LocaleSet::new();
    for path in &files {
        let Some(code) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        if code.is_empty() {
            continue;
        }
        match load_file(&code, path) {
            Ok(table) => {
                info!(
                    "Loaded locale {} with {} entries from {}",
                    code,
                    table.len(),
                    path.display()
                );
                set.push(table);
            }
            Err(e) => warn!("Skipping locale file: {e}"),
        }
    }
    Ok(set)
}

/// Load one locale file into a table named `code`.
pub fn load_file(code: &str, path: &Path) -> Result<LocaleTable, LocaleError> {
    let content = fs::read_to_string(path).map_err(|source| LocaleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Err(LocaleError::Empty(path.to_path_buf()));
    }
    let mut table = LocaleTable::new(code);
    for (key, value) in parse_pairs(&content) {
        if !table.insert(key.clone(), value) {
            debug!("Duplicate key {:?} in {}, keeping first", key, path.display());
        }
    }
    Ok(table)
}

// ============================================================================
// Flat quote scan
// ============================================================================

/// Extract top-level `"key": "value"` pairs from JSON-like text.
///
/// Never fails. Pairs whose key is empty are dropped; everything that is not
/// a string-valued pair at nesting depth 1 is skipped.
pub fn parse_pairs(content: &str) -> Vec<(String, String)> {
    let mut scanner = Scanner::new(content);
    let mut pairs = Vec::new();
    // Depth 0 is outside any object; a bare top-level string sequence
    // (no braces at all) is still scanned as depth 1 for leniency.
    let mut depth: usize = 0;
    let mut saw_brace = false;

    while let Some(c) = scanner.peek() {
        match c {
            '{' | '[' => {
                saw_brace = true;
                depth += 1;
                scanner.bump();
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                scanner.bump();
            }
            '"' => {
                let Some(key) = scanner.string() else {
                    break;
                };
                let at_top = depth == 1 || (!saw_brace && depth == 0);
                scanner.skip_whitespace();
                if scanner.peek() != Some(':') {
                    // A string that is not a key (array element, stray text).
                    continue;
                }
                scanner.bump();
                scanner.skip_whitespace();
                match scanner.peek() {
                    Some('"') => {
                        let Some(value) = scanner.string() else {
                            break;
                        };
                        if at_top && !key.is_empty() {
                            pairs.push((key, value));
                        }
                    }
                    Some('{') | Some('[') => {
                        scanner.skip_nested();
                    }
                    _ => {}
                }
            }
            _ => {
                scanner.bump();
            }
        }
    }
    pairs
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Read a quoted string starting at the opening quote.
    ///
    /// The quoted text is decoded as a JSON string, so every JSON escape
    /// (including `\uXXXX` surrogate pairs) is honoured. A string JSON
    /// rejects, such as one with an unknown escape, is kept verbatim.
    /// Returns `None` if the closing quote is missing.
    fn string(&mut self) -> Option<String> {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump()? {
                '"' => break,
                '\\' => {
                    self.bump()?;
                }
                _ => {}
            }
        }
        let quoted = &self.src[start..self.pos];
        Some(
            serde_json::from_str::<String>(quoted)
                .unwrap_or_else(|_| quoted[1..quoted.len() - 1].to_string()),
        )
    }

    /// Skip a nested object or array, including any strings inside it.
    fn skip_nested(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '{' | '[' => {
                    depth += 1;
                    self.bump();
                }
                '}' | ']' => {
                    self.bump();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                '"' => {
                    if self.string().is_none() {
                        return;
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }
}
