//! Shared test utilities for the jelly test suite.
//!
//! Provides fixture setup, small filesystem writers and readers, a locale
//! table builder, and an in-memory [`PartialSource`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let partials = MemoryPartials::from_pairs(&[("nav", "<nav>%locale.home%</nav>")]);
//! let en = table("en", &[("home", "Home")]);
//! let html = Renderer::new(&partials, RenderLimits::default())
//!     .render("<!-- %include.nav% -->", Some(&en))
//!     .unwrap();
//! assert_eq!(html, "<nav>Home</nav>");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::locale::LocaleTable;
use crate::partials::{PartialError, PartialSource};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    crate::assets::copy_tree(&fixtures, tmp.path()).unwrap();
    tmp
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Every file under `root`, keyed by `/`-separated relative path.
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

// =========================================================================
// Locale and partial builders
// =========================================================================

/// Build a locale table from literal pairs.
pub fn table(code: &str, pairs: &[(&str, &str)]) -> LocaleTable {
    LocaleTable::from_pairs(code, pairs.iter().copied())
}

/// In-memory partial source that records every requested name.
///
/// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
#[derive(Default)]
pub struct MemoryPartials {
    partials: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl MemoryPartials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            partials: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Names looked up so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl PartialSource for MemoryPartials {
    fn load(&self, name: &str) -> Result<Option<String>, PartialError> {
        self.requested.lock().unwrap().push(name.to_string());
        Ok(self.partials.get(name).cloned())
    }
}
