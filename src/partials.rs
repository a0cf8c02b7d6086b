//! Partial loading.
//!
//! The [`PartialSource`] trait resolves a partial name to its raw template
//! text. The renderer only depends on the trait, so tests can swap in an
//! in-memory source.
//!
//! The production implementation is [`DirPartials`]: a name `header`
//! resolves to `<dir>/header.html`. Names may address subdirectories
//! (`nav/top` → `<dir>/nav/top.html`), but a name that is empty, absolute,
//! or walks upward with `..` never resolves.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartialError {
    #[error("IO error reading partial {name:?} from {path}: {source}")]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Resolves partial names to raw template text.
///
/// `Ok(None)` means the partial does not exist. `Err` is reserved for a
/// partial that exists but cannot be read.
pub trait PartialSource: Sync {
    fn load(&self, name: &str) -> Result<Option<String>, PartialError>;
}

/// Partials stored as `<dir>/<name>.html` files.
#[derive(Debug, Clone)]
pub struct DirPartials {
    dir: PathBuf,
}

impl DirPartials {
    pub const EXTENSION: &'static str = "html";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a partial name maps to, or `None` if the name is not allowed.
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        if !is_safe_name(name) {
            return None;
        }
        Some(self.dir.join(format!("{name}.{}", Self::EXTENSION)))
    }
}

impl PartialSource for DirPartials {
    fn load(&self, name: &str) -> Result<Option<String>, PartialError> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PartialError::Io {
                name: name.to_string(),
                path,
                source,
            }),
        }
    }
}

fn is_safe_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    #[test]
    fn loads_partial_by_name() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "header.html", "<header>Hi</header>");
        let partials = DirPartials::new(tmp.path());
        assert_eq!(
            partials.load("header").unwrap().as_deref(),
            Some("<header>Hi</header>")
        );
    }

    #[test]
    fn loads_partial_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "nav/top.html", "top");
        let partials = DirPartials::new(tmp.path());
        assert_eq!(partials.load("nav/top").unwrap().as_deref(), Some("top"));
    }

    #[test]
    fn missing_partial_is_none() {
        let tmp = TempDir::new().unwrap();
        let partials = DirPartials::new(tmp.path());
        assert!(partials.load("nope").unwrap().is_none());
    }

    #[test]
    fn unsafe_names_never_resolve() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "secret.html", "s");
        let partials = DirPartials::new(tmp.path().join("partials"));
        assert!(partials.path_for("").is_none());
        assert!(partials.path_for("../secret").is_none());
        assert!(partials.path_for("/etc/passwd").is_none());
        assert!(partials.path_for("a/../b").is_none());
        assert!(partials.load("../secret").unwrap().is_none());
    }

    #[test]
    fn path_for_appends_extension() {
        let partials = DirPartials::new("/site/src/partials");
        assert_eq!(
            partials.path_for("footer"),
            Some(PathBuf::from("/site/src/partials/footer.html"))
        );
    }

    #[test]
    fn unreadable_partial_is_error() {
        let tmp = TempDir::new().unwrap();
        // A directory where a file is expected cannot be read as text.
        std::fs::create_dir_all(tmp.path().join("dir.html")).unwrap();
        let partials = DirPartials::new(tmp.path());
        assert!(matches!(partials.load("dir"), Err(PartialError::Io { .. })));
    }
}
