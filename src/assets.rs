//! Static tree copying.
//!
//! Static directories are duplicated into the output byte for byte, keeping
//! relative paths and empty subdirectories. Nothing is transformed.
//!
//! Failures are per entry: an unreadable file or an uncreatable target is
//! logged, counted in [`CopyStats::failed`], and skipped, and the copy
//! carries on with the rest of the tree.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Counts for one copy operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
    pub bytes: u64,
    pub failed: usize,
}

impl CopyStats {
    fn absorb(&mut self, other: CopyStats) {
        self.files += other.files;
        self.dirs += other.dirs;
        self.bytes += other.bytes;
        self.failed += other.failed;
    }
}

/// Copy the directory `src` to `dst`, so `src/a/b` lands at `dst/a/b`.
///
/// Returns `Err` only if `src` itself cannot be walked or `dst` cannot be
/// created.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats, AssetError> {
    fs::create_dir_all(dst).map_err(|source| AssetError::Write {
        path: dst.to_path_buf(),
        source,
    })?;

    let mut stats = CopyStats::default();
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(AssetError::Walk {
                    path: src.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                stats.failed += 1;
                continue;
            }
        };
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);

        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map(|_| stats.dirs += 1)
                .map_err(|source| AssetError::Write {
                    path: target,
                    source,
                })
        } else {
            copy_file(entry.path(), &target).map(|bytes| {
                stats.files += 1;
                stats.bytes += bytes;
            })
        };
        if let Err(e) = result {
            warn!("{e}");
            stats.failed += 1;
        }
    }
    Ok(stats)
}

/// Copy each entry of `src` directly into `dst`, so `src/a` lands at `dst/a`.
pub fn copy_contents(src: &Path, dst: &Path) -> Result<CopyStats, AssetError> {
    let read_dir = fs::read_dir(src).map_err(|source| AssetError::Read {
        path: src.to_path_buf(),
        source,
    })?;

    let mut stats = CopyStats::default();
    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                warn!("Skipping unreadable entry in {}: {source}", src.display());
                stats.failed += 1;
                continue;
            }
        };
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            match copy_tree(&src_path, &dst_path) {
                Ok(sub) => {
                    stats.dirs += 1;
                    stats.absorb(sub);
                }
                Err(e) => {
                    warn!("{e}");
                    stats.failed += 1;
                }
            }
        } else {
            match copy_file(&src_path, &dst_path) {
                Ok(bytes) => {
                    stats.files += 1;
                    stats.bytes += bytes;
                }
                Err(e) => {
                    warn!("{e}");
                    stats.failed += 1;
                }
            }
        }
    }
    Ok(stats)
}

/// Copy one file, creating the target's parent directory if needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, AssetError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|source| AssetError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::copy(src, dst).map_err(|source| {
        // fs::copy does not say which side failed.
        if src.is_file() {
            AssetError::Write {
                path: dst.to_path_buf(),
                source,
            }
        } else {
            AssetError::Read {
                path: src.to_path_buf(),
                source,
            }
        }
    })
}
