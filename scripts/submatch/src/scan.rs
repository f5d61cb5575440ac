//! Directory enumeration feeding the matcher.

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::normalize_ext;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Collected {
    /// Sorted, deduplicated.
    pub files: Vec<PathBuf>,
    /// Directories skipped because of a blacklist keyword.
    pub skipped: Vec<PathBuf>,
}

impl Collected {
    pub fn paths(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }
}

fn has_ext(path: &Path, exts: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = normalize_ext(ext);
            exts.iter().any(|e| normalize_ext(e) == ext)
        }
        None => false,
    }
}

fn is_blacklisted(path: &Path, blacklist: &[String]) -> bool {
    let lower = path.to_string_lossy().to_lowercase();
    blacklist
        .iter()
        .map(|kw| kw.trim().to_lowercase())
        .any(|kw| !kw.is_empty() && lower.contains(&kw))
}

/// Broken symlinks and symlink loops are skipped instead of failing the scan.
fn is_dangling_link(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_some()
        || err
            .io_error()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
}

/// Collects files under `roots` whose extension is in `exts`.
pub fn collect_files(
    roots: &[PathBuf],
    exts: &[String],
    recursive: bool,
    blacklist: &[String],
) -> Result<Collected> {
    let mut out = Collected::default();
    for root in roots {
        if !root.exists() {
            return Err(anyhow!("Directory not found: {:?}", root));
        }
        info!("scanning {:?}{}", root, if recursive { " (recursive)" } else { "" });
        // Symlinked files and folders are listed like regular ones.
        let mut walker = WalkDir::new(root).follow_links(true);
        if !recursive {
            walker = walker.max_depth(1);
        }
        let mut skipped = Vec::new();
        let iter = walker.into_iter().filter_entry(|e| {
            if e.file_type().is_dir() && is_blacklisted(e.path(), blacklist) {
                skipped.push(e.path().to_path_buf());
                return false;
            }
            true
        });
        for entry in iter {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_dangling_link(&err) => {
                    warn!("skipped unreadable link: {}", err);
                    continue;
                }
                Err(err) => return Err(err).with_context(|| format!("Walk {:?}", root)),
            };
            if entry.file_type().is_file() && has_ext(entry.path(), exts) {
                debug!("found {:?}", entry.path());
                out.files.push(entry.into_path());
            }
        }
        for dir in skipped {
            warn!("skipped blacklisted directory {:?}", dir);
            out.skipped.push(dir);
        }
    }
    out.files.sort();
    out.files.dedup();
    Ok(out)
}
