//! Locating pak archives and mapping entries to output paths

use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Resolve `input` to an ordered list of archives
///
/// A file is used as-is; a directory is searched recursively for `*.pak`.
/// The sorted order is the archive scan order.
pub fn find_pak_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input path does not exist: {}", input.display());
    }

    let mut paks = Vec::new();
    for entry in WalkDir::new(input).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
        let is_pak = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pak"));
        if entry.file_type().is_file() && is_pak {
            paks.push(entry.into_path());
        }
    }

    if paks.is_empty() {
        bail!("No .pak files found in {}", input.display());
    }

    paks.sort();
    Ok(paks)
}

/// Place an archive entry under `root`, dropping components that would escape it
pub fn entry_output_path(root: &Path, entry_name: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in Path::new(entry_name).components() {
        if let Component::Normal(part) = component {
            out.push(part);
        }
    }
    out
}
