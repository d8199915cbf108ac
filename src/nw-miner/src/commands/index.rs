//! Header index build and persistence

use anyhow::{Context, Result};
use nw_pak::ClassifiedIndex;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::paks::find_pak_files;

/// Directory under the output root holding the persisted index
pub const INDEX_DIR: &str = "header-entries";

pub fn index_dir(output: &Path) -> PathBuf {
    output.join(INDEX_DIR)
}

/// Scan `paks` in order, classify their entries and persist the tables
pub fn build(paks: &[PathBuf], output: &Path) -> Result<ClassifiedIndex> {
    let started = Instant::now();
    let index = nw_pak::build_index(paks).context("Failed to build header index")?;

    let dir = index_dir(output);
    index
        .save(&dir)
        .with_context(|| format!("Failed to write header index to {}", dir.display()))?;

    tracing::info!(
        "Indexed {} textures, {} models, {} materials from {} archives ({} ms)",
        index.textures.len(),
        index.models.len(),
        index.materials.len(),
        paks.len(),
        started.elapsed().as_millis()
    );

    Ok(index)
}

/// Delete the persisted index files
pub fn remove(output: &Path) -> Result<()> {
    let dir = index_dir(output);
    ClassifiedIndex::remove_persisted(&dir)
        .with_context(|| format!("Failed to remove header index in {}", dir.display()))
}

/// `index` command
pub fn run(input: &Path, output: &Path) -> Result<()> {
    let paks = find_pak_files(input)?;
    let index = build(&paks, output)?;

    println!("Textures:  {}", index.textures.len());
    println!("Models:    {}", index.models.len());
    println!("Materials: {}", index.materials.len());
    println!("Written to {}", index_dir(output).display());

    Ok(())
}
