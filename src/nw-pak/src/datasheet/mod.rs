//! Datasheet decoding
//!
//! Datasheets are the game's compiled data tables. A file is a fixed
//! header, a column descriptor table, a row-major cell grid and a heap of
//! null-terminated strings:
//!
//! ```text
//! 0x44  i32  column count
//! 0x48  i32  row count
//! 0x5c       columns[count]: u32 name hash, i32 name offset, i32 type tag
//!            cells[rows * columns]: i32 string offset, 4 raw value bytes
//!            string heap
//! ```
//!
//! String offsets are relative to the start of the heap. Type tags are
//! `1` string, `2` float (f32) and `3` bool (i32, non-zero is true).

mod decode;
mod render;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use decode::{decode, Layout};
pub use render::render;
pub use types::{Cell, ColumnDescriptor, ColumnKind, DatasheetTable};

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::Result;

pub const DATASHEET_EXTENSION: &str = "datasheet";
pub const OUTPUT_EXTENSION: &str = "csv";

/// Decode the datasheet at `path` and write its text form to the sibling `.csv`
///
/// The source is removed after a successful write unless `keep_source` is set.
/// Returns the path written.
pub fn convert_file<P: AsRef<Path>>(path: P, keep_source: bool) -> Result<PathBuf> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let table = decode(&data)?;

    let output = path.with_extension(OUTPUT_EXTENSION);
    std::fs::write(&output, render(&table))?;
    tracing::debug!(
        "Converted {} ({} columns, {} rows)",
        path.display(),
        table.columns.len(),
        table.len()
    );

    if !keep_source {
        std::fs::remove_file(path)?;
    }

    Ok(output)
}

/// All `.datasheet` files under `dir`, sorted
pub fn find_datasheets<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_datasheet = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(DATASHEET_EXTENSION));
        if is_datasheet {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
