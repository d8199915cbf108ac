//! Pak mining for New World
//!
//! New World ships its content in `.pak` files: zip-style archives whose
//! entries are mostly Oodle-compressed. This crate covers the parts of the
//! mining pipeline that deal with bytes:
//!
//! - [`archive`]: forward scan of local file headers (the central directory
//!   is never parsed)
//! - [`index`]: classification of entries into texture, model and material
//!   lookup tables
//! - [`extract`]: payload location and decompression of single entries,
//!   including reassembly of split textures
//! - [`datasheet`]: decoding of the binary `.datasheet` table format
//! - [`material`]: texture references inside `.mtl` material files
//!
//! # Local File Header
//!
//! ```text
//! 0x00  u32  signature (0x04034b50)
//! 0x04  u16  version needed
//! 0x06  u16  general purpose flags
//! 0x08  u16  compression method
//! 0x0a  u32  modification time/date
//! 0x0e  u32  crc32
//! 0x12  u32  compressed size
//! 0x16  u32  uncompressed size
//! 0x1a  u16  file name length
//! 0x1c  u16  extra field length
//! 0x1e       file name, extra field, payload
//! ```

pub mod archive;
pub mod datasheet;
mod entry;
pub mod extract;
pub mod index;
pub mod material;
pub mod oodle;

#[cfg(test)]
pub(crate) mod testutil;

pub use archive::{scan_archive, LocalHeaderScanner, RawEntry};
pub use datasheet::{
    convert_file as convert_datasheet, decode as decode_datasheet, find_datasheets, Cell,
    ColumnDescriptor, ColumnKind, DatasheetTable,
};
pub use entry::ArchiveEntryHeader;
pub use extract::Extractor;
pub use index::{build_index, scan_bulk, ClassifiedIndex, EntryKind, IndexBuilder};
pub use material::{texture_key, texture_output_name, texture_references};
pub use oodle::OodleDecompressor;

/// Local file header signature ("PK\x03\x04")
pub const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;

/// Size of the fixed part of a local file header
pub const LOCAL_HEADER_SIZE: u64 = 30;

/// Largest uncompressed size accepted for a single entry
///
/// Sizes come straight from the archive headers; anything above this is
/// treated as a corrupt header instead of being allocated.
pub const MAX_ENTRY_SIZE: u64 = 1 << 30;

/// Errors from pak scanning, extraction and datasheet decoding
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Failed to read archive {path}: {reason}")]
    ArchiveRead { path: String, reason: String },

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Decompression size mismatch: expected {expected}, got {actual}")]
    DecompressionSize { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn archive<P: AsRef<std::path::Path>>(path: P, reason: impl ToString) -> Self {
        Error::ArchiveRead {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
