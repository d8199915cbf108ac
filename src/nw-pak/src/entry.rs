//! Archive entry headers

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::archive::RawEntry;

/// Location and sizes of one archive entry, as produced by scanning
///
/// Identity is `(archive_path, byte_offset)`: two headers describe the same
/// entry when both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntryHeader {
    /// Archive the entry lives in
    pub archive_path: PathBuf,
    /// Offset of the entry's local header inside the archive
    pub byte_offset: u64,
    /// Entry name, lowercased
    pub file_name: String,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl ArchiveEntryHeader {
    /// Build a header from a scanned entry, normalizing its name
    pub fn from_raw(archive_path: &Path, raw: &RawEntry) -> Self {
        Self {
            archive_path: archive_path.to_path_buf(),
            byte_offset: raw.local_header_offset,
            file_name: normalize_name(&raw.file_name),
            compressed_size: raw.compressed_size,
            uncompressed_size: raw.uncompressed_size,
        }
    }

    /// Last path component of the entry name
    /// "objects/weapons/sword.cgf" -> "sword.cgf"
    pub fn base_name(&self) -> &str {
        self.file_name.rsplit('/').next().unwrap_or(&self.file_name)
    }
}

/// Lowercase an entry name and use forward slashes
pub(crate) fn normalize_name(name: &str) -> String {
    name.replace('\\', "/").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, offset: u64) -> RawEntry {
        RawEntry {
            file_name: name.to_string(),
            local_header_offset: offset,
            compressed_size: 10,
            uncompressed_size: 20,
            compression_method: 0,
            flags: 0,
        }
    }

    #[test]
    fn test_from_raw_normalizes_name() {
        let header = ArchiveEntryHeader::from_raw(
            Path::new("/paks/DataSheets.pak"),
            &raw("SharedAssets\\Objects/Sword.CGF", 64),
        );
        assert_eq!(header.file_name, "sharedassets/objects/sword.cgf");
        assert_eq!(header.archive_path, PathBuf::from("/paks/DataSheets.pak"));
        assert_eq!(header.byte_offset, 64);
        assert_eq!(header.compressed_size, 10);
        assert_eq!(header.uncompressed_size, 20);
    }

    #[test]
    fn test_base_name() {
        let header = ArchiveEntryHeader::from_raw(Path::new("a.pak"), &raw("objects/weapons/sword.cgf", 0));
        assert_eq!(header.base_name(), "sword.cgf");

        let header = ArchiveEntryHeader::from_raw(Path::new("a.pak"), &raw("root.mtl", 0));
        assert_eq!(header.base_name(), "root.mtl");
    }
}
