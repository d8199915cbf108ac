//! Fixtures for pipeline tests: stored-only paks and small datasheets

use nw_pak::{oodle::OozextractBackend, Extractor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Session;

pub fn session() -> Session {
    Session {
        extractor: Extractor::new(Arc::new(OozextractBackend::new())),
        jobs: 2,
        bulk_extensions: vec!["datasheet".to_string(), "xml".to_string()],
    }
}

/// Write a pak of stored entries followed by a central directory signature
pub fn write_pak(path: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
    let mut data = Vec::new();
    for (name, payload) in entries {
        data.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        data.extend_from_slice(&20u16.to_le_bytes()); // version needed
        data.extend_from_slice(&0u16.to_le_bytes()); // flags
        data.extend_from_slice(&0u16.to_le_bytes()); // stored
        data.extend_from_slice(&0u32.to_le_bytes()); // time/date
        data.extend_from_slice(&0u32.to_le_bytes()); // crc32
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&(name.len() as u16).to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(name.as_bytes());
        data.extend_from_slice(payload);
    }
    data.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    data.extend_from_slice(&[0u8; 42]);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, data).unwrap();
    path.to_path_buf()
}

/// A datasheet with columns Name (string) and Weight (float) and one row: Sword, 1.5
pub fn weapons_datasheet() -> Vec<u8> {
    let heap = b"Name\0Weight\0Sword\0";
    let mut data = vec![0u8; 0x5c];
    data[0x44..0x48].copy_from_slice(&2i32.to_le_bytes());
    data[0x48..0x4c].copy_from_slice(&1i32.to_le_bytes());

    // columns: hash, name offset, type tag
    for (offset, tag) in [(0i32, 1i32), (5, 2)] {
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&tag.to_le_bytes());
    }

    // row 0
    data.extend_from_slice(&12i32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&0i32.to_le_bytes());
    data.extend_from_slice(&1.5f32.to_le_bytes());

    data.extend_from_slice(heap);
    data
}

/// A fake texture container large enough to carry a full header
pub fn texture_bytes(fill: u8, len: usize) -> Vec<u8> {
    let mut data = vec![fill; len];
    data[0x1c] = 9;
    data
}
