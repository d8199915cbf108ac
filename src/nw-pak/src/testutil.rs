//! Synthetic pak archives for tests

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::oodle::OodleDecompressor;
use crate::{Error, Result, LOCAL_HEADER_SIGNATURE};

/// Compression method used for "Oodle" entries written by [`ArchiveBuilder`]
pub const FAKE_OODLE_METHOD: u16 = 15;

const XOR_KEY: u8 = 0xa5;

/// Decompressor that undoes the XOR "compression" of [`ArchiveBuilder::oodle`]
#[derive(Debug, Default)]
pub struct XorDecompressor;

impl OodleDecompressor for XorDecompressor {
    fn decode(&self, compressed: &[u8], output: &mut [u8]) -> Result<usize> {
        for (out, byte) in output.iter_mut().zip(compressed) {
            *out = byte ^ XOR_KEY;
        }
        Ok(compressed.len())
    }

    fn name(&self) -> &'static str {
        "xor"
    }
}

/// Decompressor that always fails
#[derive(Debug, Default)]
pub struct FailingDecompressor;

impl OodleDecompressor for FailingDecompressor {
    fn decode(&self, _compressed: &[u8], _output: &mut [u8]) -> Result<usize> {
        Err(Error::Decompression("codec rejected block".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Builds pak bytes one local header at a time
#[derive(Default)]
pub struct ArchiveBuilder {
    data: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry with full control over the header fields; returns its offset
    pub fn entry(
        &mut self,
        name: &str,
        method: u16,
        flags: u16,
        payload: &[u8],
        uncompressed_size: u32,
        extra: &[u8],
    ) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(&LOCAL_HEADER_SIGNATURE.to_le_bytes());
        self.data.extend_from_slice(&20u16.to_le_bytes()); // version needed
        self.data.extend_from_slice(&flags.to_le_bytes());
        self.data.extend_from_slice(&method.to_le_bytes());
        self.data.extend_from_slice(&0u32.to_le_bytes()); // time/date
        self.data.extend_from_slice(&0u32.to_le_bytes()); // crc32
        self.data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.data.extend_from_slice(&uncompressed_size.to_le_bytes());
        self.data.extend_from_slice(&(name.len() as u16).to_le_bytes());
        self.data.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        self.data.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(extra);
        self.data.extend_from_slice(payload);
        offset
    }

    pub fn stored(&mut self, name: &str, payload: &[u8]) -> u64 {
        self.entry(name, 0, 0, payload, payload.len() as u32, &[])
    }

    pub fn oodle(&mut self, name: &str, payload: &[u8]) -> u64 {
        let compressed: Vec<u8> = payload.iter().map(|b| b ^ XOR_KEY).collect();
        self.entry(name, FAKE_OODLE_METHOD, 0, &compressed, payload.len() as u32, &[])
    }

    pub fn deflated(&mut self, name: &str, payload: &[u8]) -> u64 {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(payload).unwrap();
        let compressed = encoder.finish().unwrap();
        self.entry(name, 8, 0, &compressed, payload.len() as u32, &[])
    }

    /// Append a central directory record stub; scanning must stop here
    pub fn central_directory(&mut self) {
        self.data.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        self.data.extend_from_slice(&[0u8; 42]);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, &self.data).unwrap();
        path
    }
}
