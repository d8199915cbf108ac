//! Entry extraction
//!
//! An [`ArchiveEntryHeader`] records where an entry's local header starts,
//! not where its payload starts. The payload follows the variable-length
//! name and extra field, so both lengths are read back from the archive
//! before the compressed bytes are located and handed to the codec.

use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use crate::entry::ArchiveEntryHeader;
use crate::oodle::OodleDecompressor;
use crate::{Error, Result, LOCAL_HEADER_SIGNATURE, LOCAL_HEADER_SIZE, MAX_ENTRY_SIZE};

const METHOD_OFFSET: usize = 8;
const NAME_LEN_OFFSET: usize = 26;
const EXTRA_LEN_OFFSET: usize = 28;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// Offset of the DDS header field that holds the mip map count
pub const MIP_COUNT_OFFSET: usize = 0x1c;

/// Bytes of the primary texture kept in front of the high-resolution payload
pub const TEXTURE_HEADER_SIZE: usize = 0x94;

/// Where an entry's compressed bytes live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    /// Absolute offset of the first compressed byte
    pub start: u64,
    /// Compression method from the local header
    pub method: u16,
}

/// Extracts entries from pak files, delegating Oodle payloads to a decompressor
#[derive(Clone)]
pub struct Extractor {
    decompressor: Arc<dyn OodleDecompressor>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("decompressor", &self.decompressor.name())
            .finish()
    }
}

impl Extractor {
    pub fn new(decompressor: Arc<dyn OodleDecompressor>) -> Self {
        Self { decompressor }
    }

    /// Locate the payload of `header` inside an open archive
    pub fn locate<R: Read + Seek>(
        reader: &mut R,
        archive_len: u64,
        header: &ArchiveEntryHeader,
    ) -> Result<Payload> {
        let fixed_end = header
            .byte_offset
            .checked_add(LOCAL_HEADER_SIZE)
            .filter(|end| *end <= archive_len)
            .ok_or_else(|| {
                Error::Format(format!(
                    "local header of '{}' at {:#x} lies outside the archive ({} bytes)",
                    header.file_name, header.byte_offset, archive_len
                ))
            })?;

        let mut fixed = [0u8; LOCAL_HEADER_SIZE as usize];
        reader.seek(SeekFrom::Start(header.byte_offset))?;
        reader.read_exact(&mut fixed)?;

        if LittleEndian::read_u32(&fixed) != LOCAL_HEADER_SIGNATURE {
            return Err(Error::Format(format!(
                "no local header for '{}' at {:#x}",
                header.file_name, header.byte_offset
            )));
        }

        let method = LittleEndian::read_u16(&fixed[METHOD_OFFSET..]);
        let name_len = LittleEndian::read_u16(&fixed[NAME_LEN_OFFSET..]) as u64;
        let extra_len = LittleEndian::read_u16(&fixed[EXTRA_LEN_OFFSET..]) as u64;

        let start = fixed_end + name_len + extra_len;
        let end = start.checked_add(header.compressed_size);
        if end.map_or(true, |end| end > archive_len) {
            return Err(Error::Format(format!(
                "payload of '{}' ({} bytes at {:#x}) runs past the end of the archive ({} bytes)",
                header.file_name, header.compressed_size, start, archive_len
            )));
        }

        Ok(Payload { start, method })
    }

    /// Extract and decompress a single entry
    pub fn extract_raw(&self, header: &ArchiveEntryHeader) -> Result<Vec<u8>> {
        let path = &header.archive_path;
        let mut file = File::open(path).map_err(|e| Error::archive(path, e))?;
        let archive_len = file.metadata().map_err(|e| Error::archive(path, e))?.len();

        let payload = Self::locate(&mut file, archive_len, header)?;

        if header.uncompressed_size > MAX_ENTRY_SIZE {
            return Err(Error::Decompression(format!(
                "'{}' claims {} uncompressed bytes, limit is {}",
                header.file_name, header.uncompressed_size, MAX_ENTRY_SIZE
            )));
        }

        let compressed_len = to_usize(header.compressed_size, &header.file_name)?;
        let expected = to_usize(header.uncompressed_size, &header.file_name)?;

        let mut compressed = vec![0u8; compressed_len];
        file.seek(SeekFrom::Start(payload.start))?;
        file.read_exact(&mut compressed)?;

        tracing::debug!(
            entry = %header.file_name,
            method = payload.method,
            compressed = compressed_len,
            uncompressed = expected,
            "extracting"
        );

        let data = match payload.method {
            METHOD_STORED => compressed,
            METHOD_DEFLATE => inflate(&compressed, expected)?,
            _ => self.decompressor.decompress(&compressed, expected)?,
        };

        if data.len() != expected {
            return Err(Error::DecompressionSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(data)
    }

    /// Extract a texture group: a single entry, or a split pair merged into one container
    pub fn extract_texture(&self, group: &[ArchiveEntryHeader]) -> Result<Vec<u8>> {
        match group {
            [single] => self.extract_raw(single),
            [primary, secondary] => {
                let primary_data = self.extract_raw(primary)?;
                let secondary_data = self.extract_raw(secondary)?;
                merge_split_texture(primary_data, &secondary_data).map_err(|e| match e {
                    Error::Format(msg) => Error::Format(format!("{}: {}", primary.file_name, msg)),
                    other => other,
                })
            }
            _ => Err(Error::Format(format!(
                "texture group must have 1 or 2 members, got {}",
                group.len()
            ))),
        }
    }

    /// Extract an entry to `out_path`, creating parent directories
    pub fn extract_to<P: AsRef<Path>>(&self, header: &ArchiveEntryHeader, out_path: P) -> Result<usize> {
        let data = self.extract_raw(header)?;
        write_output(out_path.as_ref(), &data)?;
        Ok(data.len())
    }

    /// Extract a texture group to `out_path`, creating parent directories
    pub fn extract_texture_to<P: AsRef<Path>>(
        &self,
        group: &[ArchiveEntryHeader],
        out_path: P,
    ) -> Result<usize> {
        let data = self.extract_texture(group)?;
        write_output(out_path.as_ref(), &data)?;
        Ok(data.len())
    }
}

/// Rebuild a full-resolution texture from its low- and high-resolution parts
///
/// The primary entry holds the container header followed by the small mips;
/// the secondary holds the large mips. The result is the primary's header,
/// with its mip count cleared, followed by the whole secondary payload.
pub fn merge_split_texture(mut primary: Vec<u8>, secondary: &[u8]) -> Result<Vec<u8>> {
    if primary.len() < TEXTURE_HEADER_SIZE {
        return Err(Error::Format(format!(
            "primary texture is {} bytes, header needs {}",
            primary.len(),
            TEXTURE_HEADER_SIZE
        )));
    }

    primary[MIP_COUNT_OFFSET] = 0;
    primary.truncate(TEXTURE_HEADER_SIZE);
    primary.extend_from_slice(secondary);
    Ok(primary)
}

/// Inflate at most one byte more than `expected`, enough to detect a size mismatch
fn inflate(compressed: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    flate2::read::DeflateDecoder::new(compressed)
        .take(expected as u64 + 1)
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(format!("deflate: {}", e)))?;
    Ok(output)
}

fn to_usize(size: u64, name: &str) -> Result<usize> {
    usize::try_from(size)
        .map_err(|_| Error::Format(format!("'{}' is too large for this platform ({} bytes)", name, size)))
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
