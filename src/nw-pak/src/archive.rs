//! Forward scan of pak local file headers
//!
//! Entries are discovered by walking local headers from the start of the
//! archive: each header gives the size of its own payload, which gives the
//! position of the next header. The walk ends at the first record that is
//! not a local header (normally the central directory). Because nothing
//! from the central directory is used, archives with damaged or
//! non-standard directories can still be enumerated.

use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use crate::{Error, Result, LOCAL_HEADER_SIGNATURE, LOCAL_HEADER_SIZE};

// Field offsets inside the fixed part of a local header
const FLAGS: usize = 6;
const METHOD: usize = 8;
const COMPRESSED_SIZE: usize = 18;
const UNCOMPRESSED_SIZE: usize = 22;
const NAME_LEN: usize = 26;
const EXTRA_LEN: usize = 28;

const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const ZIP64_EXTRA_TAG: u16 = 0x0001;
const ZIP64_MARKER: u32 = 0xffff_ffff;

/// One entry as stored in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Name as stored (not normalized)
    pub file_name: String,
    pub local_header_offset: u64,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub compression_method: u16,
    pub flags: u16,
}

/// Pull-based iterator over the local headers of one archive
///
/// Yields entries in archive order and ends at the first non-local-header
/// record. A structural error is yielded once, after which iteration stops.
/// Call [`rewind`](Self::rewind) to walk the archive again.
pub struct LocalHeaderScanner<R> {
    reader: R,
    label: String,
    next_offset: u64,
    finished: bool,
}

impl<R: Read + Seek> LocalHeaderScanner<R> {
    pub fn new(reader: R) -> Self {
        Self::with_label(reader, "<stream>")
    }

    /// Create a scanner whose errors name `label` as the archive
    pub fn with_label(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            next_offset: 0,
            finished: false,
        }
    }

    /// Restart the scan from the first entry
    pub fn rewind(&mut self) {
        self.next_offset = 0;
        self.finished = false;
    }

    /// Offset the next header will be read from
    pub fn position(&self) -> u64 {
        self.next_offset
    }

    fn fail(&self, reason: impl ToString) -> Error {
        Error::ArchiveRead {
            path: self.label.clone(),
            reason: reason.to_string(),
        }
    }

    fn read_entry(&mut self) -> Result<Option<RawEntry>> {
        let offset = self.next_offset;
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| self.fail(format!("seek to {offset:#x}: {e}")))?;

        let mut fixed = [0u8; LOCAL_HEADER_SIZE as usize];
        match self.reader.read_exact(&mut fixed[..4]) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(self.fail(e)),
        }
        if LittleEndian::read_u32(&fixed) != LOCAL_HEADER_SIGNATURE {
            return Ok(None);
        }

        self.reader
            .read_exact(&mut fixed[4..])
            .map_err(|e| self.fail(format!("truncated local header at {offset:#x}: {e}")))?;

        let flags = LittleEndian::read_u16(&fixed[FLAGS..]);
        let method = LittleEndian::read_u16(&fixed[METHOD..]);
        let compressed32 = LittleEndian::read_u32(&fixed[COMPRESSED_SIZE..]);
        let uncompressed32 = LittleEndian::read_u32(&fixed[UNCOMPRESSED_SIZE..]);
        let name_len = LittleEndian::read_u16(&fixed[NAME_LEN..]) as usize;
        let extra_len = LittleEndian::read_u16(&fixed[EXTRA_LEN..]) as usize;

        let mut name = vec![0u8; name_len];
        let mut extra = vec![0u8; extra_len];
        self.reader
            .read_exact(&mut name)
            .and_then(|()| self.reader.read_exact(&mut extra))
            .map_err(|e| self.fail(format!("truncated entry name at {offset:#x}: {e}")))?;
        let file_name = String::from_utf8_lossy(&name).into_owned();

        let (compressed_size, uncompressed_size) =
            resolve_sizes(compressed32, uncompressed32, &extra)
                .ok_or_else(|| self.fail(format!("missing zip64 sizes for '{file_name}'")))?;

        if flags & FLAG_DATA_DESCRIPTOR != 0 && compressed_size == 0 {
            return Err(self.fail(format!(
                "entry '{file_name}' stores its sizes in a data descriptor"
            )));
        }

        self.next_offset = offset
            .checked_add(LOCAL_HEADER_SIZE + name_len as u64 + extra_len as u64)
            .and_then(|o| o.checked_add(compressed_size))
            .ok_or_else(|| self.fail(format!("entry '{file_name}' overflows the archive")))?;

        Ok(Some(RawEntry {
            file_name,
            local_header_offset: offset,
            compressed_size,
            uncompressed_size,
            compression_method: method,
            flags,
        }))
    }
}

impl<R: Read + Seek> Iterator for LocalHeaderScanner<R> {
    type Item = Result<RawEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Replace 32-bit size markers with the values from the zip64 extra block
fn resolve_sizes(compressed: u32, uncompressed: u32, extra: &[u8]) -> Option<(u64, u64)> {
    if compressed != ZIP64_MARKER && uncompressed != ZIP64_MARKER {
        return Some((compressed as u64, uncompressed as u64));
    }

    let mut block = extra;
    while block.len() >= 4 {
        let tag = LittleEndian::read_u16(block);
        let size = LittleEndian::read_u16(&block[2..]) as usize;
        let body = block.get(4..4 + size)?;

        if tag == ZIP64_EXTRA_TAG {
            // Uncompressed comes first, each value present only if its marker is set
            let mut values = body.chunks_exact(8).map(LittleEndian::read_u64);
            let uncompressed = if uncompressed == ZIP64_MARKER {
                values.next()?
            } else {
                uncompressed as u64
            };
            let compressed = if compressed == ZIP64_MARKER {
                values.next()?
            } else {
                compressed as u64
            };
            return Some((compressed, uncompressed));
        }

        block = &block[4 + size..];
    }

    None
}

/// Open an archive and scan its local headers
pub fn scan_archive<P: AsRef<Path>>(path: P) -> Result<LocalHeaderScanner<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::archive(path, e))?;
    Ok(LocalHeaderScanner::with_label(
        BufReader::new(file),
        path.display().to_string(),
    ))
}
