//! Pak header index
//!
//! Scans every archive once and sorts the interesting entries into three
//! lookup tables:
//!
//! - textures (`.dds`/`.tif`, including split parts like `.dds.1`), grouped
//!   by name without extension
//! - models (`.cgf`, and `.skin` except per-LOD variants)
//! - materials (`.mtl`)
//!
//! Models and materials that appear in several archives resolve to the one
//! from the archive scanned last.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::archive::scan_archive;
use crate::entry::{normalize_name, ArchiveEntryHeader};
use crate::Result;

/// Maximum number of entries kept per texture group
pub const MAX_TEXTURE_PARTS: usize = 2;

/// Persisted index file names
pub const TEXTURES_FILE: &str = "textures.json";
pub const MODELS_FILE: &str = "models.json";
pub const MATERIALS_FILE: &str = "materials.json";

static TEXTURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<key>.+)\.(?:dds|tif)(?:\.[0-9]+)?$").expect("texture pattern"));
static MODEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(?:cgf|skin)$").expect("model pattern"));
static LOD_SKIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_lod[0-9]\.skin$").expect("lod skin pattern"));
static MATERIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.mtl$").expect("material pattern"));

/// Kind of asset an entry holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Texture,
    Model,
    Material,
}

impl EntryKind {
    /// Classify an entry by its name (case-insensitive)
    pub fn classify(name: &str) -> Option<Self> {
        let name = name.to_lowercase();

        if TEXTURE_RE.is_match(&name) {
            Some(Self::Texture)
        } else if MODEL_RE.is_match(&name) && !LOD_SKIN_RE.is_match(&name) {
            Some(Self::Model)
        } else if MATERIAL_RE.is_match(&name) {
            Some(Self::Material)
        } else {
            None
        }
    }
}

/// Group key of a texture entry name
/// "textures/rock.dds" -> "textures/rock"
/// "textures/rock.dds.1" -> "textures/rock"
pub fn texture_group_key(name: &str) -> Option<&str> {
    TEXTURE_RE
        .captures(name)
        .and_then(|c| c.name("key"))
        .map(|m| m.as_str())
}

/// The three lookup tables built from a set of archives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIndex {
    /// Group key -> 1 or 2 entries, sorted by file name
    pub textures: BTreeMap<String, Vec<ArchiveEntryHeader>>,
    /// Normalized file name -> entry
    pub models: BTreeMap<String, ArchiveEntryHeader>,
    /// Normalized file name -> entry
    pub materials: BTreeMap<String, ArchiveEntryHeader>,
}

impl ClassifiedIndex {
    /// Texture group for a key such as "textures/rock"
    pub fn texture(&self, key: &str) -> Option<&[ArchiveEntryHeader]> {
        self.textures.get(&normalize_name(key)).map(Vec::as_slice)
    }

    /// Model entry for a file name (case-insensitive)
    pub fn model(&self, name: &str) -> Option<&ArchiveEntryHeader> {
        self.models.get(&normalize_name(name))
    }

    /// Material entry for a file name (case-insensitive)
    pub fn material(&self, name: &str) -> Option<&ArchiveEntryHeader> {
        self.materials.get(&normalize_name(name))
    }

    /// Total number of keys across all three tables
    pub fn len(&self) -> usize {
        self.textures.len() + self.models.len() + self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the three tables as JSON files into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(TEXTURES_FILE), serde_json::to_vec(&self.textures)?)?;
        std::fs::write(dir.join(MODELS_FILE), serde_json::to_vec(&self.models)?)?;
        std::fs::write(dir.join(MATERIALS_FILE), serde_json::to_vec(&self.materials)?)?;
        Ok(())
    }

    /// Read tables written by [`save`](Self::save)
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            textures: serde_json::from_slice(&std::fs::read(dir.join(TEXTURES_FILE))?)?,
            models: serde_json::from_slice(&std::fs::read(dir.join(MODELS_FILE))?)?,
            materials: serde_json::from_slice(&std::fs::read(dir.join(MATERIALS_FILE))?)?,
        })
    }

    /// Delete the files written by [`save`](Self::save); missing files are ignored
    pub fn remove_persisted<P: AsRef<Path>>(dir: P) -> Result<()> {
        let dir = dir.as_ref();
        for name in [TEXTURES_FILE, MODELS_FILE, MATERIALS_FILE] {
            match std::fs::remove_file(dir.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Accumulates classified entries across archives
#[derive(Debug, Default)]
pub struct IndexBuilder {
    textures: HashMap<String, Vec<ArchiveEntryHeader>>,
    models: HashMap<String, ArchiveEntryHeader>,
    materials: HashMap<String, ArchiveEntryHeader>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry; returns its kind, or `None` if the entry is not indexed
    pub fn push(&mut self, header: ArchiveEntryHeader) -> Option<EntryKind> {
        let kind = EntryKind::classify(&header.file_name)?;

        match kind {
            EntryKind::Texture => {
                let key = texture_group_key(&header.file_name)?.to_string();
                let group = self.textures.entry(key).or_default();
                // The same part seen again in a later archive replaces the earlier one
                match group.iter_mut().find(|h| h.file_name == header.file_name) {
                    Some(existing) => *existing = header,
                    None => group.push(header),
                }
            }
            EntryKind::Model => {
                self.models.insert(header.file_name.clone(), header);
            }
            EntryKind::Material => {
                self.materials.insert(header.file_name.clone(), header);
            }
        }

        Some(kind)
    }

    /// Scan one archive; returns the number of indexed entries
    pub fn add_archive<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let mut indexed = 0;

        for raw in scan_archive(path)? {
            let header = ArchiveEntryHeader::from_raw(path, &raw?);
            if self.push(header).is_some() {
                indexed += 1;
            }
        }

        tracing::debug!(archive = %path.display(), indexed, "scanned archive");
        Ok(indexed)
    }

    /// Sort and trim texture groups and produce the final index
    pub fn finish(self) -> ClassifiedIndex {
        let textures = self
            .textures
            .into_iter()
            .map(|(key, mut group)| {
                group.sort_by(|a, b| a.file_name.cmp(&b.file_name));
                group.truncate(MAX_TEXTURE_PARTS);
                (key, group)
            })
            .collect();

        ClassifiedIndex {
            textures,
            models: self.models.into_iter().collect(),
            materials: self.materials.into_iter().collect(),
        }
    }
}

/// Build the index over `archive_paths`, in order
pub fn build_index<P: AsRef<Path>>(archive_paths: &[P]) -> Result<ClassifiedIndex> {
    let mut builder = IndexBuilder::new();
    for path in archive_paths {
        builder.add_archive(path)?;
    }
    Ok(builder.finish())
}

/// Collect entries whose name ends in one of `extensions`, per archive
///
/// Used for bulk extraction of datasheets and other tables that are
/// extracted wholesale rather than looked up by name.
pub fn scan_bulk<P: AsRef<Path>>(
    archive_paths: &[P],
    extensions: &[String],
) -> Result<Vec<(PathBuf, Vec<ArchiveEntryHeader>)>> {
    let suffixes: Vec<String> = extensions
        .iter()
        .map(|ext| format!(".{}", ext.trim_start_matches('.').to_lowercase()))
        .collect();

    let mut groups = Vec::with_capacity(archive_paths.len());

    for path in archive_paths {
        let path = path.as_ref();
        let mut selected = Vec::new();

        for raw in scan_archive(path)? {
            let header = ArchiveEntryHeader::from_raw(path, &raw?);
            if suffixes.iter().any(|s| header.file_name.ends_with(s.as_str())) {
                selected.push(header);
            }
        }

        if !selected.is_empty() {
            groups.push((path.to_path_buf(), selected));
        }
    }

    Ok(groups)
}
