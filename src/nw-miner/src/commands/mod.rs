//! CLI subcommand implementations

pub mod assets;
pub mod configure;
pub mod datasheets;
pub mod index;
pub mod list;
pub mod run;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::{Context, Result};
use nw_pak::{oodle, ArchiveEntryHeader, Extractor, OodleDecompressor};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::batch::{Batch, BatchItem, BatchReport};
use crate::config::Config;

/// Resolved settings shared by the pipeline phases
pub struct Session {
    pub extractor: Extractor,
    pub jobs: usize,
    pub bulk_extensions: Vec<String>,
}

impl Session {
    pub fn new(
        config: &Config,
        jobs: Option<usize>,
        oodle_exec: Option<String>,
        oodle_dll: Option<PathBuf>,
    ) -> Result<Self> {
        let decompressor = select_decompressor(
            oodle_exec.or_else(|| config.oodle.exec.clone()),
            oodle_dll.or_else(|| config.oodle.dll.clone()),
        )?;
        tracing::debug!("Using {} Oodle backend", decompressor.name());

        Ok(Self {
            extractor: Extractor::new(decompressor),
            jobs: config.jobs(jobs),
            bulk_extensions: config.bulk_extensions.clone(),
        })
    }

    pub fn batch(&self, label: &str) -> Result<Batch> {
        Batch::new(label, self.jobs)
    }
}

/// Pick the Oodle backend: helper command, then DLL, then the built-in decoder
pub fn select_decompressor(
    exec: Option<String>,
    dll: Option<PathBuf>,
) -> Result<Arc<dyn OodleDecompressor>> {
    let backend = match (exec, dll) {
        (Some(command), _) => oodle::exec_backend(&command)
            .with_context(|| format!("Invalid Oodle helper command '{}'", command))?,
        (None, Some(dll)) => oodle::native_backend(&dll)
            .with_context(|| format!("Failed to load Oodle DLL {}", dll.display()))?,
        (None, None) => oodle::default_backend(),
    };
    Ok(Arc::from(backend))
}

/// Extract one entry to a file
#[derive(Debug, Clone)]
pub struct EntryTask {
    pub header: ArchiveEntryHeader,
    pub output: PathBuf,
}

impl BatchItem for EntryTask {
    fn label(&self) -> String {
        self.header.file_name.clone()
    }
}

/// Extract a texture group (one entry, or a split pair) to a file
#[derive(Debug, Clone)]
pub struct TextureTask {
    pub group: Vec<ArchiveEntryHeader>,
    pub output: PathBuf,
}

impl BatchItem for TextureTask {
    fn label(&self) -> String {
        self.group
            .first()
            .map_or_else(|| self.output.display().to_string(), |h| h.file_name.clone())
    }
}

/// Keep one task per output path; a later task replaces an earlier one
pub(crate) fn dedupe_by_output<T>(
    tasks: impl IntoIterator<Item = T>,
    output: impl Fn(&T) -> &PathBuf,
) -> Vec<T> {
    let mut by_output = BTreeMap::new();
    for task in tasks {
        by_output.insert(output(&task).clone(), task);
    }
    by_output.into_values().collect()
}

pub(crate) fn print_report(phase: &str, report: &BatchReport) {
    eprintln!("{}: {} of {} succeeded", phase, report.succeeded, report.total());
    if report.is_clean() {
        return;
    }
    for (label, reason) in report.failed.iter().take(10) {
        eprintln!("  failed {}: {}", label, reason);
    }
    if report.failed.len() > 10 {
        eprintln!("  ... and {} more", report.failed.len() - 10);
    }
}
