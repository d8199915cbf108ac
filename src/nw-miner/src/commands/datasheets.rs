//! Bulk datasheet extraction and conversion

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{dedupe_by_output, print_report, EntryTask, Session};
use crate::batch::BatchReport;
use crate::paks::{entry_output_path, find_pak_files};

/// Extract every entry with a bulk extension to `<output>/<entry path>`
pub fn extract(session: &Session, paks: &[PathBuf], output: &Path) -> Result<BatchReport> {
    let started = Instant::now();
    let groups = nw_pak::scan_bulk(paks, &session.bulk_extensions)
        .context("Failed to scan archives for datasheets")?;

    let tasks = dedupe_by_output(
        groups.into_iter().flat_map(|(_, headers)| headers).map(|header| EntryTask {
            output: entry_output_path(output, &header.file_name),
            header,
        }),
        |t| &t.output,
    );

    tracing::info!(
        "Found {} bulk entries in {} archives ({} ms)",
        tasks.len(),
        paks.len(),
        started.elapsed().as_millis()
    );

    let batch = session.batch("datasheets")?;
    Ok(batch.run(&tasks, |task| {
        session.extractor.extract_to(&task.header, &task.output)?;
        Ok(())
    }))
}

/// Convert every `.datasheet` under `dir` to `.csv`
pub fn convert(session: &Session, dir: &Path, keep_source: bool) -> Result<BatchReport> {
    let files = nw_pak::find_datasheets(dir)
        .with_context(|| format!("Failed to search {} for datasheets", dir.display()))?;
    tracing::info!("Converting {} datasheets", files.len());

    let batch = session.batch("convert")?;
    Ok(batch.run(&files, |path| {
        nw_pak::convert_datasheet(path, keep_source)?;
        Ok(())
    }))
}

/// `datasheets` command: extract then convert
pub fn run(session: &Session, input: &Path, output: &Path, keep_source: bool) -> Result<()> {
    let paks = find_pak_files(input)?;

    let extracted = extract(session, &paks, output)?;
    print_report("Extract datasheets", &extracted);

    let converted = convert(session, output, keep_source)?;
    print_report("Convert datasheets", &converted);

    Ok(())
}

/// `convert` command
pub fn run_convert(session: &Session, dir: &Path, keep_source: bool) -> Result<()> {
    let converted = convert(session, dir, keep_source)?;
    print_report("Convert datasheets", &converted);
    Ok(())
}
