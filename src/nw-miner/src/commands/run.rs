//! Full pipeline: datasheets, index, assets
//!
//! Each phase finishes before the next one starts.

use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use super::{assets, datasheets, index, print_report, Session};
use crate::paks::find_pak_files;
use crate::records::load_records;

pub fn run(
    session: &Session,
    input: &Path,
    output: &Path,
    records: Option<&Path>,
    keep_datasheets: bool,
) -> Result<()> {
    let started = Instant::now();
    // Fail on a bad records file before any extraction work
    let records = records.map(load_records).transpose()?;
    let paks = find_pak_files(input)?;
    tracing::info!("Mining {} archives into {}", paks.len(), output.display());

    let extracted = datasheets::extract(session, &paks, output)?;
    print_report("Extract datasheets", &extracted);

    let converted = datasheets::convert(session, output, keep_datasheets)?;
    print_report("Convert datasheets", &converted);

    let index = index::build(&paks, output)?;

    if let Some(records) = records {
        let report = assets::extract(session, &index, &records, output)?;
        index::remove(output)?;
        print_report("Extract assets", &report);
    }

    tracing::info!("Finished in {} ms", started.elapsed().as_millis());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::{session, weapons_datasheet, write_pak};
    use super::*;

    #[test]
    fn test_pipeline_without_records_keeps_index() {
        let dir = tempfile::tempdir().unwrap();
        let datasheet = weapons_datasheet();
        write_pak(
            &dir.path().join("paks/a.pak"),
            &[
                ("datatables/weapons.datasheet", datasheet.as_slice()),
                ("objects/sword.cgf", b"model"),
            ],
        );
        let out = dir.path().join("out");

        run(&session(), &dir.path().join("paks"), &out, None, true).unwrap();

        assert_eq!(
            std::fs::read_to_string(out.join("datatables/weapons.csv")).unwrap(),
            "Name;Weight\nSword;1.5"
        );
        assert!(out.join("datatables/weapons.datasheet").exists());
        assert!(index::index_dir(&out).join("models.json").exists());
    }

    #[test]
    fn test_bad_records_fail_early() {
        let dir = tempfile::tempdir().unwrap();
        write_pak(&dir.path().join("paks/a.pak"), &[("a.xml", b"<a/>")]);
        let records = dir.path().join("records.json");
        std::fs::write(&records, "not json").unwrap();
        let out = dir.path().join("out");

        assert!(run(&session(), &dir.path().join("paks"), &out, Some(&records), false).is_err());
        assert!(!out.exists());
    }
}
