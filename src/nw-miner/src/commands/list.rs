//! Archive listing

use anyhow::{Context, Result};
use nw_pak::RawEntry;
use std::io::Write;
use std::path::Path;

fn method_name(method: u16) -> &'static str {
    match method {
        0 => "stored",
        8 => "deflate",
        _ => "oodle",
    }
}

fn write_entry<W: Write>(out: &mut W, entry: &RawEntry) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>12}  {:<7}  {:>12}  {:>12}  {}",
        entry.local_header_offset,
        method_name(entry.compression_method),
        entry.compressed_size,
        entry.uncompressed_size,
        entry.file_name
    )
}

/// Write one line per entry: offset, method, compressed and uncompressed size, name
pub fn list_entries<W: Write>(pak: &Path, out: &mut W) -> Result<usize> {
    let mut count = 0;
    for entry in nw_pak::scan_archive(pak)? {
        let entry = entry.with_context(|| format!("Failed to scan {}", pak.display()))?;
        write_entry(out, &entry)?;
        count += 1;
    }
    Ok(count)
}

/// `list` command
pub fn run(pak: &Path) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(
        out,
        "{:>12}  {:<7}  {:>12}  {:>12}  name",
        "offset", "method", "compressed", "size"
    )?;
    let count = list_entries(pak, &mut out)?;
    eprintln!("{} entries", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::write_pak;
    use super::*;

    #[test]
    fn test_list_entries() {
        let dir = tempfile::tempdir().unwrap();
        let pak = write_pak(
            &dir.path().join("a.pak"),
            &[("Objects/Sword.cgf", b"abc"), ("levels/map.xml", b"<Map/>")],
        );

        let mut out = Vec::new();
        let count = list_entries(&pak, &mut out).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Objects/Sword.cgf"));
        assert!(lines[0].contains("stored"));
        assert!(lines[1].trim_start().starts_with(&(30 + 17 + 3).to_string()));
    }

    #[test]
    fn test_list_missing_archive() {
        let mut out = Vec::new();
        assert!(list_entries(Path::new("/nonexistent/a.pak"), &mut out).is_err());
    }
}
