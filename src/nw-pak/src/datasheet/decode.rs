//! Binary datasheet decoding

use byteorder::{ByteOrder, LittleEndian};

use super::types::{Cell, ColumnDescriptor, ColumnKind, DatasheetTable};
use crate::{Error, Result};

pub const COLUMN_COUNT_OFFSET: usize = 0x44;
pub const ROW_COUNT_OFFSET: usize = 0x48;
pub const COLUMNS_OFFSET: usize = 0x5c;
pub const COLUMN_SIZE: usize = 12;
pub const CELL_SIZE: usize = 8;

/// Offsets of the regions of a datasheet buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub column_count: usize,
    pub row_count: usize,
    pub cells_offset: usize,
    pub strings_offset: usize,
}

impl Layout {
    /// Read the counts and derive region offsets, checking them against the buffer
    pub fn parse(data: &[u8]) -> Result<Self> {
        let column_count = read_count(data, COLUMN_COUNT_OFFSET, "column count")?;
        let row_count = read_count(data, ROW_COUNT_OFFSET, "row count")?;
        // Rows without columns take no space, so the buffer cannot bound them
        if column_count == 0 && row_count > 0 {
            return Err(Error::Format(format!(
                "datasheet declares {} rows but no columns",
                row_count
            )));
        }

        let cells_offset = column_count
            .checked_mul(COLUMN_SIZE)
            .and_then(|n| n.checked_add(COLUMNS_OFFSET))
            .ok_or_else(|| overflow("column table"))?;
        let strings_offset = row_count
            .checked_mul(column_count)
            .and_then(|n| n.checked_mul(CELL_SIZE))
            .and_then(|n| n.checked_add(cells_offset))
            .ok_or_else(|| overflow("cell table"))?;

        if strings_offset > data.len() {
            return Err(Error::Format(format!(
                "datasheet declares {} columns and {} rows (string heap at {:#x}) but is only {} bytes",
                column_count,
                row_count,
                strings_offset,
                data.len()
            )));
        }

        Ok(Self {
            column_count,
            row_count,
            cells_offset,
            strings_offset,
        })
    }

    /// Bytes per row
    pub fn row_stride(&self) -> usize {
        self.column_count * CELL_SIZE
    }
}

/// Decode a datasheet buffer
pub fn decode(data: &[u8]) -> Result<DatasheetTable> {
    let layout = Layout::parse(data)?;

    let mut columns = Vec::with_capacity(layout.column_count);
    for i in 0..layout.column_count {
        let base = COLUMNS_OFFSET + i * COLUMN_SIZE;
        let hash = LittleEndian::read_u32(&data[base..]);
        let name_offset = read_i32(data, base + 4)?;
        let tag = read_i32(data, base + 8)?;

        let kind = ColumnKind::from_tag(tag)
            .ok_or_else(|| Error::Format(format!("column {} has unknown type tag {}", i, tag)))?;
        let name = read_string(data, layout.strings_offset, name_offset)?;

        columns.push(ColumnDescriptor { name, kind, hash });
    }

    let mut rows = Vec::with_capacity(layout.row_count);
    for row in 0..layout.row_count {
        let row_base = layout.cells_offset + row * layout.row_stride();
        let mut cells = Vec::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            let cell = row_base + i * CELL_SIZE;
            cells.push(match column.kind {
                ColumnKind::String => {
                    Cell::String(read_string(data, layout.strings_offset, read_i32(data, cell)?)?)
                }
                ColumnKind::Float => Cell::Float(LittleEndian::read_f32(&data[cell + 4..]) as f64),
                ColumnKind::Bool => Cell::Bool(read_i32(data, cell + 4)? != 0),
            });
        }

        rows.push(cells);
    }

    Ok(DatasheetTable { columns, rows })
}

fn read_i32(data: &[u8], offset: usize) -> Result<i32> {
    offset
        .checked_add(4)
        .and_then(|end| data.get(offset..end))
        .map(LittleEndian::read_i32)
        .ok_or_else(|| {
            Error::Format(format!(
                "read of 4 bytes at {:#x} exceeds datasheet length {}",
                offset,
                data.len()
            ))
        })
}

fn read_count(data: &[u8], offset: usize, what: &str) -> Result<usize> {
    let value = read_i32(data, offset)?;
    usize::try_from(value).map_err(|_| Error::Format(format!("negative {}: {}", what, value)))
}

/// Read a null-terminated string at `strings_offset + relative`
fn read_string(data: &[u8], strings_offset: usize, relative: i32) -> Result<String> {
    let relative = usize::try_from(relative)
        .map_err(|_| Error::Format(format!("negative string offset {}", relative)))?;
    let start = strings_offset
        .checked_add(relative)
        .filter(|start| *start <= data.len())
        .ok_or_else(|| {
            Error::Format(format!(
                "string offset {:#x} is outside the datasheet ({} bytes)",
                relative,
                data.len()
            ))
        })?;

    let len = data[start..].iter().position(|&b| b == 0).ok_or_else(|| {
        Error::Format(format!("string at {:#x} has no terminator", start))
    })?;

    Ok(String::from_utf8_lossy(&data[start..start + len]).into_owned())
}

fn overflow(region: &str) -> Error {
    Error::Format(format!("{} size overflows", region))
}
