//! Builds synthetic datasheet buffers for tests

use super::decode::{COLUMNS_OFFSET, COLUMN_COUNT_OFFSET, ROW_COUNT_OFFSET};
use super::types::{Cell, ColumnKind};

#[derive(Default)]
pub struct SheetBuilder {
    columns: Vec<(String, ColumnKind)>,
    rows: Vec<Vec<RawCell>>,
}

/// Cell contents before heap offsets are assigned
enum RawCell {
    Text(String),
    Raw(i32, u32),
}

impl SheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: &str, kind: ColumnKind) -> Self {
        self.columns.push((name.to_string(), kind));
        self
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        let raw = cells
            .into_iter()
            .map(|cell| match cell {
                Cell::String(s) => RawCell::Text(s),
                Cell::Float(f) => RawCell::Raw(0, (f as f32).to_bits()),
                Cell::Bool(b) => RawCell::Raw(0, b as u32),
            })
            .collect();
        self.rows.push(raw);
        self
    }

    /// Row of literal (string offset, raw value) pairs
    pub fn raw_row(mut self, cells: Vec<(i32, u32)>) -> Self {
        self.rows
            .push(cells.into_iter().map(|(o, v)| RawCell::Raw(o, v)).collect());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut heap = Vec::new();
        let mut intern = |s: &str| {
            let offset = heap.len() as i32;
            heap.extend_from_slice(s.as_bytes());
            heap.push(0);
            offset
        };

        let mut data = vec![0u8; COLUMNS_OFFSET];
        data[COLUMN_COUNT_OFFSET..COLUMN_COUNT_OFFSET + 4]
            .copy_from_slice(&(self.columns.len() as i32).to_le_bytes());
        data[ROW_COUNT_OFFSET..ROW_COUNT_OFFSET + 4]
            .copy_from_slice(&(self.rows.len() as i32).to_le_bytes());

        for (i, (name, kind)) in self.columns.iter().enumerate() {
            data.extend_from_slice(&(0x1000_0000u32 + i as u32).to_le_bytes());
            data.extend_from_slice(&intern(name).to_le_bytes());
            data.extend_from_slice(&kind.tag().to_le_bytes());
        }

        for row in &self.rows {
            for cell in row {
                let (offset, raw) = match cell {
                    RawCell::Text(s) => (intern(s), 0),
                    RawCell::Raw(o, v) => (*o, *v),
                };
                data.extend_from_slice(&offset.to_le_bytes());
                data.extend_from_slice(&raw.to_le_bytes());
            }
        }

        data.extend_from_slice(&heap);
        data
    }
}
