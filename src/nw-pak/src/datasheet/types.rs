//! Datasheet type definitions

/// Value type of a datasheet column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    String,
    Float,
    Bool,
}

impl ColumnKind {
    /// Map an on-disk type tag to a column kind
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            1 => Some(Self::String),
            2 => Some(Self::Float),
            3 => Some(Self::Bool),
            _ => None,
        }
    }

    pub fn tag(self) -> i32 {
        match self {
            Self::String => 1,
            Self::Float => 2,
            Self::Bool => 3,
        }
    }
}

/// A column: its name, its value type and the (unused) name hash
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    pub hash: u32,
}

/// A single decoded cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    String(String),
    Float(f64),
    Bool(bool),
}

/// A decoded datasheet
///
/// Every row holds exactly one cell per column, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasheetTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Cell>>,
}

impl DatasheetTable {
    /// Column names, in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
