//! Delimited text output for decoded datasheets

use std::fmt;

use super::types::{Cell, DatasheetTable};

pub const FIELD_SEPARATOR: &str = ";";
pub const LINE_SEPARATOR: &str = "\n";

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::String(s) => f.write_str(s),
            Cell::Float(v) => write_float(f, *v),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else if v == 0.0 {
        // Covers negative zero
        f.write_str("0")
    } else if v.abs() >= 1e21 || v.abs() < 1e-6 {
        // Exponent form with an explicit sign: 1e21 -> "1e+21"
        let text = format!("{:e}", v);
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => write!(f, "{}e+{}", mantissa, exp),
            _ => f.write_str(&text),
        }
    } else {
        write!(f, "{}", v)
    }
}

/// Render a table as `;`-separated lines, header first, no trailing newline
///
/// Fields are written verbatim; a string containing `;` or a newline is not
/// escaped.
pub fn render(table: &DatasheetTable) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);
    lines.push(table.column_names().join(FIELD_SEPARATOR));

    for row in &table.rows {
        let fields: Vec<String> = row.iter().map(ToString::to_string).collect();
        lines.push(fields.join(FIELD_SEPARATOR));
    }

    lines.join(LINE_SEPARATOR)
}
