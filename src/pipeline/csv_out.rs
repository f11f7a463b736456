use crate::error::Result;
use crate::pipeline::coerce::to_spaced_json;
use crate::types::{Cell, FlatTable};
use chrono::Timelike;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Text written to the CSV for one cell. Empty markers render as "".
pub fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Null | Cell::Timestamp(None) => String::new(),
        Cell::Float(f) => render_float(*f),
        Cell::Bool(b) => render_bool(*b),
        Cell::Timestamp(Some(dt)) => {
            if dt.nanosecond() / 1_000_000 != 0 {
                dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }
        Cell::Categorical(s) | Cell::JsonList(s) | Cell::Text(s) => s.clone(),
        Cell::Raw(value) => match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => render_bool(*b),
            Value::Number(n) => n.to_string(),
            other => to_spaced_json(other),
        },
    }
}

fn render_bool(b: bool) -> String {
    let text = if b { "True" } else { "False" };
    text.to_string()
}

fn render_float(f: f64) -> String {
    if f.is_nan() {
        String::new()
    } else if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// Write the header row (column set order) and every row; returns rows written.
pub fn write_csv<W: Write>(table: &FlatTable, writer: W) -> Result<usize> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    out.write_record(&table.columns)?;
    for row in &table.rows {
        let fields = table
            .columns
            .iter()
            .map(|col| row.get(col).map(render_cell).unwrap_or_default());
        out.write_record(fields)?;
    }
    out.flush()?;
    Ok(table.rows.len())
}

/// Write `table` to `dir/file_name`, creating `dir` if needed.
pub fn write_csv_file(table: &FlatTable, dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let file = File::create(&path)?;
    let rows = write_csv(table, file)?;
    info!("Wrote {} rows to {}", rows, path.display());
    Ok(path)
}
