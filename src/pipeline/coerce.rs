//! Column type coercion.
//!
//! Every rule degrades to a sentinel instead of failing: NaN for numbers,
//! `Cell::Null` for booleans and empty cells, `Timestamp(None)` for dates.
//! Typed cells are returned as they are, so running the coercer twice gives
//! the same table.

use crate::constants::{DMY_FORMAT, DMY_SUFFIX};
use crate::pipeline::csv_out::render_cell;
use crate::types::{Cell, ColumnKind, ColumnTypes, FlatTable};
use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;
use tracing::{debug, instrument};

/// Coerce every classified column present in `table`, in place.
///
/// Date columns also get a `<column>_dmy` companion appended to the column set.
#[instrument(skip_all, fields(columns = table.columns.len(), rows = table.rows.len()))]
pub fn coerce_table(table: &mut FlatTable, types: &ColumnTypes) {
    for (kind, columns) in types.groups() {
        for column in columns {
            if !table.has_column(column) {
                continue;
            }
            match kind {
                ColumnKind::EpochMillis => coerce_dates(table, column),
                _ => {
                    for row in &mut table.rows {
                        if let Some(cell) = row.get_mut(column.as_str()) {
                            let current = std::mem::replace(cell, Cell::Null);
                            *cell = coerce_cell(kind, current);
                        }
                    }
                }
            }
            debug!(column = %column, kind = ?kind, "Coerced column");
        }
    }
}

/// Apply a single non-date rule to one cell.
pub fn coerce_cell(kind: ColumnKind, cell: Cell) -> Cell {
    match kind {
        ColumnKind::Numeric => Cell::Float(to_number(&cell)),
        ColumnKind::Boolean => to_bool(cell),
        ColumnKind::EpochMillis => Cell::Timestamp(to_timestamp(&cell)),
        ColumnKind::List => to_json_list(cell),
        ColumnKind::Categorical => to_categorical(cell),
        ColumnKind::Identifier => to_identifier(cell),
    }
}

fn coerce_dates(table: &mut FlatTable, column: &str) {
    let dmy_column = format!("{column}{DMY_SUFFIX}");
    table.add_column(&dmy_column);

    let mut missing = 0usize;
    for row in &mut table.rows {
        let current = row.remove(column).unwrap_or(Cell::Null);
        let ts = to_timestamp(&current);
        if ts.is_none() {
            missing += 1;
        }
        row.insert(dmy_column.clone(), format_dmy(ts));
        row.insert(column.to_string(), Cell::Timestamp(ts));
    }
    debug!(column, missing, "Converted epoch-ms column");
}

/// Numeric view of a cell; NaN when it cannot be read as a number.
pub fn to_number(cell: &Cell) -> f64 {
    match cell {
        Cell::Float(f) => *f,
        Cell::Bool(b) => f64::from(u8::from(*b)),
        Cell::Raw(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Cell::Raw(Value::Bool(b)) => f64::from(u8::from(*b)),
        Cell::Raw(Value::String(s)) | Cell::Text(s) | Cell::Categorical(s) => {
            s.trim().parse::<f64>().unwrap_or(f64::NAN)
        }
        Cell::Timestamp(Some(dt)) => dt.and_utc().timestamp_millis() as f64,
        _ => f64::NAN,
    }
}

/// `TRUE`/`FALSE` tokens become booleans, falsy values become `Null`,
/// anything else passes through.
pub fn to_bool(cell: Cell) -> Cell {
    if matches!(cell, Cell::Bool(_)) {
        return cell;
    }
    let token = match &cell {
        Cell::Raw(Value::String(s)) | Cell::Text(s) | Cell::Categorical(s) => Some(s.as_str()),
        _ => None,
    };
    if let Some(token) = token {
        if token.eq_ignore_ascii_case("TRUE") {
            return Cell::Bool(true);
        }
        if token.eq_ignore_ascii_case("FALSE") {
            return Cell::Bool(false);
        }
    }
    if is_falsy(&cell) {
        return Cell::Null;
    }
    match cell {
        Cell::Raw(Value::Bool(b)) => Cell::Bool(b),
        other => other,
    }
}

fn is_falsy(cell: &Cell) -> bool {
    match cell {
        Cell::Null | Cell::Timestamp(None) => true,
        Cell::Raw(v) => match v {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        },
        Cell::Float(f) => *f == 0.0,
        Cell::Text(s) | Cell::Categorical(s) => s.is_empty(),
        _ => false,
    }
}

/// Milliseconds since the Unix epoch as a date-time; `None` when unreadable.
pub fn to_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    if let Cell::Timestamp(ts) = cell {
        return *ts;
    }
    let ms = to_number(cell);
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.naive_utc())
}

/// dd-mm-yyyy text for a date, or the empty marker.
pub fn format_dmy(ts: Option<NaiveDateTime>) -> Cell {
    match ts {
        Some(dt) => Cell::Text(dt.format(DMY_FORMAT).to_string()),
        None => Cell::Null,
    }
}

/// Encode as a JSON array string. Missing values become `[]`, scalars are
/// wrapped in a one-element array.
pub fn to_json_list(cell: Cell) -> Cell {
    let value = match cell {
        list @ Cell::JsonList(_) => return list,
        Cell::Null | Cell::Timestamp(None) => Value::Array(Vec::new()),
        Cell::Float(f) if f.is_nan() => Value::Array(Vec::new()),
        Cell::Raw(Value::Null) => Value::Array(Vec::new()),
        Cell::Raw(Value::Array(items)) => Value::Array(items),
        Cell::Raw(other) => Value::Array(vec![other]),
        Cell::Float(f) => Value::Array(vec![serde_json::json!(f)]),
        Cell::Bool(b) => Value::Array(vec![Value::Bool(b)]),
        Cell::Text(s) | Cell::Categorical(s) => Value::Array(vec![Value::String(s)]),
        Cell::Timestamp(Some(dt)) => Value::Array(vec![Value::String(dt.to_string())]),
    };
    Cell::JsonList(to_spaced_json(&value))
}

fn to_categorical(cell: Cell) -> Cell {
    match cell {
        kept @ (Cell::Categorical(_) | Cell::Null) => kept,
        Cell::Raw(Value::Null) => Cell::Null,
        Cell::Raw(Value::String(s)) | Cell::Text(s) => Cell::Categorical(s),
        other => Cell::Categorical(render_cell(&other)),
    }
}

fn to_identifier(cell: Cell) -> Cell {
    match cell {
        kept @ (Cell::Text(_) | Cell::Null) => kept,
        Cell::Raw(Value::Null) => Cell::Null,
        Cell::Raw(Value::String(s)) | Cell::Categorical(s) => Cell::Text(s),
        // serde_json keeps integer digits intact
        Cell::Raw(Value::Number(n)) => Cell::Text(n.to_string()),
        other => Cell::Text(render_cell(&other)),
    }
}

/// JSON text using `", "` and `": "` separators.
pub fn to_spaced_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

/// Compact JSON with a space after each separator
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
