use crate::app::ports::Fetcher;
use crate::error::Result;
use crate::pipeline::flatten::FlattenRules;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw record as returned from external APIs, arbitrarily nested
pub type RawRecord = serde_json::Value;

/// One flattened row keyed by column name
pub type FlatRecord = HashMap<String, Cell>;

/// A single value in a flattened table.
///
/// Cells start out as `Raw` (or `Null` when the record had no value for the
/// column) and are retagged by the coercer. Once a cell carries a typed
/// variant the coercer leaves it alone, which keeps coercion idempotent.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Explicit empty marker
    Null,
    /// Uncoerced JSON value
    Raw(serde_json::Value),
    /// Numeric value; NaN is the not-a-number marker
    Float(f64),
    Bool(bool),
    /// Date-time from epoch milliseconds; `None` is the no-date marker
    Timestamp(Option<NaiveDateTime>),
    Categorical(String),
    /// JSON-encoded array
    JsonList(String),
    Text(String),
}

impl Cell {
    pub fn is_nan(&self) -> bool {
        matches!(self, Cell::Float(f) if f.is_nan())
    }
}

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Null,
            other => Cell::Raw(other),
        }
    }
}

/// Flattened rows over a uniform column set
#[derive(Debug, Clone, Default)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRecord>,
}

impl FlatTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Appends a column and fills it with the empty marker on every row.
    pub fn add_column(&mut self, name: &str) {
        if self.has_column(name) {
            return;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.entry(name.to_string()).or_insert(Cell::Null);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Semantic column types understood by the coercer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    EpochMillis,
    List,
    Categorical,
    Identifier,
}

/// Fixed classification of column names per semantic type.
///
/// Columns not listed anywhere are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnTypes {
    pub numeric: Vec<String>,
    pub boolean: Vec<String>,
    pub epoch_millis: Vec<String>,
    pub list: Vec<String>,
    pub categorical: Vec<String>,
    pub identifier: Vec<String>,
}

impl ColumnTypes {
    pub fn groups(&self) -> [(ColumnKind, &[String]); 6] {
        [
            (ColumnKind::Numeric, self.numeric.as_slice()),
            (ColumnKind::List, self.list.as_slice()),
            (ColumnKind::Boolean, self.boolean.as_slice()),
            (ColumnKind::EpochMillis, self.epoch_millis.as_slice()),
            (ColumnKind::Categorical, self.categorical.as_slice()),
            (ColumnKind::Identifier, self.identifier.as_slice()),
        ]
    }
}

/// Hyperlink pulled out of an HTML fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

impl Link {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
            reference: None,
            mandate: None,
            description: None,
            requirements: None,
        }
    }
}

/// Raw records from one endpoint plus everything needed to tabulate them
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub output_file: String,
    pub records: Vec<RawRecord>,
    pub rules: FlattenRules,
    pub columns: ColumnTypes,
    /// Records dropped while collecting (e.g. rows without a parseable link)
    pub skipped: usize,
}

/// Core trait that every web data source implements
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// Fetch and pre-shape raw records, one dataset per output file
    async fn collect(&self, fetcher: &dyn Fetcher) -> Result<Vec<Dataset>>;
}
