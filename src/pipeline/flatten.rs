//! Record flattening: nested JSON records in, uniform flat rows out.
//!
//! Two passes over the input. The first collects the column set (geometry
//! columns first, then every property key, with objects under a flatten
//! target such as `certs` expanded to `certs_<subkey>`). The second builds one
//! row per record using the same expansion rule and fills every column the
//! record lacks with `Cell::Null`.

use crate::constants::{GEOMETRY_COLUMNS, SCALAR_COLUMN};
use crate::types::{Cell, FlatRecord, FlatTable, RawRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// How a dataset's records are flattened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenRules {
    /// Key holding the property map (`properties` for GeoJSON features).
    /// `None` means the record itself is the property map.
    pub properties_key: Option<String>,
    /// Property keys whose object values are expanded into `<key>_<subkey>` columns
    pub nested: Vec<String>,
    /// Emit geometry_type / coord_x / coord_y / feature_type ahead of the properties
    pub geometry: bool,
    /// Sort property columns lexically; otherwise keep first-seen order
    pub sort_columns: bool,
}

impl Default for FlattenRules {
    fn default() -> Self {
        Self {
            properties_key: None,
            nested: Vec::new(),
            geometry: false,
            sort_columns: true,
        }
    }
}

impl FlattenRules {
    /// Rules for a GeoJSON-style FeatureCollection
    pub fn feature_collection(nested: &[&str]) -> Self {
        Self {
            properties_key: Some("properties".to_string()),
            nested: nested.iter().map(|s| s.to_string()).collect(),
            geometry: true,
            sort_columns: true,
        }
    }

    /// Rules for a plain JSON list of objects or scalars, keeping key order
    pub fn plain_records() -> Self {
        Self {
            sort_columns: false,
            ..Self::default()
        }
    }

    fn is_nested_target(&self, key: &str) -> bool {
        self.nested.iter().any(|n| n == key)
    }
}

/// Flatten records into a table whose rows all carry the full column set.
#[instrument(skip_all, fields(records = records.len()))]
pub fn flatten_records(records: &[RawRecord], rules: &FlattenRules) -> FlatTable {
    let columns = column_set(records, rules);
    let rows: Vec<FlatRecord> = records
        .iter()
        .map(|record| flatten_record(record, rules, &columns))
        .collect();

    info!(
        "Flattened {} records into {} columns",
        rows.len(),
        columns.len()
    );
    FlatTable { columns, rows }
}

/// First pass: the ordered union of all columns across `records`.
pub fn column_set(records: &[RawRecord], rules: &FlattenRules) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns: Vec<String> = Vec::new();

    if rules.geometry {
        for col in GEOMETRY_COLUMNS {
            seen.insert(col.to_string());
            columns.push(col.to_string());
        }
    }

    let mut property_columns: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in property_cells(record, rules) {
            if seen.insert(name.clone()) {
                property_columns.push(name);
            }
        }
    }
    if rules.sort_columns {
        property_columns.sort();
    }

    columns.extend(property_columns);
    columns
}

/// Second pass: one row for `record` over `columns`.
pub fn flatten_record(record: &RawRecord, rules: &FlattenRules, columns: &[String]) -> FlatRecord {
    let mut row = FlatRecord::with_capacity(columns.len());

    if rules.geometry {
        for (name, cell) in geometry_cells(record) {
            row.insert(name.to_string(), cell);
        }
    }

    for (name, cell) in property_cells(record, rules) {
        if rules.geometry && GEOMETRY_COLUMNS.contains(&name.as_str()) {
            debug!("Property '{}' shadows a geometry column; keeping geometry", name);
            continue;
        }
        row.insert(name, cell);
    }

    for col in columns {
        row.entry(col.clone()).or_insert(Cell::Null);
    }
    row
}

/// Geometry fields of a feature; absent or short coordinates become `Null`.
fn geometry_cells(record: &RawRecord) -> [(&'static str, Cell); 4] {
    let geometry = record.get("geometry");
    let geometry_type = geometry.and_then(|g| g.get("type"));
    let coords = geometry
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array);
    let coord = |i: usize| coords.and_then(|c| c.get(i)).cloned().map_or(Cell::Null, Cell::from);

    [
        ("geometry_type", geometry_type.cloned().map_or(Cell::Null, Cell::from)),
        ("coord_x", coord(0)),
        ("coord_y", coord(1)),
        ("feature_type", record.get("type").cloned().map_or(Cell::Null, Cell::from)),
    ]
}

/// Flattened `(column, cell)` pairs for the properties of one record.
///
/// Objects under a nested target expand into `<target>_<subkey>`. A synthetic
/// name never overwrites a literal key of the same name in the same record.
fn property_cells(record: &RawRecord, rules: &FlattenRules) -> Vec<(String, Cell)> {
    let props = match &rules.properties_key {
        Some(key) => record.get(key.as_str()).and_then(Value::as_object),
        None => match record {
            Value::Object(map) => Some(map),
            Value::Null => None,
            scalar => return vec![(SCALAR_COLUMN.to_string(), Cell::from(scalar.clone()))],
        },
    };
    let Some(props) = props else {
        return Vec::new();
    };

    let literal_keys: HashSet<&str> = props
        .iter()
        .filter(|(k, v)| !(rules.is_nested_target(k) && v.is_object()))
        .map(|(k, _)| k.as_str())
        .collect();

    let mut out = Vec::with_capacity(props.len());
    for (key, value) in props {
        match value {
            Value::Object(sub) if rules.is_nested_target(key) => {
                for (sub_key, sub_value) in sub {
                    let name = format!("{key}_{sub_key}");
                    if literal_keys.contains(name.as_str()) {
                        warn!("Nested key '{}' collides with a literal property; keeping the literal", name);
                        continue;
                    }
                    out.push((name, Cell::from(sub_value.clone())));
                }
            }
            _ => out.push((key.clone(), Cell::from(value.clone()))),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn features() -> Vec<RawRecord> {
        vec![
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [151.2, -33.8]},
                "properties": {"name": "SYD1", "m2": "1200"}
            }),
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [144.9, -37.8]},
                "properties": {"name": "MEL1", "certs": {"LEED": "TRUE", "EUcoc": "FALSE"}}
            }),
        ]
    }

    #[test]
    fn test_geometry_columns_first_then_sorted_properties() {
        let rules = FlattenRules::feature_collection(&["certs"]);
        let cols = column_set(&features(), &rules);
        assert_eq!(
            cols,
            vec![
                "geometry_type",
                "coord_x",
                "coord_y",
                "feature_type",
                "certs_EUcoc",
                "certs_LEED",
                "m2",
                "name"
            ]
        );
    }

    #[test]
    fn test_every_row_has_full_column_set() {
        let rules = FlattenRules::feature_collection(&["certs"]);
        let table = flatten_records(&features(), &rules);
        for row in &table.rows {
            let mut keys: Vec<&String> = row.keys().collect();
            keys.sort();
            let mut expected: Vec<&String> = table.columns.iter().collect();
            expected.sort();
            assert_eq!(keys, expected);
        }
        assert_eq!(table.rows[0]["certs_LEED"], Cell::Null);
        assert_eq!(table.rows[1]["certs_LEED"], Cell::Raw(json!("TRUE")));
        assert_eq!(table.rows[1]["m2"], Cell::Null);
    }

    #[test]
    fn test_missing_properties_and_short_coordinates() {
        let records = vec![
            json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [10.0]}}),
            json!({"type": "Feature"}),
        ];
        let table = flatten_records(&records, &FlattenRules::feature_collection(&["certs"]));

        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.rows[0]["coord_x"], Cell::Raw(json!(10.0)));
        assert_eq!(table.rows[0]["coord_y"], Cell::Null);
        assert_eq!(table.rows[1]["geometry_type"], Cell::Null);
        assert_eq!(table.rows[1]["coord_x"], Cell::Null);
        assert_eq!(table.rows[1]["feature_type"], Cell::Raw(json!("Feature")));
    }

    #[test]
    fn test_literal_key_wins_over_nested_expansion() {
        let rules = FlattenRules::feature_collection(&["certs"]);
        // literal key before and after the nested object
        let records = vec![
            json!({"properties": {"certs_LEED": "literal", "certs": {"LEED": "TRUE"}}}),
            json!({"properties": {"certs": {"LEED": "TRUE"}, "certs_LEED": "literal"}}),
        ];
        let table = flatten_records(&records, &rules);

        assert_eq!(table.columns.iter().filter(|c| *c == "certs_LEED").count(), 1);
        for row in &table.rows {
            assert_eq!(row["certs_LEED"], Cell::Raw(json!("literal")));
        }
    }

    #[test]
    fn test_non_object_nested_target_is_kept_literally() {
        let rules = FlattenRules::feature_collection(&["certs"]);
        let records = vec![json!({"properties": {"certs": "none"}})];
        let table = flatten_records(&records, &rules);
        assert!(table.has_column("certs"));
        assert_eq!(table.rows[0]["certs"], Cell::Raw(json!("none")));
    }

    #[test]
    fn test_plain_records_keep_first_seen_order() {
        let records = vec![
            json!({"zeta": 1, "alpha": 2}),
            json!({"mid": 3, "alpha": 4}),
        ];
        let table = flatten_records(&records, &FlattenRules::plain_records());
        assert_eq!(table.columns, vec!["zeta", "alpha", "mid"]);
        assert_eq!(table.rows[0]["mid"], Cell::Null);
    }

    #[test]
    fn test_scalar_records_flatten_to_value_column() {
        let records = vec![json!("Brisbane City"), json!("Toowong")];
        let table = flatten_records(&records, &FlattenRules::plain_records());
        assert_eq!(table.columns, vec![SCALAR_COLUMN]);
        assert_eq!(table.rows[1][SCALAR_COLUMN], Cell::Raw(json!("Toowong")));
    }
}
