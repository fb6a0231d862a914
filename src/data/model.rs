use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Column names the cleaner and the dashboard know about
// ---------------------------------------------------------------------------

pub mod columns {
    pub const MANUFACTURER: &str = "manufacturer";
    pub const TYPE: &str = "type";
    pub const CONDITION: &str = "condition";
    pub const PAINT_COLOR: &str = "paint_color";
    pub const PRICE: &str = "price";
    pub const CYLINDERS: &str = "cylinders";
    pub const MODEL_YEAR: &str = "model_year";
    pub const ODOMETER: &str = "odometer";
    pub const IS_4WD: &str = "is_4wd";
}

// ---------------------------------------------------------------------------
// Value – a single cell of the listings table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    /// Always finite; loaders turn NaN / inf into `Null`.
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            Value::Float(v) => write!(f, "{v:.2}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Build a float cell, mapping non-finite input to `Null`.
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Null
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interpret the value as an `f64` (numeric cells only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used when coercing a cell into a text column.
    /// Unlike `Display`, floats keep their full precision.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Row / ColumnKind
// ---------------------------------------------------------------------------

/// One listing: column name → value. A missing key reads as `Null`.
pub type Row = BTreeMap<String, Value>;

static NULL: Value = Value::Null;

/// Coarse dtype of a column, derived from the values present in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Boolean,
    /// Every cell is absent.
    Empty,
}

impl ColumnKind {
    fn of<'a>(values: impl Iterator<Item = &'a Value>) -> Self {
        let mut kind = ColumnKind::Empty;
        for v in values {
            let this = match v {
                Value::Null => continue,
                Value::Integer(_) | Value::Float(_) => ColumnKind::Numeric,
                Value::Bool(_) => ColumnKind::Boolean,
                Value::String(_) => return ColumnKind::Categorical,
            };
            kind = match kind {
                ColumnKind::Empty => this,
                k if k == this => k,
                _ => return ColumnKind::Categorical,
            };
        }
        kind
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full table with pre-computed column indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// All listings (rows).
    pub rows: Vec<Row>,
    /// Column names in source order.
    pub column_names: Vec<String>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<Value>>,
}

impl Dataset {
    /// Build column indices from the loaded rows. Columns that appear in
    /// rows but not in `column_names` are appended in first-seen order.
    pub fn new(mut column_names: Vec<String>, rows: Vec<Row>) -> Self {
        let mut known: BTreeSet<String> = column_names.iter().cloned().collect();
        for row in &rows {
            for col in row.keys() {
                if known.insert(col.clone()) {
                    column_names.push(col.clone());
                }
            }
        }

        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = column_names
            .iter()
            .map(|c| (c.clone(), BTreeSet::new()))
            .collect();
        for row in &rows {
            for col in &column_names {
                let val = row.get(col).unwrap_or(&NULL);
                if let Some(set) = unique_values.get_mut(col) {
                    set.insert(val.clone());
                }
            }
        }

        Dataset {
            rows,
            column_names,
            unique_values,
        }
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.unique_values.contains_key(column)
    }

    /// Cell at (`row`, `column`); `Null` when absent.
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    pub fn column_kind(&self, column: &str) -> Option<ColumnKind> {
        self.unique_values
            .get(column)
            .map(|vals| ColumnKind::of(vals.iter()))
    }

    /// Numeric columns in source order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_where(|k| k == ColumnKind::Numeric)
    }

    /// Text and boolean columns in source order.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns_where(|k| matches!(k, ColumnKind::Categorical | ColumnKind::Boolean))
    }

    fn columns_where(&self, pred: impl Fn(ColumnKind) -> bool) -> Vec<String> {
        self.column_names
            .iter()
            .filter(|c| self.column_kind(c).is_some_and(&pred))
            .cloned()
            .collect()
    }

    /// Non-null values of a column, sorted.
    pub fn distinct_labels(&self, column: &str) -> Vec<String> {
        self.unique_values
            .get(column)
            .map(|vals| {
                vals.iter()
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Non-null values of a column in order of first appearance.
    pub fn labels_in_row_order(&self, column: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        (0..self.len())
            .map(|i| self.value(i, column))
            .filter(|v| !v.is_null() && seen.insert(*v))
            .map(|v| v.to_string())
            .collect()
    }

    /// All row indices, in order.
    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, Value)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn missing_cells_read_as_null() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![row(&[("a", Value::Integer(1))])],
        );
        assert_eq!(ds.value(0, "b"), &Value::Null);
        assert_eq!(ds.value(7, "a"), &Value::Null);
        assert!(ds.unique_values["b"].contains(&Value::Null));
    }

    #[test]
    fn extra_row_keys_extend_schema_in_order() {
        let ds = Dataset::new(
            vec!["a".into()],
            vec![
                row(&[("a", Value::Null), ("z", Value::Bool(true))]),
                row(&[("m", Value::Null)]),
            ],
        );
        assert_eq!(ds.column_names, vec!["a", "z", "m"]);
    }

    #[test]
    fn column_kinds_split_numeric_and_categorical() {
        let ds = Dataset::new(
            vec!["price".into(), "type".into(), "is_4wd".into(), "gone".into(), "mixed".into()],
            vec![
                row(&[
                    ("price", Value::Float(1.5)),
                    ("type", Value::String("suv".into())),
                    ("is_4wd", Value::Bool(true)),
                    ("mixed", Value::Integer(3)),
                ]),
                row(&[
                    ("price", Value::Integer(2)),
                    ("mixed", Value::String("x".into())),
                ]),
            ],
        );
        assert_eq!(ds.column_kind("price"), Some(ColumnKind::Numeric));
        assert_eq!(ds.column_kind("gone"), Some(ColumnKind::Empty));
        assert_eq!(ds.column_kind("nope"), None);
        assert_eq!(ds.numeric_columns(), vec!["price"]);
        assert_eq!(ds.categorical_columns(), vec!["type", "is_4wd", "mixed"]);
    }

    #[test]
    fn labels_keep_first_appearance_order() {
        let ds = Dataset::new(
            vec!["m".into()],
            vec![
                row(&[("m", Value::String("ford".into()))]),
                row(&[("m", Value::Null)]),
                row(&[("m", Value::String("bmw".into()))]),
                row(&[("m", Value::String("ford".into()))]),
            ],
        );
        assert_eq!(ds.labels_in_row_order("m"), vec!["ford", "bmw"]);
        assert_eq!(ds.distinct_labels("m"), vec!["bmw", "ford"]);
    }

    #[test]
    fn float_display_drops_zero_fraction() {
        assert_eq!(Value::Float(5000.0).to_string(), "5000");
        assert_eq!(Value::Float(2.345).to_string(), "2.35");
        assert_eq!(Value::float(f64::NAN), Value::Null);
        assert_eq!(Value::Float(6.0).to_text(), "6");
    }
}
