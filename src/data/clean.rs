use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::columns::{
    CONDITION, CYLINDERS, IS_4WD, MANUFACTURER, MODEL_YEAR, ODOMETER, PAINT_COLOR, PRICE, TYPE,
};
use super::model::{Dataset, Row, Value};
use super::stats::median;

// ---------------------------------------------------------------------------
// Cleaning rules
// ---------------------------------------------------------------------------

/// Tunables for [`clean`]. Defaults match the listings export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    pub manufacturer_sentinel: String,
    pub paint_color_sentinel: String,
    pub condition_sentinel: String,
    /// Used when a column has no present value at all, so even the
    /// dataset-wide median is undefined.
    pub undefined_median_fallback: i64,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            manufacturer_sentinel: "Unknown".into(),
            paint_color_sentinel: "unknown".into(),
            condition_sentinel: "unknown_condition".into(),
            undefined_median_fallback: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Cleaning report
// ---------------------------------------------------------------------------

/// How the cells of one column were filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnReport {
    /// Replaced by a sentinel / default value.
    pub defaulted: usize,
    pub group_median: usize,
    pub global_median: usize,
    /// Filled with `undefined_median_fallback`.
    pub fallback: usize,
}

impl ColumnReport {
    pub fn total(&self) -> usize {
        self.defaulted + self.group_median + self.global_median + self.fallback
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub columns: BTreeMap<String, ColumnReport>,
}

impl CleaningReport {
    pub fn total_filled(&self) -> usize {
        self.columns.values().map(ColumnReport::total).sum()
    }

    /// One human-readable line per column that needed any filling.
    pub fn summary_lines(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, r)| r.total() > 0)
            .map(|(col, r)| {
                let mut parts = Vec::new();
                if r.defaulted > 0 {
                    parts.push(format!("{} defaulted", r.defaulted));
                }
                if r.group_median > 0 {
                    parts.push(format!("{} group median", r.group_median));
                }
                if r.global_median > 0 {
                    parts.push(format!("{} overall median", r.global_median));
                }
                if r.fallback > 0 {
                    parts.push(format!("{} fallback", r.fallback));
                }
                format!("{col}: {}", parts.join(", "))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Normalize and impute the recognized listing columns. The input is left
/// untouched so the raw table stays available for display.
pub fn clean(dataset: &Dataset, rules: &CleaningRules) -> Dataset {
    clean_with_report(dataset, rules).0
}

/// [`clean`], also returning what was filled where.
///
/// Order matters: `odometer` is grouped by `model_year` and `condition`,
/// so both must be normalized before it runs.
pub fn clean_with_report(dataset: &Dataset, rules: &CleaningRules) -> (Dataset, CleaningReport) {
    let mut rows = dataset.rows.clone();
    let mut column_names = dataset.column_names.clone();
    let mut report = CleaningReport::default();

    let text_rules = [
        (MANUFACTURER, &rules.manufacturer_sentinel),
        (PAINT_COLOR, &rules.paint_color_sentinel),
        (CONDITION, &rules.condition_sentinel),
    ];
    for (column, sentinel) in text_rules {
        ensure_column(&mut column_names, column);
        let defaulted = fill_text(&mut rows, column, sentinel);
        report.columns.insert(
            column.to_string(),
            ColumnReport {
                defaulted,
                ..Default::default()
            },
        );
    }

    ensure_column(&mut column_names, PRICE);
    let defaulted = normalize_price(&mut rows);
    report.columns.insert(
        PRICE.to_string(),
        ColumnReport {
            defaulted,
            ..Default::default()
        },
    );

    ensure_column(&mut column_names, IS_4WD);
    let defaulted = normalize_flag(&mut rows, IS_4WD);
    report.columns.insert(
        IS_4WD.to_string(),
        ColumnReport {
            defaulted,
            ..Default::default()
        },
    );

    for column in [CYLINDERS, MODEL_YEAR] {
        ensure_column(&mut column_names, column);
        let r = impute_group_median(&mut rows, column, &[TYPE], rules.undefined_median_fallback);
        report.columns.insert(column.to_string(), r);
    }

    ensure_column(&mut column_names, ODOMETER);
    let r = impute_group_median(
        &mut rows,
        ODOMETER,
        &[MODEL_YEAR, CONDITION],
        rules.undefined_median_fallback,
    );
    report.columns.insert(ODOMETER.to_string(), r);

    for (col, r) in &report.columns {
        if r.fallback > 0 {
            log::warn!(
                "{col}: no value present anywhere, filled {} cells with {}",
                r.fallback,
                rules.undefined_median_fallback
            );
        }
    }

    (Dataset::new(column_names, rows), report)
}

fn ensure_column(column_names: &mut Vec<String>, column: &str) {
    if !column_names.iter().any(|c| c == column) {
        column_names.push(column.to_string());
    }
}

fn fill_text(rows: &mut [Row], column: &str, sentinel: &str) -> usize {
    let mut filled = 0;
    for row in rows {
        let text = match row.get(column) {
            None | Some(Value::Null) => {
                filled += 1;
                sentinel.to_string()
            }
            Some(Value::String(_)) => continue,
            Some(other) => other.to_text(),
        };
        row.insert(column.to_string(), Value::String(text));
    }
    filled
}

/// Numeric view of a cell, parsing numeric text. Anything else is absent.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Bool(_) | Value::Null => None,
    }
}

fn normalize_price(rows: &mut [Row]) -> usize {
    let mut filled = 0;
    for row in rows {
        let price = match coerce_number(row.get(PRICE)) {
            Some(p) if p >= 0.0 => p,
            _ => {
                filled += 1;
                0.0
            }
        };
        row.insert(PRICE.to_string(), Value::Float(price));
    }
    filled
}

fn normalize_flag(rows: &mut [Row], column: &str) -> usize {
    let mut filled = 0;
    for row in rows {
        let flag = match row.get(column) {
            None | Some(Value::Null) => {
                filled += 1;
                false
            }
            Some(Value::Bool(b)) => *b,
            Some(Value::Integer(i)) => *i != 0,
            Some(Value::Float(f)) => *f != 0.0,
            Some(Value::String(s)) => !matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "" | "false" | "0" | "no" | "n" | "f"
            ),
        };
        row.insert(column.to_string(), Value::Bool(flag));
    }
    filled
}

/// Fill `target` with the median of its group (rows sharing every `keys`
/// value), then with the median of the whole column after that pass, then
/// with `fallback`. All values end up as truncated integers.
///
/// Rows with any absent key belong to no group.
fn impute_group_median(rows: &mut [Row], target: &str, keys: &[&str], fallback: i64) -> ColumnReport {
    let mut report = ColumnReport::default();

    let present: Vec<Option<f64>> = rows.iter().map(|r| coerce_number(r.get(target))).collect();
    let group_keys: Vec<Option<Vec<Value>>> = rows
        .iter()
        .map(|r| {
            keys.iter()
                .map(|k| r.get(*k).filter(|v| !v.is_null()).cloned())
                .collect()
        })
        .collect();

    let mut groups: BTreeMap<&[Value], Vec<f64>> = BTreeMap::new();
    for (key, value) in group_keys.iter().zip(&present) {
        if let (Some(key), Some(value)) = (key, value) {
            groups.entry(key.as_slice()).or_default().push(*value);
        }
    }
    let group_medians: BTreeMap<&[Value], f64> = groups
        .into_iter()
        .filter_map(|(key, mut values)| median(&mut values).map(|m| (key, m)))
        .collect();

    // First pass: group medians.
    let first_pass: Vec<Option<f64>> = present
        .iter()
        .zip(&group_keys)
        .map(|(value, key)| {
            value.or_else(|| {
                let m = key.as_deref().and_then(|k| group_medians.get(k)).copied();
                if m.is_some() {
                    report.group_median += 1;
                }
                m
            })
        })
        .collect();

    // Second pass: dataset-wide median of what the first pass produced.
    let mut known: Vec<f64> = first_pass.iter().flatten().copied().collect();
    let global = median(&mut known);

    for (row, value) in rows.iter_mut().zip(first_pass) {
        let filled = match (value, global) {
            (Some(v), _) => v.trunc() as i64,
            (None, Some(g)) => {
                report.global_median += 1;
                g.trunc() as i64
            }
            (None, None) => {
                report.fallback += 1;
                fallback
            }
        };
        row.insert(target.to_string(), Value::Integer(filled));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    fn dataset(columns: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
        let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|cells| names.iter().cloned().zip(cells).collect())
            .collect();
        Dataset::new(names, rows)
    }

    fn sample() -> Dataset {
        dataset(
            &[
                "manufacturer",
                "type",
                "condition",
                "paint_color",
                "price",
                "cylinders",
                "model_year",
                "odometer",
                "is_4wd",
                "model",
            ],
            vec![
                vec![s("ford"), s("sedan"), s("good"), Value::Null, Value::Integer(5000), Value::Null, Value::Integer(2010), Value::Null, Value::Null, s("focus")],
                vec![Value::Null, s("sedan"), Value::Null, s("red"), s("n/a"), Value::Integer(4), Value::Null, Value::Integer(90000), Value::Float(1.0), s("civic")],
                vec![s("bmw"), s("sedan"), s("good"), s("black"), Value::Float(-3.0), Value::Integer(6), Value::Integer(2012), Value::Integer(50000), Value::Bool(false), s("m3")],
                vec![s("ram"), s("truck"), s("fair"), s("white"), s("12000"), Value::Null, Value::Null, Value::Null, s("yes"), s("1500")],
                vec![s("ram"), Value::Null, s("good"), s("white"), Value::Integer(7000), Value::Integer(8), Value::Integer(2010), Value::Integer(70000), Value::Integer(1), s("2500")],
            ],
        )
    }

    #[test]
    fn cylinders_take_group_median() {
        let ds = dataset(
            &["type", "cylinders"],
            vec![
                vec![s("sedan"), Value::Null],
                vec![s("sedan"), Value::Integer(4)],
                vec![s("sedan"), Value::Integer(6)],
            ],
        );
        let cleaned = clean(&ds, &CleaningRules::default());
        assert_eq!(cleaned.value(0, "cylinders"), &Value::Integer(5));
        assert_eq!(cleaned.value(1, "cylinders"), &Value::Integer(4));
    }

    #[test]
    fn text_columns_get_sentinels() {
        let (cleaned, report) = clean_with_report(&sample(), &CleaningRules::default());
        assert_eq!(cleaned.value(1, "manufacturer"), &s("Unknown"));
        assert_eq!(cleaned.value(0, "paint_color"), &s("unknown"));
        assert_eq!(cleaned.value(1, "condition"), &s("unknown_condition"));
        assert_eq!(report.columns["manufacturer"].defaulted, 1);
    }

    #[test]
    fn price_is_numeric_and_non_negative() {
        let cleaned = clean(&sample(), &CleaningRules::default());
        let prices: Vec<&Value> = (0..cleaned.len()).map(|i| cleaned.value(i, "price")).collect();
        assert_eq!(
            prices,
            vec![
                &Value::Float(5000.0),
                &Value::Float(0.0),
                &Value::Float(0.0),
                &Value::Float(12000.0),
                &Value::Float(7000.0),
            ]
        );
    }

    #[test]
    fn four_wheel_drive_coerces_to_bool() {
        let cleaned = clean(&sample(), &CleaningRules::default());
        let flags: Vec<&Value> = (0..cleaned.len()).map(|i| cleaned.value(i, "is_4wd")).collect();
        assert_eq!(
            flags,
            vec![
                &Value::Bool(false),
                &Value::Bool(true),
                &Value::Bool(false),
                &Value::Bool(true),
                &Value::Bool(true),
            ]
        );
    }

    #[test]
    fn empty_group_falls_back_to_overall_median() {
        let (cleaned, report) = clean_with_report(&sample(), &CleaningRules::default());
        // Row 0: sedan group {4, 6} → 5.
        assert_eq!(cleaned.value(0, "cylinders"), &Value::Integer(5));
        // Row 3: the truck group has no cylinders; overall median of
        // {5, 4, 6, 8} after the group pass is 5.5 → 5.
        assert_eq!(cleaned.value(3, "cylinders"), &Value::Integer(5));
        let cyl = report.columns["cylinders"];
        assert_eq!((cyl.group_median, cyl.global_median, cyl.fallback), (1, 1, 0));
    }

    #[test]
    fn odometer_groups_by_year_and_condition() {
        let cleaned = clean(&sample(), &CleaningRules::default());
        // Row 0: (2010, good) shares its group with row 4 only → 70000.
        assert_eq!(cleaned.value(0, "odometer"), &Value::Integer(70000));
        // Row 3: model_year imputed from an empty truck group, so it falls
        // to the overall year median (2010), which makes (2010, fair) a new
        // group with no readings → overall median of {70000, 90000, 50000,
        // 70000}.
        assert_eq!(cleaned.value(3, "model_year"), &Value::Integer(2010));
        assert_eq!(cleaned.value(3, "odometer"), &Value::Integer(70000));
    }

    #[test]
    fn absent_group_key_takes_overall_median() {
        let ds = dataset(
            &["type", "cylinders"],
            vec![
                vec![s("sedan"), Value::Integer(4)],
                vec![s("sedan"), Value::Integer(6)],
                vec![s("sedan"), Value::Null],
                vec![s("truck"), Value::Integer(8)],
                vec![Value::Null, Value::Null],
            ],
        );
        let (cleaned, report) = clean_with_report(&ds, &CleaningRules::default());
        assert_eq!(cleaned.value(2, "cylinders"), &Value::Integer(5));
        // No type, so no group: overall median of {4, 6, 5, 8} is 5.5 → 5.
        assert_eq!(cleaned.value(4, "cylinders"), &Value::Integer(5));
        let cyl = report.columns["cylinders"];
        assert_eq!((cyl.group_median, cyl.global_median, cyl.fallback), (1, 1, 0));
    }

    #[test]
    fn no_recognized_column_is_absent_after_cleaning() {
        let cleaned = clean(&sample(), &CleaningRules::default());
        for col in [
            "manufacturer",
            "paint_color",
            "condition",
            "price",
            "cylinders",
            "model_year",
            "odometer",
            "is_4wd",
        ] {
            for i in 0..cleaned.len() {
                assert!(!cleaned.value(i, col).is_null(), "{col} row {i}");
            }
        }
    }

    #[test]
    fn passthrough_columns_are_untouched() {
        let ds = sample();
        let cleaned = clean(&ds, &CleaningRules::default());
        for i in 0..ds.len() {
            assert_eq!(cleaned.value(i, "model"), ds.value(i, "model"));
            assert_eq!(cleaned.value(i, "type"), ds.value(i, "type"));
        }
        assert_eq!(cleaned.column_names, ds.column_names);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let rules = CleaningRules::default();
        let once = clean(&sample(), &rules);
        let twice = clean(&once, &rules);
        assert_eq!(once, twice);
    }

    #[test]
    fn input_is_not_mutated() {
        let ds = sample();
        let before = ds.clone();
        let _ = clean(&ds, &CleaningRules::default());
        assert_eq!(ds, before);
    }

    #[test]
    fn entirely_absent_column_uses_fallback() {
        let ds = dataset(
            &["type", "odometer"],
            vec![vec![Value::Null, Value::Null], vec![Value::Null, Value::Null]],
        );
        let rules = CleaningRules {
            undefined_median_fallback: -1,
            ..Default::default()
        };
        let (cleaned, report) = clean_with_report(&ds, &rules);
        assert_eq!(cleaned.value(0, "odometer"), &Value::Integer(-1));
        assert_eq!(report.columns["odometer"].fallback, 2);
        // Missing recognized columns are added too.
        assert!(cleaned.has_column("cylinders"));
        assert_eq!(cleaned.value(1, "cylinders"), &Value::Integer(-1));
    }

    #[test]
    fn numeric_text_and_fractions_truncate() {
        let ds = dataset(
            &["type", "model_year"],
            vec![
                vec![s("suv"), s("2011")],
                vec![s("suv"), Value::Float(2014.0)],
                vec![s("suv"), Value::Null],
            ],
        );
        let cleaned = clean(&ds, &CleaningRules::default());
        assert_eq!(cleaned.value(0, "model_year"), &Value::Integer(2011));
        // median 2012.5 → 2012
        assert_eq!(cleaned.value(2, "model_year"), &Value::Integer(2012));
    }

    #[test]
    fn report_summarizes_filled_columns() {
        let (_, report) = clean_with_report(&sample(), &CleaningRules::default());
        assert!(report.total_filled() > 0);
        let lines = report.summary_lines();
        assert!(lines.iter().any(|l| l.starts_with("cylinders:")));
        assert!(!lines.iter().any(|l| l.starts_with("model:")));
    }
}
