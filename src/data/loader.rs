use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::error::DashboardError;

use super::model::{Dataset, Row, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listings table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one listing per record (the usual export)
/// * `.json`    – `[{ "manufacturer": "ford", "price": 5000, ... }, ...]`
/// * `.parquet` – flat columns of strings, integers, floats, booleans
pub fn load_file(path: &Path) -> Result<Dataset, DashboardError> {
    // Present but unreadable (permissions) counts as not found too.
    if !path.is_file() || std::fs::File::open(path).is_err() {
        return Err(DashboardError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let loaded = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        _ => {
            return Err(DashboardError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    loaded.map_err(|e| DashboardError::Malformed {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, every other row one listing.
/// Cell types are inferred per cell; empty cells are absent, and so are
/// trailing cells a short record leaves out.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, cell)| (col.clone(), guess_value(cell)))
            .collect();

        rows.push(row);
    }

    Ok(Dataset::new(headers, rows))
}

fn guess_value(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::float(f);
    }
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return Value::Bool(s.eq_ignore_ascii_case("true"));
    }
    Value::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "manufacturer": "ford", "price": 5000, "odometer": null },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if i == 0 {
                column_names.push(key.clone());
            }
            row.insert(key.clone(), json_to_value(val));
        }
        rows.push(row);
    }

    Ok(Dataset::new(column_names, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of listings, one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let listing: Row = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, col)| (field.name().clone(), extract_value(col, row)))
                .collect();
            rows.push(listing);
        }
    }

    Ok(Dataset::new(column_names, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| Value::String(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| Value::String(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| Value::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| Value::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| Value::float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| Value::float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Bool(a.value(row))),
        other => Some(Value::String(format!("{other:?}"))),
    };
    value.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(ext)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let path = Path::new("./definitely/not/here.csv");
        let err = load_file(path).unwrap_err();
        assert_eq!(
            err,
            DashboardError::FileNotFound {
                path: path.to_path_buf()
            }
        );
    }

    #[test]
    fn csv_cells_are_typed_and_blanks_absent() {
        let file = write_temp(
            ".csv",
            "price,model_year,model,condition,cylinders,odometer,type,paint_color,is_4wd,manufacturer\n\
             9400,2011.0,bmw x5,good,6.0,145000.0,SUV,,1.0,bmw\n\
             25500,,ford f-150,good,6.0,88705.0,pickup,white,1.0,ford\n\
             5500,2013.0,hyundai sonata,like new,4.0,110000.0,sedan,red,,hyundai\n",
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.column_names[0], "price");
        assert_eq!(ds.value(0, "price"), &Value::Integer(9400));
        assert_eq!(ds.value(0, "model_year"), &Value::Float(2011.0));
        assert_eq!(ds.value(1, "model_year"), &Value::Null);
        assert_eq!(ds.value(0, "paint_color"), &Value::Null);
        assert_eq!(ds.value(2, "condition"), &Value::String("like new".into()));
    }

    #[test]
    fn short_csv_rows_leave_trailing_cells_absent() {
        let file = write_temp(
            ".csv",
            "manufacturer,type,price,odometer\n\
             ford,sedan,5000,100\n\
             bmw,sedan,25000\n",
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(1, "price"), &Value::Integer(25000));
        assert_eq!(ds.value(1, "odometer"), &Value::Null);
        assert_eq!(ds.column_names.len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_file_not_found() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_temp(".csv", "manufacturer,price\nford,5000\n");
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::File::open(file.path()).is_ok() {
            // Running as root: permissions are not enforced.
            return;
        }
        assert_eq!(
            load_file(file.path()),
            Err(DashboardError::FileNotFound {
                path: file.path().to_path_buf()
            })
        );
    }

    #[test]
    fn json_records_load() {
        let file = write_temp(
            ".json",
            r#"[{"manufacturer": "ford", "price": 5000, "odometer": null, "is_4wd": true},
                {"manufacturer": "ram", "price": 1.5e4}]"#,
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(0, "odometer"), &Value::Null);
        assert_eq!(ds.value(0, "is_4wd"), &Value::Bool(true));
        assert_eq!(ds.value(1, "price"), &Value::Float(15000.0));
        assert_eq!(ds.value(1, "is_4wd"), &Value::Null);
    }

    #[test]
    fn malformed_json_names_the_path() {
        let file = write_temp(".json", r#"{"not": "an array"}"#);
        match load_file(file.path()) {
            Err(DashboardError::Malformed { path, reason }) => {
                assert_eq!(path, file.path());
                assert!(reason.contains("array"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp(".xlsx", "whatever");
        assert!(matches!(
            load_file(file.path()),
            Err(DashboardError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn parquet_columns_load_with_nulls() {
        use arrow::array::ArrayRef;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("manufacturer", DataType::Utf8, true),
            Field::new("price", DataType::Int64, true),
            Field::new("is_4wd", DataType::Boolean, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![Some("ford"), None])),
            Arc::new(Int64Array::from(vec![Some(5000), None])),
            Arc::new(BooleanArray::from(vec![Some(true), None])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let out = std::fs::File::create(file.path()).unwrap();
        let mut writer = ArrowWriter::try_new(out, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.column_names, vec!["manufacturer", "price", "is_4wd"]);
        assert_eq!(ds.value(0, "manufacturer"), &Value::String("ford".into()));
        assert_eq!(ds.value(0, "price"), &Value::Integer(5000));
        assert_eq!(ds.value(0, "is_4wd"), &Value::Bool(true));
        assert!(ds.value(1, "price").is_null());
    }

    #[test]
    fn guess_value_types() {
        assert_eq!(guess_value(""), Value::Null);
        assert_eq!(guess_value("42"), Value::Integer(42));
        assert_eq!(guess_value("nan"), Value::Null);
        assert_eq!(guess_value("True"), Value::Bool(true));
        assert_eq!(guess_value("sedan"), Value::String("sedan".into()));
    }
}
