use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetaValue, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw scenario table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Parquet file with flat scalar columns
/// * `.json`    – `[{ "model": ..., "scenario": ..., ... }, ...]`
/// * `.csv`     – header row with column names, one cell per column
///
/// The loader produces an untyped [`RawTable`]; schema checks (required
/// columns, year casting) happen at frame construction.
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "model": "a_model",
///     "scenario": "a_scenario",
///     "region": "World",
///     "variable": "Primary Energy",
///     "unit": "EJ/y",
///     "year": 2005,
///     "value": 1.0
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    // column order: union of keys in order of first appearance
    let mut columns: Vec<String> = Vec::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            for key in obj.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut table = RawTable::new(columns.clone());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let row = columns
            .iter()
            .map(|col| obj.get(col).map(json_to_cell).unwrap_or(MetaValue::Null))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> MetaValue {
    match val {
        JsonValue::String(s) => MetaValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetaValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetaValue::Float(f)
            } else {
                MetaValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetaValue::Bool(*b),
        JsonValue::Null => MetaValue::Null,
        other => MetaValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one scalar cell per column.
/// Cell types are guessed per value (int, float, bool, string, empty=null).
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = RawTable::new(headers);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = record.iter().map(guess_cell_type).collect();
        table.push_row(row);
    }
    Ok(table)
}

fn guess_cell_type(s: &str) -> MetaValue {
    if s.is_empty() {
        return MetaValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetaValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetaValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetaValue::Bool(s == "true");
    }
    MetaValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, ints, floats,
/// bools). Works with files written by both **Pandas** (`df.to_parquet()`)
/// and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut table: Option<RawTable> = None;
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let table = table
            .get_or_insert_with(|| RawTable::new(schema.fields().iter().map(|f| f.name().clone())));

        for row in 0..batch.num_rows() {
            let cells = (0..batch.num_columns())
                .map(|col| extract_cell(batch.column(col), row))
                .collect();
            table.push_row(cells);
        }
    }
    Ok(table.unwrap_or_default())
}

/// Extract a single scalar cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> MetaValue {
    if col.is_null(row) {
        return MetaValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                MetaValue::String(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                MetaValue::String(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            MetaValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            MetaValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            MetaValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            MetaValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            MetaValue::Bool(arr.value(row))
        }
        _ => MetaValue::String(format!("{:?}", col.data_type())),
    }
}
