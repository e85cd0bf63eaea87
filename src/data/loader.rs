use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{RetailDataset, TransactionRecord};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a POS dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the POS column names (recommended)
/// * `.json`    – `[{ "POS_DT": "2024-01-05", "STATE": "CA", ... }, ...]`
/// * `.parquet` – one Arrow column per POS column
pub fn load_file(path: &Path) -> Result<RetailDataset> {
    if !path.exists() {
        bail!(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} POS rows from {} ({} stores)",
        dataset.len(),
        path.display(),
        dataset
            .records
            .iter()
            .filter_map(|r| r.store_id.as_deref())
            .collect::<std::collections::BTreeSet<_>>()
            .len()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Source schema
// ---------------------------------------------------------------------------

/// A column of the source POS table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Date,
    State,
    City,
    Zip,
    Category,
    Brand,
    ProductType,
    StoreId,
    SalesAmount,
    SalesUnits,
    OnHandUnits,
    ReceiptUnits,
    OutOfStock,
}

impl Column {
    const ALL: [Column; 13] = [
        Column::Date,
        Column::State,
        Column::City,
        Column::Zip,
        Column::Category,
        Column::Brand,
        Column::ProductType,
        Column::StoreId,
        Column::SalesAmount,
        Column::SalesUnits,
        Column::OnHandUnits,
        Column::ReceiptUnits,
        Column::OutOfStock,
    ];

    fn name(self) -> &'static str {
        match self {
            Column::Date => "POS_DT",
            Column::State => "STATE",
            Column::City => "CITY",
            Column::Zip => "ZIP",
            Column::Category => "IRI_TSA_CATEGORY",
            Column::Brand => "IRI_TSA_BRAND",
            Column::ProductType => "IRI_TSA_TYPE",
            Column::StoreId => "STOR_ID",
            Column::SalesAmount => "STORE_SALES_AMOUNT",
            Column::SalesUnits => "STORE_SALES_UNITS",
            Column::OnHandUnits => "STORE_ON_HAND_UNITS",
            Column::ReceiptUnits => "STORE_RECEIPT_UNITS",
            Column::OutOfStock => "STORE_OOS_IND",
        }
    }
}

/// Position of each known column in the source, `None` when absent.
/// Only the date column is mandatory.
fn locate_columns<F>(mut position: F) -> Result<Vec<(Column, usize)>>
where
    F: FnMut(&str) -> Option<usize>,
{
    let located: Vec<(Column, usize)> = Column::ALL
        .iter()
        .filter_map(|&col| position(col.name()).map(|idx| (col, idx)))
        .collect();

    if !located.iter().any(|(col, _)| *col == Column::Date) {
        bail!(LoadError::MissingColumn(Column::Date.name()));
    }
    Ok(located)
}

// ---------------------------------------------------------------------------
// CellValue – a single source cell before it is typed into a record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// Cell contents read as missing, matching the defaults of pandas' `read_csv`.
const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl CellValue {
    /// Text is kept verbatim, so `" CA"` and `"CA"` stay distinct values.
    fn from_text(s: &str) -> Self {
        if NULL_MARKERS.contains(&s) {
            CellValue::Null
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

/// Store `cell` into the field backing `column`.
fn assign(
    record: &mut TransactionRecord,
    column: Column,
    cell: CellValue,
    row: usize,
) -> Result<()> {
    let invalid = |reason: String| LoadError::InvalidValue {
        row,
        column: column.name(),
        reason,
    };

    match column {
        Column::Date => record.date = to_date(cell).map_err(invalid)?,
        Column::State => record.state = to_text(cell),
        Column::City => record.city = to_text(cell),
        Column::Zip => record.zip = to_text(cell),
        Column::Category => record.category = to_text(cell),
        Column::Brand => record.brand = to_text(cell),
        Column::ProductType => record.product_type = to_text(cell),
        Column::StoreId => record.store_id = to_text(cell),
        Column::SalesAmount => record.sales_amount = to_amount(cell).map_err(invalid)?,
        Column::SalesUnits => record.sales_units = to_units(cell).map_err(invalid)?,
        Column::OnHandUnits => record.on_hand_units = to_units(cell).map_err(invalid)?,
        Column::ReceiptUnits => record.receipt_units = to_units(cell).map_err(invalid)?,
        Column::OutOfStock => record.out_of_stock = to_flag(cell).map_err(invalid)?,
    }
    Ok(())
}

fn to_text(cell: CellValue) -> Option<String> {
    match cell {
        CellValue::Null => None,
        CellValue::Text(s) => Some(s),
        CellValue::Integer(i) => Some(i.to_string()),
        CellValue::Float(f) if f.is_nan() => None,
        CellValue::Float(f) if f.fract() == 0.0 => Some(format!("{f:.0}")),
        CellValue::Float(f) => Some(f.to_string()),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Date(d) => Some(d.to_string()),
    }
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn to_date(cell: CellValue) -> Result<Option<NaiveDate>, String> {
    match cell {
        CellValue::Null => Ok(None),
        CellValue::Date(d) => Ok(Some(d)),
        CellValue::Text(s) if s.trim().is_empty() => Ok(None),
        CellValue::Text(s) => parse_date(s.trim())
            .map(Some)
            .ok_or_else(|| format!("'{s}' is not a date")),
        other => Err(format!("expected a date, got {other:?}")),
    }
}

fn to_amount(cell: CellValue) -> Result<Option<f64>, String> {
    match cell {
        CellValue::Null => Ok(None),
        CellValue::Float(f) if f.is_nan() => Ok(None),
        CellValue::Float(f) => Ok(Some(f)),
        CellValue::Integer(i) => Ok(Some(i as f64)),
        CellValue::Text(s) if s.trim().is_empty() => Ok(None),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| (!f.is_nan()).then_some(f))
            .map_err(|_| format!("'{s}' is not a number")),
        other => Err(format!("expected a number, got {other:?}")),
    }
}

fn to_units(cell: CellValue) -> Result<Option<i64>, String> {
    match cell {
        CellValue::Text(ref s) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = t.parse::<i64>() {
                return Ok(Some(i));
            }
            match t.parse::<f64>() {
                Ok(f) if f.is_nan() => Ok(None),
                Ok(f) => integral(f),
                Err(_) => Err(format!("'{s}' is not a whole number")),
            }
        }
        CellValue::Integer(i) => Ok(Some(i)),
        CellValue::Float(f) if f.is_nan() => Ok(None),
        CellValue::Float(f) => integral(f),
        CellValue::Null => Ok(None),
        other => Err(format!("expected a whole number, got {other:?}")),
    }
}

fn integral(f: f64) -> Result<Option<i64>, String> {
    if f.fract() == 0.0 && f.is_finite() {
        Ok(Some(f as i64))
    } else {
        Err(format!("{f} is not a whole number"))
    }
}

/// Stock-out indicator: set only when the value equals 1.
fn to_flag(cell: CellValue) -> Result<Option<bool>, String> {
    match cell {
        CellValue::Null => Ok(None),
        CellValue::Bool(b) => Ok(Some(b)),
        CellValue::Integer(i) => Ok(Some(i == 1)),
        CellValue::Float(f) if f.is_nan() => Ok(None),
        CellValue::Float(f) => Ok(Some(f == 1.0)),
        CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => other
                .parse::<f64>()
                .map(|f| (!f.is_nan()).then_some(f == 1.0))
                .map_err(|_| format!("'{s}' is not a stock-out indicator")),
        },
        other => Err(format!("expected a stock-out indicator, got {other:?}")),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the POS column names, one sale per line.
/// Every cell is read as text so ZIP codes keep their leading zeros.
fn load_csv(path: &Path) -> Result<RetailDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let columns = locate_columns(|name| headers.iter().position(|h| h.trim() == name))?;

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        // The header is line 1.
        let row = result.with_context(|| format!("CSV line {}", row_no + 2))?;
        let line = row
            .position()
            .map_or(row_no + 2, |pos| pos.line() as usize);

        let mut record = TransactionRecord::default();
        for &(column, idx) in &columns {
            let cell = CellValue::from_text(row.get(idx).unwrap_or(""));
            assign(&mut record, column, cell, line)?;
        }
        records.push(record);
    }

    Ok(RetailDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "POS_DT": "2024-01-05", "STATE": "CA", "STORE_SALES_AMOUNT": 10.0, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RetailDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    if !rows.is_empty() && !rows.iter().any(|r| r.get(Column::Date.name()).is_some()) {
        bail!(LoadError::MissingColumn(Column::Date.name()));
    }

    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut record = TransactionRecord::default();
        for column in Column::ALL {
            if let Some(val) = obj.get(column.name()) {
                assign(&mut record, column, json_to_cell(val), i + 1)?;
            }
        }
        records.push(record);
    }

    Ok(RetailDataset::from_records(records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::from_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per POS field.
///
/// Strings, integers, floats, booleans, dates and timestamps are understood;
/// files written by both **Pandas** and **Polars** work.
fn load_parquet(path: &Path) -> Result<RetailDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let columns = locate_columns(|name| schema.index_of(name).ok())?;
        let first = records.len() + 1;

        for row in 0..batch.num_rows() {
            let mut record = TransactionRecord::default();
            for &(column, idx) in &columns {
                let cell = extract_cell(batch.column(idx), row).with_context(|| {
                    format!("Row {}: reading '{}'", first + row, column.name())
                })?;
                assign(&mut record, column, cell, first + row)?;
            }
            records.push(record);
        }
    }

    Ok(RetailDataset::from_records(records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::from_text(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => CellValue::from_text(col.as_string::<i64>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            CellValue::Integer(i64::try_from(v).context("unsigned value out of range")?)
        }
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Date32 => date_cell(col.as_primitive::<Date32Type>().value_as_date(row))?,
        DataType::Date64 => date_cell(col.as_primitive::<Date64Type>().value_as_date(row))?,
        DataType::Timestamp(unit, _) => {
            let dt = match unit {
                TimeUnit::Second => {
                    col.as_primitive::<TimestampSecondType>().value_as_datetime(row)
                }
                TimeUnit::Millisecond => {
                    col.as_primitive::<TimestampMillisecondType>().value_as_datetime(row)
                }
                TimeUnit::Microsecond => {
                    col.as_primitive::<TimestampMicrosecondType>().value_as_datetime(row)
                }
                TimeUnit::Nanosecond => {
                    col.as_primitive::<TimestampNanosecondType>().value_as_datetime(row)
                }
            };
            date_cell(dt.map(|dt| dt.date()))?
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

fn date_cell(date: Option<NaiveDate>) -> Result<CellValue> {
    date.map(CellValue::Date).context("date out of range")
}
