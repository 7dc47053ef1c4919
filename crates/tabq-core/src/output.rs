//! Result-stream consumers: CSV, line-delimited JSON, and aligned tables.
//!
//! Every format emits nothing at all for an empty row stream.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde_json::{Map, Number, Value as JsonValue};

use crate::error::Result;
use crate::exec::RowStream;
use crate::model::{Row, Value};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Header line then one record per row
    Csv,
    /// One JSON object per row
    Json,
    /// Left-aligned columns with a dash separator row
    Table,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

/// Returned when an output format flag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(
    /// The unrecognized flag value
    pub String,
);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported output format: {}", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Drains `rows` into `writer` in the requested format.
///
/// Row-stream errors and write errors both surface here; rows already
/// written stay written.
pub fn write_rows<W: Write>(
    writer: W,
    format: OutputFormat,
    rows: &mut dyn RowStream,
) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(writer, rows),
        OutputFormat::Json => write_json(writer, rows),
        OutputFormat::Table => write_table(writer, rows),
    }
}

fn write_csv<W: Write>(writer: W, rows: &mut dyn RowStream) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    let mut header_written = false;
    while let Some(row) = rows.next_row()? {
        if !header_written {
            out.write_record(row.schema.columns.iter().map(|c| c.name.as_str()))?;
            header_written = true;
        }
        out.write_record(row.values.iter().map(|v| v.to_string()))?;
    }
    out.flush()?;
    Ok(())
}

fn write_json<W: Write>(mut writer: W, rows: &mut dyn RowStream) -> Result<()> {
    while let Some(row) = rows.next_row()? {
        let mut obj = Map::with_capacity(row.schema.len());
        for (col, value) in row.schema.columns.iter().zip(&row.values) {
            obj.insert(col.name.clone(), json_value(value));
        }
        serde_json::to_writer(&mut writer, &obj)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

// Native JSON types where the value's type has one, strings otherwise.
fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Int(v) => JsonValue::Number((*v).into()),
        Value::Float(v) => match Number::from_f64(*v) {
            Some(n) => JsonValue::Number(n),
            None => JsonValue::String(value.to_string()),
        },
        Value::Bool(v) => JsonValue::Bool(*v),
        Value::String(_) | Value::DateTime(_) => JsonValue::String(value.to_string()),
    }
}

fn write_table<W: Write>(mut writer: W, rows: &mut dyn RowStream) -> Result<()> {
    let mut headers: Option<Vec<String>> = None;
    let mut records: Vec<Vec<String>> = Vec::new();
    while let Some(row) = rows.next_row()? {
        if headers.is_none() {
            headers = Some(row.schema.columns.iter().map(|c| c.name.clone()).collect());
        }
        records.push(row.values.iter().map(Value::to_string).collect());
    }
    let headers = match headers {
        None => return Ok(()),
        Some(h) => h,
    };

    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for record in &records {
        for (i, field) in record.iter().enumerate() {
            if i < widths.len() && field.len() > widths[i] {
                widths[i] = field.len();
            }
        }
    }

    writeln!(writer, "{}", format_table_row(&headers, &widths))?;
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", dashes.join("  "))?;
    for record in &records {
        writeln!(writer, "{}", format_table_row(record, &widths))?;
    }
    Ok(())
}

fn format_table_row(fields: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = fields
        .iter()
        .zip(widths)
        .map(|(field, width)| format!("{:<width$}", field, width = *width))
        .collect();
    padded.join("  ")
}
