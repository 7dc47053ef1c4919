//! Delimited-records adapter: comma-separated files with a header row.

use std::collections::VecDeque;
use std::fs::File;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use super::{RowSource, INFER_SAMPLE_SIZE};
use crate::error::{Error, Result};
use crate::model::{infer_type, Column, Row, Schema, Value};

/// Reads rows from a CSV file.
///
/// The header row supplies column names. Without an explicit schema, up to
/// [`INFER_SAMPLE_SIZE`] records are buffered for type inference and then
/// replayed before the rest of the file is consumed.
pub struct CsvReader {
    reader: csv::Reader<File>,
    schema: Arc<Schema>,
    buffered: VecDeque<StringRecord>,
    record: StringRecord,
}

impl CsvReader {
    /// Opens `path`, reading the header row and inferring a schema unless
    /// one is supplied. The header row is consumed either way.
    pub fn open(path: &str, schema: Option<Schema>) -> Result<CsvReader> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().has_headers(false).from_reader(file);

        let mut header = StringRecord::new();
        if !reader.read_record(&mut header)? {
            return Err(Error::Schema(format!("{}: missing header row", path)));
        }

        let mut buffered = VecDeque::new();
        let schema = match schema {
            Some(s) => s,
            None => {
                let mut samples: Vec<Vec<String>> = vec![Vec::new(); header.len()];
                let mut record = StringRecord::new();
                for _ in 0..INFER_SAMPLE_SIZE {
                    if !reader.read_record(&mut record)? {
                        break;
                    }
                    for (i, field) in record.iter().enumerate() {
                        if let Some(column) = samples.get_mut(i) {
                            column.push(field.to_string());
                        }
                    }
                    buffered.push_back(record.clone());
                }
                let columns = header
                    .iter()
                    .zip(&samples)
                    .map(|(name, column)| Column::new(name, infer_type(column)))
                    .collect();
                Schema::new(columns)
            }
        };
        debug!(path, columns = schema.len(), sampled = buffered.len(), "opened csv source");

        Ok(CsvReader {
            reader,
            schema: Arc::new(schema),
            buffered,
            record: StringRecord::new(),
        })
    }

    fn parse_record(&self, record: &StringRecord) -> Result<Row> {
        let mut values = Vec::with_capacity(self.schema.len());
        for (i, col) in self.schema.columns.iter().enumerate() {
            match record.get(i) {
                // Short record: fill missing trailing fields with zeros.
                None => values.push(Value::zero(col.ty)),
                Some(field) => {
                    let v = Value::parse(col.ty, field).map_err(|e| Error::Value {
                        column: col.name.clone(),
                        message: e.to_string(),
                    })?;
                    values.push(v);
                }
            }
        }
        Ok(Row::new(self.schema.clone(), values))
    }
}

impl RowSource for CsvReader {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if let Some(record) = self.buffered.pop_front() {
            return self.parse_record(&record).map(Some);
        }
        if self.reader.read_record(&mut self.record)? {
            let row = self.parse_record(&self.record)?;
            Ok(Some(row))
        } else {
            Ok(None)
        }
    }
}
