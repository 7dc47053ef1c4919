//! Line-delimited-objects adapter: one JSON object per line.

use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::{RowSource, INFER_SAMPLE_SIZE};
use crate::error::{Error, Result};
use crate::model::{infer_type, Column, Row, Schema, Value};

type JsonObject = Map<String, JsonValue>;

/// Reads rows from a newline-delimited JSON file.
///
/// Blank lines are skipped. Columns are the keys observed across the
/// inference sample, in first-seen order; each key's values are sampled in
/// their string form. A `null` field counts as absent: it contributes no
/// sample and is zero-filled in rows.
pub struct NdjsonReader {
    lines: Lines<BufReader<File>>,
    schema: Arc<Schema>,
    buffered: VecDeque<JsonObject>,
}

impl NdjsonReader {
    /// Opens `path`, inferring a schema from the first non-empty lines
    /// unless one is supplied.
    pub fn open(path: &str, schema: Option<Schema>) -> Result<NdjsonReader> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let mut buffered = VecDeque::new();
        let schema = match schema {
            Some(s) => s,
            None => {
                let mut order: Vec<String> = Vec::new();
                let mut samples: HashMap<String, Vec<String>> = HashMap::new();
                while buffered.len() < INFER_SAMPLE_SIZE {
                    let line = match lines.next() {
                        None => break,
                        Some(line) => line?,
                    };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let obj = parse_object_line(line)?;
                    for (key, value) in &obj {
                        let column = samples.entry(key.clone()).or_insert_with(|| {
                            order.push(key.clone());
                            Vec::new()
                        });
                        if !value.is_null() {
                            column.push(json_field_text(value));
                        }
                    }
                    buffered.push_back(obj);
                }
                let columns = order
                    .iter()
                    .map(|name| Column::new(name.clone(), infer_type(&samples[name])))
                    .collect();
                Schema::new(columns)
            }
        };
        debug!(path, columns = schema.len(), sampled = buffered.len(), "opened ndjson source");

        Ok(NdjsonReader {
            lines,
            schema: Arc::new(schema),
            buffered,
        })
    }

    fn parse_object(&self, obj: &JsonObject) -> Result<Row> {
        let mut values = Vec::with_capacity(self.schema.len());
        for col in &self.schema.columns {
            match obj.get(&col.name) {
                None | Some(JsonValue::Null) => values.push(Value::zero(col.ty)),
                Some(raw) => {
                    let text = json_field_text(raw);
                    let v = Value::parse(col.ty, &text).map_err(|e| Error::Value {
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

impl RowSource for NdjsonReader {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        if let Some(obj) = self.buffered.pop_front() {
            return self.parse_object(&obj).map(Some);
        }
        for line in self.lines.by_ref() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let obj = parse_object_line(line)?;
            return self.parse_object(&obj).map(Some);
        }
        Ok(None)
    }
}

fn parse_object_line(line: &str) -> Result<JsonObject> {
    match serde_json::from_str::<JsonValue>(line)? {
        JsonValue::Object(obj) => Ok(obj),
        _ => Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "expected a JSON object per line",
        ))),
    }
}

// The string form a JSON field is sampled and parsed under.
fn json_field_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        // Nested values keep their JSON text; the row model is flat.
        other => other.to_string(),
    }
}
