//! The query driver: resolves inputs, wires the pipeline, drains rows.

use std::collections::HashMap;
use std::io::Write;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::exec::build_pipeline;
use crate::model::{Column, Schema, Type};
use crate::output::{write_rows, OutputFormat};
use crate::parser;
use crate::plan::Operator;
use crate::read::{open_source, InputType};

/// One query invocation: inputs, a query, and an output format.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Input specs, each `name=path` or a bare path (bound to `T`)
    pub inputs: Vec<String>,
    /// How to read the inputs
    pub input_type: InputType,
    /// Explicit schema; skips inference when present
    pub schema: Option<Schema>,
    /// The query text
    pub query: String,
    /// Result format
    pub format: OutputFormat,
}

/// Runs `request`, writing the result stream to `writer`.
///
/// The leading identifier of the query names the source table; a query
/// without one is legal only when exactly one input was supplied. Join
/// right-sources that name a registered input are rewritten to its path.
pub fn run<W: Write>(request: &QueryRequest, writer: W) -> Result<()> {
    let input_map = parse_inputs(&request.inputs)?;
    let ops = parser::parse(&request.query)?;

    let table = match parser::table_name(&request.query) {
        Some(name) => name,
        None => {
            if input_map.len() > 1 {
                return Err(Error::Usage(
                    "query must name a table when multiple inputs are provided".to_string(),
                ));
            }
            input_map
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| "T".to_string())
        }
    };
    let path = input_map
        .get(&table)
        .ok_or_else(|| Error::Usage(format!("unknown table name: {}", table)))?;
    debug!(table = %table, path = %path, operators = ops.len(), "resolved query source");

    let ops = resolve_join_inputs(ops, &input_map);
    let reader = open_source(request.input_type, path, request.schema.clone())?;
    let mut pipeline = build_pipeline(reader, &ops)?;
    write_rows(writer, request.format, pipeline.as_mut())
}

/// Builds the table-name to path mapping from raw input specs.
///
/// A spec containing `=` is `name=path`; a bare spec is a path bound to
/// the synthetic name `T`, and only one of those is allowed.
pub fn parse_inputs(specs: &[String]) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    let mut unnamed = 0;
    for spec in specs {
        let spec = spec.trim();
        if spec.is_empty() {
            continue;
        }
        if let Some((name, path)) = spec.split_once('=') {
            let name = name.trim();
            let path = path.trim();
            if name.is_empty() || path.is_empty() {
                return Err(Error::Usage("input must be name=path".to_string()));
            }
            map.insert(name.to_string(), path.to_string());
        } else {
            unnamed += 1;
            if unnamed > 1 {
                return Err(Error::Usage(
                    "only one unnamed input is allowed".to_string(),
                ));
            }
            map.insert("T".to_string(), spec.to_string());
        }
    }
    if map.is_empty() {
        return Err(Error::Usage("no valid inputs provided".to_string()));
    }
    Ok(map)
}

/// Parses an explicit schema spec of the form `col:type,col:type`.
pub fn parse_schema(raw: &str) -> Result<Schema> {
    let mut columns = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, ty) = part
            .split_once(':')
            .ok_or_else(|| Error::Schema("schema entries must be col:type".to_string()))?;
        let ty = Type::from_str(ty.trim().to_lowercase().as_str())
            .map_err(|e| Error::Schema(e.to_string()))?;
        columns.push(Column::new(name.trim(), ty));
    }
    if columns.is_empty() {
        return Err(Error::Schema("empty schema".to_string()));
    }
    Ok(Schema::new(columns))
}

// A join right-source equal to a registered table name becomes that
// input's path; anything else is used verbatim. Registered names shadow
// paths on purpose.
fn resolve_join_inputs(ops: Vec<Operator>, inputs: &HashMap<String, String>) -> Vec<Operator> {
    ops.into_iter()
        .map(|op| match op {
            Operator::Join(mut join) => {
                if let Some(path) = inputs.get(&join.right) {
                    join.right = path.clone();
                }
                Operator::Join(join)
            }
            other => other,
        })
        .collect()
}
