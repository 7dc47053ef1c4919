//! Input adapters: lazy row sources over tabular files.
//!
//! An adapter opens its file eagerly (open failure surfaces at
//! construction), infers a schema from a bounded sample unless an explicit
//! one is supplied, and then yields rows one at a time. Sampled records are
//! replayed as the first outputs, so no input row is lost to inference.
//! The file handle is released on drop.

mod csv;
mod ndjson;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{Row, Schema};

pub use csv::CsvReader;
pub use ndjson::NdjsonReader;

/// How many records to sample for schema inference.
pub const INFER_SAMPLE_SIZE: usize = 100;

/// A lazy source of rows with a known schema.
///
/// `next_row` returns `Ok(None)` at end of stream; errors are fatal for
/// the row that produced them.
pub trait RowSource {
    /// The schema every produced row conforms to.
    fn schema(&self) -> Arc<Schema>;

    /// The next row, or `None` at end of stream.
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// Supported input file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// Comma-separated records with a header row
    Csv,
    /// One JSON object per line
    Json,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Csv => write!(f, "csv"),
            InputType::Json => write!(f, "json"),
        }
    }
}

/// Returned when an input type flag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInputType(
    /// The unrecognized flag value
    pub String,
);

impl fmt::Display for UnknownInputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported input type: {}", self.0)
    }
}

impl std::error::Error for UnknownInputType {}

impl FromStr for InputType {
    type Err = UnknownInputType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(InputType::Csv),
            "json" => Ok(InputType::Json),
            other => Err(UnknownInputType(other.to_string())),
        }
    }
}

/// Opens an adapter of the given type over `path`.
pub fn open_source(
    ty: InputType,
    path: &str,
    schema: Option<Schema>,
) -> Result<Box<dyn RowSource>> {
    match ty {
        InputType::Csv => Ok(Box::new(CsvReader::open(path, schema)?)),
        InputType::Json => Ok(Box::new(NdjsonReader::open(path, schema)?)),
    }
}
