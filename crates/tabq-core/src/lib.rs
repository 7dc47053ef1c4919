//! # tabq-core
//!
//! The engine behind `tabq`: evaluates a small pipe-delimited query
//! language against CSV and newline-delimited JSON files, producing a
//! tabular result stream.
//!
//! The pipeline is pull-based and single-threaded: a query parses into an
//! ordered operator list, the list folds over an input adapter into a
//! chain of row streams, and the driver pulls the root until end of
//! stream. Operators run in the order the user wrote them; there is no
//! optimizer, no persistent state, and joins are inner equi-joins on one
//! column.
//!
//! ```rust,no_run
//! use tabq_core::driver::{run, QueryRequest};
//! use tabq_core::output::OutputFormat;
//! use tabq_core::read::InputType;
//!
//! # fn main() -> tabq_core::Result<()> {
//! let request = QueryRequest {
//!     inputs: vec!["people.csv".to_string()],
//!     input_type: InputType::Csv,
//!     schema: None,
//!     query: "T | where age > 30 | project name".to_string(),
//!     format: OutputFormat::Csv,
//! };
//! run(&request, std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver;
pub mod error;
pub mod exec;
pub mod model;
pub mod output;
pub mod parser;
pub mod plan;
pub mod read;

pub use error::{Error, Result};
pub use model::{Column, Row, Schema, Type, Value};
