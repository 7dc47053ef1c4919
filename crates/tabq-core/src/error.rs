//! Error types for the tabq engine.

use std::fmt;

use crate::parser::ParseError;

/// The main error type for tabq operations.
///
/// Variants follow the pipeline stages: I/O, query parsing, value parsing,
/// schema handling, pipeline construction, expression evaluation, and
/// invocation-level usage errors.
#[derive(Debug)]
pub enum Error {
    /// Source open/read failure or output write failure
    Io(std::io::Error),

    /// Malformed query text
    Parse(ParseError),

    /// A record's field text does not parse under its declared type
    Value {
        /// Column whose declared type rejected the text
        column: String,
        /// What the underlying parse reported
        message: String,
    },

    /// Malformed or empty explicit schema
    Schema(String),

    /// Blocking operator failed while consuming its input at build time
    Plan(String),

    /// Expression evaluation failure at runtime
    Eval(String),

    /// Bad invocation: missing inputs, unknown table, unsupported format
    Usage(String),

    /// Malformed delimited-records input
    Csv(csv::Error),

    /// Malformed line-delimited JSON input
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Parse(e) => write!(f, "parse error: {}", e),
            Error::Value { column, message } => {
                write!(f, "value error: column {}: {}", column, message)
            }
            Error::Schema(msg) => write!(f, "schema error: {}", msg),
            Error::Plan(msg) => write!(f, "plan error: {}", msg),
            Error::Eval(msg) => write!(f, "exec error: {}", msg),
            Error::Usage(msg) => write!(f, "usage error: {}", msg),
            Error::Csv(e) => write!(f, "csv error: {}", e),
            Error::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::Csv(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

/// A specialized `Result` type for tabq operations.
pub type Result<T> = std::result::Result<T, Error>;
