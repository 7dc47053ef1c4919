//! The tabular value model: types, values, columns, schemas, and rows.
//!
//! Every value carries a type tag from a closed five-type enumeration.
//! Comparison is driven by the left operand's type: the right operand is
//! coerced into the left's domain. This is asymmetric on purpose (it is the
//! filter-predicate semantics); order-by keys always come from a single
//! column, so both operands share a type there and the asymmetry is benign.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

/// Column type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// UTF-8 text, stored verbatim after trimming
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit IEEE-754 float
    Float,
    /// Boolean
    Bool,
    /// Instant with offset, RFC 3339 textual form
    DateTime,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String => write!(f, "string"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::DateTime => write!(f, "datetime"),
        }
    }
}

impl FromStr for Type {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Type::String),
            "int" => Ok(Type::Int),
            "float" => Ok(Type::Float),
            "bool" => Ok(Type::Bool),
            "datetime" => Ok(Type::DateTime),
            _ => Err(UnknownType(s.to_string())),
        }
    }
}

/// Returned when a type name in an explicit schema is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType(
    /// The unrecognized name
    pub String,
);

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type: {}", self.0)
    }
}

impl std::error::Error for UnknownType {}

/// A typed tabular value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Instant with offset
    DateTime(DateTime<FixedOffset>),
}

impl Value {
    /// The type tag this value carries.
    pub fn ty(&self) -> Type {
        match self {
            Value::String(_) => Type::String,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Bool(_) => Type::Bool,
            Value::DateTime(_) => Type::DateTime,
        }
    }

    /// The zero value used to fill short records and missing object keys.
    pub fn zero(ty: Type) -> Value {
        match ty {
            Type::String => Value::String(String::new()),
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            Type::Bool => Value::Bool(false),
            Type::DateTime => Value::DateTime(DateTime::<Utc>::UNIX_EPOCH.fixed_offset()),
        }
    }

    /// Parses `raw` as a value of type `ty`.
    ///
    /// Leading and trailing whitespace is trimmed first. Parsing as
    /// `string` never fails: the trimmed text is the value.
    pub fn parse(ty: Type, raw: &str) -> Result<Value, InvalidValue> {
        let s = raw.trim();
        let invalid = || InvalidValue {
            ty,
            raw: s.to_string(),
        };
        match ty {
            Type::String => Ok(Value::String(s.to_string())),
            Type::Int => s.parse::<i64>().map(Value::Int).map_err(|_| invalid()),
            Type::Float => s.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
            Type::Bool => parse_bool(s).map(Value::Bool).ok_or_else(invalid),
            Type::DateTime => DateTime::parse_from_rfc3339(s)
                .map(Value::DateTime)
                .map_err(|_| invalid()),
        }
    }

    /// Compares `self` against `other`, coercing `other` into `self`'s
    /// domain. Asymmetric when the types differ; see the module docs.
    pub fn compare(&self, other: &Value) -> Ordering {
        match self {
            Value::Int(a) => a.cmp(&other.coerce_int()),
            Value::Float(a) => a
                .partial_cmp(&other.coerce_float())
                .unwrap_or(Ordering::Equal),
            Value::Bool(a) => a.cmp(&other.coerce_bool()),
            Value::DateTime(a) => a.cmp(&other.coerce_datetime()),
            Value::String(_) => self.to_string().cmp(&other.to_string()),
        }
    }

    fn coerce_int(&self) -> i64 {
        match self {
            Value::Int(v) => *v,
            Value::Float(v) => *v as i64,
            Value::Bool(true) => 1,
            Value::Bool(false) => 0,
            _ => 0,
        }
    }

    fn coerce_float(&self) -> f64 {
        match self {
            Value::Float(v) => *v,
            Value::Int(v) => *v as f64,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            _ => 0.0,
        }
    }

    fn coerce_bool(&self) -> bool {
        match self {
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            _ => self.to_string() == "true",
        }
    }

    fn coerce_datetime(&self) -> DateTime<FixedOffset> {
        match self {
            Value::DateTime(v) => *v,
            _ => DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
        }
    }
}

impl fmt::Display for Value {
    /// The canonical textual form: text verbatim, base-10 integers,
    /// shortest round-trip decimals, `true`/`false`, RFC 3339 instants.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::DateTime(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Returned when field text does not parse under its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidValue {
    ty: Type,
    raw: String,
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse {:?} as {}", self.raw, self.ty)
    }
}

impl std::error::Error for InvalidValue {}

// Accepts the same spellings as the reference implementation; only
// `true`/`false` are ever produced on output.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Infers a column type from a sample of raw field texts.
///
/// Each sample is trimmed; empty samples are ignored. The first type in the
/// priority order int, float, bool, datetime under which every non-empty
/// sample parses wins; otherwise `string`. An empty slice infers `string`,
/// while a non-empty slice of only empty strings infers `int` (every
/// candidate is vacuously admissible and `int` has priority).
pub fn infer_type(values: &[String]) -> Type {
    if values.is_empty() {
        return Type::String;
    }

    let mut is_int = true;
    let mut is_float = true;
    let mut is_bool = true;
    let mut is_time = true;

    for raw in values {
        let v = raw.trim();
        if v.is_empty() {
            continue;
        }
        if is_int && v.parse::<i64>().is_err() {
            is_int = false;
        }
        if is_float && v.parse::<f64>().is_err() {
            is_float = false;
        }
        if is_bool && parse_bool(v).is_none() {
            is_bool = false;
        }
        if is_time && DateTime::parse_from_rfc3339(v).is_err() {
            is_time = false;
        }
    }

    if is_int {
        Type::Int
    } else if is_float {
        Type::Float
    } else if is_bool {
        Type::Bool
    } else if is_time {
        Type::DateTime
    } else {
        Type::String
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column type
    pub ty: Type,
}

impl Column {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, ty: Type) -> Column {
        Column {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered sequence of columns with O(1) lookup by name.
///
/// Duplicate names are legal: every column stays in the sequence, and the
/// name map points at the last occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Columns in declaration order
    pub columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Builds a schema from a column sequence.
    pub fn new(columns: Vec<Column>) -> Schema {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, c) in columns.iter().enumerate() {
            index.insert(c.name.clone(), i);
        }
        Schema { columns, index }
    }

    /// Position of the named column, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A schema-tagged sequence of typed values.
///
/// The schema is shared; operators that reshape rows build a fresh one.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The schema this row conforms to
    pub schema: Arc<Schema>,
    /// Positional values, one per column
    pub values: Vec<Value>,
}

impl Row {
    /// Creates a row over `schema`.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Row {
        Row { schema, values }
    }

    /// Looks up a value by column name.
    ///
    /// Returns `None` when the name is absent or when the recorded index
    /// lies beyond the value array (tolerates short rows).
    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.schema.index_of(name)?;
        self.values.get(idx)
    }
}
