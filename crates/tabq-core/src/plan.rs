//! Logical plan types for parsed queries.
//!
//! A query compiles to an ordered list of [`Operator`]s; operators run in
//! the textual order the user gave them, there is no optimizer.

use std::fmt;

use crate::model::Value;

/// A logical pipeline operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Keep rows for which the predicate holds
    Where(Expr),
    /// Keep the named columns, in the given order
    Project(Vec<String>),
    /// Append a computed column
    Extend {
        /// New column name
        name: String,
        /// Expression producing its value
        value: Expr,
    },
    /// Emit at most this many rows
    Take(usize),
    /// Sort by one column
    OrderBy {
        /// Key column name
        column: String,
        /// Descending order when set
        desc: bool,
    },
    /// Count rows per group (count() is the only aggregate)
    Summarize {
        /// Grouping columns; empty means one global count
        by: Vec<String>,
    },
    /// Inner equi-join against a second source
    Join(JoinOp),
}

/// The join operator's fields.
///
/// `right` holds the token as parsed; the driver rewrites it to a file path
/// when it names a registered input.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOp {
    /// Right-side source: a table name or a path
    pub right: String,
    /// Key column on the left input
    pub left_key: String,
    /// Key column on the right input
    pub right_key: String,
}

/// A scalar or boolean expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a column by name
    Column(String),
    /// A literal value
    Literal(Value),
    /// Comparison of two scalar operands
    Compare {
        /// Left operand
        left: Box<Expr>,
        /// Comparison operator
        op: CompareOp,
        /// Right operand
        right: Box<Expr>,
    },
    /// Logical combination of two boolean operands
    Logical {
        /// Left operand
        left: Box<Expr>,
        /// Logical operator
        op: LogicalOp,
        /// Right operand
        right: Box<Expr>,
    },
}

/// Comparison operators. `=` in query text is an alias for `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==` / `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// Logical operators; both short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// Both operands must hold
    And,
    /// Either operand must hold
    Or,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "and"),
            LogicalOp::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Compare { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Logical { left, op, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_display() {
        let expr = Expr::Logical {
            left: Box::new(Expr::Compare {
                left: Box::new(Expr::Column("age".to_string())),
                op: CompareOp::Gt,
                right: Box::new(Expr::Literal(Value::Int(30))),
            }),
            op: LogicalOp::And,
            right: Box::new(Expr::Compare {
                left: Box::new(Expr::Column("active".to_string())),
                op: CompareOp::Eq,
                right: Box::new(Expr::Literal(Value::Bool(false))),
            }),
        };
        assert_eq!(expr.to_string(), "((age > 30) and (active == false))");
    }
}
