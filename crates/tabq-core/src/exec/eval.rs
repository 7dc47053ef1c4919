//! Expression evaluation against a single row.
//!
//! Two contexts exist: value context (column references and literals) and
//! predicate context (comparisons and logical combinations). Logical
//! operators short-circuit; the right operand of an `and` whose left is
//! false is never evaluated.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::model::{Row, Value};
use crate::plan::{CompareOp, Expr, LogicalOp};

/// Evaluates `expr` in value context.
///
/// An absent column yields the zero string value. Comparison and logical
/// expressions are not values.
pub fn eval_value(row: &Row, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Column(name) => Ok(row
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()))),
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Compare { .. } | Expr::Logical { .. } => Err(Error::Eval(format!(
            "expression {} is not usable as a value",
            expr
        ))),
    }
}

/// Evaluates `expr` in predicate context.
pub fn eval_predicate(row: &Row, expr: &Expr) -> Result<bool> {
    match expr {
        Expr::Compare { left, op, right } => {
            let l = eval_value(row, left)?;
            let r = eval_value(row, right)?;
            let ord = l.compare(&r);
            Ok(match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Le => ord != Ordering::Greater,
            })
        }
        Expr::Logical { left, op, right } => {
            let l = eval_predicate(row, left)?;
            match op {
                LogicalOp::And if !l => Ok(false),
                LogicalOp::Or if l => Ok(true),
                _ => eval_predicate(row, right),
            }
        }
        Expr::Column(_) | Expr::Literal(_) => Err(Error::Eval(format!(
            "expression {} is not usable as a predicate",
            expr
        ))),
    }
}
