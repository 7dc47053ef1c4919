//! Parser for the pipe-delimited query language.
//!
//! A query is split on `|` into segments. The first non-empty segment may
//! name the source table; every other segment is one operator, keyed on its
//! first word (case-insensitive). Whitespace between tokens is
//! insignificant except inside quoted strings.

use std::fmt;

use crate::model::Value;
use crate::plan::{CompareOp, Expr, JoinOp, LogicalOp, Operator};

/// Parses a query into its operator list.
///
/// The leading table designator, if present, is stripped; resolving it to
/// an input is the driver's concern.
pub fn parse(query: &str) -> Result<Vec<Operator>, ParseError> {
    let mut ops = Vec::new();
    let mut first = true;
    for part in query.split('|') {
        let seg = part.trim();
        if seg.is_empty() {
            continue;
        }
        if first {
            first = false;
            let mut fields = seg.split_whitespace();
            if let (Some(word), None) = (fields.next(), fields.next()) {
                if !is_operator_keyword(word) {
                    // Source designator, not an operator.
                    continue;
                }
            }
        }
        ops.push(parse_operator(seg)?);
    }
    if ops.is_empty() {
        return Err(ParseError::EmptyQuery);
    }
    Ok(ops)
}

/// The table name designated by the query's leading segment, if any.
pub fn table_name(query: &str) -> Option<String> {
    let first = query.split('|').next()?.trim();
    let word = first.split_whitespace().next()?;
    if is_operator_keyword(word) {
        None
    } else {
        Some(word.to_string())
    }
}

fn is_operator_keyword(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "where" | "project" | "extend" | "summarize" | "take" | "order" | "join"
    )
}

fn parse_operator(seg: &str) -> Result<Operator, ParseError> {
    let keyword = seg
        .split_whitespace()
        .next()
        .expect("segment is non-empty");
    match keyword.to_lowercase().as_str() {
        "where" => parse_where(seg),
        "project" => parse_project(seg),
        "extend" => parse_extend(seg),
        "summarize" => parse_summarize(seg),
        "take" => parse_take(seg),
        "order" => parse_order_by(seg),
        "join" => parse_join(seg),
        _ => Err(ParseError::UnknownOperator {
            segment: seg.to_string(),
            keyword: keyword.to_string(),
        }),
    }
}

// The segment text after its leading keyword.
fn segment_body<'a>(seg: &'a str, keyword_len: usize) -> &'a str {
    seg[keyword_len..].trim()
}

fn parse_where(seg: &str) -> Result<Operator, ParseError> {
    let body = segment_body(seg, "where".len());
    if body.is_empty() {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "an expression",
        });
    }
    let predicate = parse_logical_expr(seg, body)?;
    Ok(Operator::Where(predicate))
}

fn parse_project(seg: &str) -> Result<Operator, ParseError> {
    let columns = split_name_list(segment_body(seg, "project".len()));
    if columns.is_empty() {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "column names",
        });
    }
    Ok(Operator::Project(columns))
}

fn parse_extend(seg: &str) -> Result<Operator, ParseError> {
    let body = segment_body(seg, "extend".len());
    let (name, raw_value) = body.split_once('=').ok_or_else(|| ParseError::MissingClause {
        segment: seg.to_string(),
        expected: "name = value",
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "name = value",
        });
    }
    let value = parse_operand(seg, raw_value.trim())?;
    Ok(Operator::Extend {
        name: name.to_string(),
        value,
    })
}

fn parse_summarize(seg: &str) -> Result<Operator, ParseError> {
    let body = segment_body(seg, "summarize".len());
    if !body.to_lowercase().starts_with("count()") {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "count()",
        });
    }
    let mut rest = body["count()".len()..].trim();
    if rest.to_lowercase().starts_with("by") {
        rest = rest["by".len()..].trim();
    }
    Ok(Operator::Summarize {
        by: split_name_list(rest),
    })
}

fn parse_take(seg: &str) -> Result<Operator, ParseError> {
    let fields: Vec<&str> = seg.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "a row count",
        });
    }
    let count = fields[1]
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidCount {
            segment: seg.to_string(),
            raw: fields[1].to_string(),
        })?;
    Ok(Operator::Take(count))
}

fn parse_order_by(seg: &str) -> Result<Operator, ParseError> {
    let mut fields = seg.split_whitespace();
    fields.next(); // "order"
    if fields.next().map(str::to_lowercase).as_deref() != Some("by") {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "order by <column>",
        });
    }
    let column = fields
        .next()
        .ok_or_else(|| ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "a column name",
        })?
        .to_string();
    let desc = match fields.next().map(|d| d.to_lowercase()) {
        None => false,
        Some(d) if d == "asc" => false,
        Some(d) if d == "desc" => true,
        Some(d) => {
            return Err(ParseError::InvalidDirection {
                segment: seg.to_string(),
                raw: d,
            })
        }
    };
    Ok(Operator::OrderBy { column, desc })
}

fn parse_join(seg: &str) -> Result<Operator, ParseError> {
    let open = seg.find('(');
    let close = seg.rfind(')');
    let (open, close) = match (open, close) {
        (Some(o), Some(c)) if c > o => (o, c),
        _ => {
            return Err(ParseError::MissingClause {
                segment: seg.to_string(),
                expected: "a right input in parentheses",
            })
        }
    };
    let right = seg[open + 1..close].trim();
    if right.is_empty() {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "a right input path",
        });
    }

    // Only `kind=inner` (or no kind at all) is accepted.
    for field in seg[..open].split_whitespace() {
        let lower = field.to_lowercase();
        if let Some(kind) = lower.strip_prefix("kind=") {
            if kind != "inner" {
                return Err(ParseError::UnsupportedJoinKind {
                    segment: seg.to_string(),
                    kind: kind.to_string(),
                });
            }
        }
    }

    let mut rest = seg[close + 1..].split_whitespace();
    if rest.next().map(str::to_lowercase).as_deref() != Some("on") {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "an on clause",
        });
    }
    let (left_key, op, right_key) = match (rest.next(), rest.next(), rest.next()) {
        (Some(l), Some(op), Some(r)) => (l, op, r),
        _ => {
            return Err(ParseError::MissingClause {
                segment: seg.to_string(),
                expected: "on <left> == <right>",
            })
        }
    };
    if op != "==" && op != "=" {
        return Err(ParseError::InvalidExpression {
            segment: seg.to_string(),
            detail: format!("join on only supports = or ==, got {}", op),
        });
    }
    Ok(Operator::Join(JoinOp {
        right: right.to_string(),
        left_key: left_key.to_string(),
        right_key: right_key.to_string(),
    }))
}

// A literal (quoted string, integer, float, true/false) or else a column
// reference. Quoted strings take the characters between the outer quotes;
// there is no escape syntax.
fn parse_operand(seg: &str, raw: &str) -> Result<Expr, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingClause {
            segment: seg.to_string(),
            expected: "a literal or column",
        });
    }
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Ok(Expr::Literal(Value::String(
                raw[1..raw.len() - 1].to_string(),
            )));
        }
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(Expr::Literal(Value::Int(v)));
    }
    if let Ok(v) = raw.parse::<f64>() {
        return Ok(Expr::Literal(Value::Float(v)));
    }
    match raw {
        "true" => return Ok(Expr::Literal(Value::Bool(true))),
        "false" => return Ok(Expr::Literal(Value::Bool(false))),
        _ => {}
    }
    Ok(Expr::Column(raw.to_string()))
}

// Grammar: compare ((and|or) compare)*, strictly left-associative, no
// precedence between and/or. A compare is exactly three tokens.
fn parse_logical_expr(seg: &str, body: &str) -> Result<Expr, ParseError> {
    let tokens: Vec<&str> = body.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(ParseError::InvalidExpression {
            segment: seg.to_string(),
            detail: format!("invalid expression: {}", body),
        });
    }
    let mut expr = parse_compare(seg, &tokens[..3])?;
    let mut rest = &tokens[3..];
    while !rest.is_empty() {
        if rest.len() < 4 {
            return Err(ParseError::InvalidExpression {
                segment: seg.to_string(),
                detail: format!("invalid logical expression: {}", body),
            });
        }
        let op = match rest[0].to_lowercase().as_str() {
            "and" => LogicalOp::And,
            "or" => LogicalOp::Or,
            other => {
                return Err(ParseError::InvalidExpression {
                    segment: seg.to_string(),
                    detail: format!("expected logical operator, got {}", other),
                })
            }
        };
        let right = parse_compare(seg, &rest[1..4])?;
        expr = Expr::Logical {
            left: Box::new(expr),
            op,
            right: Box::new(right),
        };
        rest = &rest[4..];
    }
    Ok(expr)
}

fn parse_compare(seg: &str, tokens: &[&str]) -> Result<Expr, ParseError> {
    let op = match tokens[1] {
        "==" | "=" => CompareOp::Eq,
        "!=" => CompareOp::Ne,
        ">" => CompareOp::Gt,
        ">=" => CompareOp::Ge,
        "<" => CompareOp::Lt,
        "<=" => CompareOp::Le,
        other => {
            return Err(ParseError::InvalidExpression {
                segment: seg.to_string(),
                detail: format!("invalid comparison operator: {}", other),
            })
        }
    };
    let right = parse_operand(seg, tokens[2])?;
    Ok(Expr::Compare {
        left: Box::new(Expr::Column(tokens[0].to_string())),
        op,
        right: Box::new(right),
    })
}

fn split_name_list(body: &str) -> Vec<String> {
    body.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse errors, each carrying the offending segment.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The query contained no operators
    EmptyQuery,
    /// A segment began with something that is not an operator keyword
    UnknownOperator {
        /// The full segment text
        segment: String,
        /// The unrecognized keyword
        keyword: String,
    },
    /// An operator was missing a required clause
    MissingClause {
        /// The full segment text
        segment: String,
        /// What was expected
        expected: &'static str,
    },
    /// `take` was given something other than a non-negative integer
    InvalidCount {
        /// The full segment text
        segment: String,
        /// The offending token
        raw: String,
    },
    /// `order by` direction was neither `asc` nor `desc`
    InvalidDirection {
        /// The full segment text
        segment: String,
        /// The offending token
        raw: String,
    },
    /// A predicate or join condition was malformed
    InvalidExpression {
        /// The full segment text
        segment: String,
        /// What went wrong
        detail: String,
    },
    /// A join kind other than inner was requested
    UnsupportedJoinKind {
        /// The full segment text
        segment: String,
        /// The requested kind
        kind: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyQuery => write!(f, "empty query"),
            ParseError::UnknownOperator { segment, keyword } => {
                write!(f, "unknown operator {} in segment {:?}", keyword, segment)
            }
            ParseError::MissingClause { segment, expected } => {
                write!(f, "segment {:?} requires {}", segment, expected)
            }
            ParseError::InvalidCount { segment, raw } => {
                write!(f, "invalid take count {:?} in segment {:?}", raw, segment)
            }
            ParseError::InvalidDirection { segment, raw } => {
                write!(
                    f,
                    "order by direction must be asc or desc, got {:?} in segment {:?}",
                    raw, segment
                )
            }
            ParseError::InvalidExpression { segment, detail } => {
                write!(f, "{} in segment {:?}", detail, segment)
            }
            ParseError::UnsupportedJoinKind { segment, kind } => {
                write!(
                    f,
                    "only inner join is supported, got kind={} in segment {:?}",
                    kind, segment
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_project() {
        let ops = parse("T | where age > 30 | project name, age").unwrap();
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            Operator::Where(Expr::Compare { left, op, right }) => {
                assert_eq!(**left, Expr::Column("age".to_string()));
                assert_eq!(*op, CompareOp::Gt);
                assert_eq!(**right, Expr::Literal(Value::Int(30)));
            }
            other => panic!("expected where, got {:?}", other),
        }
        assert_eq!(
            ops[1],
            Operator::Project(vec!["name".to_string(), "age".to_string()])
        );
    }

    #[test]
    fn test_parse_strips_table_designator() {
        let ops = parse("events | take 5").unwrap();
        assert_eq!(ops, vec![Operator::Take(5)]);
        // Without a designator the first segment must be an operator.
        let ops = parse("take 5").unwrap();
        assert_eq!(ops, vec![Operator::Take(5)]);
    }

    #[test]
    fn test_parse_bare_table_is_empty_query() {
        assert_eq!(parse("T"), Err(ParseError::EmptyQuery));
        assert_eq!(parse("  |  | "), Err(ParseError::EmptyQuery));
    }

    #[test]
    fn test_parse_unknown_operator() {
        let err = parse("T | explode").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator { .. }));
        // A multi-word first segment is parsed as an operator, not a table.
        let err = parse("foo bar | take 1").unwrap_err();
        assert!(matches!(err, ParseError::UnknownOperator { .. }));
    }

    #[test]
    fn test_parse_where_logical_chain() {
        let ops = parse("T | where age > 30 and active == false or dept == 'eng'").unwrap();
        // Strictly left-associative: ((a and b) or c).
        match &ops[0] {
            Operator::Where(Expr::Logical { left, op, .. }) => {
                assert_eq!(*op, LogicalOp::Or);
                assert!(matches!(
                    **left,
                    Expr::Logical {
                        op: LogicalOp::And,
                        ..
                    }
                ));
            }
            other => panic!("expected logical or, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_where_errors() {
        assert!(parse("T | where").is_err());
        assert!(parse("T | where age >").is_err());
        assert!(parse("T | where age ~ 3").is_err());
        assert!(parse("T | where age > 3 bogus x > 1").is_err());
        assert!(parse("T | where age > 3 and").is_err());
    }

    #[test]
    fn test_parse_operand_literals() {
        let ops = parse("T | where name == \"alice\"").unwrap();
        let Operator::Where(Expr::Compare { right, .. }) = &ops[0] else {
            panic!("expected where");
        };
        assert_eq!(**right, Expr::Literal(Value::String("alice".to_string())));

        let ops = parse("T | where score == 1.5").unwrap();
        let Operator::Where(Expr::Compare { right, .. }) = &ops[0] else {
            panic!("expected where");
        };
        assert_eq!(**right, Expr::Literal(Value::Float(1.5)));

        let ops = parse("T | where active == false").unwrap();
        let Operator::Where(Expr::Compare { right, .. }) = &ops[0] else {
            panic!("expected where");
        };
        assert_eq!(**right, Expr::Literal(Value::Bool(false)));

        // Anything else is a column reference.
        let ops = parse("T | where a == b").unwrap();
        let Operator::Where(Expr::Compare { right, .. }) = &ops[0] else {
            panic!("expected where");
        };
        assert_eq!(**right, Expr::Column("b".to_string()));
    }

    #[test]
    fn test_parse_project_empty() {
        assert!(parse("T | project").is_err());
        assert!(parse("T | project ,").is_err());
    }

    #[test]
    fn test_parse_extend() {
        let ops = parse("T | extend flag = true").unwrap();
        assert_eq!(
            ops[0],
            Operator::Extend {
                name: "flag".to_string(),
                value: Expr::Literal(Value::Bool(true)),
            }
        );
        let ops = parse("T | extend copy = name").unwrap();
        assert_eq!(
            ops[0],
            Operator::Extend {
                name: "copy".to_string(),
                value: Expr::Column("name".to_string()),
            }
        );
        assert!(parse("T | extend flag").is_err());
    }

    #[test]
    fn test_parse_summarize() {
        assert_eq!(
            parse("T | summarize count()").unwrap()[0],
            Operator::Summarize { by: vec![] }
        );
        assert_eq!(
            parse("T | summarize count() by dept, region").unwrap()[0],
            Operator::Summarize {
                by: vec!["dept".to_string(), "region".to_string()]
            }
        );
        assert!(parse("T | summarize sum(x)").is_err());
    }

    #[test]
    fn test_parse_take() {
        assert_eq!(parse("T | take 0").unwrap()[0], Operator::Take(0));
        assert!(parse("T | take").is_err());
        assert!(parse("T | take x").is_err());
        assert!(parse("T | take -1").is_err());
        assert!(parse("T | take 1 2").is_err());
    }

    #[test]
    fn test_parse_order_by() {
        assert_eq!(
            parse("T | order by age").unwrap()[0],
            Operator::OrderBy {
                column: "age".to_string(),
                desc: false
            }
        );
        assert_eq!(
            parse("T | order by age desc").unwrap()[0],
            Operator::OrderBy {
                column: "age".to_string(),
                desc: true
            }
        );
        assert!(parse("T | order age").is_err());
        assert!(parse("T | order by").is_err());
        assert!(parse("T | order by age sideways").is_err());
    }

    #[test]
    fn test_parse_join() {
        let ops = parse("L | join kind=inner (right.csv) on id == id").unwrap();
        assert_eq!(
            ops[0],
            Operator::Join(JoinOp {
                right: "right.csv".to_string(),
                left_key: "id".to_string(),
                right_key: "id".to_string(),
            })
        );
        // The kind is optional and defaults to inner.
        let ops = parse("L | join (R) on a = b").unwrap();
        assert_eq!(
            ops[0],
            Operator::Join(JoinOp {
                right: "R".to_string(),
                left_key: "a".to_string(),
                right_key: "b".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_join_errors() {
        assert!(parse("L | join right.csv on id == id").is_err());
        assert!(parse("L | join () on id == id").is_err());
        assert!(parse("L | join (r.csv) id == id").is_err());
        assert!(parse("L | join (r.csv) on id").is_err());
        assert!(parse("L | join (r.csv) on id > id").is_err());
        assert!(parse("L | join kind=left (r.csv) on id == id").is_err());
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert!(parse("T | WHERE age > 1").is_ok());
        assert!(parse("T | Project name").is_ok());
        assert!(parse("T | ORDER BY age DESC").is_ok());
        assert!(parse("T | SUMMARIZE COUNT() BY dept").is_ok());
    }

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("T | take 1"), Some("T".to_string()));
        assert_eq!(table_name("events | take 1"), Some("events".to_string()));
        assert_eq!(table_name("where x == 1"), None);
        assert_eq!(table_name(""), None);
    }
}
