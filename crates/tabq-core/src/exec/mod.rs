//! Pull-based execution operators.
//!
//! [`build_pipeline`] wraps a row source and folds the logical operator
//! list into a chain of [`RowStream`]s; pulling the root pulls the whole
//! chain, one row at a time. Filter, project, extend, take, and the join's
//! left traversal are streaming. Order-by and summarize drain their input
//! before yielding anything, and the join materializes its right side at
//! construction; those three surface upstream errors at build time.

mod eval;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

pub use eval::{eval_predicate, eval_value};

use crate::error::Result;
use crate::model::{Column, Row, Schema, Type, Value};
use crate::plan::{Expr, Operator};
use crate::read::{CsvReader, RowSource};

/// A pull-based stream of rows. `Ok(None)` is end of stream.
pub trait RowStream {
    /// The next row, or `None` at end of stream.
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// Adapts an input source to the operator chain.
pub struct SourceOp {
    reader: Box<dyn RowSource>,
}

impl SourceOp {
    /// Wraps `reader` as the pipeline leaf.
    pub fn new(reader: Box<dyn RowSource>) -> SourceOp {
        SourceOp { reader }
    }
}

impl RowStream for SourceOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        self.reader.next_row()
    }
}

/// Streaming filter: emits rows for which the predicate holds.
pub struct FilterOp {
    input: Box<dyn RowStream>,
    predicate: Expr,
}

impl FilterOp {
    /// Filters `input` by `predicate`.
    pub fn new(input: Box<dyn RowStream>, predicate: Expr) -> FilterOp {
        FilterOp { input, predicate }
    }
}

impl RowStream for FilterOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        while let Some(row) = self.input.next_row()? {
            if eval_predicate(&row, &self.predicate)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

/// Streaming projection onto the requested columns, in request order.
/// Requested columns the input lacks are silently dropped.
pub struct ProjectOp {
    input: Box<dyn RowStream>,
    columns: Vec<String>,
}

impl ProjectOp {
    /// Projects `input` onto `columns`.
    pub fn new(input: Box<dyn RowStream>, columns: Vec<String>) -> ProjectOp {
        ProjectOp { input, columns }
    }
}

impl RowStream for ProjectOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        let row = match self.input.next_row()? {
            None => return Ok(None),
            Some(row) => row,
        };
        let mut columns = Vec::with_capacity(self.columns.len());
        let mut values = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            if let Some(v) = row.get(name) {
                columns.push(Column::new(name.clone(), v.ty()));
                values.push(v.clone());
            }
        }
        Ok(Some(Row::new(Arc::new(Schema::new(columns)), values)))
    }
}

/// Streaming extend: appends one computed trailing column.
///
/// An input column of the same name is kept; the name map's last-wins rule
/// makes downstream lookups see the new column.
pub struct ExtendOp {
    input: Box<dyn RowStream>,
    name: String,
    value: Expr,
}

impl ExtendOp {
    /// Appends `name` computed by `value` to every row of `input`.
    pub fn new(input: Box<dyn RowStream>, name: String, value: Expr) -> ExtendOp {
        ExtendOp { input, name, value }
    }
}

impl RowStream for ExtendOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        let row = match self.input.next_row()? {
            None => return Ok(None),
            Some(row) => row,
        };
        let v = eval_value(&row, &self.value)?;
        let mut columns = row.schema.columns.clone();
        columns.push(Column::new(self.name.clone(), v.ty()));
        let mut values = row.values;
        values.push(v);
        Ok(Some(Row::new(Arc::new(Schema::new(columns)), values)))
    }
}

/// Streaming limit: after `n` rows the source is not consulted again.
pub struct TakeOp {
    input: Box<dyn RowStream>,
    remaining: usize,
}

impl TakeOp {
    /// Emits at most `count` rows of `input`.
    pub fn new(input: Box<dyn RowStream>, count: usize) -> TakeOp {
        TakeOp {
            input,
            remaining: count,
        }
    }
}

impl RowStream for TakeOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        match self.input.next_row()? {
            None => Ok(None),
            Some(row) => {
                self.remaining -= 1;
                Ok(Some(row))
            }
        }
    }
}

/// Blocking sort on one column.
///
/// The input is drained at construction and stable-sorted with the value
/// model's comparison; rows with equal keys keep their source order. Both
/// operands come from the same column, so the comparison's cross-type
/// asymmetry cannot bite here.
pub struct OrderByOp {
    rows: std::vec::IntoIter<Row>,
}

impl OrderByOp {
    /// Drains and sorts `input`; an upstream error aborts construction.
    pub fn new(mut input: Box<dyn RowStream>, column: &str, desc: bool) -> Result<OrderByOp> {
        let mut rows = Vec::new();
        while let Some(row) = input.next_row()? {
            rows.push(row);
        }
        let zero = Value::String(String::new());
        rows.sort_by(|a, b| {
            let va = a.get(column).unwrap_or(&zero);
            let vb = b.get(column).unwrap_or(&zero);
            let ord = va.compare(vb);
            if desc {
                ord.reverse()
            } else {
                ord
            }
        });
        Ok(OrderByOp {
            rows: rows.into_iter(),
        })
    }
}

impl RowStream for OrderByOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}

/// Blocking count-by aggregation.
///
/// Groups are keyed by the `|`-joined textual forms of the BY columns and
/// emitted in first-seen order, each as the BY values followed by an int
/// `count` column. An empty BY produces a single global count row (none at
/// all when the input is empty).
pub struct SummarizeOp {
    rows: std::vec::IntoIter<Row>,
}

impl SummarizeOp {
    /// Drains and groups `input`; an upstream error aborts construction.
    pub fn new(mut input: Box<dyn RowStream>, by: &[String]) -> Result<SummarizeOp> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut representatives: HashMap<String, Vec<Value>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        while let Some(row) = input.next_row()? {
            let mut group_values = Vec::with_capacity(by.len());
            let mut key_parts = Vec::with_capacity(by.len());
            for name in by {
                let v = row
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()));
                key_parts.push(v.to_string());
                group_values.push(v);
            }
            match counts.entry(key_parts.join("|")) {
                Entry::Occupied(mut e) => *e.get_mut() += 1,
                Entry::Vacant(e) => {
                    order.push(e.key().clone());
                    representatives.insert(e.key().clone(), group_values);
                    e.insert(1);
                }
            }
        }

        let mut rows = Vec::with_capacity(order.len());
        for key in &order {
            let mut values = representatives
                .remove(key)
                .unwrap_or_default();
            let mut columns: Vec<Column> = by
                .iter()
                .zip(&values)
                .map(|(name, v)| Column::new(name.clone(), v.ty()))
                .collect();
            columns.push(Column::new("count", Type::Int));
            values.push(Value::Int(counts[key] as i64));
            rows.push(Row::new(Arc::new(Schema::new(columns)), values));
        }
        Ok(SummarizeOp {
            rows: rows.into_iter(),
        })
    }
}

impl RowStream for SummarizeOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}

/// Inner equi-join. The right side is fully materialized from a
/// delimited-records file at construction; the left side is streamed. Each
/// left row emits one output per right match, contiguously, in right-side
/// insertion order; unmatched left rows are discarded.
pub struct JoinOp {
    input: Box<dyn RowStream>,
    right: HashMap<String, Vec<Row>>,
    right_schema: Arc<Schema>,
    left_key: String,
    pending: VecDeque<Row>,
}

impl JoinOp {
    /// Loads the right side from `right_path` and indexes it by the
    /// textual form of `right_key`. A load failure aborts construction.
    pub fn new(
        input: Box<dyn RowStream>,
        right_path: &str,
        left_key: &str,
        right_key: &str,
    ) -> Result<JoinOp> {
        let mut reader = CsvReader::open(right_path, None)?;
        let right_schema = reader.schema();
        let mut right: HashMap<String, Vec<Row>> = HashMap::new();
        while let Some(row) = reader.next_row()? {
            let key = row.get(right_key).map(Value::to_string).unwrap_or_default();
            right.entry(key).or_default().push(row);
        }
        debug!(path = right_path, keys = right.len(), "loaded join right side");
        Ok(JoinOp {
            input,
            right,
            right_schema,
            left_key: left_key.to_string(),
            pending: VecDeque::new(),
        })
    }
}

impl RowStream for JoinOp {
    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Ok(Some(row));
            }
            let left = match self.input.next_row()? {
                None => return Ok(None),
                Some(row) => row,
            };
            let key = left
                .get(&self.left_key)
                .map(Value::to_string)
                .unwrap_or_default();
            if let Some(matches) = self.right.get(&key) {
                self.pending
                    .extend(joined_rows(&left, matches, &self.right_schema));
            }
        }
    }
}

// Left columns verbatim, then right columns; a right name colliding with a
// left one is renamed `right.<name>`.
fn joined_rows(left: &Row, matches: &[Row], right_schema: &Schema) -> Vec<Row> {
    let mut columns = left.schema.columns.clone();
    for c in &right_schema.columns {
        let name = if left.schema.index_of(&c.name).is_some() {
            format!("right.{}", c.name)
        } else {
            c.name.clone()
        };
        columns.push(Column::new(name, c.ty));
    }
    let schema = Arc::new(Schema::new(columns));

    matches
        .iter()
        .map(|r| {
            let mut values = left.values.clone();
            values.extend(r.values.iter().cloned());
            Row::new(schema.clone(), values)
        })
        .collect()
}

/// Folds the operator list over a source into an executable pipeline.
///
/// Blocking operators run their drain here, so a pipeline that builds
/// successfully has already absorbed any upstream error they would hit.
pub fn build_pipeline(reader: Box<dyn RowSource>, ops: &[Operator]) -> Result<Box<dyn RowStream>> {
    let mut current: Box<dyn RowStream> = Box::new(SourceOp::new(reader));
    for op in ops {
        current = match op {
            Operator::Where(predicate) => Box::new(FilterOp::new(current, predicate.clone())),
            Operator::Project(columns) => Box::new(ProjectOp::new(current, columns.clone())),
            Operator::Extend { name, value } => {
                Box::new(ExtendOp::new(current, name.clone(), value.clone()))
            }
            Operator::Take(count) => Box::new(TakeOp::new(current, *count)),
            Operator::OrderBy { column, desc } => {
                Box::new(OrderByOp::new(current, column, *desc)?)
            }
            Operator::Summarize { by } => Box::new(SummarizeOp::new(current, by)?),
            Operator::Join(join) => Box::new(JoinOp::new(
                current,
                &join.right,
                &join.left_key,
                &join.right_key,
            )?),
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::Type;
    use crate::plan::{CompareOp, JoinOp as JoinPlan};
    use std::fs::File;
    use std::io::Write;

    struct VecStream {
        rows: VecDeque<Row>,
    }

    impl VecStream {
        fn boxed(rows: Vec<Row>) -> Box<dyn RowStream> {
            Box::new(VecStream { rows: rows.into() })
        }
    }

    impl RowStream for VecStream {
        fn next_row(&mut self) -> Result<Option<Row>> {
            Ok(self.rows.pop_front())
        }
    }

    struct ErrStream;

    impl RowStream for ErrStream {
        fn next_row(&mut self) -> Result<Option<Row>> {
            Err(Error::Plan("boom".to_string()))
        }
    }

    fn int_row(n: i64) -> Row {
        let schema = Arc::new(Schema::new(vec![Column::new("n", Type::Int)]));
        Row::new(schema, vec![Value::Int(n)])
    }

    fn kv_row(k: i64, v: &str) -> Row {
        let schema = Arc::new(Schema::new(vec![
            Column::new("k", Type::Int),
            Column::new("v", Type::String),
        ]));
        Row::new(schema, vec![Value::Int(k), Value::String(v.to_string())])
    }

    fn n_greater_than(limit: i64) -> Expr {
        Expr::Compare {
            left: Box::new(Expr::Column("n".to_string())),
            op: CompareOp::Gt,
            right: Box::new(Expr::Literal(Value::Int(limit))),
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn drain(mut op: impl RowStream) -> Vec<Row> {
        let mut out = Vec::new();
        while let Some(row) = op.next_row().unwrap() {
            out.push(row);
        }
        out
    }

    #[test]
    fn test_filter() {
        let input = VecStream::boxed(vec![int_row(1), int_row(5), int_row(2)]);
        let rows = drain(FilterOp::new(input, n_greater_than(1)));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[0], Value::Int(5));
        assert_eq!(rows[1].values[0], Value::Int(2));
    }

    #[test]
    fn test_filter_no_match_is_eos() {
        let input = VecStream::boxed(vec![int_row(1)]);
        let mut filter = FilterOp::new(input, n_greater_than(10));
        assert!(filter.next_row().unwrap().is_none());
    }

    #[test]
    fn test_filter_propagates_errors() {
        let mut filter = FilterOp::new(Box::new(ErrStream), n_greater_than(0));
        assert!(filter.next_row().is_err());

        // Predicate evaluation errors propagate too.
        let input = VecStream::boxed(vec![int_row(1)]);
        let mut filter = FilterOp::new(input, Expr::Column("n".to_string()));
        assert!(filter.next_row().is_err());
    }

    #[test]
    fn test_project_drops_missing_columns() {
        let input = VecStream::boxed(vec![kv_row(1, "a")]);
        let mut project = ProjectOp::new(
            input,
            vec!["v".to_string(), "missing".to_string(), "k".to_string()],
        );
        let row = project.next_row().unwrap().unwrap();
        let names: Vec<&str> = row.schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["v", "k"]);
        assert_eq!(row.values, vec![Value::String("a".to_string()), Value::Int(1)]);
        assert_eq!(row.schema.len(), row.values.len());
    }

    #[test]
    fn test_project_is_idempotent() {
        let cols = vec!["k".to_string(), "v".to_string()];
        let once = drain(ProjectOp::new(
            VecStream::boxed(vec![kv_row(1, "a")]),
            cols.clone(),
        ));
        let twice = drain(ProjectOp::new(
            Box::new(ProjectOp::new(
                VecStream::boxed(vec![kv_row(1, "a")]),
                cols.clone(),
            )),
            cols,
        ));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_extend_appends_trailing_column() {
        let input = VecStream::boxed(vec![int_row(7)]);
        let mut extend = ExtendOp::new(
            input,
            "copy".to_string(),
            Expr::Column("n".to_string()),
        );
        let row = extend.next_row().unwrap().unwrap();
        assert_eq!(row.schema.columns.last().unwrap().name, "copy");
        assert_eq!(row.values.last(), Some(&Value::Int(7)));
    }

    #[test]
    fn test_extend_duplicate_name_shadows_for_lookup() {
        let input = VecStream::boxed(vec![int_row(7)]);
        let mut extend = ExtendOp::new(
            input,
            "n".to_string(),
            Expr::Literal(Value::String("x".to_string())),
        );
        let row = extend.next_row().unwrap().unwrap();
        // Both columns remain; name lookup sees the last-inserted one.
        assert_eq!(row.schema.len(), 2);
        assert_eq!(row.get("n"), Some(&Value::String("x".to_string())));
    }

    #[test]
    fn test_take() {
        let input = VecStream::boxed(vec![int_row(1), int_row(2), int_row(3)]);
        let rows = drain(TakeOp::new(input, 2));
        assert_eq!(rows.len(), 2);

        let input = VecStream::boxed(vec![int_row(1)]);
        let rows = drain(TakeOp::new(input, 0));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_take_stops_consulting_source() {
        // After n rows the upstream error is never reached.
        struct CountedThenErr {
            left: usize,
        }
        impl RowStream for CountedThenErr {
            fn next_row(&mut self) -> Result<Option<Row>> {
                if self.left == 0 {
                    return Err(Error::Plan("pulled past the limit".to_string()));
                }
                self.left -= 1;
                Ok(Some(int_row(1)))
            }
        }
        let mut take = TakeOp::new(Box::new(CountedThenErr { left: 1 }), 1);
        assert!(take.next_row().unwrap().is_some());
        assert!(take.next_row().unwrap().is_none());
        assert!(take.next_row().unwrap().is_none());
    }

    #[test]
    fn test_order_by_asc_desc() {
        let input = VecStream::boxed(vec![int_row(2), int_row(1), int_row(3)]);
        let rows = drain(OrderByOp::new(input, "n", false).unwrap());
        let keys: Vec<&Value> = rows.iter().map(|r| &r.values[0]).collect();
        assert_eq!(keys, vec![&Value::Int(1), &Value::Int(2), &Value::Int(3)]);

        let input = VecStream::boxed(vec![int_row(2), int_row(1), int_row(3)]);
        let rows = drain(OrderByOp::new(input, "n", true).unwrap());
        let keys: Vec<&Value> = rows.iter().map(|r| &r.values[0]).collect();
        assert_eq!(keys, vec![&Value::Int(3), &Value::Int(2), &Value::Int(1)]);
    }

    #[test]
    fn test_order_by_is_stable() {
        let input = VecStream::boxed(vec![kv_row(1, "a"), kv_row(2, "b"), kv_row(1, "c")]);
        let rows = drain(OrderByOp::new(input, "k", true).unwrap());
        assert_eq!(rows[0].values[0], Value::Int(2));
        // Equal keys keep source order.
        assert_eq!(rows[1].values[1], Value::String("a".to_string()));
        assert_eq!(rows[2].values[1], Value::String("c".to_string()));
    }

    #[test]
    fn test_order_by_aborts_at_build() {
        assert!(OrderByOp::new(Box::new(ErrStream), "n", false).is_err());
    }

    #[test]
    fn test_order_by_empty_input() {
        let mut op = OrderByOp::new(VecStream::boxed(vec![]), "n", false).unwrap();
        assert!(op.next_row().unwrap().is_none());
    }

    #[test]
    fn test_summarize_count_by() {
        let input = VecStream::boxed(vec![kv_row(1, "a"), kv_row(1, "b"), kv_row(2, "c")]);
        let rows = drain(SummarizeOp::new(input, &["k".to_string()]).unwrap());
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let names: Vec<&str> = row.schema.columns.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["k", "count"]);
        }
        let mut counts: Vec<(String, i64)> = rows
            .iter()
            .map(|r| {
                let k = r.values[0].to_string();
                let Value::Int(c) = r.values[1] else {
                    panic!("count must be int");
                };
                (k, c)
            })
            .collect();
        counts.sort();
        assert_eq!(counts, vec![("1".to_string(), 2), ("2".to_string(), 1)]);
    }

    #[test]
    fn test_summarize_global_count() {
        let input = VecStream::boxed(vec![int_row(1), int_row(2)]);
        let rows = drain(SummarizeOp::new(input, &[]).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].schema.columns[0].name, "count");
        assert_eq!(rows[0].values, vec![Value::Int(2)]);
    }

    #[test]
    fn test_summarize_aborts_at_build() {
        assert!(SummarizeOp::new(Box::new(ErrStream), &["n".to_string()]).is_err());
    }

    #[test]
    fn test_join_inner() {
        let dir = tempfile::tempdir().unwrap();
        let right = write_file(&dir, "right.csv", "id,dept\n1,eng\n3,sales\n");
        let input = VecStream::boxed(vec![kv_row(1, "alice"), kv_row(2, "bob")]);
        // Left key column is `k`; right key is `id`.
        let mut join = JoinOp::new(input, &right, "k", "id").unwrap();
        let row = join.next_row().unwrap().unwrap();
        assert_eq!(row.get("v"), Some(&Value::String("alice".to_string())));
        assert_eq!(row.get("dept"), Some(&Value::String("eng".to_string())));
        // Unmatched left rows are discarded.
        assert!(join.next_row().unwrap().is_none());
    }

    #[test]
    fn test_join_multiplicity_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let right = write_file(&dir, "right.csv", "id,tag\n1,x\n1,y\n");
        let input = VecStream::boxed(vec![kv_row(1, "a"), kv_row(1, "b")]);
        let rows = drain(JoinOp::new(input, &right, "k", "id").unwrap());
        // 2 left matches x 2 right matches, contiguous per left row in
        // right insertion order.
        assert_eq!(rows.len(), 4);
        let pairs: Vec<(String, String)> = rows
            .iter()
            .map(|r| (r.get("v").unwrap().to_string(), r.get("tag").unwrap().to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "x".to_string()),
                ("a".to_string(), "y".to_string()),
                ("b".to_string(), "x".to_string()),
                ("b".to_string(), "y".to_string()),
            ]
        );
    }

    #[test]
    fn test_join_renames_colliding_columns() {
        let dir = tempfile::tempdir().unwrap();
        let right = write_file(&dir, "right.csv", "k,dept\n1,eng\n");
        let input = VecStream::boxed(vec![kv_row(1, "alice")]);
        let mut join = JoinOp::new(input, &right, "k", "k").unwrap();
        let row = join.next_row().unwrap().unwrap();
        let names: Vec<&str> = row.schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["k", "v", "right.k", "dept"]);
    }

    #[test]
    fn test_join_missing_right_file_aborts_at_build() {
        let input = VecStream::boxed(vec![]);
        assert!(JoinOp::new(input, "no-such-file.csv", "k", "id").is_err());
    }

    #[test]
    fn test_build_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "t.csv", "name,age\nalice,30\nbob,41\ncarol,22\n");
        let reader = CsvReader::open(&path, None).unwrap();
        let ops = vec![
            Operator::Where(Expr::Compare {
                left: Box::new(Expr::Column("age".to_string())),
                op: CompareOp::Gt,
                right: Box::new(Expr::Literal(Value::Int(25))),
            }),
            Operator::OrderBy {
                column: "age".to_string(),
                desc: true,
            },
            Operator::Take(1),
        ];
        let pipeline = build_pipeline(Box::new(reader), &ops).unwrap();
        let rows = drain_boxed(pipeline);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::String("bob".to_string())));
    }

    #[test]
    fn test_build_pipeline_join_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let left = write_file(&dir, "left.csv", "id,name\n1,alice\n2,bob\n");
        let right = write_file(&dir, "right.csv", "id,dept\n1,eng\n3,sales\n");
        let reader = CsvReader::open(&left, None).unwrap();
        let ops = vec![
            Operator::Join(JoinPlan {
                right,
                left_key: "id".to_string(),
                right_key: "id".to_string(),
            }),
            Operator::Project(vec!["name".to_string(), "dept".to_string()]),
        ];
        let pipeline = build_pipeline(Box::new(reader), &ops).unwrap();
        let rows = drain_boxed(pipeline);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values, vec![
            Value::String("alice".to_string()),
            Value::String("eng".to_string()),
        ]);
    }

    #[test]
    fn test_blocking_build_absorbs_upstream_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "t.csv", "n\nx\n");
        let schema = Schema::new(vec![Column::new("n", Type::Int)]);
        let reader = CsvReader::open(&path, Some(schema)).unwrap();
        let ops = vec![Operator::OrderBy {
            column: "n".to_string(),
            desc: false,
        }];
        assert!(build_pipeline(Box::new(reader), &ops).is_err());
    }

    fn drain_boxed(mut op: Box<dyn RowStream>) -> Vec<Row> {
        let mut out = Vec::new();
        while let Some(row) = op.next_row().unwrap() {
            out.push(row);
        }
        out
    }
}
