//! Ordered SQL fragment assembly.
//!
//! Each [`Clause`] variant carries a typed payload and generates exactly one
//! SQL fragment plus its bound parameters. A [`ClauseSet`] keeps at most one
//! fragment per [`ClauseKind`] and stitches the requested kinds together in
//! caller-specified order.
//!
//! Fragments always use `?` as the parameter marker; the session rewrites
//! markers into the dialect's bind-variable syntax just before execution.
//!
//! ```ignore
//! let mut set = ClauseSet::new();
//! set.set(Clause::Select { table: "users".into(), columns: vec!["name".into()] });
//! set.set(Clause::Limit(3));
//! let (sql, params) = set.build(&[ClauseKind::Select, ClauseKind::Where, ClauseKind::Limit]);
//! assert_eq!(sql, "SELECT name FROM users LIMIT ?");
//! ```

use crate::param::Param;
use std::collections::{BTreeMap, HashMap};
use tokio_postgres::types::ToSql;

/// The fixed set of statement segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Insert,
    Values,
    Select,
    Limit,
    Where,
    OrderBy,
    Update,
    Delete,
    Count,
}

/// A single statement segment with its typed inputs.
#[derive(Debug, Clone)]
pub enum Clause {
    /// `INSERT INTO <table> (<col1,col2,...>)`
    Insert { table: String, columns: Vec<String> },
    /// `VALUES (?,?),(?,?)`, one tuple per record
    Values(Vec<Vec<Param>>),
    /// `SELECT <col1,col2,...> FROM <table>`
    Select { table: String, columns: Vec<String> },
    /// `LIMIT ?`
    Limit(i64),
    /// `WHERE <template>`, template markers bound to `params`
    Where { template: String, params: Vec<Param> },
    /// `ORDER BY <expr>`
    OrderBy(String),
    /// `UPDATE <table> SET col1 = ?, col2 = ?`
    Update { table: String, values: UpdateValues },
    /// `DELETE FROM <table>`
    Delete { table: String },
    /// `SELECT count(*) FROM <table>`
    Count { table: String },
}

impl Clause {
    /// The kind this clause is stored under.
    pub fn kind(&self) -> ClauseKind {
        match self {
            Clause::Insert { .. } => ClauseKind::Insert,
            Clause::Values(_) => ClauseKind::Values,
            Clause::Select { .. } => ClauseKind::Select,
            Clause::Limit(_) => ClauseKind::Limit,
            Clause::Where { .. } => ClauseKind::Where,
            Clause::OrderBy(_) => ClauseKind::OrderBy,
            Clause::Update { .. } => ClauseKind::Update,
            Clause::Delete { .. } => ClauseKind::Delete,
            Clause::Count { .. } => ClauseKind::Count,
        }
    }

    /// Produce the SQL fragment and its ordered parameters.
    pub fn generate(self) -> (String, Vec<Param>) {
        match self {
            Clause::Insert { table, columns } => {
                (format!("INSERT INTO {} ({})", table, columns.join(",")), Vec::new())
            }
            Clause::Values(tuples) => {
                let mut sql = String::from("VALUES ");
                let mut params = Vec::new();
                for (i, tuple) in tuples.into_iter().enumerate() {
                    if i > 0 {
                        sql.push(',');
                    }
                    sql.push('(');
                    sql.push_str(&bind_vars(tuple.len()));
                    sql.push(')');
                    params.extend(tuple);
                }
                (sql, params)
            }
            Clause::Select { table, columns } => {
                (format!("SELECT {} FROM {}", columns.join(","), table), Vec::new())
            }
            Clause::Limit(n) => ("LIMIT ?".to_string(), vec![Param::new(n)]),
            Clause::Where { template, params } => (format!("WHERE {template}"), params),
            Clause::OrderBy(expr) => (format!("ORDER BY {expr}"), Vec::new()),
            Clause::Update { table, values } => {
                let mut sets = Vec::with_capacity(values.len());
                let mut params = Vec::with_capacity(values.len());
                for (column, value) in values.pairs {
                    sets.push(format!("{column} = ?"));
                    params.push(value);
                }
                (format!("UPDATE {} SET {}", table, sets.join(", ")), params)
            }
            Clause::Delete { table } => (format!("DELETE FROM {table}"), Vec::new()),
            Clause::Count { table } => (format!("SELECT count(*) FROM {table}"), Vec::new()),
        }
    }
}

fn bind_vars(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// Pending fragments for one statement, keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct ClauseSet {
    fragments: HashMap<ClauseKind, (String, Vec<Param>)>,
}

impl ClauseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate `clause` and store it, replacing any fragment of the same kind.
    pub fn set(&mut self, clause: Clause) -> &mut Self {
        let kind = clause.kind();
        self.fragments.insert(kind, clause.generate());
        self
    }

    /// Whether a fragment of `kind` is pending.
    pub fn contains(&self, kind: ClauseKind) -> bool {
        self.fragments.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Join the pending fragments of `order` with single spaces.
    ///
    /// Kinds with no pending fragment are skipped. Parameters are concatenated
    /// in the same order so they line up with the markers in the SQL.
    pub fn build(&self, order: &[ClauseKind]) -> (String, Vec<Param>) {
        let mut sqls = Vec::with_capacity(order.len());
        let mut params = Vec::new();
        for kind in order {
            if let Some((sql, vars)) = self.fragments.get(kind) {
                sqls.push(sql.as_str());
                params.extend(vars.iter().cloned());
            }
        }
        tracing::trace!(target: "tinyorm.sql", ?order, param_count = params.len(), "build");
        (sqls.join(" "), params)
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }
}

/// Column/value pairs for an UPDATE, in SET-list order.
///
/// Ordered sources (`Vec`, arrays, [`BTreeMap`], the [`kv!`](crate::kv) macro)
/// keep their order. Building from a [`HashMap`] inherits the map's iteration
/// order, so the generated SQL text may differ between runs even though every
/// value still binds to its own column.
#[derive(Debug, Clone, Default)]
pub struct UpdateValues {
    pairs: Vec<(String, Param)>,
}

impl UpdateValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column assignment.
    pub fn set<T>(mut self, column: impl Into<String>, value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.pairs.push((column.into(), Param::new(value)));
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Column names in SET-list order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(c, _)| c.as_str())
    }

    /// Rewrite every column name, e.g. to quote identifiers.
    pub(crate) fn map_columns(self, f: impl Fn(&str) -> String) -> Self {
        Self {
            pairs: self.pairs.into_iter().map(|(c, v)| (f(&c), v)).collect(),
        }
    }
}

impl<K: Into<String>> From<Vec<(K, Param)>> for UpdateValues {
    fn from(pairs: Vec<(K, Param)>) -> Self {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Param); N]> for UpdateValues {
    fn from(pairs: [(K, Param); N]) -> Self {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>> From<BTreeMap<K, Param>> for UpdateValues {
    fn from(map: BTreeMap<K, Param>) -> Self {
        Self {
            pairs: map.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>> From<HashMap<K, Param>> for UpdateValues {
    fn from(map: HashMap<K, Param>) -> Self {
        Self {
            pairs: map.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
