//! The session: clause accumulation, hook dispatch and statement execution.
//!
//! A [`Session`] borrows one connection (a plain client or an open
//! transaction), caches the table description of the last bound model type,
//! and collects SQL fragments until a terminal call executes them. Every
//! terminal call consumes and clears the pending state, whether or not the
//! statement succeeded.
//!
//! ```ignore
//! let mut s = engine.new_session();
//! s.insert(&mut [User { name: "Tom".into(), age: 18 }]).await?;
//!
//! let mut users = Vec::new();
//! s.filter("age >= ?", params![18_i32]).find(&mut users).await?;
//! ```
//!
//! A session is meant for one caller at a time; give each unit of work its own.

mod hooks;
mod record;
mod table;

pub use hooks::{HookContext, HookPoint, Hooks};

use crate::clause::ClauseSet;
use crate::client::GenericClient;
use crate::dialect::{Dialect, render_placeholders};
use crate::error::OrmResult;
use crate::param::{Param, as_refs};
use crate::schema::Schema;
use std::sync::Arc;
use tokio_postgres::Row;

/// The model type currently bound to a session.
struct BoundTable {
    schema: Schema,
    /// Receiver for hooks that have no single record to run on.
    prototype: Box<dyn Hooks + Send + Sync>,
}

/// A unit of statement building and execution over one connection.
pub struct Session<'c, C: GenericClient> {
    client: &'c C,
    dialect: Arc<dyn Dialect>,
    ref_table: Option<BoundTable>,
    clause: ClauseSet,
    sql: String,
    sql_vars: Vec<Param>,
}

impl<'c, C: GenericClient> Session<'c, C> {
    pub fn new(client: &'c C, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            client,
            dialect,
            ref_table: None,
            clause: ClauseSet::new(),
            sql: String::new(),
            sql_vars: Vec::new(),
        }
    }

    /// The connection statements run on.
    pub fn client(&self) -> &'c C {
        self.client
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Drop the raw SQL buffer, its parameters and every pending clause.
    pub fn clear(&mut self) {
        self.sql.clear();
        self.sql_vars.clear();
        self.clause.clear();
    }

    /// Append raw SQL (with `?` markers) and its parameters to the buffer.
    pub fn raw(&mut self, sql: &str, params: impl IntoIterator<Item = Param>) -> &mut Self {
        self.sql.push_str(sql);
        self.sql.push(' ');
        self.sql_vars.extend(params);
        self
    }

    /// Currently buffered raw SQL, before placeholder rendering.
    pub fn pending_sql(&self) -> &str {
        self.sql.trim_end()
    }

    /// Execute the buffered statement and return the affected row count.
    pub async fn exec(&mut self) -> OrmResult<u64> {
        let (sql, vars) = self.take_statement();
        tracing::debug!(target: "tinyorm.sql", sql = %sql, param_count = vars.len(), "exec");

        let result = if vars.is_empty() {
            self.client.execute(&sql, &[]).await
        } else {
            self.client.execute(&sql, &as_refs(&vars)).await
        };
        result.inspect_err(|error| {
            tracing::error!(target: "tinyorm.sql", sql = %sql, %error, "exec failed");
        })
    }

    /// Execute the buffered statement and return its first row.
    ///
    /// Zero rows is reported as [`OrmError::NotFound`](crate::OrmError::NotFound).
    pub async fn query_row(&mut self) -> OrmResult<Row> {
        let (sql, vars) = self.take_statement();
        tracing::debug!(target: "tinyorm.sql", sql = %sql, param_count = vars.len(), "query_row");

        self.client
            .query_one(&sql, &as_refs(&vars))
            .await
            .inspect_err(|error| {
                tracing::error!(target: "tinyorm.sql", sql = %sql, %error, "query_row failed");
            })
    }

    /// Execute the buffered statement and return all rows.
    pub async fn query_rows(&mut self) -> OrmResult<Vec<Row>> {
        let (sql, vars) = self.take_statement();
        tracing::debug!(target: "tinyorm.sql", sql = %sql, param_count = vars.len(), "query_rows");

        self.client
            .query(&sql, &as_refs(&vars))
            .await
            .inspect_err(|error| {
                tracing::error!(target: "tinyorm.sql", sql = %sql, %error, "query_rows failed");
            })
    }

    /// Render the buffered statement for execution and reset all pending state.
    fn take_statement(&mut self) -> (String, Vec<Param>) {
        let sql = render_placeholders(self.sql.trim_end(), self.dialect.as_ref());
        let vars = std::mem::take(&mut self.sql_vars);
        self.clear();
        (sql, vars)
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }
}
