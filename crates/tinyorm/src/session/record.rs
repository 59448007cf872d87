use super::hooks::{HookContext, HookPoint, Hooks, dispatch};
use super::Session;
use crate::clause::{Clause, ClauseKind, UpdateValues};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::param::Param;
use crate::row::FromRow;
use crate::schema::Model;

impl<C: GenericClient> Session<'_, C> {
    /// Insert `records` in one statement and return the affected row count.
    ///
    /// `before_insert` runs on every record before its values are read;
    /// `after_insert` runs once on the prototype after a successful insert.
    ///
    /// All records share the type `M` and land in one table. A batch of
    /// mixed models takes one call per type; wrap the calls in
    /// [`Engine::transaction`](crate::Engine::transaction) to keep them atomic.
    pub async fn insert<M: Model>(&mut self, records: &mut [M]) -> OrmResult<u64> {
        if records.is_empty() {
            self.clear();
            return Err(OrmError::validation("insert needs at least one record"));
        }

        self.model::<M>();
        let mut tuples = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            self.call_hook_on(HookPoint::BeforeInsert, &mut *record);
            tuples.push(self.ref_table()?.record_values(&*record));
        }

        let (table, columns) = self.quoted_table()?;
        self.clause.set(Clause::Insert { table, columns });
        self.clause.set(Clause::Values(tuples));
        let (sql, vars) = self.clause.build(&[ClauseKind::Insert, ClauseKind::Values]);
        let affected = self.raw(&sql, vars).exec().await?;

        self.call_hook(HookPoint::AfterInsert);
        Ok(affected)
    }

    /// Select rows of `M` and append them to `dest` in the order returned.
    ///
    /// Pending `filter`, `order_by` and `limit` fragments apply.
    pub async fn find<M: Model>(&mut self, dest: &mut Vec<M>) -> OrmResult<()> {
        self.model::<M>();
        self.call_hook(HookPoint::BeforeQuery);

        let (table, columns) = self.quoted_table()?;
        self.clause.set(Clause::Select { table, columns });
        let (sql, vars) = self.clause.build(&[
            ClauseKind::Select,
            ClauseKind::Where,
            ClauseKind::OrderBy,
            ClauseKind::Limit,
        ]);
        let rows = self.raw(&sql, vars).query_rows().await?;

        dest.reserve(rows.len());
        for row in &rows {
            let mut record = M::from_row(row)?;
            self.call_hook_on(HookPoint::AfterQuery, &mut record);
            dest.push(record);
        }
        Ok(())
    }

    /// Load the first matching row of `M` into `dest`.
    ///
    /// Adds `LIMIT 1` to the pending fragments; zero rows is
    /// [`OrmError::NotFound`] and leaves `dest` untouched.
    pub async fn first<M: Model>(&mut self, dest: &mut M) -> OrmResult<()> {
        let mut found: Vec<M> = Vec::with_capacity(1);
        self.limit(1).find(&mut found).await?;
        match found.pop() {
            Some(record) => {
                *dest = record;
                Ok(())
            }
            None => Err(OrmError::not_found(format!("no rows in {}", M::TABLE))),
        }
    }

    /// Update columns of the bound table and return the affected row count.
    ///
    /// Accepts anything convertible to [`UpdateValues`]: the [`kv!`](crate::kv)
    /// macro, a `Vec` or array of `(column, Param)` pairs, or a map.
    pub async fn update(&mut self, values: impl Into<UpdateValues>) -> OrmResult<u64> {
        let values = values.into();
        if values.is_empty() {
            self.clear();
            return Err(OrmError::validation("update needs at least one column"));
        }

        let (table, _) = self.quoted_table()?;
        self.call_hook(HookPoint::BeforeUpdate);

        let values = values.map_columns(|column| self.quote(column));
        self.clause.set(Clause::Update { table, values });
        let (sql, vars) = self.clause.build(&[ClauseKind::Update, ClauseKind::Where]);
        let affected = self.raw(&sql, vars).exec().await?;

        self.call_hook(HookPoint::AfterUpdate);
        Ok(affected)
    }

    /// Delete rows of the bound table and return the affected row count.
    pub async fn delete(&mut self) -> OrmResult<u64> {
        let (table, _) = self.quoted_table()?;
        self.call_hook(HookPoint::BeforeDelete);

        self.clause.set(Clause::Delete { table });
        let (sql, vars) = self.clause.build(&[ClauseKind::Delete, ClauseKind::Where]);
        let affected = self.raw(&sql, vars).exec().await?;

        self.call_hook(HookPoint::AfterDelete);
        Ok(affected)
    }

    /// Count rows of the bound table, honoring a pending `filter`.
    pub async fn count(&mut self) -> OrmResult<i64> {
        let (table, _) = self.quoted_table()?;
        self.clause.set(Clause::Count { table });
        let (sql, vars) = self.clause.build(&[ClauseKind::Count, ClauseKind::Where]);
        let row = self.raw(&sql, vars).query_row().await?;
        i64::from_row(&row)
    }

    /// Set the WHERE fragment. `template` uses `?` markers bound to `params`.
    ///
    /// Replaces any earlier `filter` on this statement.
    #[doc(alias = "where")]
    pub fn filter(&mut self, template: &str, params: impl IntoIterator<Item = Param>) -> &mut Self {
        self.clause.set(Clause::Where {
            template: template.to_string(),
            params: params.into_iter().collect(),
        });
        self
    }

    /// Set the ORDER BY fragment, replacing any earlier one.
    pub fn order_by(&mut self, expr: &str) -> &mut Self {
        self.clause.set(Clause::OrderBy(expr.to_string()));
        self
    }

    /// Set the LIMIT fragment, replacing any earlier one.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.clause.set(Clause::Limit(n));
        self
    }

    /// Quoted table name and column list of the bound table.
    ///
    /// With nothing bound the pending statement is discarded, as a failed
    /// execution would.
    fn quoted_table(&mut self) -> OrmResult<(String, Vec<String>)> {
        let quoted = self.ref_table().map(|table| {
            let columns = table.field_names.iter().map(|c| self.quote(c)).collect();
            (self.quote(&table.name), columns)
        });
        if quoted.is_err() {
            self.clear();
        }
        quoted
    }

    /// Run a per-record hook on `record`.
    fn call_hook_on(&self, point: HookPoint, record: &mut dyn Hooks) {
        if let Some(bound) = &self.ref_table {
            let ctx = HookContext {
                point,
                table: &bound.schema,
            };
            dispatch(record, &ctx);
        }
    }

    /// Run a hook on the bound table's prototype.
    fn call_hook(&mut self, point: HookPoint) {
        if let Some(bound) = self.ref_table.as_mut() {
            let ctx = HookContext {
                point,
                table: &bound.schema,
            };
            dispatch(bound.prototype.as_mut(), &ctx);
        }
    }
}
