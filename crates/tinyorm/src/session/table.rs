use super::{BoundTable, Session};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::row::FromRow;
use crate::schema::{Model, Schema};

impl<C: GenericClient> Session<'_, C> {
    /// Bind `M` as the session's table.
    ///
    /// The table description is derived only when nothing is bound yet or a
    /// different type was bound before; binding the same type again is a no-op.
    pub fn model<M: Model>(&mut self) -> &mut Self {
        let cached = self
            .ref_table
            .as_ref()
            .is_some_and(|bound| bound.schema.is_model::<M>());
        if !cached {
            self.ref_table = Some(BoundTable {
                schema: Schema::parse::<M>(self.dialect.as_ref()),
                prototype: Box::new(M::default()),
            });
        }
        self
    }

    /// The bound table description.
    pub fn ref_table(&self) -> OrmResult<&Schema> {
        match &self.ref_table {
            Some(bound) => Ok(&bound.schema),
            None => {
                tracing::error!(target: "tinyorm", "Model is not set");
                Err(OrmError::ModelNotSet)
            }
        }
    }

    /// Create the bound table from its schema.
    pub async fn create_table(&mut self) -> OrmResult<()> {
        let table = self.ref_table()?;
        let columns: Vec<String> = table
            .fields
            .iter()
            .map(|field| {
                format!("{} {} {}", self.quote(&field.name), field.ty, field.tag)
                    .trim_end()
                    .to_string()
            })
            .collect();
        let sql = format!("CREATE TABLE {} ({});", self.quote(&table.name), columns.join(","));
        self.raw(&sql, []).exec().await?;
        Ok(())
    }

    /// Drop the bound table if it exists.
    pub async fn drop_table(&mut self) -> OrmResult<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", self.quote(&self.ref_table()?.name));
        self.raw(&sql, []).exec().await?;
        Ok(())
    }

    /// Whether the bound table exists, according to the dialect's existence query.
    pub async fn has_table(&mut self) -> OrmResult<bool> {
        let (sql, params) = self.dialect.table_exist_sql(&self.ref_table()?.name);
        let row = self.raw(&sql, params).query_row().await?;
        let count = i64::from_row(&row)?;
        Ok(count == 1)
    }
}
