//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use tokio_postgres::Row;

/// Trait for converting a database row into a Rust struct.
///
/// This trait should typically be derived using `#[derive(FromRow)]`
/// from the `tinyorm-derive` crate. Columns are looked up by name, so the
/// order of the SELECT list does not matter to the mapping.
///
/// # Example
///
/// ```ignore
/// use tinyorm::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     name: String,
///     age: i32,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning OrmError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| OrmError::decode(column, e.to_string()))
    }
}

/// Single-column rows decode into scalars, used for `count(*)` style queries.
impl FromRow for i64 {
    fn from_row(row: &Row) -> OrmResult<Self> {
        row.try_get(0)
            .map_err(|e| OrmError::decode("0", e.to_string()))
    }
}
