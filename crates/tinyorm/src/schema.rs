//! Record type → table metadata.
//!
//! A [`Model`] describes its columns statically (normally through
//! `#[derive(Model)]`); [`Schema::parse`] combines that description with a
//! [`Dialect`] to produce column types. Parsing walks only static metadata, so
//! the same type always yields the same table name and field order.

use crate::dialect::{Dialect, NativeType};
use crate::param::Param;
use crate::row::FromRow;
use crate::session::Hooks;
use std::any::TypeId;
use std::collections::HashMap;

/// Static description of one mapped struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name (the field's identifier).
    pub name: &'static str,
    /// Native type of the field.
    pub native: NativeType,
    /// Raw constraint text, e.g. `PRIMARY KEY`.
    pub tag: Option<&'static str>,
}

/// A record type mapped to a table.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Debug, Default, Model)]
/// struct User {
///     #[orm(tag = "PRIMARY KEY")]
///     name: String,
///     age: i32,
/// }
/// ```
///
/// `columns()` and `record_values()` must list fields in the same order; the
/// INSERT column list and its VALUES tuples are built from them positionally.
pub trait Model: FromRow + Hooks + Default + Send + Sync + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Mapped columns in declaration order.
    fn columns() -> &'static [ColumnDef];

    /// Current values of the mapped fields, in `columns()` order.
    fn record_values(&self) -> Vec<Param>;
}

/// One column of a parsed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Dialect-specific column type.
    pub ty: String,
    /// Raw constraint text, empty when the field has none.
    pub tag: String,
}

/// Table metadata derived from a [`Model`] type.
#[derive(Debug, Clone)]
pub struct Schema {
    model: TypeId,
    model_name: &'static str,
    pub name: String,
    pub fields: Vec<Field>,
    pub field_names: Vec<String>,
    field_map: HashMap<String, usize>,
}

impl Schema {
    /// Derive the table description of `M` using `dialect` for column types.
    pub fn parse<M: Model>(dialect: &dyn Dialect) -> Self {
        let columns = M::columns();
        let mut fields = Vec::with_capacity(columns.len());
        let mut field_names = Vec::with_capacity(columns.len());
        let mut field_map = HashMap::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            fields.push(Field {
                name: column.name.to_string(),
                ty: dialect.data_type_of(column.native),
                tag: column.tag.unwrap_or_default().to_string(),
            });
            field_names.push(column.name.to_string());
            field_map.insert(column.name.to_string(), i);
        }

        Self {
            model: TypeId::of::<M>(),
            model_name: std::any::type_name::<M>(),
            name: M::TABLE.to_string(),
            fields,
            field_names,
            field_map,
        }
    }

    /// Look up a field by column name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).map(|&i| &self.fields[i])
    }

    /// Whether this schema was parsed from `M`.
    pub fn is_model<M: Model>(&self) -> bool {
        self.model == TypeId::of::<M>()
    }

    /// Rust type name of the source model.
    pub fn model_name(&self) -> &'static str {
        self.model_name
    }

    /// Values of `record` in field order.
    pub fn record_values<M: Model>(&self, record: &M) -> Vec<Param> {
        debug_assert!(self.is_model::<M>(), "record type does not match schema");
        record.record_values()
    }
}
