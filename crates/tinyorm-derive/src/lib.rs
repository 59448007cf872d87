//! Derive macros for tinyorm
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Model)]` macros.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod from_row;
mod model;

/// Derive `FromRow` trait for a struct.
///
/// Each field is read from the column of the same name. Fields marked
/// `#[orm(skip)]` are not read and take `Default::default()`.
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
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Model` (and, by default, an empty `Hooks`) for a struct.
///
/// # Example
///
/// ```ignore
/// use tinyorm::{FromRow, Model};
///
/// #[derive(Debug, Default, FromRow, Model)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(tag = "PRIMARY KEY")]
///     name: String,
///     age: i32,
///     #[orm(skip)]
///     cached: Option<String>,
/// }
/// ```
///
/// # Generated
///
/// - `TABLE` - the struct's identifier unless overridden
/// - `columns()` - one `ColumnDef` per mapped field, in declaration order
/// - `record_values()` - cloned field values in the same order
/// - `impl Hooks for T {}` unless `#[orm(hooks)]` is present
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Override the table name
/// - `#[orm(hooks)]` - Do not generate `Hooks`; the struct provides its own
/// - `#[orm(tag = "...")]` - Raw constraint text for CREATE TABLE
/// - `#[orm(skip)]` - Leave the field out of the table
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
