//! # tinyorm
//!
//! A small session-oriented ORM for PostgreSQL.
//!
//! ## Features
//!
//! - **Typed records**: `#[derive(Model, FromRow)]` maps a struct to a table
//! - **Session API**: `insert`, `find`, `first`, `update`, `delete`, `count`
//!   with composable `filter` / `order_by` / `limit` fragments
//! - **Raw SQL**: `raw(..)` plus `exec` / `query_row` / `query_rows` when the
//!   CRUD layer is not enough
//! - **Hooks**: optional before/after callbacks around every CRUD operation
//! - **Transactions**: an async closure runs all-or-nothing, panics included
//! - **Dialects**: column types and bind-var syntax behind a pluggable trait
//!
//! ## Example
//!
//! ```ignore
//! use tinyorm::prelude::*;
//!
//! #[derive(Debug, Default, Clone, PartialEq, FromRow, Model)]
//! struct User {
//!     #[orm(tag = "PRIMARY KEY")]
//!     name: String,
//!     age: i32,
//! }
//!
//! # async fn demo() -> OrmResult<()> {
//! let mut engine = Engine::connect("postgres", "postgres://localhost/app").await?;
//!
//! let mut s = engine.new_session();
//! s.model::<User>().drop_table().await?;
//! s.create_table().await?;
//! s.insert(&mut [User { name: "Tom".into(), age: 18 }]).await?;
//!
//! let mut adults = Vec::new();
//! s.filter("age >= ?", params![18_i32]).find::<User>(&mut adults).await?;
//!
//! s.model::<User>()
//!     .filter("name = ?", params!["Tom"])
//!     .update(kv!["age", 19_i32])
//!     .await?;
//!
//! engine
//!     .transaction(async |s| {
//!         s.model::<User>().delete().await?;
//!         Ok(())
//!     })
//!     .await?;
//! engine.close().await;
//! # Ok(()) }
//! ```

pub mod clause;
pub mod client;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod param;
pub mod prelude;
pub mod row;
pub mod schema;
pub mod session;
pub mod transaction;

pub use clause::{Clause, ClauseKind, ClauseSet, UpdateValues};
pub use client::{GenericClient, Transactional};
pub use dialect::{
    Dialect, NativeType, Postgres, SqlType, get_dialect, register_dialect, render_placeholders,
};
pub use engine::{Engine, EngineConfig};
pub use error::{OrmError, OrmResult};
pub use param::Param;
pub use row::{FromRow, RowExt};
pub use schema::{ColumnDef, Field, Model, Schema};
pub use session::{HookContext, HookPoint, Hooks, Session};
pub use transaction::run_in_transaction;

#[cfg(feature = "derive")]
pub use tinyorm_derive::{FromRow, Model};

// Derived code names driver types through this path.
#[doc(hidden)]
pub use tokio_postgres;
