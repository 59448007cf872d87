//! Convenient imports for typical `tinyorm` usage.
//!
//! ```ignore
//! use tinyorm::prelude::*;
//! ```

pub use crate::{
    Engine, EngineConfig, FromRow, GenericClient, HookContext, Hooks, Model, OrmError, OrmResult,
    Param, RowExt, Session, UpdateValues, kv, params,
};
