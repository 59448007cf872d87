//! Helpers shared by the `FromRow` and `Model` derives.

pub mod attrs;
