//! Parameter storage using Arc for clone-friendly statement fragments.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly parameter wrapper using Arc.
///
/// Fragments produced by the clause builder own their bound values; wrapping
/// them in `Arc` lets a fragment be cloned into the flattened parameter list
/// without copying the value.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Every ToSql impl is also Debug.
        f.debug_tuple("Param").field(&self.0).finish()
    }
}

/// Borrow a parameter slice in the shape tokio-postgres expects.
pub fn as_refs(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(Param::as_sql).collect()
}

/// Build a `Vec<Param>` from heterogeneous values.
///
/// ```ignore
/// session.filter("age >= ? AND name <> ?", tinyorm::params![18_i32, "Tom"]);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Param::new($value)),+]
    };
}

/// Build an ordered column/value list from an alternating flat sequence.
///
/// ```ignore
/// session.update(tinyorm::kv!["name", "Sam", "age", 30_i32]).await?;
/// ```
#[macro_export]
macro_rules! kv {
    ($($column:expr, $value:expr),+ $(,)?) => {
        $crate::UpdateValues::from(::std::vec![
            $((::std::string::String::from($column), $crate::Param::new($value))),+
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_macro_keeps_order_and_count() {
        let params = crate::params![1_i32, "two", 3.0_f64];
        assert_eq!(params.len(), 3);
        let debug = format!("{:?}", params);
        let one = debug.find('1').unwrap();
        let two = debug.find("two").unwrap();
        assert!(one < two);
    }

    #[test]
    fn empty_params_macro() {
        assert!(crate::params![].is_empty());
    }

    #[test]
    fn as_refs_matches_len() {
        let params = vec![Param::new(1_i64), Param::new(String::from("x"))];
        assert_eq!(as_refs(&params).len(), 2);
    }
}
