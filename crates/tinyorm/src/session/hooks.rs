//! Lifecycle hooks around Insert, Query, Update and Delete.

use crate::error::OrmResult;
use crate::schema::Schema;

/// The eight points at which a [`Hooks`] method may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BeforeQuery,
    AfterQuery,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
    BeforeInsert,
    AfterInsert,
}

impl HookPoint {
    pub fn name(self) -> &'static str {
        match self {
            HookPoint::BeforeQuery => "BeforeQuery",
            HookPoint::AfterQuery => "AfterQuery",
            HookPoint::BeforeUpdate => "BeforeUpdate",
            HookPoint::AfterUpdate => "AfterUpdate",
            HookPoint::BeforeDelete => "BeforeDelete",
            HookPoint::AfterDelete => "AfterDelete",
            HookPoint::BeforeInsert => "BeforeInsert",
            HookPoint::AfterInsert => "AfterInsert",
        }
    }
}

/// What a hook can see about the operation it brackets.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub point: HookPoint,
    /// The table bound to the session.
    pub table: &'a Schema,
}

/// Optional lifecycle callbacks of a record type.
///
/// Every method defaults to a no-op. `#[derive(Model)]` emits an empty impl;
/// add `#[orm(hooks)]` to the struct to write your own instead.
///
/// Per-record hooks (`before_insert`, `after_query`) run on the record being
/// inserted or the record just decoded. The others run on the bound table's
/// prototype, a `Default` instance created when the type was bound.
///
/// Hooks see a [`HookContext`], not the session: they cannot run statements.
/// Database work that must accompany an operation belongs around the session
/// call, inside [`Engine::transaction`](crate::Engine::transaction) when it
/// has to commit together with it.
///
/// A returned error is logged and otherwise ignored: hooks never abort or
/// change the result of the operation they bracket.
///
/// ```ignore
/// #[derive(Debug, Default, FromRow, Model)]
/// #[orm(hooks)]
/// struct Account {
///     #[orm(tag = "PRIMARY KEY")]
///     id: i64,
///     password: String,
/// }
///
/// impl Hooks for Account {
///     fn after_query(&mut self, _ctx: &HookContext<'_>) -> OrmResult<()> {
///         self.password = "******".to_string();
///         Ok(())
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait Hooks {
    fn before_query(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }

    fn after_query(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }

    fn before_update(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }

    fn after_update(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }

    fn before_delete(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }

    fn after_delete(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }

    fn before_insert(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }

    fn after_insert(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
        Ok(())
    }
}

/// Run the hook for `point` on `target`, logging any error it returns.
pub(crate) fn dispatch(target: &mut dyn Hooks, ctx: &HookContext<'_>) {
    let result = match ctx.point {
        HookPoint::BeforeQuery => target.before_query(ctx),
        HookPoint::AfterQuery => target.after_query(ctx),
        HookPoint::BeforeUpdate => target.before_update(ctx),
        HookPoint::AfterUpdate => target.after_update(ctx),
        HookPoint::BeforeDelete => target.before_delete(ctx),
        HookPoint::AfterDelete => target.after_delete(ctx),
        HookPoint::BeforeInsert => target.before_insert(ctx),
        HookPoint::AfterInsert => target.after_insert(ctx),
    };
    if let Err(error) = result {
        tracing::error!(
            target: "tinyorm",
            hook = ctx.point.name(),
            table = %ctx.table.name,
            %error,
            "hook returned an error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{NativeType, Postgres};
    use crate::error::OrmError;
    use crate::param::Param;
    use crate::row::FromRow;
    use crate::schema::{ColumnDef, Model};
    use tokio_postgres::Row;

    #[derive(Debug, Default)]
    struct Seen {
        calls: Vec<(HookPoint, String)>,
    }

    impl FromRow for Seen {
        fn from_row(_row: &Row) -> OrmResult<Self> {
            Ok(Seen::default())
        }
    }

    impl Hooks for Seen {
        fn before_delete(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
            self.calls.push((ctx.point, ctx.table.name.clone()));
            Ok(())
        }

        fn after_delete(&mut self, ctx: &HookContext<'_>) -> OrmResult<()> {
            self.calls.push((ctx.point, ctx.table.name.clone()));
            Err(OrmError::validation("rejected"))
        }
    }

    impl Model for Seen {
        const TABLE: &'static str = "seen";

        fn columns() -> &'static [ColumnDef] {
            const COLUMNS: &[ColumnDef] = &[ColumnDef {
                name: "id",
                native: NativeType::BigInt,
                tag: None,
            }];
            COLUMNS
        }

        fn record_values(&self) -> Vec<Param> {
            vec![Param::new(0_i64)]
        }
    }

    #[test]
    fn dispatch_passes_point_and_table() {
        let schema = Schema::parse::<Seen>(&Postgres);
        let mut seen = Seen::default();

        for point in [HookPoint::BeforeDelete, HookPoint::AfterDelete, HookPoint::AfterQuery] {
            let ctx = HookContext {
                point,
                table: &schema,
            };
            dispatch(&mut seen, &ctx);
        }

        assert_eq!(
            seen.calls,
            vec![
                (HookPoint::BeforeDelete, "seen".to_string()),
                (HookPoint::AfterDelete, "seen".to_string()),
            ]
        );
    }

    #[test]
    fn point_names() {
        assert_eq!(HookPoint::BeforeQuery.name(), "BeforeQuery");
        assert_eq!(HookPoint::AfterInsert.name(), "AfterInsert");
    }
}
