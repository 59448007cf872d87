//! All-or-nothing units of work.
//!
//! [`run_in_transaction`] hands a [`Session`] over an open transaction to a
//! caller-supplied async closure and then finishes the transaction:
//!
//! - the closure panicked: roll back, then resume the panic
//! - the closure returned `Err`: roll back and return that error
//! - the closure returned `Ok`: commit; a failed commit is the result
//!
//! Errors from a rollback are logged and dropped, the closure's outcome
//! always takes priority.
//!
//! ```ignore
//! let total = engine
//!     .transaction(async |s| {
//!         s.insert(&mut [User { name: "Tom".into(), age: 18 }]).await?;
//!         s.model::<User>().count().await
//!     })
//!     .await?;
//! ```

use crate::client::Transactional;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::session::Session;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Run `f` on a session over `tx`, then commit or roll back.
pub async fn run_in_transaction<Tx, T, F>(tx: Tx, dialect: Arc<dyn Dialect>, f: F) -> OrmResult<T>
where
    Tx: Transactional,
    F: AsyncFnOnce(&mut Session<'_, Tx>) -> OrmResult<T>,
{
    tracing::debug!(target: "tinyorm", "begin transaction");

    let outcome = {
        let mut session = Session::new(&tx, dialect);
        AssertUnwindSafe(f(&mut session)).catch_unwind().await
    };

    match outcome {
        Err(panic) => {
            tracing::warn!(target: "tinyorm", "unit of work panicked, rolling back");
            if let Err(error) = tx.rollback().await {
                tracing::error!(target: "tinyorm", %error, "rollback failed");
            }
            std::panic::resume_unwind(panic)
        }
        Ok(Err(error)) => {
            tracing::debug!(target: "tinyorm", %error, "rollback");
            if let Err(rollback_error) = tx.rollback().await {
                tracing::error!(target: "tinyorm", error = %rollback_error, "rollback failed");
            }
            Err(error)
        }
        Ok(Ok(value)) => {
            tx.commit().await.inspect_err(|error| {
                tracing::error!(target: "tinyorm", %error, "commit failed");
            })?;
            tracing::debug!(target: "tinyorm", "commit");
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GenericClient;
    use crate::dialect::Postgres;
    use crate::error::OrmError;
    use std::sync::Mutex;
    use tokio_postgres::Row;
    use tokio_postgres::types::ToSql;

    /// Logs statements and the way the transaction was finished.
    #[derive(Clone, Default)]
    struct MockTx {
        events: Arc<Mutex<Vec<String>>>,
        fail_commit: bool,
        fail_rollback: bool,
    }

    impl MockTx {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }
    }

    impl GenericClient for MockTx {
        async fn query(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> OrmResult<Vec<Row>> {
            self.push(sql);
            Ok(Vec::new())
        }

        async fn execute(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> OrmResult<u64> {
            self.push(sql);
            Ok(1)
        }
    }

    impl Transactional for MockTx {
        async fn commit(self) -> OrmResult<()> {
            self.push("COMMIT");
            if self.fail_commit {
                return Err(OrmError::Other("commit refused".to_string()));
            }
            Ok(())
        }

        async fn rollback(self) -> OrmResult<()> {
            self.push("ROLLBACK");
            if self.fail_rollback {
                return Err(OrmError::Other("rollback refused".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn commits_on_success() {
        let tx = MockTx::default();
        let result = run_in_transaction(tx.clone(), Arc::new(Postgres), async |s| {
            s.raw("UPDATE t SET a = 1", []).exec().await
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(tx.events(), vec!["UPDATE t SET a = 1", "COMMIT"]);
    }

    #[tokio::test]
    async fn rolls_back_on_error() {
        let tx = MockTx {
            fail_rollback: true,
            ..MockTx::default()
        };
        let result = run_in_transaction::<_, (), _>(tx.clone(), Arc::new(Postgres), async |s| {
            s.raw("DELETE FROM t", []).exec().await?;
            Err(OrmError::validation("nope"))
        })
        .await;

        // The unit of work's error wins over the failed rollback.
        assert!(matches!(result, Err(OrmError::Validation(_))));
        assert_eq!(tx.events(), vec!["DELETE FROM t", "ROLLBACK"]);
    }

    #[tokio::test]
    async fn rolls_back_and_resumes_panic() {
        let tx = MockTx::default();
        let outcome = AssertUnwindSafe(run_in_transaction::<_, (), _>(
            tx.clone(),
            Arc::new(Postgres),
            async |s| {
                s.raw("INSERT INTO t VALUES (1)", []).exec().await?;
                panic!("unit of work exploded");
            },
        ))
        .catch_unwind()
        .await;

        let payload = outcome.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"unit of work exploded"));
        assert_eq!(tx.events(), vec!["INSERT INTO t VALUES (1)", "ROLLBACK"]);
    }

    #[tokio::test]
    async fn failed_commit_is_reported() {
        let tx = MockTx {
            fail_commit: true,
            ..MockTx::default()
        };
        let result = run_in_transaction(tx.clone(), Arc::new(Postgres), async |_s| Ok(7)).await;

        assert!(matches!(result, Err(OrmError::Other(ref m)) if m == "commit refused"));
        assert_eq!(tx.events(), vec!["COMMIT"]);
    }
}
