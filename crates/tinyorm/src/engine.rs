//! Connection bootstrap and session factory.

use crate::dialect::{Dialect, get_dialect};
use crate::error::{OrmError, OrmResult};
use crate::session::Session;
use crate::transaction::run_in_transaction;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

/// Configuration for [`Engine::from_config`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registered dialect name.
    pub dialect: String,
    /// Connection string understood by tokio-postgres.
    pub database_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: "postgres".to_string(),
            database_url: String::new(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `DATABASE_URL` and, if set, `TINYORM_DIALECT`.
    pub fn from_env() -> OrmResult<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| OrmError::Connection("DATABASE_URL is not set".to_string()))?;
        let mut config = Self::new().database_url(database_url);
        if let Ok(dialect) = std::env::var("TINYORM_DIALECT") {
            config = config.dialect(dialect);
        }
        Ok(config)
    }

    /// Set the dialect name.
    pub fn dialect(mut self, name: impl Into<String>) -> Self {
        self.dialect = name.into();
        self
    }

    /// Set the connection string.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }
}

/// Owns one database connection and hands out sessions over it.
///
/// ```ignore
/// let mut engine = Engine::connect("postgres", "postgres://localhost/app").await?;
/// let mut s = engine.new_session();
/// s.model::<User>().create_table().await?;
/// engine.close().await;
/// ```
pub struct Engine {
    client: Client,
    dialect: Arc<dyn Dialect>,
    connection: Option<JoinHandle<()>>,
}

impl Engine {
    /// Look up `dialect_name`, open a connection to `url` and drive it on a
    /// background task.
    pub async fn connect(dialect_name: &str, url: &str) -> OrmResult<Self> {
        let dialect = get_dialect(dialect_name).ok_or_else(|| {
            tracing::error!(target: "tinyorm", dialect = dialect_name, "dialect not found");
            OrmError::DialectNotRegistered(dialect_name.to_string())
        })?;

        let (client, connection) = tokio_postgres::connect(url, NoTls).await.map_err(|e| {
            tracing::error!(target: "tinyorm", error = %e, "connect failed");
            OrmError::Connection(e.to_string())
        })?;
        let handle = tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::error!(target: "tinyorm", %error, "connection closed with error");
            }
        });

        tracing::info!(target: "tinyorm", dialect = dialect.name(), "connect database success");
        Ok(Self {
            client,
            dialect,
            connection: Some(handle),
        })
    }

    pub async fn from_config(config: &EngineConfig) -> OrmResult<Self> {
        Self::connect(&config.dialect, &config.database_url).await
    }

    /// Wrap a client whose connection is driven elsewhere.
    pub fn new(client: Client, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            client,
            dialect,
            connection: None,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A fresh session over the engine's connection.
    pub fn new_session(&self) -> Session<'_, Client> {
        Session::new(&self.client, Arc::clone(&self.dialect))
    }

    /// Run `f` inside a transaction; see [`run_in_transaction`].
    pub async fn transaction<T, F>(&mut self, f: F) -> OrmResult<T>
    where
        F: for<'t> AsyncFnOnce(&mut Session<'_, tokio_postgres::Transaction<'t>>) -> OrmResult<T>,
    {
        let dialect = Arc::clone(&self.dialect);
        let tx = self.client.transaction().await.inspect_err(|error| {
            tracing::error!(target: "tinyorm", %error, "begin transaction failed");
        })?;
        run_in_transaction(tx, dialect, f).await
    }

    /// Close the connection and wait for its task to finish.
    pub async fn close(self) {
        let Self {
            client, connection, ..
        } = self;
        drop(client);
        if let Some(handle) = connection {
            if let Err(error) = handle.await {
                tracing::error!(target: "tinyorm", %error, "connection task failed");
            }
        }
        tracing::info!(target: "tinyorm", "close database success");
    }
}
