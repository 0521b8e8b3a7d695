//! SurrealDB connection management.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "taskvault".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Build the configuration from `TASKVAULT_DB_*` environment
    /// variables, falling back to the local-development defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env_or("TASKVAULT_DB_URL", defaults.url),
            namespace: env_or("TASKVAULT_DB_NAMESPACE", defaults.namespace),
            database: env_or("TASKVAULT_DB_NAME", defaults.database),
            username: env_or("TASKVAULT_DB_USER", defaults.username),
            password: env_or("TASKVAULT_DB_PASSWORD", defaults.password),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root, selects the configured namespace and
    /// database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    /// Apply any pending schema migrations over this connection.
    pub async fn migrate(&self) -> Result<(), DbError> {
        schema::run_migrations(&self.db).await
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_overrides_defaults() {
        std::env::set_var("TASKVAULT_DB_NAMESPACE", "staging");
        std::env::set_var("TASKVAULT_DB_NAME", "vault");

        let config = DbConfig::from_env();
        assert_eq!(config.namespace, "staging");
        assert_eq!(config.database, "vault");
        // Unset variables keep their defaults.
        assert_eq!(config.url, "127.0.0.1:8000");
        assert_eq!(config.username, "root");

        std::env::remove_var("TASKVAULT_DB_NAMESPACE");
        std::env::remove_var("TASKVAULT_DB_NAME");
    }
}
