use std::path::PathBuf;

use async_trait::async_trait;
use fleet_core::db::repository::{FleetRepository, RepositoryError};
use fleet_core::db::{DbConfig, RepositoryFactory};
use tracing::info;

use crate::repository::SqliteRepository;

/// Resolves the seeds directory at runtime.
///
/// Resolution order:
/// 1. **`FLEET_DB_SQLITE_SEEDS_DIR`** when set.
/// 2. **`./seeds`** when it exists in the current working directory.
/// 3. **Crate manifest dir**: `$CARGO_MANIFEST_DIR/seeds`.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FLEET_DB_SQLITE_SEEDS_DIR") {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// [`RepositoryFactory`] for SQLite.
///
/// ```rust,no_run
/// use fleet_core::db::RepositoryRegistry;
/// use fleet_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Opens `config.connection_string` (a file path, `sqlite:` url or
    /// `:memory:`), runs migrations and applies the seed files.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn FleetRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        info!(database = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::db::{DbConfig, RepositoryFactory};

    use super::SqliteRepositoryFactory;

    #[test]
    fn backend_name_is_sqlite() {
        assert_eq!(SqliteRepositoryFactory.backend_name(), "sqlite");
    }

    #[tokio::test]
    async fn creates_seeded_in_memory_repository() {
        let config = DbConfig::default();

        let repo = SqliteRepositoryFactory
            .create(&config)
            .await
            .expect("failed to create in-memory repository");

        let taxes = repo.list_tax_rates().await.unwrap();
        assert!(!taxes.is_empty(), "seed tax rates should be present");
    }
}
