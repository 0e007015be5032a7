use std::collections::BTreeMap;

use async_trait::async_trait;

use super::repository::{FleetRepository, RepositoryError};

/// Which store to open.
///
/// The default is a throwaway in-memory SQLite database, which is what the
/// tests and a bare `fleet` invocation without configuration get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Name a factory registered itself under.
    pub backend: String,
    /// Backend specific. A file path or `:memory:` for SQLite.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens a [`FleetRepository`] for one kind of store.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Returns a repository with its schema in place.
    async fn create(&self, config: &DbConfig)
    -> Result<Box<dyn FleetRepository>, RepositoryError>;
}

/// The backends a binary was built with.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later factory with the same name wins.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    pub fn available_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Opens the store named by `config.backend`.
    ///
    /// Fails with [`RepositoryError::Configuration`] for an unregistered
    /// backend; anything else comes from the factory.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn FleetRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "no '{}' backend in this build (have: {})",
                config.backend,
                self.available_backends().join(", ")
            )));
        };
        factory.create(config).await
    }
}
