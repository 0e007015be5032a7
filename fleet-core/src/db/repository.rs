use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::catalog::Catalog;
use crate::models::{
    Brand, CatalogEntry, LookupItem, LookupKind, ModelDetails, ReferenceData, TaxRate, Vehicle,
    VehicleDetails, VehicleModel,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    /// The change would break a relationship or a uniqueness rule; the
    /// message is meant for the user.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait FleetRepository: Send + Sync {
    // Tax rates
    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, RepositoryError>;
    async fn upsert_tax_rate(&self, rate: &TaxRate) -> Result<(), RepositoryError>;

    // Catalog: one entry per vehicle model
    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, RepositoryError>;

    // Lookups
    async fn list_lookups(&self, kind: LookupKind) -> Result<Vec<LookupItem>, RepositoryError>;

    // Brands
    async fn list_brands(&self) -> Result<Vec<Brand>, RepositoryError>;
    async fn create_brand(&self, name: &str) -> Result<Brand, RepositoryError>;

    /// Renames a brand; models of that brand follow the new name.
    async fn rename_brand(&self, name: &str, new_name: &str) -> Result<Brand, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] while any model uses the brand.
    async fn delete_brand(&self, name: &str) -> Result<(), RepositoryError>;

    // Vehicle models
    async fn list_models(&self) -> Result<Vec<VehicleModel>, RepositoryError>;
    async fn get_model(&self, model_id: i64) -> Result<VehicleModel, RepositoryError>;
    async fn find_model(
        &self,
        brand: &str,
        model: &str,
        version: &str,
    ) -> Result<Option<VehicleModel>, RepositoryError>;
    async fn create_model(&self, details: &ModelDetails) -> Result<VehicleModel, RepositoryError>;
    async fn update_model(
        &self,
        model_id: i64,
        details: &ModelDetails,
    ) -> Result<VehicleModel, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] while any vehicle references
    /// the model.
    async fn delete_model(&self, model_id: i64) -> Result<(), RepositoryError>;

    // Vehicles
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError>;
    async fn get_vehicle(&self, unit_nr: i64) -> Result<Vehicle, RepositoryError>;
    async fn create_vehicle(&self, details: &VehicleDetails) -> Result<Vehicle, RepositoryError>;
    async fn update_vehicle(
        &self,
        unit_nr: i64,
        details: &VehicleDetails,
    ) -> Result<Vehicle, RepositoryError>;
    async fn delete_vehicle(&self, unit_nr: i64) -> Result<(), RepositoryError>;

    /// Fetches everything a form needs to populate its dropdowns.
    async fn load_reference_data(&self) -> Result<ReferenceData, RepositoryError> {
        let taxes = self.list_tax_rates().await?;
        let catalog = Catalog::new(self.list_catalog().await?);
        let brands = self.list_brands().await?;

        let mut lookups = BTreeMap::new();
        for kind in LookupKind::ALL {
            lookups.insert(kind, self.list_lookups(kind).await?);
        }

        debug!(
            taxes = taxes.len(),
            catalog = catalog.len(),
            brands = brands.len(),
            "reference data loaded"
        );
        Ok(ReferenceData {
            taxes,
            catalog,
            brands,
            lookups,
        })
    }
}
