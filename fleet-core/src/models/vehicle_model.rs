use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CatalogEntry;
use crate::pricing::Ledger;

/// Editable body of a vehicle model (a brand/model/version with its
/// technical data and list price).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    pub brand: String,
    pub model: String,
    pub version: String,
    pub group_code: Option<String>,
    pub category_code: Option<String>,
    pub segment_code: Option<String>,
    pub fuel_type: Option<String>,
    pub fuel_capacity: Option<Decimal>,
    pub battery_capacity_kwh: Option<Decimal>,
    pub seats: Option<i32>,
    pub doors: Option<i32>,
    pub power_kw: Option<Decimal>,
    pub co2: Option<i32>,
    pub tyre_code: Option<String>,
    pub nr_tyres: Option<i32>,
    pub note: String,

    /// Base price, tax and tax-inclusive price.
    pub price: Ledger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleModel {
    pub model_id: i64,
    #[serde(flatten)]
    pub details: ModelDetails,
}

impl VehicleModel {
    pub fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry {
            brand: self.details.brand.clone(),
            model: self.details.model.clone(),
            version: self.details.version.clone(),
            version_id: self.model_id,
        }
    }

    pub fn display_name(&self) -> String {
        format!(
            "{} {} {}",
            self.details.brand, self.details.model, self.details.version
        )
    }
}
