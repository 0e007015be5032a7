mod brand;
mod catalog_entry;
mod lookup;
mod reference_data;
mod tax_rate;
mod vehicle;
mod vehicle_model;

pub use brand::Brand;
pub use catalog_entry::CatalogEntry;
pub use lookup::{LookupItem, LookupKind};
pub use reference_data::ReferenceData;
pub use tax_rate::TaxRate;
pub use vehicle::{Vehicle, VehicleDetails};
pub use vehicle_model::{ModelDetails, VehicleModel};
