//! CSV import of tax rates and the vehicle catalog.

mod loader;

pub use loader::{
    CatalogLoadSummary, CatalogLoader, CatalogRecord, LoaderError, TaxRateLoader, TaxRateRecord,
};
