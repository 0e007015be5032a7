pub mod catalog;
pub mod db;
pub mod form;
pub mod models;
pub mod pricing;

pub use catalog::{Catalog, Selection, SelectionEdit, SelectionStatus, VersionOption};
pub use db::repository::{FleetRepository, RepositoryError};
pub use models::*;
pub use pricing::{DerivedAmounts, Ledger, LedgerEdit, derive};
