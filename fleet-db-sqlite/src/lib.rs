//! SQLite storage for the fleet repository.

mod decimal;
mod factory;
mod repository;

pub use decimal::{decimal_to_text, get_decimal, get_optional_decimal};
pub use factory::{SqliteRepositoryFactory, seeds_dir};
pub use repository::SqliteRepository;
