//! Brand → model → version cascading selection over the vehicle catalog.

mod selection;
mod selector;

pub use selection::{Selection, SelectionEdit, SelectionStatus};
pub use selector::{Catalog, VersionOption};
