use serde::{Deserialize, Serialize};

/// One valid brand/model/version combination.
///
/// `version_id` is the id of the vehicle model record the entry was
/// projected from; it is the value a vehicle stores as its `model_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub brand: String,
    pub model: String,
    pub version: String,
    pub version_id: i64,
}
