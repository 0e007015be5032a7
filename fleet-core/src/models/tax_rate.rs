use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: i32,
    pub label: String,
    /// Percentage, e.g. `20` for 20%.
    pub percent_value: Decimal,
}
