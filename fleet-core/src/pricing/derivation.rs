//! Tax amount and tax-inclusive total from a base amount and a tax id.
//!
//! # Rules
//!
//! | Input                          | Effect                                   |
//! |--------------------------------|------------------------------------------|
//! | base amount absent             | treated as 0                             |
//! | tax id absent                  | rate 0                                   |
//! | tax id not in the tax table    | rate 0                                   |
//! | otherwise                      | `tax = base * rate / 100`, `total = base + tax` |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fleet_core::TaxRate;
//! use fleet_core::pricing::derive;
//!
//! let taxes = vec![TaxRate { id: 1, label: "TVA 20%".to_string(), percent_value: dec!(20) }];
//!
//! let derived = derive(Some(dec!(100)), Some(1), &taxes);
//! assert_eq!(derived.tax_amount, dec!(20));
//! assert_eq!(derived.total_amount, dec!(120));
//!
//! let unknown = derive(Some(dec!(100)), Some(99), &taxes);
//! assert_eq!(unknown.tax_amount, dec!(0));
//! assert_eq!(unknown.total_amount, dec!(100));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TaxRate;

/// The two values derived from a ledger's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAmounts {
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Percentage registered for `tax_id`, or zero when the id is absent from
/// the table.
pub fn tax_rate_for(
    taxes: &[TaxRate],
    tax_id: i32,
) -> Decimal {
    taxes
        .iter()
        .find(|t| t.id == tax_id)
        .map(|t| t.percent_value)
        .unwrap_or(Decimal::ZERO)
}

/// Derives the tax amount and the tax-inclusive total.
///
/// Never fails: missing inputs and unknown tax ids degrade to zero, and an
/// amount too large for [`Decimal`] arithmetic yields a zero tax amount.
pub fn derive(
    base_amount: Option<Decimal>,
    tax_id: Option<i32>,
    taxes: &[TaxRate],
) -> DerivedAmounts {
    let base = base_amount.unwrap_or(Decimal::ZERO);
    let rate = tax_id
        .map(|id| tax_rate_for(taxes, id))
        .unwrap_or(Decimal::ZERO);

    let tax_amount = tax_amount(base, rate);
    match base.checked_add(tax_amount) {
        Some(total_amount) => DerivedAmounts {
            tax_amount,
            total_amount,
        },
        None => {
            tracing::warn!(%base, %tax_amount, "total overflowed, using zero tax");
            DerivedAmounts {
                tax_amount: Decimal::ZERO,
                total_amount: base,
            }
        }
    }
}

fn tax_amount(
    base: Decimal,
    rate: Decimal,
) -> Decimal {
    if base.is_zero() || rate.is_zero() {
        return Decimal::ZERO;
    }
    match base
        .checked_mul(rate)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
    {
        Some(amount) => amount.normalize(),
        None => {
            tracing::warn!(%base, %rate, "tax amount overflowed, using zero");
            Decimal::ZERO
        }
    }
}
