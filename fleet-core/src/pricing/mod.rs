//! Tax and tax-inclusive amounts derived from a base amount.
//!
//! A [`Ledger`] tracks one base amount and one tax selection (a vehicle has a
//! purchase ledger and a sale ledger, a model has a single price ledger). The
//! derived fields are always recomputed by [`derive`] from the post-edit
//! inputs, so they can never drift from the amounts they were computed from.

pub mod amount;
pub mod derivation;
pub mod ledger;

pub use amount::{parse_amount, round_half_up};
pub use derivation::{DerivedAmounts, derive, tax_rate_for};
pub use ledger::{Ledger, LedgerEdit};
