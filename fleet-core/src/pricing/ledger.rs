use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TaxRate;
use crate::pricing::derive;

/// Base amount, tax selection and the two amounts derived from them.
///
/// Invariant: `tax_amount` and `total_amount` are what [`derive`] returns for
/// `base_amount` and `tax_id`. Only [`Ledger::apply`] and
/// [`Ledger::rederive`] produce ledgers with edited inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub base_amount: Option<Decimal>,
    pub tax_id: Option<i32>,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// A single user edit to one of a ledger's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEdit {
    SetBaseAmount(Option<Decimal>),
    SetTax(Option<i32>),
}

impl Ledger {
    /// Builds a ledger from its inputs with the derived fields filled in.
    pub fn new(
        base_amount: Option<Decimal>,
        tax_id: Option<i32>,
        taxes: &[TaxRate],
    ) -> Self {
        let derived = derive(base_amount, tax_id, taxes);
        Self {
            base_amount,
            tax_id,
            tax_amount: derived.tax_amount,
            total_amount: derived.total_amount,
        }
    }

    /// Returns the ledger that results from `edit`.
    ///
    /// The edited input and the other, unchanged input are merged first and
    /// the derived fields computed from that merged state, so the result is
    /// one consistent value rather than a sequence of partial updates.
    pub fn apply(
        &self,
        edit: LedgerEdit,
        taxes: &[TaxRate],
    ) -> Self {
        let (base_amount, tax_id) = match edit {
            LedgerEdit::SetBaseAmount(amount) => (amount, self.tax_id),
            LedgerEdit::SetTax(id) => (self.base_amount, id),
        };
        Self::new(base_amount, tax_id, taxes)
    }

    /// Recomputes the derived fields from the current inputs.
    pub fn rederive(
        &self,
        taxes: &[TaxRate],
    ) -> Self {
        Self::new(self.base_amount, self.tax_id, taxes)
    }

    /// True when the derived fields match the current inputs under `taxes`.
    pub fn is_consistent(
        &self,
        taxes: &[TaxRate],
    ) -> bool {
        *self == self.rederive(taxes)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn taxes() -> Vec<TaxRate> {
        vec![
            TaxRate {
                id: 1,
                label: "TVA 20%".to_string(),
                percent_value: dec!(20),
            },
            TaxRate {
                id: 2,
                label: "TVA 10%".to_string(),
                percent_value: dec!(10),
            },
        ]
    }

    #[test]
    fn default_ledger_is_empty_and_consistent() {
        let ledger = Ledger::default();

        assert_eq!(ledger.base_amount, None);
        assert_eq!(ledger.tax_id, None);
        assert!(ledger.is_consistent(&taxes()));
    }

    #[test]
    fn set_base_amount_uses_existing_tax() {
        let ledger = Ledger::new(None, Some(1), &taxes());

        let next = ledger.apply(LedgerEdit::SetBaseAmount(Some(dec!(50))), &taxes());

        assert_eq!(next.base_amount, Some(dec!(50)));
        assert_eq!(next.tax_id, Some(1));
        assert_eq!(next.tax_amount, dec!(10));
        assert_eq!(next.total_amount, dec!(60));
    }

    #[test]
    fn set_tax_uses_existing_base_amount() {
        let ledger = Ledger::new(Some(dec!(200)), None, &taxes());

        let next = ledger.apply(LedgerEdit::SetTax(Some(2)), &taxes());

        assert_eq!(next.base_amount, Some(dec!(200)));
        assert_eq!(next.tax_amount, dec!(20));
        assert_eq!(next.total_amount, dec!(220));
    }

    #[test]
    fn clearing_tax_removes_tax_amount() {
        let ledger = Ledger::new(Some(dec!(200)), Some(1), &taxes());

        let next = ledger.apply(LedgerEdit::SetTax(None), &taxes());

        assert_eq!(next.tax_amount, dec!(0));
        assert_eq!(next.total_amount, dec!(200));
    }

    #[test]
    fn clearing_base_amount_zeroes_totals() {
        let ledger = Ledger::new(Some(dec!(200)), Some(1), &taxes());

        let next = ledger.apply(LedgerEdit::SetBaseAmount(None), &taxes());

        assert_eq!(next.tax_id, Some(1));
        assert_eq!(next.tax_amount, dec!(0));
        assert_eq!(next.total_amount, dec!(0));
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let ledger = Ledger::new(Some(dec!(10)), Some(1), &taxes());

        let _ = ledger.apply(LedgerEdit::SetBaseAmount(Some(dec!(99))), &taxes());

        assert_eq!(ledger.base_amount, Some(dec!(10)));
        assert_eq!(ledger.total_amount, dec!(12));
    }

    #[test]
    fn sequential_edits_observe_previous_results() {
        let taxes = taxes();
        let ledger = Ledger::default()
            .apply(LedgerEdit::SetBaseAmount(Some(dec!(100))), &taxes)
            .apply(LedgerEdit::SetTax(Some(1)), &taxes)
            .apply(LedgerEdit::SetBaseAmount(Some(dec!(200))), &taxes);

        assert_eq!(
            ledger,
            Ledger {
                base_amount: Some(dec!(200)),
                tax_id: Some(1),
                tax_amount: dec!(40),
                total_amount: dec!(240),
            }
        );
    }

    #[test]
    fn stale_derived_fields_are_detected_and_rederived() {
        let stale = Ledger {
            base_amount: Some(dec!(100)),
            tax_id: Some(1),
            tax_amount: dec!(0),
            total_amount: dec!(100),
        };

        assert!(!stale.is_consistent(&taxes()));
        assert_eq!(stale.rederive(&taxes()).total_amount, dec!(120));
    }
}
