use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::models::{Brand, LookupItem, LookupKind, TaxRate};

/// Read-only snapshot of the lookup data a form works against.
///
/// The default value is the empty snapshot used while the real one is still
/// being fetched; every projection over it yields empty results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub taxes: Vec<TaxRate>,
    pub catalog: Catalog,
    pub brands: Vec<Brand>,
    pub lookups: BTreeMap<LookupKind, Vec<LookupItem>>,
}

impl ReferenceData {
    pub fn lookup(
        &self,
        kind: LookupKind,
    ) -> &[LookupItem] {
        self.lookups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tax(
        &self,
        id: i32,
    ) -> Option<&TaxRate> {
        self.taxes.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.taxes.is_empty()
            && self.catalog.is_empty()
            && self.brands.is_empty()
            && self.lookups.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_snapshot_is_empty() {
        let data = ReferenceData::default();

        assert!(data.is_empty());
        assert!(data.lookup(LookupKind::Fuel).is_empty());
        assert!(data.tax(1).is_none());
    }

    #[test]
    fn lookup_returns_items_for_present_kind() {
        let mut data = ReferenceData::default();
        data.lookups.insert(
            LookupKind::Fuel,
            vec![LookupItem {
                code: "D".to_string(),
                label: "Diesel".to_string(),
            }],
        );

        assert_eq!(data.lookup(LookupKind::Fuel).len(), 1);
        assert!(data.lookup(LookupKind::Color).is_empty());
        assert!(!data.is_empty());
    }

    #[test]
    fn tax_finds_rate_by_id() {
        let data = ReferenceData {
            taxes: vec![TaxRate {
                id: 3,
                label: "TVA 19%".to_string(),
                percent_value: dec!(19),
            }],
            ..Default::default()
        };

        assert_eq!(data.tax(3).map(|t| t.percent_value), Some(dec!(19)));
        assert!(data.tax(4).is_none());
    }
}
