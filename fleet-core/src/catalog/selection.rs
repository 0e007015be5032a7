use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// The brand/model/version currently chosen in a form.
///
/// Empty strings mean "nothing chosen".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub brand: String,
    pub model: String,
    pub version_id: Option<i64>,
}

/// A single change to one level of the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEdit {
    SetBrand(String),
    SetModel(String),
    SetVersion(Option<i64>),
}

/// How a selection relates to the catalog it is shown against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    /// Nothing chosen.
    Empty,
    /// Brand, or brand and model, chosen but no version yet.
    Partial,
    /// A version is chosen and the catalog knows it under this brand/model.
    Complete,
    /// A version is chosen that the catalog does not (or no longer) resolve.
    Unresolved,
}

impl Selection {
    /// Opening selection for a record that references `version_id`.
    ///
    /// Brand and model come from the catalog. A version the catalog does not
    /// know is kept as-is with blank brand and model, so the stored value
    /// survives until the user edits it.
    pub fn seeded(
        catalog: &Catalog,
        version_id: Option<i64>,
    ) -> Self {
        let Some(id) = version_id else {
            return Self::default();
        };
        match catalog.entry(id) {
            Some(entry) => Self {
                brand: entry.brand.clone(),
                model: entry.model.clone(),
                version_id: Some(id),
            },
            None => {
                tracing::debug!(version_id = id, "seeded version not found in catalog");
                Self {
                    brand: String::new(),
                    model: String::new(),
                    version_id: Some(id),
                }
            }
        }
    }

    /// Returns the selection that results from `edit`.
    ///
    /// Choosing a brand clears the model and version; choosing a model clears
    /// the version. Both happen whether or not the new value is in the
    /// catalog, and even when it equals the current value. Choosing a version
    /// leaves brand and model alone.
    pub fn apply(
        &self,
        edit: SelectionEdit,
    ) -> Self {
        match edit {
            SelectionEdit::SetBrand(brand) => Self {
                brand,
                model: String::new(),
                version_id: None,
            },
            SelectionEdit::SetModel(model) => Self {
                brand: self.brand.clone(),
                model,
                version_id: None,
            },
            SelectionEdit::SetVersion(version_id) => Self {
                brand: self.brand.clone(),
                model: self.model.clone(),
                version_id,
            },
        }
    }

    pub fn status(
        &self,
        catalog: &Catalog,
    ) -> SelectionStatus {
        match self.version_id {
            Some(id) if catalog.contains_version(&self.brand, &self.model, id) => {
                SelectionStatus::Complete
            }
            Some(_) => SelectionStatus::Unresolved,
            None if self.brand.is_empty() && self.model.is_empty() => SelectionStatus::Empty,
            None => SelectionStatus::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::CatalogEntry;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry {
                brand: "Toyota".to_string(),
                model: "Corolla".to_string(),
                version: "LE".to_string(),
                version_id: 1,
            },
            CatalogEntry {
                brand: "Toyota".to_string(),
                model: "Corolla".to_string(),
                version: "SE".to_string(),
                version_id: 2,
            },
            CatalogEntry {
                brand: "Honda".to_string(),
                model: "Civic".to_string(),
                version: "EX".to_string(),
                version_id: 3,
            },
        ])
    }

    fn complete() -> Selection {
        Selection {
            brand: "Toyota".to_string(),
            model: "Corolla".to_string(),
            version_id: Some(2),
        }
    }

    // =========================================================================
    // reset rules
    // =========================================================================

    #[test]
    fn set_brand_clears_model_and_version() {
        let next = complete().apply(SelectionEdit::SetBrand("Honda".to_string()));

        assert_eq!(
            next,
            Selection {
                brand: "Honda".to_string(),
                model: String::new(),
                version_id: None,
            }
        );
    }

    #[test]
    fn set_brand_clears_even_for_unknown_or_same_brand() {
        for brand in ["Lada", "Toyota", ""] {
            let next = complete().apply(SelectionEdit::SetBrand(brand.to_string()));
            assert_eq!(next.brand, brand);
            assert_eq!(next.model, "");
            assert_eq!(next.version_id, None);
        }
    }

    #[test]
    fn set_model_clears_version_and_keeps_brand() {
        for model in ["Yaris", "Corolla", ""] {
            let next = complete().apply(SelectionEdit::SetModel(model.to_string()));
            assert_eq!(next.brand, "Toyota");
            assert_eq!(next.model, model);
            assert_eq!(next.version_id, None);
        }
    }

    #[test]
    fn set_version_keeps_brand_and_model() {
        let next = complete().apply(SelectionEdit::SetVersion(Some(1)));

        assert_eq!(next.brand, "Toyota");
        assert_eq!(next.model, "Corolla");
        assert_eq!(next.version_id, Some(1));
    }

    #[test]
    fn set_version_none_only_clears_version() {
        let next = complete().apply(SelectionEdit::SetVersion(None));

        assert_eq!(next.brand, "Toyota");
        assert_eq!(next.model, "Corolla");
        assert_eq!(next.version_id, None);
    }

    // =========================================================================
    // seeding
    // =========================================================================

    #[test]
    fn seeded_resolves_brand_and_model_from_catalog() {
        assert_eq!(Selection::seeded(&catalog(), Some(2)), complete());
    }

    #[test]
    fn seeded_without_version_is_empty() {
        assert_eq!(Selection::seeded(&catalog(), None), Selection::default());
    }

    #[test]
    fn seeded_unknown_version_is_kept() {
        let selection = Selection::seeded(&catalog(), Some(77));

        assert_eq!(selection.version_id, Some(77));
        assert_eq!(selection.brand, "");
        assert_eq!(selection.status(&catalog()), SelectionStatus::Unresolved);
    }

    #[test]
    fn seeded_against_unloaded_catalog_keeps_version() {
        let selection = Selection::seeded(&Catalog::default(), Some(2));

        assert_eq!(selection.version_id, Some(2));
    }

    // =========================================================================
    // status
    // =========================================================================

    #[test]
    fn status_reports_each_stage() {
        let catalog = catalog();

        assert_eq!(Selection::default().status(&catalog), SelectionStatus::Empty);
        assert_eq!(
            Selection::default()
                .apply(SelectionEdit::SetBrand("Toyota".to_string()))
                .status(&catalog),
            SelectionStatus::Partial
        );
        assert_eq!(complete().status(&catalog), SelectionStatus::Complete);
    }

    #[test]
    fn stale_version_after_reload_is_not_cleared() {
        let selection = complete();
        let reloaded = Catalog::new(vec![catalog().entries()[0].clone()]);

        assert_eq!(selection.status(&reloaded), SelectionStatus::Unresolved);
        assert_eq!(selection.version_id, Some(2));
    }
}
