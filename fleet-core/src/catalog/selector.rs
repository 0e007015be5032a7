use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::CatalogEntry;

/// One choice offered by the version dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOption {
    pub version_id: i64,
    pub version: String,
}

/// Ordered list of valid brand/model/version combinations.
///
/// An empty catalog (nothing loaded yet) is valid; every projection over it
/// is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct brands, sorted alphabetically.
    pub fn brands(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.brand.clone()).collect()
    }

    /// Distinct models of `brand`, sorted. Empty for a blank or unknown brand.
    pub fn models_of(
        &self,
        brand: &str,
    ) -> BTreeSet<String> {
        if brand.is_empty() {
            return BTreeSet::new();
        }
        self.entries
            .iter()
            .filter(|e| e.brand == brand)
            .map(|e| e.model.clone())
            .collect()
    }

    /// Versions of `brand`/`model` in catalog order.
    ///
    /// Each `version_id` appears once; when the catalog repeats an id the
    /// first row wins.
    pub fn versions_of(
        &self,
        brand: &str,
        model: &str,
    ) -> Vec<VersionOption> {
        if brand.is_empty() || model.is_empty() {
            return Vec::new();
        }
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| e.brand == brand && e.model == model)
            .filter(|e| seen.insert(e.version_id))
            .map(|e| VersionOption {
                version_id: e.version_id,
                version: e.version.clone(),
            })
            .collect()
    }

    /// First entry registered for `version_id`.
    pub fn entry(
        &self,
        version_id: i64,
    ) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.version_id == version_id)
    }

    pub fn contains_model(
        &self,
        brand: &str,
        model: &str,
    ) -> bool {
        self.entries
            .iter()
            .any(|e| e.brand == brand && e.model == model)
    }

    pub fn contains_version(
        &self,
        brand: &str,
        model: &str,
        version_id: i64,
    ) -> bool {
        self.entries
            .iter()
            .any(|e| e.brand == brand && e.model == model && e.version_id == version_id)
    }
}

impl From<Vec<CatalogEntry>> for Catalog {
    fn from(entries: Vec<CatalogEntry>) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
