use std::collections::HashSet;
use std::io::Read;

use fleet_core::pricing::parse_amount;
use fleet_core::{FleetRepository, Ledger, ModelDetails, RepositoryError, TaxRate};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while importing CSV data.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    /// `row` is the 1-based line number in the file, header included.
    #[error("Invalid record on line {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for LoaderError {
    fn from(err: csv::Error) -> Self {
        LoaderError::CsvParse(err.to_string())
    }
}

/// One line of a tax rate file: `id,label,percent_value`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxRateRecord {
    pub id: i32,
    pub label: String,
    pub percent_value: Decimal,
}

/// Loads tax rates, replacing the label and percentage of existing ids.
pub struct TaxRateLoader;

impl TaxRateLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxRateRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: TaxRateRecord = result?;
            let row = index + 2;
            if record.label.trim().is_empty() {
                return Err(LoaderError::InvalidRecord {
                    row,
                    reason: "label must not be empty".to_string(),
                });
            }
            if record.percent_value.is_sign_negative() && !record.percent_value.is_zero() {
                return Err(LoaderError::InvalidRecord {
                    row,
                    reason: format!("negative percentage {}", record.percent_value),
                });
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Upserts every record. Returns how many were written.
    pub async fn load<R: FleetRepository + ?Sized>(
        repo: &R,
        records: &[TaxRateRecord],
    ) -> Result<usize, LoaderError> {
        for record in records {
            repo.upsert_tax_rate(&TaxRate {
                id: record.id,
                label: record.label.trim().to_string(),
                percent_value: record.percent_value,
            })
            .await?;
        }
        info!(count = records.len(), "tax rates loaded");
        Ok(records.len())
    }
}

#[derive(Debug, Deserialize)]
struct RawCatalogRow {
    brand: String,
    model: String,
    version: String,
    #[serde(default)]
    fuel_type: Option<String>,
    #[serde(default)]
    base_price: Option<String>,
    #[serde(default)]
    tax_id: Option<String>,
}

/// One line of a catalog file:
/// `brand,model,version,fuel_type,base_price,tax_id`.
///
/// `base_price` accepts thousands separators; blank optional columns are
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    pub brand: String,
    pub model: String,
    pub version: String,
    pub fuel_type: Option<String>,
    pub base_price: Option<Decimal>,
    pub tax_id: Option<i32>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CatalogRecord {
    fn from_raw(
        raw: RawCatalogRow,
        row: usize,
    ) -> Result<Self, LoaderError> {
        let invalid = |reason: String| LoaderError::InvalidRecord { row, reason };

        let brand = raw.brand.trim().to_string();
        let model = raw.model.trim().to_string();
        let version = raw.version.trim().to_string();
        for (name, value) in [("brand", &brand), ("model", &model), ("version", &version)] {
            if value.is_empty() {
                return Err(invalid(format!("{name} must not be empty")));
            }
        }

        let base_price = match blank_to_none(raw.base_price) {
            None => None,
            Some(text) => {
                let amount = parse_amount(&text)
                    .ok_or_else(|| invalid(format!("invalid base_price '{text}'")))?;
                if amount.is_sign_negative() && !amount.is_zero() {
                    return Err(invalid(format!("negative base_price {amount}")));
                }
                Some(amount)
            }
        };

        let tax_id = match blank_to_none(raw.tax_id) {
            None => None,
            Some(text) => Some(
                text.parse::<i32>()
                    .map_err(|_| invalid(format!("invalid tax_id '{text}'")))?,
            ),
        };

        Ok(Self {
            brand,
            model,
            version,
            fuel_type: blank_to_none(raw.fuel_type),
            base_price,
            tax_id,
        })
    }
}

/// Counts reported by [`CatalogLoader::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogLoadSummary {
    pub brands_created: usize,
    pub models_created: usize,
    pub models_updated: usize,
    pub models_unchanged: usize,
}

/// Loads brands and vehicle models from a catalog file.
///
/// Missing brands and models are created. A model that already exists (same
/// brand, model and version) gets its price ledger, and fuel type when one is
/// given, replaced. Loading the same file twice changes nothing the second
/// time.
pub struct CatalogLoader;

impl CatalogLoader {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CatalogRecord>, LoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let raw: RawCatalogRow = result?;
            records.push(CatalogRecord::from_raw(raw, index + 2)?);
        }

        Ok(records)
    }

    pub async fn load<R: FleetRepository + ?Sized>(
        repo: &R,
        records: &[CatalogRecord],
    ) -> Result<CatalogLoadSummary, LoaderError> {
        let taxes = repo.list_tax_rates().await?;
        let mut brands: HashSet<String> = repo
            .list_brands()
            .await?
            .into_iter()
            .map(|b| b.name)
            .collect();
        let mut summary = CatalogLoadSummary::default();

        for record in records {
            if brands.insert(record.brand.clone()) {
                repo.create_brand(&record.brand).await?;
                summary.brands_created += 1;
            }

            let price = Ledger::new(record.base_price, record.tax_id, &taxes);
            let existing = repo
                .find_model(&record.brand, &record.model, &record.version)
                .await?;

            match existing {
                Some(existing) => {
                    let mut details = existing.details.clone();
                    details.price = price;
                    if record.fuel_type.is_some() {
                        details.fuel_type = record.fuel_type.clone();
                    }
                    if details == existing.details {
                        summary.models_unchanged += 1;
                    } else {
                        repo.update_model(existing.model_id, &details).await?;
                        debug!(model_id = existing.model_id, "catalog model updated");
                        summary.models_updated += 1;
                    }
                }
                None => {
                    repo.create_model(&ModelDetails {
                        brand: record.brand.clone(),
                        model: record.model.clone(),
                        version: record.version.clone(),
                        fuel_type: record.fuel_type.clone(),
                        price,
                        ..Default::default()
                    })
                    .await?;
                    summary.models_created += 1;
                }
            }
        }

        info!(?summary, "catalog loaded");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_parse_tax_rates() {
        let csv = "id,label,percent_value\n1,TVA 20%,20\n3,TVA 5.5%,5.5";

        let records = TaxRateLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![
                TaxRateRecord {
                    id: 1,
                    label: "TVA 20%".to_string(),
                    percent_value: dec!(20),
                },
                TaxRateRecord {
                    id: 3,
                    label: "TVA 5.5%".to_string(),
                    percent_value: dec!(5.5),
                },
            ]
        );
    }

    #[test]
    fn test_parse_tax_rates_rejects_negative_percentage() {
        let csv = "id,label,percent_value\n1,TVA,20\n2,Bad,-1";

        let result = TaxRateLoader::parse(csv.as_bytes());

        match result {
            Err(LoaderError::InvalidRecord { row, reason }) => {
                assert_eq!(row, 3);
                assert!(reason.contains("negative"), "got: {reason}");
            }
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tax_rates_missing_column() {
        let csv = "id,label\n1,TVA";

        let err = TaxRateLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");

        let LoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "got: {msg}");
    }

    #[test]
    fn test_parse_catalog_with_separators_and_blanks() {
        let csv = "brand,model,version,fuel_type,base_price,tax_id\n\
                   Toyota,Corolla,LE,E,\"21,500.00\",1\n\
                   Renault,Kangoo,Van,,,";

        let records = CatalogLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![
                CatalogRecord {
                    brand: "Toyota".to_string(),
                    model: "Corolla".to_string(),
                    version: "LE".to_string(),
                    fuel_type: Some("E".to_string()),
                    base_price: Some(dec!(21500.00)),
                    tax_id: Some(1),
                },
                CatalogRecord {
                    brand: "Renault".to_string(),
                    model: "Kangoo".to_string(),
                    version: "Van".to_string(),
                    fuel_type: None,
                    base_price: None,
                    tax_id: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_catalog_rejects_blank_version() {
        let csv = "brand,model,version,fuel_type,base_price,tax_id\nToyota,Corolla, ,E,100,1";

        let result = CatalogLoader::parse(csv.as_bytes());

        assert!(matches!(
            result,
            Err(LoaderError::InvalidRecord { row: 2, ref reason }) if reason == "version must not be empty"
        ));
    }

    #[test]
    fn test_parse_catalog_rejects_bad_price() {
        let csv = "brand,model,version,fuel_type,base_price,tax_id\nToyota,Corolla,LE,E,abc,1";

        let result = CatalogLoader::parse(csv.as_bytes());

        assert!(matches!(
            result,
            Err(LoaderError::InvalidRecord { row: 2, ref reason }) if reason.contains("base_price")
        ));
    }

    #[test]
    fn test_parse_catalog_rejects_bad_tax_id() {
        let csv = "brand,model,version,fuel_type,base_price,tax_id\nToyota,Corolla,LE,E,100,x";

        let result = CatalogLoader::parse(csv.as_bytes());

        assert!(matches!(
            result,
            Err(LoaderError::InvalidRecord { reason, .. }) if reason == "invalid tax_id 'x'"
        ));
    }

    #[test]
    fn test_parse_empty_catalog() {
        let csv = "brand,model,version,fuel_type,base_price,tax_id\n";

        let records = CatalogLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }
}
