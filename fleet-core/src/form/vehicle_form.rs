use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::catalog::{Selection, SelectionEdit, VersionOption};
use crate::form::{EditSession, FormError, FormMode, ValidationErrors};
use crate::pricing::LedgerEdit;
use crate::{ReferenceData, Vehicle, VehicleDetails};

/// Everything the vehicle editor changes: the record body plus the
/// brand/model/version choice behind its `model_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleDraft {
    pub details: VehicleDetails,
    pub selection: Selection,
}

/// One edit to a vehicle form.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleEdit {
    Purchase(LedgerEdit),
    Sale(LedgerEdit),
    Selection(SelectionEdit),
    PlateNr(String),
    ChassisNr(String),
    ColorCode(Option<String>),
    FuelType(Option<String>),
    StatusCode(Option<String>),
    GroupCode(Option<String>),
    RentalStation(Option<String>),
    CurrentKm(i64),
    PurchaseDate(Option<NaiveDate>),
    SalesDate(Option<NaiveDate>),
    SalesClient(Option<String>),
    Note(String),
    Blocked(bool),
}

impl VehicleDraft {
    /// Opening draft for a stored vehicle.
    pub fn from_vehicle(
        vehicle: &Vehicle,
        reference: &ReferenceData,
    ) -> Self {
        Self {
            details: vehicle.details.clone(),
            selection: Selection::seeded(&reference.catalog, vehicle.details.model_id),
        }
    }

    /// Returns the draft that results from `edit`.
    ///
    /// Ledger edits rederive that ledger against `reference.taxes`; selection
    /// edits keep `details.model_id` equal to the selected version. `today`
    /// stamps the blocked date when a vehicle gets blocked.
    pub fn apply(
        &self,
        edit: VehicleEdit,
        reference: &ReferenceData,
        today: NaiveDate,
    ) -> Self {
        let mut next = self.clone();
        let details = &mut next.details;
        match edit {
            VehicleEdit::Purchase(edit) => {
                details.purchase = details.purchase.apply(edit, &reference.taxes);
            }
            VehicleEdit::Sale(edit) => {
                details.sale = details.sale.apply(edit, &reference.taxes);
            }
            VehicleEdit::Selection(edit) => {
                next.selection = next.selection.apply(edit);
                details.model_id = next.selection.version_id;
            }
            VehicleEdit::PlateNr(value) => details.plate_nr = value,
            VehicleEdit::ChassisNr(value) => details.chassis_nr = value,
            VehicleEdit::ColorCode(value) => details.color_code = value,
            VehicleEdit::FuelType(value) => details.fuel_type = value,
            VehicleEdit::StatusCode(value) => details.status_code = value,
            VehicleEdit::GroupCode(value) => details.group_code = value,
            VehicleEdit::RentalStation(value) => details.rental_station = value,
            VehicleEdit::CurrentKm(value) => details.current_km = value,
            VehicleEdit::PurchaseDate(value) => details.purchase_date = value,
            VehicleEdit::SalesDate(value) => details.sales_date = value,
            VehicleEdit::SalesClient(value) => details.sales_client = value,
            VehicleEdit::Note(value) => details.note = value,
            VehicleEdit::Blocked(blocked) => {
                details.is_blocked = blocked;
                if !blocked {
                    details.blocked_date = None;
                } else if details.blocked_date.is_none() {
                    details.blocked_date = Some(today);
                }
            }
        }
        next
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_non_negative(
            "purchase_ht",
            self.details.purchase.base_amount,
            "purchase amount cannot be negative",
        );
        errors.require_non_negative(
            "sales_ht",
            self.details.sale.base_amount,
            "sale amount cannot be negative",
        );
        if self.details.current_km < 0 {
            errors.add("current_km", "mileage cannot be negative");
        }
        errors.into_result()
    }
}

/// Editor for a single vehicle, new or existing.
#[derive(Debug, Clone)]
pub struct VehicleForm {
    unit_nr: Option<i64>,
    session: EditSession<VehicleDraft>,
    reference: Arc<ReferenceData>,
}

impl VehicleForm {
    pub fn open(
        vehicle: &Vehicle,
        reference: Arc<ReferenceData>,
    ) -> Self {
        let draft = VehicleDraft::from_vehicle(vehicle, &reference);
        Self {
            unit_nr: Some(vehicle.unit_nr),
            session: EditSession::existing(draft),
            reference,
        }
    }

    pub fn create(reference: Arc<ReferenceData>) -> Self {
        Self {
            unit_nr: None,
            session: EditSession::new_record(VehicleDraft::default()),
            reference,
        }
    }

    pub fn unit_nr(&self) -> Option<i64> {
        self.unit_nr
    }

    pub fn mode(&self) -> FormMode {
        self.session.mode()
    }

    pub fn draft(&self) -> &VehicleDraft {
        self.session.draft()
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Installs a freshly loaded snapshot.
    ///
    /// The selection and ledgers are left exactly as they are, even when
    /// they no longer resolve against the new data.
    pub fn replace_reference(
        &mut self,
        reference: Arc<ReferenceData>,
    ) {
        self.reference = reference;
    }

    pub fn brands(&self) -> BTreeSet<String> {
        self.reference.catalog.brands()
    }

    pub fn models(&self) -> BTreeSet<String> {
        self.reference
            .catalog
            .models_of(&self.draft().selection.brand)
    }

    pub fn versions(&self) -> Vec<VersionOption> {
        let selection = &self.draft().selection;
        self.reference
            .catalog
            .versions_of(&selection.brand, &selection.model)
    }

    pub fn begin_edit(&mut self) -> Result<(), FormError> {
        self.session.begin_edit()
    }

    pub fn apply(
        &mut self,
        edit: VehicleEdit,
    ) -> Result<(), FormError> {
        self.apply_on(edit, Utc::now().date_naive())
    }

    pub fn apply_on(
        &mut self,
        edit: VehicleEdit,
        today: NaiveDate,
    ) -> Result<(), FormError> {
        debug!(unit_nr = ?self.unit_nr, ?edit, "vehicle edit");
        let next = self.session.draft().apply(edit, &self.reference, today);
        self.session.update(next)
    }

    pub fn cancel(&mut self) -> Result<(), FormError> {
        self.session.cancel()
    }

    /// Validated details ready to be persisted.
    pub fn submit(&self) -> Result<VehicleDetails, FormError> {
        let draft = self.session.submission()?;
        draft.validate().map_err(FormError::Invalid)?;
        Ok(draft.details.clone())
    }

    /// Adopts the record the store returned after a successful save.
    pub fn mark_saved(
        &mut self,
        vehicle: &Vehicle,
    ) -> Result<(), FormError> {
        let draft = VehicleDraft::from_vehicle(vehicle, &self.reference);
        self.session.mark_saved(draft)?;
        self.unit_nr = Some(vehicle.unit_nr);
        Ok(())
    }

    pub fn request_delete(&mut self) -> Result<(), FormError> {
        self.session.request_delete()
    }

    pub fn dismiss_delete(&mut self) -> Result<(), FormError> {
        self.session.dismiss_delete()
    }

    pub fn confirm_delete(&mut self) -> Result<(), FormError> {
        self.session.confirm_delete()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::Catalog;
    use crate::form::FormAction;
    use crate::pricing::Ledger;
    use crate::{CatalogEntry, TaxRate};

    fn reference() -> Arc<ReferenceData> {
        Arc::new(ReferenceData {
            taxes: vec![TaxRate {
                id: 1,
                label: "TVA 20%".to_string(),
                percent_value: dec!(20),
            }],
            catalog: Catalog::new(vec![
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
            ]),
            ..Default::default()
        })
    }

    fn vehicle() -> Vehicle {
        let stamp = Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap();
        Vehicle {
            unit_nr: 7,
            details: VehicleDetails {
                plate_nr: "AB-123-CD".to_string(),
                model_id: Some(2),
                purchase: Ledger {
                    base_amount: Some(dec!(10000)),
                    tax_id: Some(1),
                    tax_amount: dec!(2000),
                    total_amount: dec!(12000),
                },
                ..Default::default()
            },
            created_at: stamp,
            updated_at: stamp,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn open_seeds_selection_from_model_id() {
        let form = VehicleForm::open(&vehicle(), reference());

        assert_eq!(form.mode(), FormMode::Viewing);
        assert_eq!(form.draft().selection.brand, "Toyota");
        assert_eq!(form.draft().selection.model, "Corolla");
        assert_eq!(form.draft().selection.version_id, Some(2));
        assert_eq!(form.versions().len(), 2);
    }

    #[test]
    fn edits_are_rejected_while_viewing() {
        let mut form = VehicleForm::open(&vehicle(), reference());

        let result = form.apply_on(VehicleEdit::Note("x".to_string()), today());

        assert_eq!(
            result,
            Err(FormError::InvalidTransition {
                from: FormMode::Viewing,
                action: FormAction::Update,
            })
        );
    }

    #[test]
    fn purchase_and_sale_ledgers_are_independent() {
        let mut form = VehicleForm::open(&vehicle(), reference());
        form.begin_edit().unwrap();

        form.apply_on(
            VehicleEdit::Sale(LedgerEdit::SetBaseAmount(Some(dec!(8000)))),
            today(),
        )
        .unwrap();
        form.apply_on(VehicleEdit::Sale(LedgerEdit::SetTax(Some(1))), today())
            .unwrap();

        let details = &form.draft().details;
        assert_eq!(details.sale.total_amount, dec!(9600));
        assert_eq!(details.purchase.total_amount, dec!(12000));
    }

    #[test]
    fn sequential_ledger_edits_end_consistent() {
        let mut form = VehicleForm::create(reference());

        for edit in [
            LedgerEdit::SetBaseAmount(Some(dec!(100))),
            LedgerEdit::SetTax(Some(1)),
            LedgerEdit::SetBaseAmount(Some(dec!(200))),
        ] {
            form.apply_on(VehicleEdit::Purchase(edit), today()).unwrap();
        }

        assert_eq!(
            form.draft().details.purchase,
            Ledger {
                base_amount: Some(dec!(200)),
                tax_id: Some(1),
                tax_amount: dec!(40),
                total_amount: dec!(240),
            }
        );
    }

    #[test]
    fn brand_change_clears_model_id() {
        let mut form = VehicleForm::open(&vehicle(), reference());
        form.begin_edit().unwrap();

        form.apply_on(
            VehicleEdit::Selection(SelectionEdit::SetBrand("Honda".to_string())),
            today(),
        )
        .unwrap();

        assert_eq!(form.draft().details.model_id, None);
        assert_eq!(form.draft().selection.model, "");
        assert_eq!(
            form.models(),
            ["Civic".to_string()].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn choosing_a_version_sets_model_id() {
        let mut form = VehicleForm::create(reference());
        for edit in [
            SelectionEdit::SetBrand("Honda".to_string()),
            SelectionEdit::SetModel("Civic".to_string()),
            SelectionEdit::SetVersion(Some(3)),
        ] {
            form.apply_on(VehicleEdit::Selection(edit), today()).unwrap();
        }

        assert_eq!(form.draft().details.model_id, Some(3));
    }

    #[test]
    fn blocking_stamps_date_and_unblocking_clears_it() {
        let mut form = VehicleForm::create(reference());

        form.apply_on(VehicleEdit::Blocked(true), today()).unwrap();
        assert_eq!(form.draft().details.blocked_date, Some(today()));

        let later = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        form.apply_on(VehicleEdit::Blocked(true), later).unwrap();
        assert_eq!(form.draft().details.blocked_date, Some(today()));

        form.apply_on(VehicleEdit::Blocked(false), later).unwrap();
        assert!(!form.draft().details.is_blocked);
        assert_eq!(form.draft().details.blocked_date, None);
    }

    #[test]
    fn cancel_restores_selection_and_ledgers() {
        let mut form = VehicleForm::open(&vehicle(), reference());
        form.begin_edit().unwrap();
        form.apply_on(
            VehicleEdit::Selection(SelectionEdit::SetBrand("Honda".to_string())),
            today(),
        )
        .unwrap();
        form.apply_on(
            VehicleEdit::Purchase(LedgerEdit::SetTax(None)),
            today(),
        )
        .unwrap();

        form.cancel().unwrap();

        assert_eq!(form.draft().selection.version_id, Some(2));
        assert_eq!(form.draft().details.purchase.total_amount, dec!(12000));
    }

    #[test]
    fn submit_rejects_negative_amounts() {
        let mut form = VehicleForm::create(reference());
        form.apply_on(
            VehicleEdit::Purchase(LedgerEdit::SetBaseAmount(Some(dec!(-1)))),
            today(),
        )
        .unwrap();
        form.apply_on(VehicleEdit::CurrentKm(-5), today()).unwrap();

        let Err(FormError::Invalid(errors)) = form.submit() else {
            panic!("expected validation failure");
        };
        assert!(errors.get("purchase_ht").is_some());
        assert!(errors.get("current_km").is_some());
        assert!(errors.get("sales_ht").is_none());
    }

    #[test]
    fn mark_saved_adopts_stored_record() {
        let mut form = VehicleForm::create(reference());
        form.apply_on(VehicleEdit::PlateNr("ZZ-999-ZZ".to_string()), today())
            .unwrap();
        let details = form.submit().unwrap();
        let mut stored = vehicle();
        stored.unit_nr = 11;
        stored.details = details;

        form.mark_saved(&stored).unwrap();

        assert_eq!(form.unit_nr(), Some(11));
        assert_eq!(form.mode(), FormMode::Viewing);
        assert_eq!(form.draft().details.plate_nr, "ZZ-999-ZZ");
    }

    #[test]
    fn reference_reload_keeps_stale_selection() {
        let mut form = VehicleForm::open(&vehicle(), reference());

        form.replace_reference(Arc::new(ReferenceData::default()));

        assert_eq!(form.draft().selection.version_id, Some(2));
        assert_eq!(form.draft().selection.brand, "Toyota");
        assert!(form.versions().is_empty());
    }

    #[test]
    fn form_works_before_reference_data_arrives() {
        let mut form = VehicleForm::create(Arc::new(ReferenceData::default()));

        form.apply_on(
            VehicleEdit::Purchase(LedgerEdit::SetBaseAmount(Some(dec!(100)))),
            today(),
        )
        .unwrap();
        form.apply_on(VehicleEdit::Purchase(LedgerEdit::SetTax(Some(1))), today())
            .unwrap();

        assert!(form.brands().is_empty());
        assert_eq!(form.draft().details.purchase.tax_amount, dec!(0));
        assert_eq!(form.draft().details.purchase.total_amount, dec!(100));
    }
}
