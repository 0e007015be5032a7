use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::form::{EditSession, FormError, FormMode, ValidationErrors};
use crate::pricing::LedgerEdit;
use crate::{ModelDetails, ReferenceData, VehicleModel};

/// One edit to a vehicle model form.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEdit {
    Price(LedgerEdit),
    Brand(String),
    Model(String),
    Version(String),
    GroupCode(Option<String>),
    CategoryCode(Option<String>),
    SegmentCode(Option<String>),
    FuelType(Option<String>),
    FuelCapacity(Option<Decimal>),
    BatteryCapacity(Option<Decimal>),
    Seats(Option<i32>),
    Doors(Option<i32>),
    PowerKw(Option<Decimal>),
    Co2(Option<i32>),
    TyreCode(Option<String>),
    NrTyres(Option<i32>),
    Note(String),
}

impl ModelEdit {
    /// Name of the field the edit touches, as used in validation messages.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Price(LedgerEdit::SetBaseAmount(_)) => "base_price",
            Self::Price(LedgerEdit::SetTax(_)) => "tax_id",
            Self::Brand(_) => "brand",
            Self::Model(_) => "model",
            Self::Version(_) => "version",
            Self::GroupCode(_) => "group_code",
            Self::CategoryCode(_) => "category_code",
            Self::SegmentCode(_) => "segment_code",
            Self::FuelType(_) => "fuel_type",
            Self::FuelCapacity(_) => "fuel_capacity",
            Self::BatteryCapacity(_) => "battery_capacity_kwh",
            Self::Seats(_) => "seats",
            Self::Doors(_) => "doors",
            Self::PowerKw(_) => "power_kw",
            Self::Co2(_) => "co2",
            Self::TyreCode(_) => "tyre_code",
            Self::NrTyres(_) => "nr_tyres",
            Self::Note(_) => "note",
        }
    }
}

fn apply_edit(
    details: &ModelDetails,
    edit: ModelEdit,
    reference: &ReferenceData,
) -> ModelDetails {
    let mut next = details.clone();
    match edit {
        ModelEdit::Price(edit) => next.price = next.price.apply(edit, &reference.taxes),
        ModelEdit::Brand(value) => next.brand = value,
        ModelEdit::Model(value) => next.model = value,
        ModelEdit::Version(value) => next.version = value,
        ModelEdit::GroupCode(value) => next.group_code = value,
        ModelEdit::CategoryCode(value) => next.category_code = value,
        ModelEdit::SegmentCode(value) => next.segment_code = value,
        ModelEdit::FuelType(value) => next.fuel_type = value,
        ModelEdit::FuelCapacity(value) => next.fuel_capacity = value,
        ModelEdit::BatteryCapacity(value) => next.battery_capacity_kwh = value,
        ModelEdit::Seats(value) => next.seats = value,
        ModelEdit::Doors(value) => next.doors = value,
        ModelEdit::PowerKw(value) => next.power_kw = value,
        ModelEdit::Co2(value) => next.co2 = value,
        ModelEdit::TyreCode(value) => next.tyre_code = value,
        ModelEdit::NrTyres(value) => next.nr_tyres = value,
        ModelEdit::Note(value) => next.note = value,
    }
    next
}

/// Checks the fields a model must have before it can be stored.
pub fn validate_model(details: &ModelDetails) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.require_text("brand", &details.brand, "brand is required");
    errors.require_text("model", &details.model, "model is required");
    errors.require_text("version", &details.version, "version is required");
    errors.require_non_negative(
        "fuel_capacity",
        details.fuel_capacity,
        "fuel capacity cannot be negative",
    );
    errors.require_non_negative(
        "battery_capacity_kwh",
        details.battery_capacity_kwh,
        "battery capacity cannot be negative",
    );
    errors.require_non_negative(
        "base_price",
        details.price.base_amount,
        "base price cannot be negative",
    );
    errors.into_result()
}

/// Editor for a single vehicle model.
///
/// Validation errors from the last failed submit are kept until the field
/// they belong to is edited again.
#[derive(Debug, Clone)]
pub struct ModelForm {
    model_id: Option<i64>,
    session: EditSession<ModelDetails>,
    errors: ValidationErrors,
    reference: Arc<ReferenceData>,
}

impl ModelForm {
    pub fn open(
        model: &VehicleModel,
        reference: Arc<ReferenceData>,
    ) -> Self {
        Self {
            model_id: Some(model.model_id),
            session: EditSession::existing(model.details.clone()),
            errors: ValidationErrors::new(),
            reference,
        }
    }

    pub fn create(reference: Arc<ReferenceData>) -> Self {
        Self {
            model_id: None,
            session: EditSession::new_record(ModelDetails::default()),
            errors: ValidationErrors::new(),
            reference,
        }
    }

    pub fn model_id(&self) -> Option<i64> {
        self.model_id
    }

    pub fn mode(&self) -> FormMode {
        self.session.mode()
    }

    pub fn draft(&self) -> &ModelDetails {
        self.session.draft()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn replace_reference(
        &mut self,
        reference: Arc<ReferenceData>,
    ) {
        self.reference = reference;
    }

    pub fn begin_edit(&mut self) -> Result<(), FormError> {
        self.session.begin_edit()
    }

    pub fn apply(
        &mut self,
        edit: ModelEdit,
    ) -> Result<(), FormError> {
        debug!(model_id = ?self.model_id, ?edit, "model edit");
        let field = edit.field();
        let next = apply_edit(self.session.draft(), edit, &self.reference);
        self.session.update(next)?;
        self.errors.clear_field(field);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), FormError> {
        self.session.cancel()?;
        self.errors = ValidationErrors::new();
        Ok(())
    }

    /// Validated details ready to be persisted. A failed check is also kept
    /// in [`ModelForm::errors`].
    pub fn submit(&mut self) -> Result<ModelDetails, FormError> {
        let draft = self.session.submission()?.clone();
        if let Err(errors) = validate_model(&draft) {
            self.errors = errors.clone();
            return Err(FormError::Invalid(errors));
        }
        self.errors = ValidationErrors::new();
        Ok(draft)
    }

    pub fn mark_saved(
        &mut self,
        model: &VehicleModel,
    ) -> Result<(), FormError> {
        self.session.mark_saved(model.details.clone())?;
        self.model_id = Some(model.model_id);
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
