//! `field=value` arguments to typed form edits.
//!
//! Amount fields follow the pricing rules: blank or non-numeric input
//! becomes "no amount" rather than an error. Every other field is strict.

use std::str::FromStr;

use chrono::NaiveDate;
use fleet_core::form::{ModelEdit, VehicleEdit, VehicleForm};
use fleet_core::pricing::parse_amount;
use fleet_core::{LedgerEdit, LookupKind, ReferenceData, SelectionEdit};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseEditError {
    #[error("expected FIELD=VALUE, got '{0}'")]
    MissingEquals(String),

    #[error("unknown field '{field}', expected one of: {}", .expected.join(", "))]
    UnknownField {
        field: String,
        expected: &'static [&'static str],
    },

    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("'{value}' is not a valid {field} here")]
    UnknownChoice { field: String, value: String },
}

pub const VEHICLE_FIELDS: &[&str] = &[
    "brand",
    "model",
    "version",
    "plate_nr",
    "chassis_nr",
    "color_code",
    "fuel_type",
    "status_code",
    "group_code",
    "rental_station",
    "current_km",
    "purchase_date",
    "purchase_ht",
    "purchase_tax",
    "sales_date",
    "sales_client",
    "sales_ht",
    "sales_tax",
    "note",
    "blocked",
];

pub const MODEL_FIELDS: &[&str] = &[
    "brand",
    "model",
    "version",
    "group_code",
    "category_code",
    "segment_code",
    "fuel_type",
    "fuel_capacity",
    "battery_capacity_kwh",
    "seats",
    "doors",
    "power_kw",
    "co2",
    "tyre_code",
    "nr_tyres",
    "note",
    "base_price",
    "tax",
];

fn split(arg: &str) -> Result<(&str, &str), ParseEditError> {
    let (field, value) = arg
        .split_once('=')
        .ok_or_else(|| ParseEditError::MissingEquals(arg.to_string()))?;
    Ok((field.trim(), value.trim()))
}

fn invalid(
    field: &str,
    value: &str,
    reason: impl Into<String>,
) -> ParseEditError {
    ParseEditError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn unknown_field(
    field: &str,
    expected: &'static [&'static str],
) -> ParseEditError {
    ParseEditError::UnknownField {
        field: field.to_string(),
        expected,
    }
}

fn optional_text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional<T: FromStr>(
    field: &str,
    value: &str,
) -> Result<Option<T>, ParseEditError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| invalid(field, value, "not a number"))
}

fn optional_decimal(
    field: &str,
    value: &str,
) -> Result<Option<Decimal>, ParseEditError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_amount(value)
        .map(Some)
        .ok_or_else(|| invalid(field, value, "not a number"))
}

fn optional_date(
    field: &str,
    value: &str,
) -> Result<Option<NaiveDate>, ParseEditError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| invalid(field, value, "expected YYYY-MM-DD"))
}

fn flag(
    field: &str,
    value: &str,
) -> Result<bool, ParseEditError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(field, value, "expected true or false")),
    }
}

fn ledger_base(value: &str) -> LedgerEdit {
    LedgerEdit::SetBaseAmount(parse_amount(value))
}

fn ledger_tax(
    field: &str,
    value: &str,
) -> Result<LedgerEdit, ParseEditError> {
    optional::<i32>(field, value).map(LedgerEdit::SetTax)
}

pub fn parse_vehicle_edit(arg: &str) -> Result<VehicleEdit, ParseEditError> {
    let (field, value) = split(arg)?;
    let edit = match field {
        "brand" => VehicleEdit::Selection(SelectionEdit::SetBrand(value.to_string())),
        "model" => VehicleEdit::Selection(SelectionEdit::SetModel(value.to_string())),
        "version" => VehicleEdit::Selection(SelectionEdit::SetVersion(optional(field, value)?)),
        "plate_nr" => VehicleEdit::PlateNr(value.to_string()),
        "chassis_nr" => VehicleEdit::ChassisNr(value.to_string()),
        "color_code" => VehicleEdit::ColorCode(optional_text(value)),
        "fuel_type" => VehicleEdit::FuelType(optional_text(value)),
        "status_code" => VehicleEdit::StatusCode(optional_text(value)),
        "group_code" => VehicleEdit::GroupCode(optional_text(value)),
        "rental_station" => VehicleEdit::RentalStation(optional_text(value)),
        "current_km" => VehicleEdit::CurrentKm(
            value
                .parse()
                .map_err(|_| invalid(field, value, "not a whole number"))?,
        ),
        "purchase_date" => VehicleEdit::PurchaseDate(optional_date(field, value)?),
        "purchase_ht" => VehicleEdit::Purchase(ledger_base(value)),
        "purchase_tax" => VehicleEdit::Purchase(ledger_tax(field, value)?),
        "sales_date" => VehicleEdit::SalesDate(optional_date(field, value)?),
        "sales_client" => VehicleEdit::SalesClient(optional_text(value)),
        "sales_ht" => VehicleEdit::Sale(ledger_base(value)),
        "sales_tax" => VehicleEdit::Sale(ledger_tax(field, value)?),
        "note" => VehicleEdit::Note(value.to_string()),
        "blocked" => VehicleEdit::Blocked(flag(field, value)?),
        other => return Err(unknown_field(other, VEHICLE_FIELDS)),
    };
    Ok(edit)
}

pub fn parse_model_edit(arg: &str) -> Result<ModelEdit, ParseEditError> {
    let (field, value) = split(arg)?;
    let edit = match field {
        "brand" => ModelEdit::Brand(value.to_string()),
        "model" => ModelEdit::Model(value.to_string()),
        "version" => ModelEdit::Version(value.to_string()),
        "group_code" => ModelEdit::GroupCode(optional_text(value)),
        "category_code" => ModelEdit::CategoryCode(optional_text(value)),
        "segment_code" => ModelEdit::SegmentCode(optional_text(value)),
        "fuel_type" => ModelEdit::FuelType(optional_text(value)),
        "fuel_capacity" => ModelEdit::FuelCapacity(optional_decimal(field, value)?),
        "battery_capacity_kwh" => ModelEdit::BatteryCapacity(optional_decimal(field, value)?),
        "seats" => ModelEdit::Seats(optional(field, value)?),
        "doors" => ModelEdit::Doors(optional(field, value)?),
        "power_kw" => ModelEdit::PowerKw(optional_decimal(field, value)?),
        "co2" => ModelEdit::Co2(optional(field, value)?),
        "tyre_code" => ModelEdit::TyreCode(optional_text(value)),
        "nr_tyres" => ModelEdit::NrTyres(optional(field, value)?),
        "note" => ModelEdit::Note(value.to_string()),
        "base_price" => ModelEdit::Price(ledger_base(value)),
        "tax" => ModelEdit::Price(ledger_tax(field, value)?),
        other => return Err(unknown_field(other, MODEL_FIELDS)),
    };
    Ok(edit)
}

fn check_lookup(
    reference: &ReferenceData,
    kind: LookupKind,
    field: &str,
    code: Option<&String>,
) -> Result<(), ParseEditError> {
    let Some(code) = code else {
        return Ok(());
    };
    let items = reference.lookup(kind);
    // Nothing to check against until the lists are loaded.
    if items.is_empty() || items.iter().any(|item| &item.code == code) {
        Ok(())
    } else {
        Err(ParseEditError::UnknownChoice {
            field: field.to_string(),
            value: code.clone(),
        })
    }
}

/// Checks a vehicle edit against what the form currently offers.
///
/// Must run right before the edit is applied: the valid models depend on the
/// brand chosen by earlier edits.
pub fn check_vehicle_edit(
    form: &VehicleForm,
    edit: &VehicleEdit,
) -> Result<(), ParseEditError> {
    let reference = form.reference();
    let unknown = |field: &str, value: String| ParseEditError::UnknownChoice {
        field: field.to_string(),
        value,
    };
    match edit {
        VehicleEdit::Selection(SelectionEdit::SetBrand(brand)) => {
            if !brand.is_empty() && !form.brands().contains(brand) {
                return Err(unknown("brand", brand.clone()));
            }
        }
        VehicleEdit::Selection(SelectionEdit::SetModel(model)) => {
            if !model.is_empty() && !form.models().contains(model) {
                return Err(unknown("model", model.clone()));
            }
        }
        VehicleEdit::Selection(SelectionEdit::SetVersion(Some(id))) => {
            if !form.versions().iter().any(|v| v.version_id == *id) {
                return Err(unknown("version", id.to_string()));
            }
        }
        VehicleEdit::ColorCode(code) => {
            check_lookup(reference, LookupKind::Color, "color_code", code.as_ref())?
        }
        VehicleEdit::FuelType(code) => {
            check_lookup(reference, LookupKind::Fuel, "fuel_type", code.as_ref())?
        }
        VehicleEdit::StatusCode(code) => {
            check_lookup(reference, LookupKind::Status, "status_code", code.as_ref())?
        }
        VehicleEdit::GroupCode(code) => {
            check_lookup(reference, LookupKind::Group, "group_code", code.as_ref())?
        }
        VehicleEdit::RentalStation(code) => {
            check_lookup(reference, LookupKind::Station, "rental_station", code.as_ref())?
        }
        _ => {}
    }
    Ok(())
}

/// Checks a model edit against the known brands and lookup lists.
pub fn check_model_edit(
    reference: &ReferenceData,
    edit: &ModelEdit,
) -> Result<(), ParseEditError> {
    match edit {
        ModelEdit::Brand(brand) => {
            if !brand.is_empty() && !reference.brands.iter().any(|b| &b.name == brand) {
                return Err(ParseEditError::UnknownChoice {
                    field: "brand".to_string(),
                    value: brand.clone(),
                });
            }
        }
        ModelEdit::GroupCode(code) => {
            check_lookup(reference, LookupKind::Group, "group_code", code.as_ref())?
        }
        ModelEdit::CategoryCode(code) => {
            check_lookup(reference, LookupKind::Category, "category_code", code.as_ref())?
        }
        ModelEdit::SegmentCode(code) => {
            check_lookup(reference, LookupKind::Segment, "segment_code", code.as_ref())?
        }
        ModelEdit::FuelType(code) => {
            check_lookup(reference, LookupKind::Fuel, "fuel_type", code.as_ref())?
        }
        ModelEdit::TyreCode(code) => {
            check_lookup(reference, LookupKind::Tyre, "tyre_code", code.as_ref())?
        }
        _ => {}
    }
    Ok(())
}
