//! Plain-text rendering of records for the terminal.
//!
//! Amounts are rounded half-up to two places here and nowhere else.

use chrono::NaiveDate;
use fleet_core::pricing::round_half_up;
use fleet_core::{
    Brand, DerivedAmounts, Ledger, LookupKind, ReferenceData, Selection, SelectionStatus, Vehicle,
    VehicleModel, VersionOption,
};
use rust_decimal::Decimal;

pub fn amount(value: Decimal) -> String {
    format!("{:.2}", round_half_up(value))
}

fn optional_amount(value: Option<Decimal>) -> String {
    value.map(amount).unwrap_or_else(|| "-".to_string())
}

fn optional_date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn optional_text<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn tax_label(
    reference: &ReferenceData,
    tax_id: Option<i32>,
) -> String {
    match tax_id {
        None => "-".to_string(),
        Some(id) => match reference.tax(id) {
            Some(rate) => format!("{} ({}%)", rate.label, rate.percent_value.normalize()),
            None => format!("#{id} (unknown, 0%)"),
        },
    }
}

pub fn lookup_label(
    reference: &ReferenceData,
    kind: LookupKind,
    code: Option<&str>,
) -> String {
    let Some(code) = code else {
        return "-".to_string();
    };
    match reference.lookup(kind).iter().find(|item| item.code == code) {
        Some(item) => format!("{} ({code})", item.label),
        None => code.to_string(),
    }
}

/// `brand model version` for a model id, as the catalog knows it.
pub fn model_name(
    reference: &ReferenceData,
    model_id: Option<i64>,
) -> String {
    let Some(id) = model_id else {
        return "-".to_string();
    };
    let catalog = &reference.catalog;
    let selection = Selection::seeded(catalog, model_id);
    match (selection.status(catalog), catalog.entry(id)) {
        (SelectionStatus::Complete, Some(entry)) => {
            format!("{} {} {}", entry.brand, entry.model, entry.version)
        }
        _ => format!("model #{id} (not in catalog)"),
    }
}

fn ledger_lines(
    title: &str,
    base_label: &str,
    ledger: &Ledger,
    reference: &ReferenceData,
) -> Vec<String> {
    let mut lines = vec![
        format!("{title}:"),
        format!("  {base_label:<14}{}", optional_amount(ledger.base_amount)),
        format!("  {:<14}{}", "tax", tax_label(reference, ledger.tax_id)),
        format!("  {:<14}{}", "tax amount", amount(ledger.tax_amount)),
        format!("  {:<14}{}", "total", amount(ledger.total_amount)),
    ];
    // Stored amounts predate a change to the tax table.
    if !ledger.is_consistent(&reference.taxes) {
        let current = ledger.rederive(&reference.taxes);
        lines.push(format!(
            "  {:<14}{} (at current rates)",
            "now",
            amount(current.total_amount)
        ));
    }
    lines
}

fn field(
    name: &str,
    value: impl AsRef<str>,
) -> String {
    format!("{name:<16}{}", value.as_ref())
}

pub fn names<I>(names: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn brands(brands: &[Brand]) -> String {
    names(brands.iter().map(|b| b.name.as_str()))
}

pub fn versions(versions: &[VersionOption]) -> String {
    versions
        .iter()
        .map(|v| format!("{:>5}  {}", v.version_id, v.version))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn models(models: &[VehicleModel]) -> String {
    let mut lines = vec![format!("{:>5}  {:<40}{:>12}", "id", "model", "price")];
    lines.extend(models.iter().map(|m| {
        format!(
            "{:>5}  {:<40}{:>12}",
            m.model_id,
            m.display_name(),
            amount(m.details.price.total_amount)
        )
    }));
    lines.join("\n")
}

pub fn model(
    model: &VehicleModel,
    reference: &ReferenceData,
) -> String {
    let d = &model.details;
    let mut lines = vec![
        field("model id", model.model_id.to_string()),
        field("brand", &d.brand),
        field("model", &d.model),
        field("version", &d.version),
        field(
            "group",
            lookup_label(reference, LookupKind::Group, d.group_code.as_deref()),
        ),
        field(
            "category",
            lookup_label(reference, LookupKind::Category, d.category_code.as_deref()),
        ),
        field(
            "segment",
            lookup_label(reference, LookupKind::Segment, d.segment_code.as_deref()),
        ),
        field(
            "fuel",
            lookup_label(reference, LookupKind::Fuel, d.fuel_type.as_deref()),
        ),
        field("fuel capacity", optional_text(d.fuel_capacity)),
        field("battery kWh", optional_text(d.battery_capacity_kwh)),
        field("seats", optional_text(d.seats)),
        field("doors", optional_text(d.doors)),
        field("power kW", optional_text(d.power_kw)),
        field("CO2 g/km", optional_text(d.co2)),
        field(
            "tyres",
            lookup_label(reference, LookupKind::Tyre, d.tyre_code.as_deref()),
        ),
        field("tyre count", optional_text(d.nr_tyres)),
    ];
    if !d.note.is_empty() {
        lines.push(field("note", &d.note));
    }
    lines.extend(ledger_lines("price", "base price", &d.price, reference));
    lines.join("\n")
}

pub fn vehicles(
    vehicles: &[Vehicle],
    reference: &ReferenceData,
) -> String {
    let mut lines = vec![format!(
        "{:>5}  {:<12}{:<36}{:>10}  {}",
        "unit", "plate", "model", "km", "status"
    )];
    lines.extend(vehicles.iter().map(|v| {
        let d = &v.details;
        let mut status = lookup_label(reference, LookupKind::Status, d.status_code.as_deref());
        if d.is_blocked {
            status.push_str(" [blocked]");
        }
        format!(
            "{:>5}  {:<12}{:<36}{:>10}  {}",
            v.unit_nr,
            d.plate_nr,
            model_name(reference, d.model_id),
            d.current_km,
            status
        )
    }));
    lines.join("\n")
}

pub fn vehicle(
    vehicle: &Vehicle,
    reference: &ReferenceData,
) -> String {
    let d = &vehicle.details;
    let mut lines = vec![
        field("unit", vehicle.unit_nr.to_string()),
        field("plate", &d.plate_nr),
        field("chassis", &d.chassis_nr),
        field("model", model_name(reference, d.model_id)),
        field(
            "colour",
            lookup_label(reference, LookupKind::Color, d.color_code.as_deref()),
        ),
        field(
            "fuel",
            lookup_label(reference, LookupKind::Fuel, d.fuel_type.as_deref()),
        ),
        field(
            "status",
            lookup_label(reference, LookupKind::Status, d.status_code.as_deref()),
        ),
        field(
            "group",
            lookup_label(reference, LookupKind::Group, d.group_code.as_deref()),
        ),
        field(
            "station",
            lookup_label(reference, LookupKind::Station, d.rental_station.as_deref()),
        ),
        field("km", d.current_km.to_string()),
        field(
            "blocked",
            if d.is_blocked {
                format!("yes, since {}", optional_date(d.blocked_date))
            } else {
                "no".to_string()
            },
        ),
    ];
    if !d.note.is_empty() {
        lines.push(field("note", &d.note));
    }
    lines.push(field("purchase date", optional_date(d.purchase_date)));
    lines.extend(ledger_lines("purchase", "price excl.", &d.purchase, reference));
    lines.push(field("sales date", optional_date(d.sales_date)));
    lines.push(field("sales client", optional_text(d.sales_client.as_deref())));
    lines.extend(ledger_lines("sale", "price excl.", &d.sale, reference));
    lines.join("\n")
}

pub fn quote(
    base_amount: Option<Decimal>,
    tax_id: Option<i32>,
    derived: &DerivedAmounts,
    reference: &ReferenceData,
) -> String {
    [
        field("base", optional_amount(base_amount)),
        field("tax", tax_label(reference, tax_id)),
        field("tax amount", amount(derived.tax_amount)),
        field("total", amount(derived.total_amount)),
    ]
    .join("\n")
}
