use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::Ledger;

/// Editable body of a fleet vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleDetails {
    pub plate_nr: String,
    pub chassis_nr: String,

    /// Catalog version the vehicle is an instance of.
    pub model_id: Option<i64>,

    // Lookup codes
    pub color_code: Option<String>,
    pub fuel_type: Option<String>,
    pub status_code: Option<String>,
    pub group_code: Option<String>,
    pub rental_station: Option<String>,

    pub current_km: i64,

    // Purchase side
    pub purchase_date: Option<NaiveDate>,
    pub purchase: Ledger,

    // Sale side
    pub sales_date: Option<NaiveDate>,
    pub sales_client: Option<String>,
    pub sale: Ledger,

    pub note: String,
    pub is_blocked: bool,
    pub blocked_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub unit_nr: i64,
    #[serde(flatten)]
    pub details: VehicleDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
