use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fleet_core::{
    Brand, CatalogEntry, FleetRepository, Ledger, LookupItem, LookupKind, ModelDetails,
    RepositoryError, TaxRate, Vehicle, VehicleDetails, VehicleModel,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Decode, Row, Sqlite, Type};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const MODEL_COLUMNS: &str = "model_id, brand, model, version, group_code,
    category_code, segment_code, fuel_type, fuel_capacity, battery_capacity_kwh,
    seats, doors, power_kw, co2, tyre_code, nr_tyres, note,
    base_price, tax_id, tax_amount, total_price";

const VEHICLE_COLUMNS: &str = "unit_nr, plate_nr, chassis_nr, model_id, color_code, fuel_type,
    status_code, group_code, rental_station, current_km,
    purchase_date, purchase_ht, purchase_tax_id, purchase_tva, purchase_ttc,
    sales_date, sales_client, sales_ht, sales_tax_id, sales_tva, sales_ttc,
    note, is_blocked, blocked_date, created_at, updated_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file if needed.
    ///
    /// `:memory:` databases are held on a single connection so every query
    /// sees the same data.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Executes every `.sql` file in `seeds_dir`, in file name order.
    ///
    /// Seed files only insert rows that are missing, so running them again
    /// changes nothing.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in &entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
        }

        info!(files = entries.len(), dir = %seeds_dir.display(), "seeds applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Maps constraint failures to [`RepositoryError::Conflict`] with `context`
/// as the message; anything else is a database error.
fn write_error(
    e: sqlx::Error,
    context: impl FnOnce() -> String,
) -> RepositoryError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() || db.is_foreign_key_violation() {
            return RepositoryError::Conflict(context());
        }
    }
    RepositoryError::Database(e.to_string())
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn column<'r, T>(
    row: &'r SqliteRow,
    name: &str,
) -> Result<T, RepositoryError>
where
    T: Decode<'r, Sqlite> + Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", name, e)))
}

fn ledger_from_row(
    row: &SqliteRow,
    base: &str,
    tax_id: &str,
    tax_amount: &str,
    total: &str,
) -> Result<Ledger, RepositoryError> {
    Ok(Ledger {
        base_amount: get_optional_decimal(row, base)?,
        tax_id: column(row, tax_id)?,
        tax_amount: get_decimal(row, tax_amount)?,
        total_amount: get_decimal(row, total)?,
    })
}

fn row_to_tax_rate(row: &SqliteRow) -> Result<TaxRate, RepositoryError> {
    Ok(TaxRate {
        id: column(row, "id")?,
        label: column(row, "label")?,
        percent_value: get_decimal(row, "percent_value")?,
    })
}

fn row_to_model(row: &SqliteRow) -> Result<VehicleModel, RepositoryError> {
    Ok(VehicleModel {
        model_id: column(row, "model_id")?,
        details: ModelDetails {
            brand: column(row, "brand")?,
            model: column(row, "model")?,
            version: column(row, "version")?,
            group_code: column(row, "group_code")?,
            category_code: column(row, "category_code")?,
            segment_code: column(row, "segment_code")?,
            fuel_type: column(row, "fuel_type")?,
            fuel_capacity: get_optional_decimal(row, "fuel_capacity")?,
            battery_capacity_kwh: get_optional_decimal(row, "battery_capacity_kwh")?,
            seats: column(row, "seats")?,
            doors: column(row, "doors")?,
            power_kw: get_optional_decimal(row, "power_kw")?,
            co2: column(row, "co2")?,
            tyre_code: column(row, "tyre_code")?,
            nr_tyres: column(row, "nr_tyres")?,
            note: column(row, "note")?,
            price: ledger_from_row(row, "base_price", "tax_id", "tax_amount", "total_price")?,
        },
    })
}

fn row_to_vehicle(row: &SqliteRow) -> Result<Vehicle, RepositoryError> {
    Ok(Vehicle {
        unit_nr: column(row, "unit_nr")?,
        details: VehicleDetails {
            plate_nr: column(row, "plate_nr")?,
            chassis_nr: column(row, "chassis_nr")?,
            model_id: column(row, "model_id")?,
            color_code: column(row, "color_code")?,
            fuel_type: column(row, "fuel_type")?,
            status_code: column(row, "status_code")?,
            group_code: column(row, "group_code")?,
            rental_station: column(row, "rental_station")?,
            current_km: column(row, "current_km")?,
            purchase_date: column::<Option<NaiveDate>>(row, "purchase_date")?,
            purchase: ledger_from_row(
                row,
                "purchase_ht",
                "purchase_tax_id",
                "purchase_tva",
                "purchase_ttc",
            )?,
            sales_date: column::<Option<NaiveDate>>(row, "sales_date")?,
            sales_client: column(row, "sales_client")?,
            sale: ledger_from_row(row, "sales_ht", "sales_tax_id", "sales_tva", "sales_ttc")?,
            note: column(row, "note")?,
            is_blocked: column(row, "is_blocked")?,
            blocked_date: column::<Option<NaiveDate>>(row, "blocked_date")?,
        },
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        updated_at: column::<DateTime<Utc>>(row, "updated_at")?,
    })
}

#[async_trait]
impl FleetRepository for SqliteRepository {
    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, RepositoryError> {
        let rows = sqlx::query("SELECT id, label, percent_value FROM tax_rates ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(row_to_tax_rate).collect()
    }

    async fn upsert_tax_rate(
        &self,
        rate: &TaxRate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_rates (id, label, percent_value) VALUES (?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                label = excluded.label,
                percent_value = excluded.percent_value",
        )
        .bind(rate.id)
        .bind(&rate.label)
        .bind(decimal_to_text(rate.percent_value))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT model_id, brand, model, version FROM vehicle_models
             ORDER BY brand, model, version, model_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                Ok(CatalogEntry {
                    brand: column(row, "brand")?,
                    model: column(row, "model")?,
                    version: column(row, "version")?,
                    version_id: column(row, "model_id")?,
                })
            })
            .collect()
    }

    async fn list_lookups(
        &self,
        kind: LookupKind,
    ) -> Result<Vec<LookupItem>, RepositoryError> {
        let rows = sqlx::query("SELECT code, label FROM lookups WHERE kind = ? ORDER BY label")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                Ok(LookupItem {
                    code: column(row, "code")?,
                    label: column(row, "label")?,
                })
            })
            .collect()
    }

    async fn list_brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query("SELECT name FROM brands ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| column::<String>(row, "name").map(Brand::new))
            .collect()
    }

    async fn create_brand(
        &self,
        name: &str,
    ) -> Result<Brand, RepositoryError> {
        sqlx::query("INSERT INTO brands (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, || format!("brand '{}' already exists", name)))?;

        debug!(brand = name, "brand created");
        Ok(Brand::new(name))
    }

    async fn rename_brand(
        &self,
        name: &str,
        new_name: &str,
    ) -> Result<Brand, RepositoryError> {
        let result = sqlx::query("UPDATE brands SET name = ? WHERE name = ?")
            .bind(new_name)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, || format!("brand '{}' already exists", new_name)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!(from = name, to = new_name, "brand renamed");
        Ok(Brand::new(new_name))
    }

    async fn delete_brand(
        &self,
        name: &str,
    ) -> Result<(), RepositoryError> {
        // The foreign key from vehicle_models decides whether the brand is in use.
        let result = sqlx::query("DELETE FROM brands WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                write_error(e, || {
                    format!("brand '{name}' is used by vehicle models and cannot be deleted")
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_models(&self) -> Result<Vec<VehicleModel>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {MODEL_COLUMNS} FROM vehicle_models ORDER BY brand, model, version"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_model).collect()
    }

    async fn get_model(
        &self,
        model_id: i64,
    ) -> Result<VehicleModel, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MODEL_COLUMNS} FROM vehicle_models WHERE model_id = ?"
        ))
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_model(&row)
    }

    async fn find_model(
        &self,
        brand: &str,
        model: &str,
        version: &str,
    ) -> Result<Option<VehicleModel>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MODEL_COLUMNS} FROM vehicle_models
             WHERE brand = ? AND model = ? AND version = ?"
        ))
        .bind(brand)
        .bind(model)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.as_ref().map(row_to_model).transpose()
    }

    async fn create_model(
        &self,
        details: &ModelDetails,
    ) -> Result<VehicleModel, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO vehicle_models (
                brand, model, version, group_code, category_code, segment_code, fuel_type,
                fuel_capacity, battery_capacity_kwh, seats, doors, power_kw, co2,
                tyre_code, nr_tyres, note,
                base_price, tax_id, tax_amount, total_price
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&details.brand)
        .bind(&details.model)
        .bind(&details.version)
        .bind(&details.group_code)
        .bind(&details.category_code)
        .bind(&details.segment_code)
        .bind(&details.fuel_type)
        .bind(details.fuel_capacity.map(decimal_to_text))
        .bind(details.battery_capacity_kwh.map(decimal_to_text))
        .bind(details.seats)
        .bind(details.doors)
        .bind(details.power_kw.map(decimal_to_text))
        .bind(details.co2)
        .bind(&details.tyre_code)
        .bind(details.nr_tyres)
        .bind(&details.note)
        .bind(details.price.base_amount.map(decimal_to_text))
        .bind(details.price.tax_id)
        .bind(decimal_to_text(details.price.tax_amount))
        .bind(decimal_to_text(details.price.total_amount))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || model_conflict(details)))?;

        let model_id = result.last_insert_rowid();
        debug!(model_id, "vehicle model created");
        self.get_model(model_id).await
    }

    async fn update_model(
        &self,
        model_id: i64,
        details: &ModelDetails,
    ) -> Result<VehicleModel, RepositoryError> {
        let result = sqlx::query(
            "UPDATE vehicle_models SET
                brand = ?, model = ?, version = ?, group_code = ?,
                category_code = ?, segment_code = ?, fuel_type = ?,
                fuel_capacity = ?, battery_capacity_kwh = ?, seats = ?, doors = ?,
                power_kw = ?, co2 = ?, tyre_code = ?, nr_tyres = ?, note = ?,
                base_price = ?, tax_id = ?, tax_amount = ?, total_price = ?
             WHERE model_id = ?",
        )
        .bind(&details.brand)
        .bind(&details.model)
        .bind(&details.version)
        .bind(&details.group_code)
        .bind(&details.category_code)
        .bind(&details.segment_code)
        .bind(&details.fuel_type)
        .bind(details.fuel_capacity.map(decimal_to_text))
        .bind(details.battery_capacity_kwh.map(decimal_to_text))
        .bind(details.seats)
        .bind(details.doors)
        .bind(details.power_kw.map(decimal_to_text))
        .bind(details.co2)
        .bind(&details.tyre_code)
        .bind(details.nr_tyres)
        .bind(&details.note)
        .bind(details.price.base_amount.map(decimal_to_text))
        .bind(details.price.tax_id)
        .bind(decimal_to_text(details.price.tax_amount))
        .bind(decimal_to_text(details.price.total_amount))
        .bind(model_id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || model_conflict(details)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_model(model_id).await
    }

    async fn delete_model(
        &self,
        model_id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM vehicle_models WHERE model_id = ?")
            .bind(model_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                write_error(e, || {
                    format!("model {model_id} is used by vehicles and cannot be deleted")
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY unit_nr"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_vehicle).collect()
    }

    async fn get_vehicle(
        &self,
        unit_nr: i64,
    ) -> Result<Vehicle, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE unit_nr = ?"
        ))
        .bind(unit_nr)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_vehicle(&row)
    }

    async fn create_vehicle(
        &self,
        details: &VehicleDetails,
    ) -> Result<Vehicle, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO vehicles (
                plate_nr, chassis_nr, model_id, color_code, fuel_type,
                status_code, group_code, rental_station, current_km,
                purchase_date, purchase_ht, purchase_tax_id, purchase_tva, purchase_ttc,
                sales_date, sales_client, sales_ht, sales_tax_id, sales_tva, sales_ttc,
                note, is_blocked, blocked_date, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&details.plate_nr)
        .bind(&details.chassis_nr)
        .bind(details.model_id)
        .bind(&details.color_code)
        .bind(&details.fuel_type)
        .bind(&details.status_code)
        .bind(&details.group_code)
        .bind(&details.rental_station)
        .bind(details.current_km)
        .bind(details.purchase_date)
        .bind(details.purchase.base_amount.map(decimal_to_text))
        .bind(details.purchase.tax_id)
        .bind(decimal_to_text(details.purchase.tax_amount))
        .bind(decimal_to_text(details.purchase.total_amount))
        .bind(details.sales_date)
        .bind(&details.sales_client)
        .bind(details.sale.base_amount.map(decimal_to_text))
        .bind(details.sale.tax_id)
        .bind(decimal_to_text(details.sale.tax_amount))
        .bind(decimal_to_text(details.sale.total_amount))
        .bind(&details.note)
        .bind(details.is_blocked)
        .bind(details.blocked_date)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || unknown_model(details.model_id)))?;

        let unit_nr = result.last_insert_rowid();
        debug!(unit_nr, "vehicle created");
        self.get_vehicle(unit_nr).await
    }

    async fn update_vehicle(
        &self,
        unit_nr: i64,
        details: &VehicleDetails,
    ) -> Result<Vehicle, RepositoryError> {
        let result = sqlx::query(
            "UPDATE vehicles SET
                plate_nr = ?, chassis_nr = ?, model_id = ?, color_code = ?, fuel_type = ?,
                status_code = ?, group_code = ?, rental_station = ?, current_km = ?,
                purchase_date = ?, purchase_ht = ?, purchase_tax_id = ?,
                purchase_tva = ?, purchase_ttc = ?,
                sales_date = ?, sales_client = ?, sales_ht = ?, sales_tax_id = ?,
                sales_tva = ?, sales_ttc = ?,
                note = ?, is_blocked = ?, blocked_date = ?, updated_at = ?
             WHERE unit_nr = ?",
        )
        .bind(&details.plate_nr)
        .bind(&details.chassis_nr)
        .bind(details.model_id)
        .bind(&details.color_code)
        .bind(&details.fuel_type)
        .bind(&details.status_code)
        .bind(&details.group_code)
        .bind(&details.rental_station)
        .bind(details.current_km)
        .bind(details.purchase_date)
        .bind(details.purchase.base_amount.map(decimal_to_text))
        .bind(details.purchase.tax_id)
        .bind(decimal_to_text(details.purchase.tax_amount))
        .bind(decimal_to_text(details.purchase.total_amount))
        .bind(details.sales_date)
        .bind(&details.sales_client)
        .bind(details.sale.base_amount.map(decimal_to_text))
        .bind(details.sale.tax_id)
        .bind(decimal_to_text(details.sale.tax_amount))
        .bind(decimal_to_text(details.sale.total_amount))
        .bind(&details.note)
        .bind(details.is_blocked)
        .bind(details.blocked_date)
        .bind(Utc::now())
        .bind(unit_nr)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, || unknown_model(details.model_id)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_vehicle(unit_nr).await
    }

    async fn delete_vehicle(
        &self,
        unit_nr: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE unit_nr = ?")
            .bind(unit_nr)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

fn model_conflict(details: &ModelDetails) -> String {
    format!(
        "model '{} {} {}' already exists or brand '{}' is unknown",
        details.brand, details.model, details.version, details.brand
    )
}

fn unknown_model(model_id: Option<i64>) -> String {
    match model_id {
        Some(id) => format!("model {} does not exist", id),
        None => "vehicle conflicts with existing data".to_string(),
    }
}
