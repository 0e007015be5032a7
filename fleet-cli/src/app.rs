//! Drives the core forms against a repository: every command opens a form
//! through a [`FormSession`], replays the requested edits in order, and
//! persists the result.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use fleet_core::db::{DbConfig, RepositoryRegistry};
use fleet_core::form::{
    FormSession, LoadOutcome, LoadState, ModelEdit, ModelForm, VehicleEdit, VehicleForm,
    validate_brand_name,
};
use fleet_core::pricing::derive;
use fleet_core::{
    Brand, DerivedAmounts, FleetRepository, ReferenceData, RepositoryError, Vehicle, VehicleModel,
};
use fleet_db_sqlite::SqliteRepositoryFactory;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::edits::{check_model_edit, check_vehicle_edit};

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Stopped at the confirmation step.
    AwaitingConfirmation,
}

fn load_outcome<T, F>(
    fetched: Result<T, RepositoryError>,
    open: impl FnOnce(T) -> F,
) -> LoadOutcome<F> {
    match fetched {
        Ok(record) => LoadOutcome::Loaded(open(record)),
        Err(RepositoryError::NotFound) => LoadOutcome::NotFound,
        Err(e) => LoadOutcome::Failed(e.to_string()),
    }
}

fn loaded<'a, F>(
    session: &'a mut FormSession<F>,
    what: &str,
) -> Result<&'a mut F> {
    match session.state() {
        LoadState::Loaded(_) => {}
        LoadState::NotFound => bail!("{what} not found"),
        LoadState::Failed(message) => bail!("cannot load {what}: {message}"),
        LoadState::Idle | LoadState::Loading => bail!("{what} is not loaded"),
    }
    session
        .form_mut()
        .ok_or_else(|| anyhow!("{what} is not loaded"))
}

pub struct FleetApp {
    repo: Box<dyn FleetRepository>,
    reference: Arc<ReferenceData>,
    models: FormSession<ModelForm>,
    vehicles: FormSession<VehicleForm>,
}

impl FleetApp {
    /// Opens the configured store and loads its reference data.
    pub async fn connect(
        registry: &RepositoryRegistry,
        config: &DbConfig,
    ) -> Result<Self> {
        debug!(backend = %config.backend, "connecting");
        let repo = registry
            .create(config)
            .await
            .with_context(|| {
                format!("cannot open {} database '{}'", config.backend, config.connection_string)
            })?;
        let mut app = Self::new(repo);
        app.refresh_reference().await?;
        Ok(app)
    }

    /// Wraps `repo` with an empty reference snapshot.
    pub fn new(repo: Box<dyn FleetRepository>) -> Self {
        Self {
            repo,
            reference: Arc::new(ReferenceData::default()),
            models: FormSession::new(),
            vehicles: FormSession::new(),
        }
    }

    pub fn repository(&self) -> &dyn FleetRepository {
        self.repo.as_ref()
    }

    pub fn reference(&self) -> &Arc<ReferenceData> {
        &self.reference
    }

    /// Reloads the reference snapshot and hands it to any open form.
    pub async fn refresh_reference(&mut self) -> Result<Arc<ReferenceData>> {
        let data = self
            .repo
            .load_reference_data()
            .await
            .context("cannot load reference data")?;
        self.reference = Arc::new(data);
        if let Some(form) = self.models.form_mut() {
            form.replace_reference(Arc::clone(&self.reference));
        }
        if let Some(form) = self.vehicles.form_mut() {
            form.replace_reference(Arc::clone(&self.reference));
        }
        debug!(
            models = self.reference.catalog.len(),
            brands = self.reference.brands.len(),
            "reference data loaded"
        );
        Ok(Arc::clone(&self.reference))
    }

    pub fn quote(
        &self,
        base_amount: Option<Decimal>,
        tax_id: Option<i32>,
    ) -> DerivedAmounts {
        derive(base_amount, tax_id, &self.reference.taxes)
    }

    // ── Brands ──────────────────────────────────────────────────────────────

    pub async fn list_brands(&self) -> Result<Vec<Brand>> {
        Ok(self.repo.list_brands().await?)
    }

    pub async fn add_brand(
        &mut self,
        name: &str,
    ) -> Result<Brand> {
        let name = validate_brand_name(name)?;
        let brand = self.repo.create_brand(&name).await?;
        info!(brand = %brand.name, "brand added");
        self.refresh_reference().await?;
        Ok(brand)
    }

    pub async fn rename_brand(
        &mut self,
        name: &str,
        new_name: &str,
    ) -> Result<Brand> {
        let new_name = validate_brand_name(new_name)?;
        let brand = self
            .repo
            .rename_brand(name, &new_name)
            .await
            .with_context(|| format!("cannot rename brand '{name}'"))?;
        info!(from = name, to = %brand.name, "brand renamed");
        self.refresh_reference().await?;
        Ok(brand)
    }

    pub async fn delete_brand(
        &mut self,
        name: &str,
        confirmed: bool,
    ) -> Result<DeleteOutcome> {
        if !self.reference.brands.iter().any(|b| b.name == name) {
            return Err(RepositoryError::NotFound).with_context(|| format!("brand '{name}'"));
        }
        if !confirmed {
            return Ok(DeleteOutcome::AwaitingConfirmation);
        }
        self.repo.delete_brand(name).await?;
        info!(brand = name, "brand deleted");
        self.refresh_reference().await?;
        Ok(DeleteOutcome::Deleted)
    }

    // ── Vehicle models ──────────────────────────────────────────────────────

    pub async fn list_models(&self) -> Result<Vec<VehicleModel>> {
        Ok(self.repo.list_models().await?)
    }

    /// Loads model `model_id` into the model form.
    pub async fn open_model(
        &mut self,
        model_id: i64,
    ) -> Result<&mut ModelForm> {
        let ticket = self.models.begin_load();
        let fetched = self.repo.get_model(model_id).await;
        let reference = Arc::clone(&self.reference);
        let outcome = load_outcome(fetched, |model| ModelForm::open(&model, reference));
        self.models.finish_load(ticket, outcome);
        loaded(&mut self.models, &format!("model {model_id}"))
    }

    fn replay_model_edits(
        form: &mut ModelForm,
        edits: Vec<ModelEdit>,
    ) -> Result<()> {
        for edit in edits {
            check_model_edit(form.reference(), &edit)?;
            form.apply(edit)?;
        }
        Ok(())
    }

    pub async fn create_model(
        &mut self,
        edits: Vec<ModelEdit>,
    ) -> Result<VehicleModel> {
        let mut form = ModelForm::create(Arc::clone(&self.reference));
        Self::replay_model_edits(&mut form, edits)?;
        let details = form.submit()?;
        let model = self.repo.create_model(&details).await?;
        form.mark_saved(&model)?;
        info!(model_id = model.model_id, name = %model.display_name(), "model created");
        self.refresh_reference().await?;
        Ok(model)
    }

    pub async fn edit_model(
        &mut self,
        model_id: i64,
        edits: Vec<ModelEdit>,
    ) -> Result<VehicleModel> {
        self.open_model(model_id).await?;
        let form = loaded(&mut self.models, &format!("model {model_id}"))?;
        form.begin_edit()?;
        Self::replay_model_edits(form, edits)?;
        let details = form.submit()?;
        let model = self.repo.update_model(model_id, &details).await?;
        form.mark_saved(&model)?;
        info!(model_id, "model updated");
        self.refresh_reference().await?;
        Ok(model)
    }

    pub async fn delete_model(
        &mut self,
        model_id: i64,
        confirmed: bool,
    ) -> Result<DeleteOutcome> {
        self.open_model(model_id).await?;
        let form = loaded(&mut self.models, &format!("model {model_id}"))?;
        form.request_delete()?;
        if !confirmed {
            return Ok(DeleteOutcome::AwaitingConfirmation);
        }
        if let Err(e) = self.repo.delete_model(model_id).await {
            form.dismiss_delete()?;
            return Err(e).with_context(|| format!("cannot delete model {model_id}"));
        }
        form.confirm_delete()?;
        self.models.close();
        info!(model_id, "model deleted");
        self.refresh_reference().await?;
        Ok(DeleteOutcome::Deleted)
    }

    // ── Vehicles ────────────────────────────────────────────────────────────

    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        Ok(self.repo.list_vehicles().await?)
    }

    /// Loads vehicle `unit_nr` into the vehicle form.
    pub async fn open_vehicle(
        &mut self,
        unit_nr: i64,
    ) -> Result<&mut VehicleForm> {
        let ticket = self.vehicles.begin_load();
        let fetched = self.repo.get_vehicle(unit_nr).await;
        let reference = Arc::clone(&self.reference);
        let outcome = load_outcome(fetched, |vehicle| VehicleForm::open(&vehicle, reference));
        self.vehicles.finish_load(ticket, outcome);
        loaded(&mut self.vehicles, &format!("vehicle {unit_nr}"))
    }

    fn replay_vehicle_edits(
        form: &mut VehicleForm,
        edits: Vec<VehicleEdit>,
    ) -> Result<()> {
        for edit in edits {
            check_vehicle_edit(form, &edit)?;
            form.apply(edit)?;
        }
        Ok(())
    }

    pub async fn create_vehicle(
        &mut self,
        edits: Vec<VehicleEdit>,
    ) -> Result<Vehicle> {
        let mut form = VehicleForm::create(Arc::clone(&self.reference));
        Self::replay_vehicle_edits(&mut form, edits)?;
        let details = form.submit()?;
        let vehicle = self.repo.create_vehicle(&details).await?;
        form.mark_saved(&vehicle)?;
        info!(unit_nr = vehicle.unit_nr, plate_nr = %vehicle.details.plate_nr, "vehicle created");
        Ok(vehicle)
    }

    pub async fn edit_vehicle(
        &mut self,
        unit_nr: i64,
        edits: Vec<VehicleEdit>,
    ) -> Result<Vehicle> {
        self.open_vehicle(unit_nr).await?;
        let form = loaded(&mut self.vehicles, &format!("vehicle {unit_nr}"))?;
        form.begin_edit()?;
        Self::replay_vehicle_edits(form, edits)?;
        let details = form.submit()?;
        let vehicle = self.repo.update_vehicle(unit_nr, &details).await?;
        form.mark_saved(&vehicle)?;
        info!(unit_nr, "vehicle updated");
        Ok(vehicle)
    }

    pub async fn delete_vehicle(
        &mut self,
        unit_nr: i64,
        confirmed: bool,
    ) -> Result<DeleteOutcome> {
        self.open_vehicle(unit_nr).await?;
        let form = loaded(&mut self.vehicles, &format!("vehicle {unit_nr}"))?;
        form.request_delete()?;
        if !confirmed {
            return Ok(DeleteOutcome::AwaitingConfirmation);
        }
        if let Err(e) = self.repo.delete_vehicle(unit_nr).await {
            form.dismiss_delete()?;
            return Err(e).with_context(|| format!("cannot delete vehicle {unit_nr}"));
        }
        form.confirm_delete()?;
        self.vehicles.close();
        info!(unit_nr, "vehicle deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// The vehicle form as left by the last vehicle command, if still open.
    pub fn vehicle_form(&self) -> Option<&VehicleForm> {
        self.vehicles.form()
    }

    pub fn model_form(&self) -> Option<&ModelForm> {
        self.models.form()
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::form::FormMode;

    use super::*;

    #[test]
    fn registry_offers_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[test]
    fn not_found_fetch_becomes_not_found_outcome() {
        let outcome: LoadOutcome<i64> = load_outcome(Err(RepositoryError::NotFound), |v: i64| v);
        assert_eq!(outcome, LoadOutcome::NotFound);

        let failed: LoadOutcome<i64> =
            load_outcome(Err(RepositoryError::Database("disk full".into())), |v: i64| v);
        assert_eq!(failed, LoadOutcome::Failed("Database error: disk full".to_string()));
    }

    #[test]
    fn loaded_reports_missing_record() {
        let mut session: FormSession<FormMode> = FormSession::new();
        let ticket = session.begin_load();
        session.finish_load(ticket, LoadOutcome::NotFound);

        let err = loaded(&mut session, "vehicle 9").unwrap_err();
        assert_eq!(err.to_string(), "vehicle 9 not found");
    }
}
