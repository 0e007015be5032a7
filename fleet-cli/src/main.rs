use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use fleet_cli::app::{self, DeleteOutcome, FleetApp};
use fleet_cli::config::{FleetConfig, Overrides};
use fleet_cli::edits::{parse_model_edit, parse_vehicle_edit};
use fleet_cli::{display, logging};
use fleet_core::form::{ModelEdit, VehicleEdit};
use fleet_core::pricing::parse_amount;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Fleet management: vehicles, vehicle models, brands and price quotes.
///
/// Settings come from `fleet.toml` in the working directory (or `--config`);
/// flags override them.
#[derive(Debug, Parser)]
#[command(name = "fleet", version)]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `fleet.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log filter, e.g. `debug` or `info,fleet_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print records as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Vehicle brands.
    Brands {
        #[command(subcommand)]
        action: BrandCommand,
    },
    /// Vehicle models (brand, model, version and list price).
    Models {
        #[command(subcommand)]
        action: ModelCommand,
    },
    /// Fleet vehicles.
    Vehicles {
        #[command(subcommand)]
        action: VehicleCommand,
    },
    /// What the brand/model/version pickers offer.
    Catalog {
        #[command(subcommand)]
        action: CatalogCommand,
    },
    /// Tax and tax-inclusive total for an amount.
    Quote {
        /// Amount before tax.
        #[arg(long)]
        base: String,
        /// Tax rate id.
        #[arg(long)]
        tax: Option<i32>,
    },
}

#[derive(Debug, Subcommand)]
enum BrandCommand {
    List,
    Add {
        name: String,
    },
    Rename {
        name: String,
        new_name: String,
    },
    Delete {
        name: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ModelCommand {
    List,
    Show {
        model_id: i64,
    },
    Create {
        /// Field assignment, applied in order. Repeatable.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_model_edit)]
        edits: Vec<ModelEdit>,
    },
    Edit {
        model_id: i64,
        /// Field assignment, applied in order. Repeatable.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_model_edit)]
        edits: Vec<ModelEdit>,
    },
    Delete {
        model_id: i64,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum VehicleCommand {
    List,
    Show {
        unit_nr: i64,
    },
    Create {
        /// Field assignment, applied in order. Repeatable.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_vehicle_edit)]
        edits: Vec<VehicleEdit>,
    },
    Edit {
        unit_nr: i64,
        /// Field assignment, applied in order. Repeatable.
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_vehicle_edit)]
        edits: Vec<VehicleEdit>,
    },
    Delete {
        unit_nr: i64,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    Brands,
    Models { brand: String },
    Versions { brand: String, model: String },
}

// ─── output ──────────────────────────────────────────────────────────────────

struct Output {
    json: bool,
}

impl Output {
    fn show<T: Serialize + ?Sized>(
        &self,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    fn deleted(
        &self,
        what: &str,
        outcome: DeleteOutcome,
    ) {
        match outcome {
            DeleteOutcome::Deleted => println!("deleted {what}"),
            DeleteOutcome::AwaitingConfirmation => {
                println!("about to delete {what}; re-run with --yes to confirm")
            }
        }
    }
}

// ─── commands ────────────────────────────────────────────────────────────────

async fn run_brands(
    app: &mut FleetApp,
    out: &Output,
    action: BrandCommand,
) -> Result<()> {
    match action {
        BrandCommand::List => {
            let brands = app.list_brands().await?;
            out.show(&brands, || display::brands(&brands))
        }
        BrandCommand::Add { name } => {
            let brand = app.add_brand(&name).await?;
            out.show(&brand, || format!("added brand {}", brand.name))
        }
        BrandCommand::Rename { name, new_name } => {
            let brand = app.rename_brand(&name, &new_name).await?;
            out.show(&brand, || format!("renamed {name} to {}", brand.name))
        }
        BrandCommand::Delete { name, yes } => {
            let outcome = app.delete_brand(&name, yes).await?;
            out.deleted(&format!("brand {name}"), outcome);
            Ok(())
        }
    }
}

async fn run_models(
    app: &mut FleetApp,
    out: &Output,
    action: ModelCommand,
) -> Result<()> {
    match action {
        ModelCommand::List => {
            let models = app.list_models().await?;
            out.show(&models, || display::models(&models))
        }
        ModelCommand::Show { model_id } => {
            let reference = app.reference().clone();
            let model = app
                .repository()
                .get_model(model_id)
                .await
                .with_context(|| format!("model {model_id}"))?;
            out.show(&model, || display::model(&model, &reference))
        }
        ModelCommand::Create { edits } => {
            let model = app.create_model(edits).await?;
            let reference = app.reference().clone();
            out.show(&model, || display::model(&model, &reference))
        }
        ModelCommand::Edit { model_id, edits } => {
            let model = app.edit_model(model_id, edits).await?;
            let reference = app.reference().clone();
            out.show(&model, || display::model(&model, &reference))
        }
        ModelCommand::Delete { model_id, yes } => {
            let outcome = app.delete_model(model_id, yes).await?;
            out.deleted(&format!("model {model_id}"), outcome);
            Ok(())
        }
    }
}

async fn run_vehicles(
    app: &mut FleetApp,
    out: &Output,
    action: VehicleCommand,
) -> Result<()> {
    let reference = app.reference().clone();
    match action {
        VehicleCommand::List => {
            let vehicles = app.list_vehicles().await?;
            out.show(&vehicles, || display::vehicles(&vehicles, &reference))
        }
        VehicleCommand::Show { unit_nr } => {
            let vehicle = app
                .repository()
                .get_vehicle(unit_nr)
                .await
                .with_context(|| format!("vehicle {unit_nr}"))?;
            out.show(&vehicle, || display::vehicle(&vehicle, &reference))
        }
        VehicleCommand::Create { edits } => {
            let vehicle = app.create_vehicle(edits).await?;
            out.show(&vehicle, || display::vehicle(&vehicle, &reference))
        }
        VehicleCommand::Edit { unit_nr, edits } => {
            let vehicle = app.edit_vehicle(unit_nr, edits).await?;
            out.show(&vehicle, || display::vehicle(&vehicle, &reference))
        }
        VehicleCommand::Delete { unit_nr, yes } => {
            let outcome = app.delete_vehicle(unit_nr, yes).await?;
            out.deleted(&format!("vehicle {unit_nr}"), outcome);
            Ok(())
        }
    }
}

fn run_catalog(
    app: &FleetApp,
    out: &Output,
    action: CatalogCommand,
) -> Result<()> {
    let catalog = &app.reference().catalog;
    match action {
        CatalogCommand::Brands => {
            let brands = catalog.brands();
            out.show(&brands, || display::names(&brands))
        }
        CatalogCommand::Models { brand } => {
            let models = catalog.models_of(&brand);
            out.show(&models, || display::names(&models))
        }
        CatalogCommand::Versions { brand, model } => {
            let versions = catalog.versions_of(&brand, &model);
            out.show(&versions, || display::versions(&versions))
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = FleetConfig::load(cli.config.as_deref())?.with_overrides(Overrides {
        backend: cli.backend,
        connection_string: cli.db,
        log_level: cli.log_level,
    });
    logging::init(&config.logging)?;

    let db_config = config.db_config();
    debug!(?db_config, "configuration resolved");
    let mut app = FleetApp::connect(&app::build_registry(), &db_config).await?;
    let out = Output { json: cli.json };

    match cli.command {
        Command::Brands { action } => run_brands(&mut app, &out, action).await,
        Command::Models { action } => run_models(&mut app, &out, action).await,
        Command::Vehicles { action } => run_vehicles(&mut app, &out, action).await,
        Command::Catalog { action } => run_catalog(&app, &out, action),
        Command::Quote { base, tax } => {
            let base_amount = parse_amount(&base);
            let derived = app.quote(base_amount, tax);
            out.show(&derived, || {
                display::quote(base_amount, tax, &derived, app.reference())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_flags_keep_command_line_order() {
        let cli = Cli::try_parse_from([
            "fleet",
            "vehicles",
            "create",
            "--set",
            "brand=Toyota",
            "--set",
            "model=Corolla",
            "--set",
            "version=1",
            "--db",
            ":memory:",
        ])
        .unwrap();

        let Command::Vehicles {
            action: VehicleCommand::Create { edits },
        } = cli.command
        else {
            panic!("expected vehicles create");
        };
        assert_eq!(edits.len(), 3);
        assert_eq!(edits[0], parse_vehicle_edit("brand=Toyota").unwrap());
        assert_eq!(edits[2], parse_vehicle_edit("version=1").unwrap());
        assert_eq!(cli.db.as_deref(), Some(":memory:"));
    }

    #[test]
    fn malformed_set_is_rejected_by_the_parser() {
        let result = Cli::try_parse_from(["fleet", "models", "create", "--set", "seats"]);
        assert!(result.is_err());
    }
}
