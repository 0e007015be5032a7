use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use fleet_data::{CatalogLoader, TaxRateLoader};
use fleet_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load tax rates and the vehicle catalog from CSV files into the database.
///
/// Tax rate files have the columns `id,label,percent_value`.
/// Catalog files have the columns
/// `brand,model,version,fuel_type,base_price,tax_id`.
#[derive(Parser, Debug)]
#[command(name = "fleet-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// SQLite database URL (e.g., sqlite:fleet.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:fleet.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,

    /// CSV file with tax rates
    #[arg(short, long)]
    taxes: Option<PathBuf>,

    /// CSV file with brand/model/version rows
    #[arg(short, long)]
    catalog: Option<PathBuf>,
}

fn open_csv(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("cannot open {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if args.taxes.is_none() && args.catalog.is_none() && !args.migrate && args.seeds.is_none() {
        bail!("nothing to do: pass --taxes, --catalog, --migrate or --seeds");
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    // Taxes first so catalog prices derive against the new rates.
    if let Some(path) = &args.taxes {
        let records = TaxRateLoader::parse(open_csv(path)?)
            .with_context(|| format!("invalid tax rate file {}", path.display()))?;
        let loaded = TaxRateLoader::load(&repo, &records)
            .await
            .context("Failed to load tax rates into database")?;
        println!("Loaded {} tax rates.", loaded);
    }

    if let Some(path) = &args.catalog {
        let records = CatalogLoader::parse(open_csv(path)?)
            .with_context(|| format!("invalid catalog file {}", path.display()))?;
        println!("Parsed {} catalog rows", records.len());

        let summary = CatalogLoader::load(&repo, &records)
            .await
            .context("Failed to load catalog into database")?;
        println!(
            "Catalog loaded: {} brands created, {} models created, {} updated, {} unchanged.",
            summary.brands_created,
            summary.models_created,
            summary.models_updated,
            summary.models_unchanged
        );
    }

    Ok(())
}
