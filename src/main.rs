//! # FIPE Harness CLI (`fipe`)
//!
//! The `fipe` binary drives the catalog pipeline and reads the
//! normalized tables.
//!
//! ## Usage
//!
//! ```bash
//! fipe --config ./config/fipe.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fipe process` | Run extract → normalize → load for every configured vehicle type |
//! | `fipe serve` | Start the HTTP server (trigger + lookup endpoints) |
//! | `fipe brands` | List normalized brands for a vehicle type |
//! | `fipe models` | List model names for a brand |
//! | `fipe versions` | List versions for a brand (optionally one model) |
//!
//! ## Examples
//!
//! ```bash
//! # Reprocess only cars and trucks
//! fipe process --types CAR,TRUCK
//!
//! # Brand autocomplete data for motorcycles
//! fipe brands --type MOTORCYCLE
//!
//! # Versions of one model
//! fipe versions --type CAR --brand 59 --model ONIX
//! ```

mod config;
mod error;
mod extract;
mod load;
mod models;
mod normalize;
mod pipeline;
mod server;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use config::{load_config, Config};
use models::VehicleType;
use pipeline::run_pipeline;
use store::postgrest::PostgrestStore;
use store::CatalogStore;

/// FIPE Harness — vehicle-catalog ingestion and normalization pipeline.
#[derive(Parser)]
#[command(
    name = "fipe",
    about = "FIPE Harness — vehicle-catalog ingestion and normalization pipeline",
    version,
    long_about = "Reads the raw FIPE table from the structured store in pages, normalizes it \
    into deduplicated brand/model/version tables via idempotent batched upserts, and serves \
    the catalog lookups the storefront autocomplete UIs consume."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fipe.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion pipeline.
    ///
    /// Processes each configured vehicle type sequentially. A type's
    /// failure is reported but does not stop the remaining types; the
    /// command exits non-zero if any type failed.
    Process {
        /// Comma-separated vehicle types to process (default: the
        /// configured list, normally CAR,MOTORCYCLE,TRUCK).
        #[arg(long, value_delimiter = ',')]
        types: Option<Vec<String>>,
    },

    /// Start the HTTP server.
    ///
    /// Exposes `POST /process` as the pipeline trigger plus the
    /// `GET /fipe/*` lookup endpoints.
    Serve,

    /// List normalized brands for a vehicle type.
    Brands {
        /// Vehicle type (CAR, MOTORCYCLE, or TRUCK).
        #[arg(long = "type", default_value = "CAR")]
        vehicle_type: String,
    },

    /// List model names for one brand.
    Models {
        /// Vehicle type (CAR, MOTORCYCLE, or TRUCK).
        #[arg(long = "type", default_value = "CAR")]
        vehicle_type: String,

        /// Brand code (as stored, e.g. 59).
        #[arg(long)]
        brand: String,
    },

    /// List versions for one brand, optionally narrowed to one model.
    Versions {
        /// Vehicle type (CAR, MOTORCYCLE, or TRUCK).
        #[arg(long = "type", default_value = "CAR")]
        vehicle_type: String,

        /// Brand code (as stored, e.g. 59).
        #[arg(long)]
        brand: String,

        /// Model name (e.g. ONIX).
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let store: Arc<dyn CatalogStore> = Arc::new(PostgrestStore::new(&config.store)?);

    match cli.command {
        Commands::Process { types } => run_process(&config, store.as_ref(), types).await,
        Commands::Serve => server::run_server(&config, store).await,
        Commands::Brands { vehicle_type } => {
            let tipo = parse_type(&vehicle_type)?;
            let brands = store.list_brands(tipo).await?;
            println!("{:<12} BRAND", "CODE");
            for brand in &brands {
                println!("{:<12} {}", brand.brand_code, brand.brand_value);
            }
            println!("total: {}", brands.len());
            Ok(())
        }
        Commands::Models {
            vehicle_type,
            brand,
        } => {
            let tipo = parse_type(&vehicle_type)?;
            let models = store.list_models(tipo, &brand).await?;
            for model in &models {
                println!("{}", model);
            }
            println!("total: {}", models.len());
            Ok(())
        }
        Commands::Versions {
            vehicle_type,
            brand,
            model,
        } => {
            let tipo = parse_type(&vehicle_type)?;
            let versions = store
                .list_versions(tipo, Some(&brand), model.as_deref())
                .await?;
            println!("{:<40} {:<14} FUEL", "VERSION", "CATEGORY");
            for version in &versions {
                println!(
                    "{:<40} {:<14} {}",
                    version.version,
                    version.categoria.as_deref().unwrap_or("-"),
                    version.combustivel.as_deref().unwrap_or("-")
                );
            }
            println!("total: {}", versions.len());
            Ok(())
        }
    }
}

fn parse_type(raw: &str) -> Result<VehicleType> {
    raw.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Run the pipeline from the CLI and print the per-type summary.
async fn run_process(
    config: &Config,
    store: &dyn CatalogStore,
    types: Option<Vec<String>>,
) -> Result<()> {
    let mut pipeline_config = config.pipeline.clone();
    if let Some(types) = types {
        pipeline_config.types = types
            .iter()
            .map(|t| parse_type(t))
            .collect::<Result<Vec<_>>>()?;
    }

    let outcome = run_pipeline(store, &pipeline_config).await;

    for summary in &outcome.summaries {
        println!("{}", summary.vehicle_type);
        println!("  rows read: {}", summary.rows_read);
        println!("  brands written: {}", summary.brands_written);
        println!("  models written: {}", summary.models_written);
        println!("  versions written: {}", summary.versions_written);
    }

    if outcome.is_success() {
        println!("ok");
        return Ok(());
    }

    for (vehicle_type, error) in &outcome.failures {
        eprintln!("{} failed: {}", vehicle_type, error);
    }
    anyhow::bail!("{} vehicle type(s) failed", outcome.failures.len())
}
