//! Pipeline orchestration.
//!
//! Runs extract → normalize → load once per vehicle type, sequentially
//! and in a fixed order. Types are independent partitions with no shared
//! state, so one type's failure is recorded and the remaining types are
//! still processed (continue-and-aggregate); the caller decides how to
//! surface a mixed outcome.
//!
//! Everything is awaited in order — this runs as an infrequent
//! administrative job, and ordered logs are worth more here than
//! parallel throughput.

use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::extract::extract_raw_rows;
use crate::load::load_catalog;
use crate::models::{TypeSummary, VehicleType};
use crate::normalize::normalize_rows;
use crate::store::CatalogStore;

/// Aggregate result of one pipeline invocation.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    /// Summaries of the types that completed, in processing order.
    pub summaries: Vec<TypeSummary>,
    /// Failures per type, in processing order.
    pub failures: Vec<(VehicleType, PipelineError)>,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the full pipeline over the configured vehicle types.
pub async fn run_pipeline(store: &dyn CatalogStore, config: &PipelineConfig) -> PipelineOutcome {
    let mut outcome = PipelineOutcome::default();

    for &vehicle_type in &config.types {
        info!(vehicle_type = %vehicle_type, "processing partition");
        match process_type(store, vehicle_type, config).await {
            Ok(summary) => {
                info!(
                    vehicle_type = %vehicle_type,
                    rows_read = summary.rows_read,
                    brands = summary.brands_written,
                    models = summary.models_written,
                    versions = summary.versions_written,
                    "partition complete"
                );
                outcome.summaries.push(summary);
            }
            Err(e) => {
                error!(vehicle_type = %vehicle_type, error = %e, "partition failed");
                outcome.failures.push((vehicle_type, e));
            }
        }
    }

    outcome
}

/// Extract, normalize, and load one partition.
async fn process_type(
    store: &dyn CatalogStore,
    vehicle_type: VehicleType,
    config: &PipelineConfig,
) -> Result<TypeSummary, PipelineError> {
    let rows = extract_raw_rows(store, vehicle_type, config.page_size).await?;
    info!(vehicle_type = %vehicle_type, rows = rows.len(), "extraction complete");

    if rows.is_empty() {
        return Ok(TypeSummary {
            vehicle_type,
            rows_read: 0,
            brands_written: 0,
            models_written: 0,
            versions_written: 0,
        });
    }

    let catalog = normalize_rows(vehicle_type, &rows);
    info!(
        vehicle_type = %vehicle_type,
        brands = catalog.brands.len(),
        models = catalog.models.len(),
        versions = catalog.versions.len(),
        "normalization complete"
    );

    let report = load_catalog(store, &catalog, config).await?;

    Ok(TypeSummary {
        vehicle_type,
        rows_read: rows.len(),
        brands_written: report.brands_written,
        models_written: report.models_written,
        versions_written: report.versions_written,
    })
}
