//! Batched loader for the normalized collections.
//!
//! Each collection goes to its destination table via upserts against a
//! declared composite conflict key, so re-running the loader with
//! unchanged input produces no new rows and identical column values.
//!
//! Brand counts are small enough for a single call; models and versions
//! are split into bounded batches to stay under the store's request-size
//! limits. Batches are submitted sequentially — a failure aborts the
//! remaining batches of that collection but leaves the committed ones,
//! which the next run repeats idempotently.

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{LoadError, StoreError};
use crate::normalize::NormalizedCatalog;
use crate::store::postgrest::{BRANDS_TABLE, MODELS_TABLE, VERSIONS_TABLE};
use crate::store::CatalogStore;

/// Counts of distinct records written per collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadReport {
    pub brands_written: usize,
    pub models_written: usize,
    pub versions_written: usize,
}

/// Upsert all three collections of one partition's catalog.
pub async fn load_catalog(
    store: &dyn CatalogStore,
    catalog: &NormalizedCatalog,
    config: &PipelineConfig,
) -> Result<LoadReport, LoadError> {
    if !catalog.brands.is_empty() {
        info!(count = catalog.brands.len(), "upserting brands");
        store
            .upsert_brands(&catalog.brands)
            .await
            .map_err(|source| batch_error(BRANDS_TABLE, 0, catalog.brands.len(), source))?;
    }

    load_batched(
        MODELS_TABLE,
        &catalog.models,
        config.model_batch_size,
        |batch| store.upsert_models(batch),
    )
    .await?;

    load_batched(
        VERSIONS_TABLE,
        &catalog.versions,
        config.version_batch_size,
        |batch| store.upsert_versions(batch),
    )
    .await?;

    Ok(LoadReport {
        brands_written: catalog.brands.len(),
        models_written: catalog.models.len(),
        versions_written: catalog.versions.len(),
    })
}

/// Submit `records` in sequential batches of `batch_size`, mapping a
/// failure to a [`LoadError`] carrying the batch's index range.
async fn load_batched<'a, T, F, Fut>(
    table: &'static str,
    records: &'a [T],
    batch_size: usize,
    mut upsert: F,
) -> Result<(), LoadError>
where
    F: FnMut(&'a [T]) -> Fut,
    Fut: std::future::Future<Output = Result<(), StoreError>>,
{
    if records.is_empty() {
        return Ok(());
    }

    info!(
        count = records.len(),
        batch_size, table, "upserting in batches"
    );

    for (index, batch) in records.chunks(batch_size).enumerate() {
        let start = index * batch_size;
        upsert(batch)
            .await
            .map_err(|source| batch_error(table, start, start + batch.len(), source))?;
        info!(table, start, end = start + batch.len(), "batch upserted");
    }

    Ok(())
}

fn batch_error(
    table: &'static str,
    batch_start: usize,
    batch_end: usize,
    source: StoreError,
) -> LoadError {
    LoadError {
        table,
        batch_start,
        batch_end,
        source,
    }
}
