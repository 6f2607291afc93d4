//! Error taxonomy for the ingestion pipeline.
//!
//! Store-level faults surface as [`StoreError`]; the pipeline wraps them
//! with stage context: [`ExtractionError`] for paged reads (fatal to a
//! partition before anything is written) and [`LoadError`] for batch
//! upserts (fatal to the remaining batches of one collection, while
//! already-committed batches stay in place).

use thiserror::Error;

use crate::models::VehicleType;

/// A failure talking to the structured store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
}

/// A paged read failed. The whole partition aborts; no partial result
/// is kept, since re-running the pipeline is idempotent.
#[derive(Debug, Error)]
#[error("extraction for {vehicle_type} failed at page {page}: {source}")]
pub struct ExtractionError {
    pub vehicle_type: VehicleType,
    pub page: usize,
    #[source]
    pub source: StoreError,
}

/// A batch upsert failed. Carries the failed batch's index range within
/// the collection so the operator can see how far loading got.
#[derive(Debug, Error)]
#[error("load into {table} failed for batch {batch_start}..{batch_end}: {source}")]
pub struct LoadError {
    pub table: &'static str,
    pub batch_start: usize,
    pub batch_end: usize,
    #[source]
    pub source: StoreError,
}

/// Any failure that aborts one vehicle type's processing.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Load(#[from] LoadError),
}
