//! Storage abstraction for the FIPE catalog.
//!
//! The [`CatalogStore`] trait defines every store operation the pipeline
//! and the lookup endpoints need, keeping the remote structured store an
//! opaque collaborator and enabling an in-memory backend in tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{BrandRecord, ModelRecord, RawVehicleRow, VehicleType, VersionRecord};

/// Abstract structured-store backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`fetch_raw_page`](CatalogStore::fetch_raw_page) | Read one page of raw FIPE rows for a partition |
/// | [`upsert_brands`](CatalogStore::upsert_brands) | Upsert one batch of brands (conflict key: type, brand_code) |
/// | [`upsert_models`](CatalogStore::upsert_models) | Upsert one batch of models (conflict key: type, brand_code, model_name) |
/// | [`upsert_versions`](CatalogStore::upsert_versions) | Upsert one batch of versions (conflict key: type, brand_code, model_name, version) |
/// | [`list_brands`](CatalogStore::list_brands) | Read normalized brands for a partition, ordered by name |
/// | [`list_models`](CatalogStore::list_models) | Read model names for a brand, ordered by name |
/// | [`list_versions`](CatalogStore::list_versions) | Read versions for a partition (optionally one brand/model), ordered by version |
///
/// Upserts must use overwrite-on-conflict semantics against the declared
/// composite key: re-submitting an unchanged batch creates no new rows
/// and leaves column values identical.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Read page `page` (offset `page * page_size`, limit `page_size`)
    /// of raw rows for one vehicle type.
    async fn fetch_raw_page(
        &self,
        vehicle_type: VehicleType,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<RawVehicleRow>, StoreError>;

    /// Upsert one batch of brand records.
    async fn upsert_brands(&self, records: &[BrandRecord]) -> Result<(), StoreError>;

    /// Upsert one batch of model records.
    async fn upsert_models(&self, records: &[ModelRecord]) -> Result<(), StoreError>;

    /// Upsert one batch of version records.
    async fn upsert_versions(&self, records: &[VersionRecord]) -> Result<(), StoreError>;

    /// All normalized brands for a partition, ordered by brand name.
    async fn list_brands(&self, vehicle_type: VehicleType) -> Result<Vec<BrandRecord>, StoreError>;

    /// Model names for one brand, ordered alphabetically.
    async fn list_models(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Versions for a partition, optionally narrowed to one brand and
    /// one model, ordered by version string.
    async fn list_versions(
        &self,
        vehicle_type: VehicleType,
        brand_code: Option<&str>,
        model_name: Option<&str>,
    ) -> Result<Vec<VersionRecord>, StoreError>;
}
