//! In-memory [`CatalogStore`] implementation for testing.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Raw rows are seeded per vehicle type and served back in pages; upserts
//! land in keyed maps, so overwrite-on-conflict falls out of `insert`.
//!
//! The store also counts page requests and upsert calls per table, and
//! can be told to fail extraction for one partition or upserts into one
//! table — enough to exercise the pipeline's error paths without a
//! remote store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{BrandRecord, ModelRecord, RawVehicleRow, VehicleType, VersionRecord};

use super::postgrest;
use super::CatalogStore;

#[derive(Default)]
struct Counters {
    page_requests: usize,
    upsert_calls: HashMap<&'static str, usize>,
}

#[derive(Default)]
struct Failures {
    fetch_for: Option<VehicleType>,
    /// Upserts into this table fail once the table has already received
    /// the given number of successful calls.
    upserts_into: Option<(&'static str, usize)>,
}

/// In-memory store for tests.
#[derive(Default)]
pub struct InMemoryStore {
    raw: RwLock<HashMap<VehicleType, Vec<RawVehicleRow>>>,
    brands: RwLock<HashMap<(VehicleType, String), BrandRecord>>,
    models: RwLock<HashMap<(VehicleType, String, String), ModelRecord>>,
    versions: RwLock<HashMap<(VehicleType, String, String, String), VersionRecord>>,
    counters: RwLock<Counters>,
    failures: RwLock<Failures>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw rows for one partition.
    pub fn seed_raw(&self, vehicle_type: VehicleType, rows: Vec<RawVehicleRow>) {
        self.raw.write().unwrap().insert(vehicle_type, rows);
    }

    /// Make every raw-page fetch for `vehicle_type` fail.
    pub fn fail_extraction_for(&self, vehicle_type: VehicleType) {
        self.failures.write().unwrap().fetch_for = Some(vehicle_type);
    }

    /// Make upserts into `table` fail after `after_calls` successful calls.
    pub fn fail_upserts_into(&self, table: &'static str, after_calls: usize) {
        self.failures.write().unwrap().upserts_into = Some((table, after_calls));
    }

    /// Number of raw-page requests served (including failed ones).
    pub fn page_requests(&self) -> usize {
        self.counters.read().unwrap().page_requests
    }

    /// Number of successful upsert calls received for `table`.
    pub fn upsert_calls(&self, table: &str) -> usize {
        self.counters
            .read()
            .unwrap()
            .upsert_calls
            .get(table)
            .copied()
            .unwrap_or(0)
    }

    pub fn brand_rows(&self) -> Vec<BrandRecord> {
        let mut rows: Vec<_> = self.brands.read().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| a.brand_code.cmp(&b.brand_code));
        rows
    }

    pub fn model_rows(&self) -> Vec<ModelRecord> {
        let mut rows: Vec<_> = self.models.read().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| (&a.brand_code, &a.model_name).cmp(&(&b.brand_code, &b.model_name)));
        rows
    }

    pub fn version_rows(&self) -> Vec<VersionRecord> {
        let mut rows: Vec<_> = self.versions.read().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| {
            (&a.brand_code, &a.model_name, &a.version).cmp(&(&b.brand_code, &b.model_name, &b.version))
        });
        rows
    }

    /// Checks the injected failure for `table` and, when the call is
    /// allowed through, records it in the counters.
    fn admit_upsert(&self, table: &'static str) -> Result<(), StoreError> {
        let failures = self.failures.read().unwrap();
        if let Some((failing_table, after_calls)) = failures.upserts_into {
            if failing_table == table && self.upsert_calls(table) >= after_calls {
                return Err(StoreError::Backend(format!(
                    "injected upsert failure for {}",
                    table
                )));
            }
        }
        drop(failures);
        *self
            .counters
            .write()
            .unwrap()
            .upsert_calls
            .entry(table)
            .or_insert(0) += 1;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn fetch_raw_page(
        &self,
        vehicle_type: VehicleType,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<RawVehicleRow>, StoreError> {
        self.counters.write().unwrap().page_requests += 1;

        if self.failures.read().unwrap().fetch_for == Some(vehicle_type) {
            return Err(StoreError::Backend(format!(
                "injected fetch failure for {}",
                vehicle_type
            )));
        }

        let raw = self.raw.read().unwrap();
        let rows = match raw.get(&vehicle_type) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        let start = page * page_size;
        if start >= rows.len() {
            return Ok(Vec::new());
        }
        let end = (start + page_size).min(rows.len());
        Ok(rows[start..end].to_vec())
    }

    async fn upsert_brands(&self, records: &[BrandRecord]) -> Result<(), StoreError> {
        self.admit_upsert(postgrest::BRANDS_TABLE)?;
        let mut brands = self.brands.write().unwrap();
        for record in records {
            brands.insert(
                (record.vehicle_type, record.brand_code.clone()),
                record.clone(),
            );
        }
        Ok(())
    }

    async fn upsert_models(&self, records: &[ModelRecord]) -> Result<(), StoreError> {
        self.admit_upsert(postgrest::MODELS_TABLE)?;
        let mut models = self.models.write().unwrap();
        for record in records {
            models.insert(
                (
                    record.vehicle_type,
                    record.brand_code.clone(),
                    record.model_name.clone(),
                ),
                record.clone(),
            );
        }
        Ok(())
    }

    async fn upsert_versions(&self, records: &[VersionRecord]) -> Result<(), StoreError> {
        self.admit_upsert(postgrest::VERSIONS_TABLE)?;
        let mut versions = self.versions.write().unwrap();
        for record in records {
            versions.insert(
                (
                    record.vehicle_type,
                    record.brand_code.clone(),
                    record.model_name.clone(),
                    record.version.clone(),
                ),
                record.clone(),
            );
        }
        Ok(())
    }

    async fn list_brands(&self, vehicle_type: VehicleType) -> Result<Vec<BrandRecord>, StoreError> {
        let mut rows: Vec<_> = self
            .brands
            .read()
            .unwrap()
            .values()
            .filter(|b| b.vehicle_type == vehicle_type)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.brand_value.cmp(&b.brand_value));
        Ok(rows)
    }

    async fn list_models(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<_> = self
            .models
            .read()
            .unwrap()
            .values()
            .filter(|m| m.vehicle_type == vehicle_type && m.brand_code == brand_code)
            .map(|m| m.model_name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_versions(
        &self,
        vehicle_type: VehicleType,
        brand_code: Option<&str>,
        model_name: Option<&str>,
    ) -> Result<Vec<VersionRecord>, StoreError> {
        let mut rows: Vec<_> = self
            .versions
            .read()
            .unwrap()
            .values()
            .filter(|v| {
                v.vehicle_type == vehicle_type
                    && brand_code.map_or(true, |c| v.brand_code == c)
                    && model_name.map_or(true, |m| v.model_name == m)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(rows)
    }
}
