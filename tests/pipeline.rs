//! Integration tests for the full pipeline against the in-memory store.
//!
//! These cover the contract the remote store cannot be relied on for in
//! CI: pagination termination, idempotent loading, batch splitting,
//! partition isolation, and the end-to-end dedup scenario.

use std::sync::Arc;

use fipe_harness::config::PipelineConfig;
use fipe_harness::error::PipelineError;
use fipe_harness::extract::extract_raw_rows;
use fipe_harness::load::load_catalog;
use fipe_harness::models::{RawVehicleRow, VehicleType};
use fipe_harness::normalize::normalize_rows;
use fipe_harness::pipeline::run_pipeline;
use fipe_harness::store::memory::InMemoryStore;
use fipe_harness::store::postgrest::{MODELS_TABLE, VERSIONS_TABLE};
use fipe_harness::store::CatalogStore;

fn raw(code: &str, brand: &str, model_value: &str) -> RawVehicleRow {
    RawVehicleRow {
        brand_code: Some(code.to_string()),
        brand_value: Some(brand.to_string()),
        model_value: Some(model_value.to_string()),
    }
}

/// `count` distinct raw rows for one brand, each yielding its own model.
fn raw_rows(count: usize) -> Vec<RawVehicleRow> {
    (0..count)
        .map(|i| raw("59", "GM - CHEVROLET", &format!("MODEL{} 1.0 FLEX", i)))
        .collect()
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        page_size: 10,
        model_batch_size: 1000,
        version_batch_size: 500,
        types: VehicleType::ALL.to_vec(),
    }
}

// ─── Pagination ─────────────────────────────────────────────────────

#[tokio::test]
async fn pagination_stops_after_empty_page() {
    let store = InMemoryStore::new();
    // Exactly 3 full pages; page 3 comes back empty.
    store.seed_raw(VehicleType::Car, raw_rows(30));

    let rows = extract_raw_rows(&store, VehicleType::Car, 10).await.unwrap();
    assert_eq!(rows.len(), 30);
    assert_eq!(store.page_requests(), 4);
}

#[tokio::test]
async fn pagination_stops_on_short_page() {
    let store = InMemoryStore::new();
    store.seed_raw(VehicleType::Car, raw_rows(25));

    let rows = extract_raw_rows(&store, VehicleType::Car, 10).await.unwrap();
    assert_eq!(rows.len(), 25);
    // Pages 0 and 1 are full; page 2 is short and terminates the read.
    assert_eq!(store.page_requests(), 3);
}

#[tokio::test]
async fn extraction_error_aborts_partition() {
    let store = InMemoryStore::new();
    store.seed_raw(VehicleType::Car, raw_rows(5));
    store.fail_extraction_for(VehicleType::Car);

    let err = extract_raw_rows(&store, VehicleType::Car, 10)
        .await
        .unwrap_err();
    assert_eq!(err.vehicle_type, VehicleType::Car);
    assert_eq!(err.page, 0);
}

// ─── Loading ────────────────────────────────────────────────────────

#[tokio::test]
async fn load_is_idempotent() {
    let store = InMemoryStore::new();
    let rows = vec![
        raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
        raw("59", "GM - CHEVROLET", "ONIX 1.0 TURBO"),
        raw("21", "FIAT - FIAT", "ARGO HATCH"),
    ];
    let catalog = normalize_rows(VehicleType::Car, &rows);
    let config = small_config();

    load_catalog(&store, &catalog, &config).await.unwrap();
    let brands_first = store.brand_rows();
    let models_first = store.model_rows();
    let versions_first = store.version_rows();

    // Second load with identical input: no new rows, identical values.
    load_catalog(&store, &catalog, &config).await.unwrap();
    assert_eq!(store.brand_rows(), brands_first);
    assert_eq!(store.model_rows(), models_first);
    assert_eq!(store.version_rows(), versions_first);
}

#[tokio::test]
async fn loader_splits_into_bounded_batches() {
    let store = InMemoryStore::new();
    let rows = raw_rows(2500);
    let catalog = normalize_rows(VehicleType::Car, &rows);
    assert_eq!(catalog.models.len(), 2500);
    assert_eq!(catalog.versions.len(), 2500);

    let config = small_config();
    let report = load_catalog(&store, &catalog, &config).await.unwrap();

    assert_eq!(report.models_written, 2500);
    // 2500 models at 1000/batch → 3 calls; 2500 versions at 500/batch → 5.
    assert_eq!(store.upsert_calls(MODELS_TABLE), 3);
    assert_eq!(store.upsert_calls(VERSIONS_TABLE), 5);
}

#[tokio::test]
async fn load_error_keeps_committed_batches() {
    let store = InMemoryStore::new();
    let rows = raw_rows(1200);
    let catalog = normalize_rows(VehicleType::Car, &rows);
    let config = small_config();

    // First versions batch succeeds, second fails.
    store.fail_upserts_into(VERSIONS_TABLE, 1);

    let err = load_catalog(&store, &catalog, &config).await.unwrap_err();
    assert_eq!(err.table, VERSIONS_TABLE);
    assert_eq!(err.batch_start, 500);
    assert_eq!(err.batch_end, 1000);

    // The first batch stays committed; nothing was rolled back.
    assert_eq!(store.version_rows().len(), 500);
    // Models loaded fully before the versions failure.
    assert_eq!(store.model_rows().len(), 1200);
}

// ─── Orchestration ──────────────────────────────────────────────────

#[tokio::test]
async fn failing_partition_does_not_stop_the_others() {
    let store = InMemoryStore::new();
    store.seed_raw(VehicleType::Car, vec![raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX")]);
    store.seed_raw(VehicleType::Truck, vec![raw("102", "VOLVO", "FH 540 DIESEL")]);
    store.fail_extraction_for(VehicleType::Motorcycle);

    let outcome = run_pipeline(&store, &small_config()).await;

    assert!(!outcome.is_success());
    let processed: Vec<_> = outcome.summaries.iter().map(|s| s.vehicle_type).collect();
    assert_eq!(processed, vec![VehicleType::Car, VehicleType::Truck]);

    assert_eq!(outcome.failures.len(), 1);
    let (failed_type, error) = &outcome.failures[0];
    assert_eq!(*failed_type, VehicleType::Motorcycle);
    assert!(matches!(error, PipelineError::Extraction(_)));
}

#[tokio::test]
async fn empty_partition_reports_zero_counts() {
    let store = InMemoryStore::new();
    let mut config = small_config();
    config.types = vec![VehicleType::Truck];

    let outcome = run_pipeline(&store, &config).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.summaries.len(), 1);
    let summary = &outcome.summaries[0];
    assert_eq!(summary.rows_read, 0);
    assert_eq!(summary.brands_written, 0);
    // No upserts at all for an empty partition.
    assert_eq!(store.upsert_calls(MODELS_TABLE), 0);
}

#[tokio::test]
async fn duplicate_raw_rows_produce_single_records_end_to_end() {
    let store = InMemoryStore::new();
    store.seed_raw(
        VehicleType::Car,
        vec![
            raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
            raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
        ],
    );
    let mut config = small_config();
    config.types = vec![VehicleType::Car];

    let outcome = run_pipeline(&store, &config).await;
    assert!(outcome.is_success());

    let summary = &outcome.summaries[0];
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.brands_written, 1);
    assert_eq!(summary.models_written, 1);
    assert_eq!(summary.versions_written, 1);

    let brands = store.brand_rows();
    assert_eq!(brands.len(), 1);
    assert_eq!(brands[0].vehicle_type, VehicleType::Car);
    assert_eq!(brands[0].brand_code, "59");
    assert_eq!(brands[0].brand_value, "CHEVROLET");

    let models = store.model_rows();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].model_name, "ONIX");

    let versions = store.version_rows();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].model_name, "ONIX");
    assert_eq!(versions[0].version, "1.0 FLEX");
    assert_eq!(versions[0].categoria, None);
    assert_eq!(versions[0].combustivel.as_deref(), Some("Flex"));
}

#[tokio::test]
async fn rerunning_the_pipeline_changes_nothing() {
    let store = InMemoryStore::new();
    store.seed_raw(
        VehicleType::Car,
        vec![
            raw("59", "GM - CHEVROLET", "TRACKER SUV FLEX"),
            raw("21", "FIAT - FIAT", "TORO PICKUP DIESEL"),
        ],
    );
    let mut config = small_config();
    config.types = vec![VehicleType::Car];

    let first = run_pipeline(&store, &config).await;
    assert!(first.is_success());
    let versions_first = store.version_rows();
    assert_eq!(versions_first.len(), 2);
    assert_eq!(versions_first[0].categoria.as_deref(), Some("Caminhonete"));
    assert_eq!(versions_first[1].categoria.as_deref(), Some("SUV"));

    let second = run_pipeline(&store, &config).await;
    assert!(second.is_success());
    assert_eq!(store.version_rows(), versions_first);
    assert_eq!(store.brand_rows().len(), 2);
}

// ─── Lookups ────────────────────────────────────────────────────────

#[tokio::test]
async fn lookups_read_back_the_normalized_tables() {
    let store = Arc::new(InMemoryStore::new());
    store.seed_raw(
        VehicleType::Car,
        vec![
            raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
            raw("59", "GM - CHEVROLET", "ONIX 1.0 TURBO"),
            raw("21", "FIAT - FIAT", "ARGO 1.3 HATCH"),
        ],
    );
    let mut config = small_config();
    config.types = vec![VehicleType::Car];
    assert!(run_pipeline(store.as_ref(), &config).await.is_success());

    let brands = store.list_brands(VehicleType::Car).await.unwrap();
    let names: Vec<_> = brands.iter().map(|b| b.brand_value.as_str()).collect();
    assert_eq!(names, vec!["CHEVROLET", "FIAT"]);

    let models = store.list_models(VehicleType::Car, "59").await.unwrap();
    assert_eq!(models, vec!["ONIX".to_string()]);

    let versions = store
        .list_versions(VehicleType::Car, Some("59"), Some("ONIX"))
        .await
        .unwrap();
    let labels: Vec<_> = versions.iter().map(|v| v.version.as_str()).collect();
    assert_eq!(labels, vec!["1.0 FLEX", "1.0 TURBO"]);

    // Other partitions stay empty.
    assert!(store
        .list_brands(VehicleType::Motorcycle)
        .await
        .unwrap()
        .is_empty());
}
