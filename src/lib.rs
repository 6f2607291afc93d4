//! # FIPE Harness
//!
//! Ingestion and normalization pipeline for the FIPE vehicle price
//! table, plus the catalog lookup API the storefront consumes.
//!
//! The raw FIPE table is one wide flat row per (vehicle type, brand,
//! "model value") combination. The pipeline reads it in pages, splits
//! each model value into a canonical model name and trailing version
//! string, classifies body category and fuel from keyword vocabularies,
//! deduplicates into three normalized collections, and bulk-upserts
//! them in bounded batches — idempotently, so the job is safe to
//! re-trigger at any time.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌─────────────┐
//! │ raw table │──▶│ Extractor │──▶│ Normalizer │──▶│   Loader    │
//! │  (paged)  │   │ per type  │   │ dedup maps │   │ batch upsert│
//! └───────────┘   └───────────┘   └────────────┘   └──────┬──────┘
//!                                                         │
//!                                      brands / models / versions
//!                                                         │
//!                            ┌────────────────────────────┤
//!                            ▼                            ▼
//!                      ┌──────────┐                ┌──────────┐
//!                      │   CLI    │                │   HTTP   │
//!                      │  (fipe)  │                │ lookups  │
//!                      └──────────┘                └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Pipeline error taxonomy |
//! | [`store`] | Structured-store abstraction (remote + in-memory) |
//! | [`extract`] | Paginated raw-table extractor |
//! | [`normalize`] | Model/version split, classification, dedup |
//! | [`load`] | Batched idempotent loader |
//! | [`pipeline`] | Per-type orchestration |
//! | [`server`] | HTTP trigger and lookup endpoints |

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod server;
pub mod store;
