//! HTTP trigger and catalog lookup API.
//!
//! The pipeline runs as a manually-triggered admin operation, so the
//! server exposes exactly one mutating endpoint plus the read-only
//! lookups the storefront autocomplete UIs consume.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/process` | Run the full pipeline; JSON summary per type |
//! | `GET`  | `/fipe/marcas` | Brands for a type (`?tipo=CAR`) |
//! | `GET`  | `/fipe/modelos` | Model names (`?tipo=&brand_code=`) |
//! | `GET`  | `/fipe/versoes` | Versions (`?tipo=&brand_code=&modelo=`) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Errors are JSON: `{ "error": "...", "details": "..." }`. `/process`
//! has no partial-success 2xx — if any vehicle type fails, the response
//! is a 500 that still lists the summaries of the types that succeeded.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the lookups serve
//! browser-based storefront clients directly.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::models::{TypeSummary, VehicleType};
use crate::pipeline::run_pipeline;
use crate::store::CatalogStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<dyn CatalogStore>,
}

/// Starts the HTTP server on the configured bind address.
///
/// The store is passed in explicitly (rather than constructed from
/// ambient state) so callers — including tests — choose the backend.
pub async fn run_server(config: &Config, store: Arc<dyn CatalogStore>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/process", post(handle_process))
        .route("/fipe/marcas", get(handle_marcas))
        .route("/fipe/modelos", get(handle_modelos))
        .route("/fipe/versoes", get(handle_versoes))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!("FIPE server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

struct AppError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        error: message.into(),
        details: None,
    }
}

fn store_error(err: crate::error::StoreError) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        error: "store query failed".to_string(),
        details: Some(err.to_string()),
    }
}

// ============ POST /process ============

/// JSON response body for a fully successful run.
#[derive(Serialize)]
struct ProcessResponse {
    success: bool,
    results: Vec<TypeSummary>,
}

/// JSON response body when at least one type failed. Summaries of the
/// types that succeeded are still included.
#[derive(Serialize)]
struct ProcessFailureResponse {
    error: String,
    details: String,
    results: Vec<TypeSummary>,
}

/// Handler for `POST /process`.
///
/// Runs the whole pipeline over the configured vehicle types. No body
/// is required; the trigger is idempotent and safe to re-invoke.
async fn handle_process(State(state): State<AppState>) -> Response {
    info!("pipeline triggered over HTTP");
    let outcome = run_pipeline(state.store.as_ref(), &state.config.pipeline).await;

    if outcome.is_success() {
        return Json(ProcessResponse {
            success: true,
            results: outcome.summaries,
        })
        .into_response();
    }

    let details = outcome
        .failures
        .iter()
        .map(|(_, e)| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ProcessFailureResponse {
            error: "FIPE processing failed".to_string(),
            details,
            results: outcome.summaries,
        }),
    )
        .into_response()
}

// ============ GET /fipe/* lookups ============

#[derive(Deserialize)]
struct LookupParams {
    tipo: Option<String>,
    brand_code: Option<String>,
    modelo: Option<String>,
}

/// Parse the `tipo` query parameter, defaulting to CAR.
fn parse_tipo(params: &LookupParams) -> Result<VehicleType, AppError> {
    match &params.tipo {
        Some(raw) => raw.parse().map_err(bad_request),
        None => Ok(VehicleType::Car),
    }
}

#[derive(Serialize)]
struct MarcaItem {
    brand_code: String,
    brand_value: String,
}

#[derive(Serialize)]
struct MarcasResponse {
    marcas: Vec<MarcaItem>,
    total: usize,
}

async fn handle_marcas(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<MarcasResponse>, AppError> {
    let tipo = parse_tipo(&params)?;
    let brands = state.store.list_brands(tipo).await.map_err(store_error)?;

    let marcas: Vec<MarcaItem> = brands
        .into_iter()
        .map(|b| MarcaItem {
            brand_code: b.brand_code,
            brand_value: b.brand_value,
        })
        .collect();
    let total = marcas.len();
    Ok(Json(MarcasResponse { marcas, total }))
}

#[derive(Serialize)]
struct ModelosResponse {
    modelos: Vec<String>,
    total: usize,
}

async fn handle_modelos(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<ModelosResponse>, AppError> {
    let tipo = parse_tipo(&params)?;
    let brand_code = params
        .brand_code
        .as_deref()
        .ok_or_else(|| bad_request("brand_code obrigatório"))?;

    let modelos = state
        .store
        .list_models(tipo, brand_code)
        .await
        .map_err(store_error)?;
    let total = modelos.len();
    Ok(Json(ModelosResponse { modelos, total }))
}

#[derive(Serialize)]
struct VersaoItem {
    versao: String,
    categoria: Option<String>,
    combustivel: Option<String>,
}

#[derive(Serialize)]
struct VersoesResponse {
    versoes: Vec<VersaoItem>,
    total: usize,
}

async fn handle_versoes(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<VersoesResponse>, AppError> {
    let tipo = parse_tipo(&params)?;
    let versions = state
        .store
        .list_versions(tipo, params.brand_code.as_deref(), params.modelo.as_deref())
        .await
        .map_err(store_error)?;

    let versoes: Vec<VersaoItem> = versions
        .into_iter()
        .map(|v| VersaoItem {
            versao: v.version,
            categoria: v.categoria,
            combustivel: v.combustivel,
        })
        .collect();
    let total = versoes.len();
    Ok(Json(VersoesResponse { versoes, total }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
