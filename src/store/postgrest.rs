//! Remote [`CatalogStore`] speaking the PostgREST wire protocol.
//!
//! The hosted store exposes every table under `/rest/v1/{table}` with
//! column filters (`?col=eq.value`), `offset`/`limit` paging, and upsert
//! via `POST ?on_conflict=col,col` with the `resolution=merge-duplicates`
//! preference — on conflict the incoming values overwrite the existing
//! row, which is what makes re-running the pipeline idempotent.
//!
//! Authentication is the service key, sent both as `apikey` and as a
//! bearer token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{BrandRecord, ModelRecord, RawVehicleRow, VehicleType, VersionRecord};

use super::CatalogStore;

/// Flat source table, one row per (type, brand, model value).
pub const RAW_TABLE: &str = "fipe";
/// Destination tables written by the loader.
pub const BRANDS_TABLE: &str = "fipe_marcas_unicas";
pub const MODELS_TABLE: &str = "fipe_modelos_unicos";
pub const VERSIONS_TABLE: &str = "fipe_versoes_unicas";

/// Composite conflict keys, per destination table.
const BRANDS_CONFLICT: &str = "type,brand_code";
const MODELS_CONFLICT: &str = "type,brand_code,model_name";
const VERSIONS_CONFLICT: &str = "type,brand_code,model_name,version";

pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
}

impl PostgrestStore {
    /// Build a client from the store configuration. Fails when no
    /// service key can be resolved.
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let service_key = config.resolve_service_key()?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", service_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let mut apikey = HeaderValue::from_str(&service_key)?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Map a non-2xx response to [`StoreError::Status`], keeping the
    /// response body as the error detail.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Single batched upsert with the declared composite conflict key.
    async fn upsert<T: Serialize>(
        &self,
        table: &str,
        on_conflict: &str,
        records: &[T],
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(records)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgrestStore {
    async fn fetch_raw_page(
        &self,
        vehicle_type: VehicleType,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<RawVehicleRow>, StoreError> {
        let response = self
            .client
            .get(self.table_url(RAW_TABLE))
            .query(&[
                ("select", r#""Brand Code","Brand Value","Model Value""#.to_string()),
                ("Type", format!("eq.{}", vehicle_type)),
                ("offset", (page * page_size).to_string()),
                ("limit", page_size.to_string()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn upsert_brands(&self, records: &[BrandRecord]) -> Result<(), StoreError> {
        self.upsert(BRANDS_TABLE, BRANDS_CONFLICT, records).await
    }

    async fn upsert_models(&self, records: &[ModelRecord]) -> Result<(), StoreError> {
        self.upsert(MODELS_TABLE, MODELS_CONFLICT, records).await
    }

    async fn upsert_versions(&self, records: &[VersionRecord]) -> Result<(), StoreError> {
        self.upsert(VERSIONS_TABLE, VERSIONS_CONFLICT, records).await
    }

    async fn list_brands(&self, vehicle_type: VehicleType) -> Result<Vec<BrandRecord>, StoreError> {
        let response = self
            .client
            .get(self.table_url(BRANDS_TABLE))
            .query(&[
                ("select", "type,brand_code,brand_value".to_string()),
                ("type", format!("eq.{}", vehicle_type)),
                ("order", "brand_value.asc".to_string()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn list_models(
        &self,
        vehicle_type: VehicleType,
        brand_code: &str,
    ) -> Result<Vec<String>, StoreError> {
        #[derive(serde::Deserialize)]
        struct ModelName {
            model_name: String,
        }

        let response = self
            .client
            .get(self.table_url(MODELS_TABLE))
            .query(&[
                ("select", "model_name".to_string()),
                ("type", format!("eq.{}", vehicle_type)),
                ("brand_code", format!("eq.{}", brand_code)),
                ("order", "model_name.asc".to_string()),
            ])
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let rows: Vec<ModelName> = response.json().await?;
        Ok(rows.into_iter().map(|r| r.model_name).collect())
    }

    async fn list_versions(
        &self,
        vehicle_type: VehicleType,
        brand_code: Option<&str>,
        model_name: Option<&str>,
    ) -> Result<Vec<VersionRecord>, StoreError> {
        let mut query = vec![
            (
                "select",
                "type,brand_code,model_name,version,categoria,combustivel".to_string(),
            ),
            ("type", format!("eq.{}", vehicle_type)),
            ("order", "version.asc".to_string()),
        ];
        if let Some(code) = brand_code {
            query.push(("brand_code", format!("eq.{}", code)));
        }
        if let Some(model) = model_name {
            query.push(("model_name", format!("eq.{}", model)));
        }

        let response = self
            .client
            .get(self.table_url(VERSIONS_TABLE))
            .query(&query)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }
}
