use anyhow::{Context, Result};
use std::path::Path;

use serde::Deserialize;

use crate::models::VehicleType;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the structured store (e.g. `https://xyz.supabase.co`).
    pub url: String,
    /// Service key with write access to the normalized tables. May be
    /// omitted in favor of the `FIPE_SERVICE_KEY` environment variable.
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Rows requested per page when reading the raw table.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Models upserted per batch.
    #[serde(default = "default_model_batch_size")]
    pub model_batch_size: usize,
    /// Versions upserted per batch. Smaller than models because version
    /// rows carry more columns and the store caps request sizes.
    #[serde(default = "default_version_batch_size")]
    pub version_batch_size: usize,
    /// Partitions to process, in order.
    #[serde(default = "default_types")]
    pub types: Vec<VehicleType>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            model_batch_size: default_model_batch_size(),
            version_batch_size: default_version_batch_size(),
            types: default_types(),
        }
    }
}

fn default_page_size() -> usize {
    5000
}
fn default_model_batch_size() -> usize {
    1000
}
fn default_version_batch_size() -> usize {
    500
}
fn default_types() -> Vec<VehicleType> {
    VehicleType::ALL.to_vec()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8700".to_string()
}

impl StoreConfig {
    /// Resolve the service key from the config file or the
    /// `FIPE_SERVICE_KEY` environment variable.
    pub fn resolve_service_key(&self) -> Result<String> {
        if let Some(key) = &self.service_key {
            if !key.trim().is_empty() {
                return Ok(key.clone());
            }
        }
        std::env::var("FIPE_SERVICE_KEY")
            .context("store.service_key not set and FIPE_SERVICE_KEY is not in the environment")
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.store.url.trim().is_empty() {
        anyhow::bail!("store.url must not be empty");
    }

    if config.pipeline.page_size == 0 {
        anyhow::bail!("pipeline.page_size must be > 0");
    }

    if config.pipeline.model_batch_size == 0 || config.pipeline.version_batch_size == 0 {
        anyhow::bail!("pipeline batch sizes must be > 0");
    }

    if config.pipeline.types.is_empty() {
        anyhow::bail!("pipeline.types must name at least one vehicle type");
    }

    Ok(config)
}
