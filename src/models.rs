//! Core data models for the FIPE ingestion pipeline.
//!
//! These types represent the raw rows read from the FIPE table and the
//! normalized brand/model/version records the pipeline writes back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// The vehicle-type partitions the raw table is filtered and processed by.
///
/// Serialized with the store's literals (`CAR`, `MOTORCYCLE`, `TRUCK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Truck,
}

impl VehicleType {
    /// All partitions, in the order the pipeline processes them.
    pub const ALL: [VehicleType; 3] = [
        VehicleType::Car,
        VehicleType::Motorcycle,
        VehicleType::Truck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "CAR",
            VehicleType::Motorcycle => "MOTORCYCLE",
            VehicleType::Truck => "TRUCK",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CAR" => Ok(VehicleType::Car),
            "MOTORCYCLE" => Ok(VehicleType::Motorcycle),
            "TRUCK" => Ok(VehicleType::Truck),
            other => Err(format!(
                "unknown vehicle type: '{}'. Must be CAR, MOTORCYCLE, or TRUCK",
                other
            )),
        }
    }
}

/// A raw row from the flat FIPE table, before normalization.
///
/// The source table is wide; only the three columns the pipeline needs
/// are selected. All fields are optional at the wire boundary — rows
/// missing a brand code or model value are skipped by the normalizer
/// rather than failing the run.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVehicleRow {
    /// Brand code as stored. The source column holds strings in some
    /// partitions and numbers in others, so both are accepted.
    #[serde(rename = "Brand Code", default, deserialize_with = "string_or_number")]
    pub brand_code: Option<String>,
    #[serde(rename = "Brand Value", default)]
    pub brand_value: Option<String>,
    #[serde(rename = "Model Value", default)]
    pub model_value: Option<String>,
}

/// Accepts a JSON string or number and yields its string form.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A deduplicated brand. Identity key = (type, brand_code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandRecord {
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub brand_code: String,
    /// Brand name with known manufacturer prefixes stripped.
    pub brand_value: String,
}

/// A deduplicated model. Identity key = (type, brand_code, model_name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub brand_code: String,
    /// Leading portion of the raw model-value string (see `normalize`).
    pub model_name: String,
}

/// A deduplicated version/trim. Identity key = (type, brand_code,
/// model_name, version). Only created when a non-empty trailing version
/// string exists after the model-name split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub brand_code: String,
    pub model_name: String,
    pub version: String,
    /// Body category derived from the version string (`SUV`, `Sedan`,
    /// `Hatch`, `Caminhonete`), when a keyword matched.
    pub categoria: Option<String>,
    /// Fuel type derived from the version string (`Flex`, `Diesel`,
    /// `Gasolina`, `Elétrico`), when a keyword matched.
    pub combustivel: Option<String>,
}

/// Per-partition result reported by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    pub vehicle_type: VehicleType,
    pub rows_read: usize,
    pub brands_written: usize,
    pub models_written: usize,
    pub versions_written: usize,
}
