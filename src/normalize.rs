//! Normalizer/deduplicator for raw FIPE rows.
//!
//! Three rules, all deterministic and lexical (no NLP):
//!
//! 1. **Brand cleanup** — a small fixed set of manufacturer prefixes
//!    (`GM - `, `FIAT - `, `VW - `) is stripped case-insensitively from
//!    the start of the brand name.
//! 2. **Model/version split** — the model name is the first whitespace
//!    token plus any immediately following purely-numeric tokens;
//!    everything after, re-joined with single spaces, is the version.
//!    The rule greedily consumes leading digit groups — it does not know
//!    `2 0` is an engine size, and `1.6` is not numeric because of the
//!    dot.
//! 3. **Classification** — body category and fuel are substring matches
//!    against the uppercased version string, first match wins, fixed
//!    priority order.
//!
//! Rows are folded into three collections deduplicated by composite
//! identity key, first occurrence wins. Malformed rows (missing brand
//! code or empty model value) are skipped silently.

use std::collections::HashSet;

use crate::models::{BrandRecord, ModelRecord, RawVehicleRow, VehicleType, VersionRecord};

/// Manufacturer prefixes stripped from brand names, applied in order.
const BRAND_PREFIXES: [&str; 3] = ["GM - ", "FIAT - ", "VW - "];

/// The three deduplicated collections one partition normalizes into.
///
/// Vectors preserve first-seen order over the extracted row sequence,
/// which keeps batch boundaries stable between runs on unchanged input.
#[derive(Debug, Default)]
pub struct NormalizedCatalog {
    pub brands: Vec<BrandRecord>,
    pub models: Vec<ModelRecord>,
    pub versions: Vec<VersionRecord>,
}

/// Strip known manufacturer prefixes from the start of a brand name.
pub fn strip_brand_prefix(brand: &str) -> String {
    let mut name = brand;
    for prefix in BRAND_PREFIXES {
        if let Some(head) = name.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                name = &name[prefix.len()..];
            }
        }
    }
    name.to_string()
}

/// Split a raw model-value string into (model name, optional version).
///
/// Tokenizes on whitespace; the model name takes the first token and
/// every purely-numeric token that immediately follows it. The rest is
/// the version, or `None` when nothing remains.
pub fn split_model_version(model_value: &str) -> (String, Option<String>) {
    let tokens: Vec<&str> = model_value.split_whitespace().collect();
    if tokens.is_empty() {
        return (String::new(), None);
    }

    let mut model_len = 1;
    while model_len < tokens.len() && is_numeric_token(tokens[model_len]) {
        model_len += 1;
    }

    let model = tokens[..model_len].join(" ");
    let version = if model_len < tokens.len() {
        Some(tokens[model_len..].join(" "))
    } else {
        None
    };
    (model, version)
}

/// ASCII digits only — `2020` counts, `1.6` and `2.0` do not.
fn is_numeric_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Derive (category, fuel) from a version string.
///
/// Both vocabularies are checked against the uppercased version in a
/// fixed priority order; the first matching keyword wins and no keyword
/// yields `None`.
pub fn classify_version(version: &str) -> (Option<&'static str>, Option<&'static str>) {
    let upper = version.to_uppercase();

    let category = if upper.contains("SUV") {
        Some("SUV")
    } else if upper.contains("SEDAN") {
        Some("Sedan")
    } else if upper.contains("HATCH") {
        Some("Hatch")
    } else if upper.contains("PICKUP") {
        Some("Caminhonete")
    } else {
        None
    };

    let fuel = if upper.contains("FLEX") {
        Some("Flex")
    } else if upper.contains("DIESEL") {
        Some("Diesel")
    } else if upper.contains("GASOLINA") || upper.contains("GAS.") {
        Some("Gasolina")
    } else if upper.contains("ELETRICO") || upper.contains("ELÉTRICO") {
        Some("Elétrico")
    } else {
        None
    };

    (category, fuel)
}

/// Fold the full raw-row set for one partition into the three
/// deduplicated collections.
///
/// Deduplication is first-seen-wins per composite key: a later row with
/// the same key (even with different brand casing) does not overwrite
/// the earlier derived values.
pub fn normalize_rows(vehicle_type: VehicleType, rows: &[RawVehicleRow]) -> NormalizedCatalog {
    let mut catalog = NormalizedCatalog::default();
    let mut seen_brands: HashSet<String> = HashSet::new();
    let mut seen_models: HashSet<(String, String)> = HashSet::new();
    let mut seen_versions: HashSet<(String, String, String)> = HashSet::new();

    for row in rows {
        let (Some(code), Some(brand), Some(model_value)) =
            (&row.brand_code, &row.brand_value, &row.model_value)
        else {
            continue;
        };
        if model_value.trim().is_empty() {
            continue;
        }

        if seen_brands.insert(code.clone()) {
            catalog.brands.push(BrandRecord {
                vehicle_type,
                brand_code: code.clone(),
                brand_value: strip_brand_prefix(brand),
            });
        }

        let (model, version) = split_model_version(model_value);

        if seen_models.insert((code.clone(), model.clone())) {
            catalog.models.push(ModelRecord {
                vehicle_type,
                brand_code: code.clone(),
                model_name: model.clone(),
            });
        }

        if let Some(version) = version {
            if seen_versions.insert((code.clone(), model.clone(), version.clone())) {
                let (categoria, combustivel) = classify_version(&version);
                catalog.versions.push(VersionRecord {
                    vehicle_type,
                    brand_code: code.clone(),
                    model_name: model,
                    version,
                    categoria: categoria.map(String::from),
                    combustivel: combustivel.map(String::from),
                });
            }
        }
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(code: &str, brand: &str, model_value: &str) -> RawVehicleRow {
        RawVehicleRow {
            brand_code: Some(code.to_string()),
            brand_value: Some(brand.to_string()),
            model_value: Some(model_value.to_string()),
        }
    }

    #[test]
    fn test_split_dot_is_not_numeric() {
        let (model, version) = split_model_version("GOL 1.6");
        assert_eq!(model, "GOL");
        assert_eq!(version.as_deref(), Some("1.6"));
    }

    #[test]
    fn test_split_consumes_leading_numeric_tokens() {
        let (model, version) = split_model_version("COROLLA 2020 XEI");
        assert_eq!(model, "COROLLA 2020");
        assert_eq!(version.as_deref(), Some("XEI"));

        let (model, version) = split_model_version("COROLLA 2 0 XEI");
        assert_eq!(model, "COROLLA 2 0");
        assert_eq!(version.as_deref(), Some("XEI"));
    }

    #[test]
    fn test_split_without_version() {
        let (model, version) = split_model_version("ONIX");
        assert_eq!(model, "ONIX");
        assert_eq!(version, None);

        // All-numeric tail belongs to the model name
        let (model, version) = split_model_version("STRADA 2021");
        assert_eq!(model, "STRADA 2021");
        assert_eq!(version, None);
    }

    #[test]
    fn test_split_is_lossless_modulo_whitespace() {
        for input in [
            "ONIX 1.0 FLEX",
            "COROLLA 2 0 XEI",
            "GOL 1.6",
            "HILUX  SW4   DIESEL",
            "ONIX",
        ] {
            let (model, version) = split_model_version(input);
            let rejoined = match &version {
                Some(v) => format!("{} {}", model, v),
                None => model.clone(),
            };
            let normalized: Vec<&str> = input.split_whitespace().collect();
            assert_eq!(rejoined, normalized.join(" "), "input: {:?}", input);
        }
    }

    #[test]
    fn test_classification_priority() {
        let (category, fuel) = classify_version("SUV FLEX AUTOMATICO");
        assert_eq!(category, Some("SUV"));
        assert_eq!(fuel, Some("Flex"));

        let (category, fuel) = classify_version("XEI AUT");
        assert_eq!(category, None);
        assert_eq!(fuel, None);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let (category, fuel) = classify_version("sedan gasolina");
        assert_eq!(category, Some("Sedan"));
        assert_eq!(fuel, Some("Gasolina"));
    }

    #[test]
    fn test_fuel_gas_abbreviation_and_accents() {
        let (_, fuel) = classify_version("1.0 GAS. MANUAL");
        assert_eq!(fuel, Some("Gasolina"));

        let (_, fuel) = classify_version("MOTOR ELÉTRICO");
        assert_eq!(fuel, Some("Elétrico"));
    }

    #[test]
    fn test_brand_prefix_strip() {
        assert_eq!(strip_brand_prefix("GM - CHEVROLET"), "CHEVROLET");
        assert_eq!(strip_brand_prefix("FIAT - FIAT"), "FIAT");
        assert_eq!(strip_brand_prefix("vw - VOLKSWAGEN"), "VOLKSWAGEN");
        assert_eq!(strip_brand_prefix("HONDA"), "HONDA");
        // Prefix only strips at the start
        assert_eq!(strip_brand_prefix("CHEVROLET GM - "), "CHEVROLET GM - ");
    }

    #[test]
    fn test_duplicate_rows_collapse_to_single_records() {
        let rows = vec![
            raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
            raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
        ];
        let catalog = normalize_rows(VehicleType::Car, &rows);

        assert_eq!(catalog.brands.len(), 1);
        assert_eq!(catalog.brands[0].brand_code, "59");
        assert_eq!(catalog.brands[0].brand_value, "CHEVROLET");

        assert_eq!(catalog.models.len(), 1);
        assert_eq!(catalog.models[0].model_name, "ONIX");

        assert_eq!(catalog.versions.len(), 1);
        let version = &catalog.versions[0];
        assert_eq!(version.version, "1.0 FLEX");
        assert_eq!(version.categoria, None);
        assert_eq!(version.combustivel.as_deref(), Some("Flex"));
    }

    #[test]
    fn test_first_seen_brand_name_wins() {
        let rows = vec![
            raw("59", "GM - CHEVROLET", "ONIX 1.0"),
            raw("59", "Chevrolet", "TRACKER SUV"),
        ];
        let catalog = normalize_rows(VehicleType::Car, &rows);
        assert_eq!(catalog.brands.len(), 1);
        assert_eq!(catalog.brands[0].brand_value, "CHEVROLET");
    }

    #[test]
    fn test_composite_keys_are_unique() {
        let rows = vec![
            raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
            raw("59", "GM - CHEVROLET", "ONIX 1.0 TURBO"),
            raw("59", "GM - CHEVROLET", "ONIX 1.0 FLEX"),
            raw("21", "FIAT - FIAT", "ONIX 1.0 FLEX"),
        ];
        let catalog = normalize_rows(VehicleType::Car, &rows);

        let mut brand_keys: Vec<_> = catalog.brands.iter().map(|b| &b.brand_code).collect();
        brand_keys.sort();
        brand_keys.dedup();
        assert_eq!(brand_keys.len(), catalog.brands.len());

        let mut version_keys: Vec<_> = catalog
            .versions
            .iter()
            .map(|v| (&v.brand_code, &v.model_name, &v.version))
            .collect();
        version_keys.sort();
        version_keys.dedup();
        assert_eq!(version_keys.len(), catalog.versions.len());
        assert_eq!(catalog.versions.len(), 3);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let rows = vec![
            RawVehicleRow {
                brand_code: None,
                brand_value: Some("CHEVROLET".to_string()),
                model_value: Some("ONIX 1.0".to_string()),
            },
            RawVehicleRow {
                brand_code: Some("59".to_string()),
                brand_value: None,
                model_value: Some("ONIX 1.0".to_string()),
            },
            RawVehicleRow {
                brand_code: Some("59".to_string()),
                brand_value: Some("CHEVROLET".to_string()),
                model_value: Some("   ".to_string()),
            },
        ];
        let catalog = normalize_rows(VehicleType::Car, &rows);
        assert!(catalog.brands.is_empty());
        assert!(catalog.models.is_empty());
        assert!(catalog.versions.is_empty());
    }
}
