use std::collections::HashMap;
use std::env::VarError;
use std::time::Duration;

use super::*;
use crate::metals::MetalCode;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("GEMSTORE_API_BASE_URL", "http://localhost:8000/api");
    m
}

#[test]
fn build_pricing_config_fails_without_api_base_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "GEMSTORE_API_BASE_URL"),
        "expected MissingEnvVar(GEMSTORE_API_BASE_URL), got: {result:?}"
    );
}

#[test]
fn build_pricing_config_treats_blank_api_base_url_as_missing() {
    let mut map = HashMap::new();
    map.insert("GEMSTORE_API_BASE_URL", "   ");
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn blank_optional_vars_fall_back_to_defaults() {
    let mut map = full_env();
    map.insert("GEMSTORE_DEBOUNCE_MS", "");
    map.insert("GEMSTORE_LOG_LEVEL", "  ");
    map.insert("GEMSTORE_METALS_PATH", "");
    map.insert("GEMSTORE_PRICE_FIELDS", " ");
    let cfg = build_pricing_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.debounce(), Duration::from_millis(300));
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.metals, MetalTable::default());
    assert_eq!(cfg.price_fields.len(), DEFAULT_PRICE_FIELDS.len());
}

#[test]
fn build_pricing_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.api_base_url, "http://localhost:8000/api");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.request_timeout_secs, 10);
    assert_eq!(cfg.user_agent, "gemstore/0.1 (price-resolution)");
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_ms, 250);
    assert_eq!(cfg.debounce(), Duration::from_millis(300));
    assert_eq!(cfg.display_hold(), Duration::from_millis(150));
    assert!((cfg.default_base_price - 1000.0).abs() < f64::EPSILON);
    assert!((cfg.carat_exponent - 1.5).abs() < f64::EPSILON);
    assert_eq!(
        cfg.price_fields,
        vec![
            "final_price",
            "price",
            "total_price",
            "calculated_price",
            "amount",
            "cost"
        ]
    );
    assert_eq!(cfg.metals, MetalTable::default());
}

#[test]
fn debounce_ms_override() {
    let mut map = full_env();
    map.insert("GEMSTORE_DEBOUNCE_MS", "500");
    let cfg = build_pricing_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.debounce_ms, 500);
}

#[test]
fn debounce_ms_invalid() {
    let mut map = full_env();
    map.insert("GEMSTORE_DEBOUNCE_MS", "soon");
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GEMSTORE_DEBOUNCE_MS"),
        "expected InvalidEnvVar(GEMSTORE_DEBOUNCE_MS), got: {result:?}"
    );
}

#[test]
fn display_hold_ms_override() {
    let mut map = full_env();
    map.insert("GEMSTORE_DISPLAY_HOLD_MS", "0");
    let cfg = build_pricing_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.display_hold(), Duration::ZERO);
}

#[test]
fn max_retries_invalid() {
    let mut map = full_env();
    map.insert("GEMSTORE_MAX_RETRIES", "-1");
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GEMSTORE_MAX_RETRIES"),
        "expected InvalidEnvVar(GEMSTORE_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn default_base_price_override() {
    let mut map = full_env();
    map.insert("GEMSTORE_DEFAULT_BASE_PRICE", "1250.50");
    let cfg = build_pricing_config(lookup_from_map(&map)).unwrap();
    assert!((cfg.default_base_price - 1250.5).abs() < f64::EPSILON);
}

#[test]
fn default_base_price_rejects_zero() {
    let mut map = full_env();
    map.insert("GEMSTORE_DEFAULT_BASE_PRICE", "0");
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GEMSTORE_DEFAULT_BASE_PRICE"),
        "expected InvalidEnvVar(GEMSTORE_DEFAULT_BASE_PRICE), got: {result:?}"
    );
}

#[test]
fn carat_exponent_rejects_nan() {
    let mut map = full_env();
    map.insert("GEMSTORE_CARAT_EXPONENT", "NaN");
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GEMSTORE_CARAT_EXPONENT"),
        "expected InvalidEnvVar(GEMSTORE_CARAT_EXPONENT), got: {result:?}"
    );
}

#[test]
fn price_fields_override_is_trimmed() {
    let mut map = full_env();
    map.insert("GEMSTORE_PRICE_FIELDS", " sale_price , price,, ");
    let cfg = build_pricing_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.price_fields, vec!["sale_price", "price"]);
}

#[test]
fn price_fields_rejects_empty_list() {
    let mut map = full_env();
    map.insert("GEMSTORE_PRICE_FIELDS", " , ");
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GEMSTORE_PRICE_FIELDS"),
        "expected InvalidEnvVar(GEMSTORE_PRICE_FIELDS), got: {result:?}"
    );
}

#[test]
fn metals_path_missing_file_is_an_error() {
    let mut map = full_env();
    map.insert("GEMSTORE_METALS_PATH", "/nonexistent/metals.yaml");
    let result = build_pricing_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MetalsFileIo { .. })));
}

#[test]
fn metals_default_table_has_both_purities() {
    let cfg = build_pricing_config(lookup_from_map(&full_env())).unwrap();
    for code in MetalCode::ALL {
        assert!(cfg.metals.multiplier(code) >= 1.0);
    }
}
