use std::path::PathBuf;

use crate::app_config::PricingConfig;
use crate::metals::{load_metal_table, MetalTable};
use crate::pricing::DEFAULT_PRICE_FIELDS;
use crate::ConfigError;

/// Load pricing configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_pricing_config() -> Result<PricingConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_pricing_config_from_env()
}

/// Load pricing configuration from environment variables already in the process.
///
/// Unlike [`load_pricing_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_pricing_config_from_env() -> Result<PricingConfig, ConfigError> {
    build_pricing_config(|key| std::env::var(key))
}

/// Build pricing configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_pricing_config<F>(lookup: F) -> Result<PricingConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    // Unset and blank are the same thing.
    let present = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let require = |var: &str| -> Result<String, ConfigError> {
        present(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { present(var).unwrap_or_else(|| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(var, format!("{value} is not a positive number")));
        }
        Ok(value)
    };

    let api_base_url = require("GEMSTORE_API_BASE_URL")?;
    let log_level = or_default("GEMSTORE_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("GEMSTORE_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("GEMSTORE_USER_AGENT", "gemstore/0.1 (price-resolution)");
    let max_retries = parse_u32("GEMSTORE_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("GEMSTORE_RETRY_BACKOFF_BASE_MS", "250")?;

    let debounce_ms = parse_u64("GEMSTORE_DEBOUNCE_MS", "300")?;
    let display_hold_ms = parse_u64("GEMSTORE_DISPLAY_HOLD_MS", "150")?;

    let default_base_price = parse_positive_f64("GEMSTORE_DEFAULT_BASE_PRICE", "1000")?;
    let carat_exponent = parse_positive_f64("GEMSTORE_CARAT_EXPONENT", "1.5")?;

    let price_fields = match present("GEMSTORE_PRICE_FIELDS") {
        Some(raw) => parse_price_fields(&raw)
            .ok_or_else(|| invalid("GEMSTORE_PRICE_FIELDS", "no field names given".into()))?,
        None => DEFAULT_PRICE_FIELDS.iter().map(|f| (*f).to_owned()).collect(),
    };

    let metals = match present("GEMSTORE_METALS_PATH") {
        Some(path) => load_metal_table(&PathBuf::from(path.trim()))?,
        None => MetalTable::default(),
    };

    Ok(PricingConfig {
        api_base_url,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        debounce_ms,
        display_hold_ms,
        default_base_price,
        carat_exponent,
        price_fields,
        metals,
    })
}

/// Split a comma-separated field list, dropping blanks.
///
/// Returns `None` when no field names remain.
fn parse_price_fields(raw: &str) -> Option<Vec<String>> {
    let fields: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_owned)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
