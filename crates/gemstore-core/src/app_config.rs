use std::time::Duration;

use crate::metals::MetalTable;

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub api_base_url: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub debounce_ms: u64,
    pub display_hold_ms: u64,
    pub default_base_price: f64,
    pub carat_exponent: f64,
    pub price_fields: Vec<String>,
    pub metals: MetalTable,
}

impl PricingConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn display_hold(&self) -> Duration {
        Duration::from_millis(self.display_hold_ms)
    }
}
