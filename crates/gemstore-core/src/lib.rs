pub mod app_config;
pub mod config;
pub mod metals;
pub mod pricing;
pub mod products;

pub use app_config::PricingConfig;
pub use config::{load_pricing_config, load_pricing_config_from_env};
pub use metals::{load_metal_table, MetalCode, MetalOption, MetalTable};
pub use pricing::{
    PriceQuote, PriceSource, SelectionState, DEFAULT_BASE_PRICE, DEFAULT_CARAT_EXPONENT,
    DEFAULT_PRICE_FIELDS,
};
pub use products::{CaratOption, ProductPricing, RawCaratRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read metals file {path}: {source}")]
    MetalsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse metals file: {0}")]
    MetalsFileParse(#[source] serde_yaml::Error),

    #[error("metals validation failed: {0}")]
    Validation(String),
}
