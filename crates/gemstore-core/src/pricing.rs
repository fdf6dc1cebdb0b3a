use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metals::MetalCode;

/// Base price substituted when a product record carries none, in source
/// currency units.
pub const DEFAULT_BASE_PRICE: f64 = 1000.0;

/// Exponent applied to the carat weight by the fallback price formula.
pub const DEFAULT_CARAT_EXPONENT: f64 = 1.5;

/// Response fields probed for a price, highest priority first.
pub const DEFAULT_PRICE_FIELDS: [&str; 6] = [
    "final_price",
    "price",
    "total_price",
    "calculated_price",
    "amount",
    "cost",
];

/// The shopper's current variant selection.
///
/// `carat_index` addresses the current carat option set; the controller
/// owning this value keeps it in range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub carat_index: usize,
    pub metal: MetalCode,
    pub color: String,
    pub size: String,
}

/// Where a published price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Remote,
    Fallback,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::Remote => write!(f, "remote"),
            PriceSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved unit price for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Non-negative price in source currency units.
    pub value: f64,
    pub source: PriceSource,
    /// Set while a newer selection is still being resolved.
    pub is_stale: bool,
    /// Selection generation this quote was resolved for.
    pub generation: u64,
    pub resolved_at: DateTime<Utc>,
}

impl PriceQuote {
    #[must_use]
    pub fn new(value: f64, source: PriceSource, generation: u64) -> Self {
        Self {
            value,
            source,
            is_stale: false,
            generation,
            resolved_at: Utc::now(),
        }
    }

    /// Returns a copy flagged as superseded by a pending selection.
    #[must_use]
    pub fn stale(&self) -> Self {
        Self {
            is_stale: true,
            ..self.clone()
        }
    }

    /// Unit price attached to a cart line, rounded to cents.
    ///
    /// Returns `None` only for values that cannot be represented as a
    /// decimal (non-finite or out of range).
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        Decimal::from_f64(self.value).map(|d| d.round_dp(2))
    }
}
