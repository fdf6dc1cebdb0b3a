use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a product's carat option set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaratOption {
    /// Backend identifier, kept opaque.
    pub id: String,
    /// Positive carat weight, unique within its option set.
    pub carat_weight: f64,
}

/// Field names a carat weight may arrive under, highest priority first.
const WEIGHT_FIELDS: [&str; 3] = ["carat_weight", "carat", "weight"];

/// A carat record as the backend sends it, before validation.
///
/// The weight may arrive as a JSON number or a numeric string, under any of
/// `carat_weight`, `carat`, or `weight`. When several are present the first
/// non-null one in that order is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct RawCaratRecord {
    pub id: Value,
    #[serde(rename = "carat_weight")]
    pub weight: Option<Value>,
}

impl RawCaratRecord {
    #[must_use]
    pub fn new(id: impl Into<Value>, weight: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            weight: Some(weight.into()),
        }
    }

    /// Reads a record from one entry of a product's carat list.
    ///
    /// Returns `None` when `entry` is not a JSON object.
    #[must_use]
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let object = entry.as_object()?;
        let weight = WEIGHT_FIELDS
            .iter()
            .find_map(|field| object.get(*field).filter(|v| !v.is_null()))
            .cloned();
        Some(Self {
            id: object.get("id").cloned().unwrap_or(Value::Null),
            weight,
        })
    }
}

impl TryFrom<Value> for RawCaratRecord {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_entry(&value).ok_or_else(|| format!("expected a carat object, got {value}"))
    }
}

/// The pricing-relevant slice of a product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPricing {
    pub product_id: String,
    pub base_price: Option<f64>,
    pub carats: Vec<RawCaratRecord>,
}

impl ProductPricing {
    /// Extracts pricing inputs from an untyped product record.
    ///
    /// The base price is read from `base_price`, then `price`, accepting
    /// numbers or numeric strings. Carat records are read from `carats`,
    /// then `carat_options`; entries that are not objects are skipped.
    #[must_use]
    pub fn from_record(product_id: &str, record: &Value) -> Self {
        let base_price = ["base_price", "price"]
            .iter()
            .find_map(|field| record.get(field).and_then(number_like));

        let carats = ["carats", "carat_options"]
            .iter()
            .find_map(|field| record.get(field).and_then(Value::as_array))
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(RawCaratRecord::from_entry)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            product_id: product_id.to_owned(),
            base_price,
            carats,
        }
    }

    /// Returns the record's base price, or `default` when it is missing or
    /// not a positive number.
    #[must_use]
    pub fn effective_base_price(&self, default: f64) -> f64 {
        self.base_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(default)
    }
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
