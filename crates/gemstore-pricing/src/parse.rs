//! Price extraction from loosely-shaped pricing responses.
//!
//! The pricing backend has renamed its canonical price field more than once.
//! The parser probes an ordered list of candidate fields and takes the first
//! one that yields a usable number, so a rename only needs a config change.

use gemstore_core::DEFAULT_PRICE_FIELDS;
use serde_json::Value;

/// Extracts a price from a raw pricing response by probing fields in
/// priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceResponseParser {
    fields: Vec<String>,
}

impl Default for PriceResponseParser {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_FIELDS)
    }
}

impl PriceResponseParser {
    /// Creates a parser that probes `fields`, highest priority first.
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the value of the highest-priority field holding a finite,
    /// non-negative number, or `None` when no field qualifies.
    ///
    /// A field holding an object with a `value` key is unwrapped one level.
    /// Strings are sanitized with [`sanitize_numeric`] before parsing.
    #[must_use]
    pub fn extract(&self, response: &Value) -> Option<f64> {
        let object = response.as_object()?;

        self.fields.iter().find_map(|field| {
            let raw = object.get(field).filter(|v| !v.is_null())?;
            let value = unwrap_nested(raw);
            let price = coerce_number(value)?;
            (price.is_finite() && price >= 0.0).then_some(price)
        })
    }
}

/// Unwraps `{"value": x}` to `x`; anything else is returned as-is.
fn unwrap_nested(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get("value").unwrap_or(value),
        other => other,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => sanitize_numeric(s).parse::<f64>().ok(),
        _ => None,
    }
}

/// Strips everything except digits, decimal points, and a leading minus sign.
///
/// A `-` is kept only if no digit or point has been kept before it, so
/// `"-$12.50"` becomes `"-12.50"` while `"12-50"` becomes `"1250"`.
pub(crate) fn sanitize_numeric(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() || c == '.' || (c == '-' && out.is_empty()) {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
