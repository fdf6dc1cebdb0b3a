//! Derivation of a product's canonical carat option set from raw records.

use gemstore_core::{CaratOption, RawCaratRecord};
use serde_json::Value;

/// Builds the ordered, deduplicated carat options for a product.
///
/// Records whose weight is missing, non-numeric, non-finite, or not positive
/// are skipped. When several records share a weight the earliest one in
/// `records` is kept. The result is sorted ascending by weight and may be
/// empty.
#[must_use]
pub fn derive(records: &[RawCaratRecord]) -> Vec<CaratOption> {
    let mut options: Vec<CaratOption> = records
        .iter()
        .filter_map(|record| {
            let Some(carat_weight) = record.weight.as_ref().and_then(parse_weight) else {
                tracing::debug!(id = %record.id, weight = ?record.weight, "skipping carat record without a usable weight");
                return None;
            };
            Some(CaratOption {
                id: opaque_id(&record.id),
                carat_weight,
            })
        })
        .collect();

    // Stable sort keeps input order among equal weights, so dedup_by keeps
    // the first occurrence.
    options.sort_by(|a, b| a.carat_weight.total_cmp(&b.carat_weight));
    options.dedup_by(|later, earlier| later.carat_weight.total_cmp(&earlier.carat_weight).is_eq());
    options
}

fn parse_weight(value: &Value) -> Option<f64> {
    let weight = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (weight.is_finite() && weight > 0.0).then_some(weight)
}

fn opaque_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An index-addressable carat option set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaratOptionSet {
    options: Vec<CaratOption>,
}

impl CaratOptionSet {
    #[must_use]
    pub fn from_records(records: &[RawCaratRecord]) -> Self {
        Self {
            options: derive(records),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CaratOption> {
        self.options.get(index)
    }

    /// Clamps `index` into `[0, len)`, or `0` for an empty set.
    #[must_use]
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.options.len().saturating_sub(1))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaratOption> {
        self.options.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[CaratOption] {
        &self.options
    }
}

impl<'a> IntoIterator for &'a CaratOptionSet {
    type Item = &'a CaratOption;
    type IntoIter = std::slice::Iter<'a, CaratOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}
