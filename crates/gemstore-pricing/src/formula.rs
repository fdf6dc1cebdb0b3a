//! Local price estimate used when the pricing backend cannot answer.

use gemstore_core::DEFAULT_CARAT_EXPONENT;

/// Deterministic fallback price: `round(base × carat^exponent × metal)`.
///
/// Larger stones are priced super-linearly through `exponent`. The formula is
/// total: it never substitutes defaults for its inputs. Callers supply the
/// default base price when a product record lacks one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackFormula {
    exponent: f64,
}

impl Default for FallbackFormula {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_CARAT_EXPONENT,
        }
    }
}

impl FallbackFormula {
    #[must_use]
    pub fn new(exponent: f64) -> Self {
        Self { exponent }
    }

    #[must_use]
    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Computes the fallback price rounded to whole currency units.
    #[must_use]
    pub fn compute(&self, base_price: f64, carat_weight: f64, metal_multiplier: f64) -> f64 {
        (base_price * carat_weight.powf(self.exponent) * metal_multiplier).round()
    }
}

/// [`FallbackFormula::compute`] with the default carat exponent.
#[must_use]
pub fn compute(base_price: f64, carat_weight: f64, metal_multiplier: f64) -> f64 {
    FallbackFormula::default().compute(base_price, carat_weight, metal_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_price(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < f64::EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn one_and_a_half_carat_fourteen_karat() {
        assert_price(compute(1000.0, 1.5, 1.0), 1837.0);
    }

    #[test]
    fn one_carat_is_base_times_metal() {
        assert_price(compute(1000.0, 1.0, 1.3), 1300.0);
    }

    #[test]
    fn small_stones_are_discounted_super_linearly() {
        // 0.5^1.5 = 0.35355...
        assert_price(compute(1000.0, 0.5, 1.0), 354.0);
    }

    #[test]
    fn rounds_to_whole_units() {
        // 999 * 2^1.5 * 1.3 = 3673.27...
        assert_price(compute(999.0, 2.0, 1.3), 3673.0);
    }

    #[test]
    fn custom_exponent_is_applied() {
        let linear = FallbackFormula::new(1.0);
        assert_price(linear.compute(1000.0, 1.5, 1.0), 1500.0);
        assert!((linear.exponent() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn is_deterministic() {
        let a = compute(1234.0, 0.75, 1.3);
        let b = compute(1234.0, 0.75, 1.3);
        assert_price(a, b);
    }
}
