use bakeoff_util::finite::Finite;
use std::collections::BTreeMap;

/// Metrics are rounded to this many digits after the decimal point.
pub const DECIMAL_DIGITS: i32 = 5;

/// Make `value` safe to serialize. Values that are NaN or infinite become `None`, and finite values are rounded to `DECIMAL_DIGITS` digits.
pub fn sanitize(value: f64) -> Option<f64> {
	let value = Finite::new(value).ok()?.get();
	let scale = 10f64.powi(DECIMAL_DIGITS);
	let scaled = value * scale;
	// Values this large have no digits after the decimal point to round.
	let rounded = if scaled.is_finite() {
		scaled.round() / scale
	} else {
		value
	};
	if rounded == 0.0 {
		Some(0.0)
	} else {
		Some(rounded)
	}
}

/// Apply [`sanitize`] to every present value in `metrics`.
pub fn sanitize_metrics(metrics: BTreeMap<String, Option<f64>>) -> BTreeMap<String, Option<f64>> {
	metrics
		.into_iter()
		.map(|(name, value)| (name, value.and_then(sanitize)))
		.collect()
}

#[test]
fn test_sanitize() {
	assert_eq!(sanitize(std::f64::NAN), None);
	assert_eq!(sanitize(std::f64::INFINITY), None);
	assert_eq!(sanitize(std::f64::NEG_INFINITY), None);
	assert_eq!(sanitize(0.123456789), Some(0.12346));
	assert_eq!(sanitize(-2.0), Some(-2.0));
	assert_eq!(sanitize(-0.000001), Some(0.0));
	assert_eq!(sanitize(1e306), Some(1e306));
	let value = -911684320.696805;
	let sanitized = sanitize(value).unwrap();
	assert!((sanitized - value).abs() < 0.5e-5 + 1e-6);
	assert_eq!(sanitize(sanitized), Some(sanitized));
}

#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn sanitized_values_are_finite(value in proptest::num::f64::ANY) {
			match sanitize(value) {
				Some(sanitized) => {
					prop_assert!(value.is_finite());
					prop_assert!(sanitized.is_finite());
				}
				None => prop_assert!(!value.is_finite()),
			}
		}

		#[test]
		fn rounding_is_close_and_idempotent(value in -1e9f64..1e9) {
			let sanitized = sanitize(value).unwrap();
			// Scaling by 10^5 and back loses a few ulps of `value`.
			let slack = value.abs() * std::f64::EPSILON * 8.0;
			prop_assert!((sanitized - value).abs() <= 0.5e-5 + slack);
			prop_assert_eq!(sanitize(sanitized), Some(sanitized));
		}
	}
}
