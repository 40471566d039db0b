use ndarray::prelude::*;

/**
A `Scaler` transforms each feature to zero mean and unit variance. [Learn more](https://en.wikipedia.org/wiki/Feature_scaling#Standardization_(Z-score_Normalization).

`feature_value = (value - mean) / std`

A feature whose standard deviation is zero is only centered.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
	pub means: Array1<f32>,
	pub stds: Array1<f32>,
}

impl Scaler {
	pub fn fit(features: ArrayView2<f32>) -> Scaler {
		let n_features = features.ncols();
		let mut means = Array1::zeros(n_features);
		let mut stds = Array1::ones(n_features);
		for (feature_index, column) in features.axis_iter(Axis(1)).enumerate() {
			let (mean, std) = mean_std(column.iter().copied());
			means[feature_index] = mean;
			if std > 0.0 && std.is_finite() {
				stds[feature_index] = std;
			}
		}
		Scaler { means, stds }
	}

	pub fn transform(&self, features: ArrayView2<f32>) -> Array2<f32> {
		let mut features = features.to_owned();
		for mut row in features.axis_iter_mut(Axis(0)) {
			row -= &self.means;
			row /= &self.stds;
		}
		features
	}
}

/// Compute the mean and population standard deviation of `values`, accumulating in `f64`.
pub(crate) fn mean_std(values: impl Iterator<Item = f32> + Clone) -> (f32, f32) {
	let (n, sum) = values
		.clone()
		.fold((0usize, 0.0f64), |(n, sum), value| (n + 1, sum + value as f64));
	if n == 0 {
		return (0.0, 0.0);
	}
	let mean = sum / n as f64;
	let m2 = values.fold(0.0f64, |m2, value| m2 + (value as f64 - mean).powi(2));
	(mean as f32, (m2 / n as f64).sqrt() as f32)
}

#[test]
fn test_scaler() {
	let features = arr2(&[[0.0, 5.0], [5.2, 5.0], [1.3, 5.0], [2.2, 5.0]]);
	let scaler = Scaler::fit(features.view());
	assert_eq!(scaler.stds[1], 1.0);
	let transformed = scaler.transform(features.view());
	let (mean, std) = mean_std(transformed.column(0).iter().copied());
	assert!(mean.abs() < 1e-5);
	assert!((std - 1.0).abs() < 1e-5);
	assert!(transformed.column(1).iter().all(|value| *value == 0.0));
}
