use super::{check_features, check_finite, solve::solve_positive_definite, Scaler, TrainError};
use ndarray::prelude::*;

/// These are the options passed to `Regressor::train`.
#[derive(Clone, Debug)]
pub struct RegressorOptions {
	/// This value times the number of examples is added to the diagonal of the normal equations so that collinear features still have a solution.
	pub l2_regularization: f64,
}

impl Default for RegressorOptions {
	fn default() -> Self {
		Self {
			l2_regularization: 1e-8,
		}
	}
}

/// This struct describes a linear regressor model fit by ordinary least squares. You can train one by calling `Regressor::train`.
#[derive(Clone, Debug)]
pub struct Regressor {
	pub scaler: Scaler,
	pub bias: f32,
	/// These weights apply to the standardized features.
	pub weights: Array1<f32>,
}

impl Regressor {
	/// Train a linear regressor.
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<f32>,
		options: &RegressorOptions,
	) -> Result<Regressor, TrainError> {
		check_features(features)?;
		check_finite(labels.iter()).map_err(|_| TrainError::NonFiniteLabel)?;
		let n_examples = features.nrows();
		let n_features = features.ncols();
		let scaler = Scaler::fit(features);
		let x = scaler.transform(features).mapv(f64::from);
		let y = labels.mapv(f64::from);
		let bias = y.sum() / n_examples as f64;
		let y = y - bias;
		let mut xtx = x.t().dot(&x);
		let ridge = options.l2_regularization * n_examples as f64;
		for i in 0..n_features {
			xtx[[i, i]] += ridge;
		}
		let xty = x.t().dot(&y);
		let weights = solve_positive_definite(xtx, xty.view()).ok_or(TrainError::Singular)?;
		let weights = weights.mapv(|weight| weight as f32);
		let bias = bias as f32;
		check_finite(weights.iter().chain(std::iter::once(&bias)))?;
		Ok(Regressor {
			scaler,
			bias,
			weights,
		})
	}

	/// Predict the label for each row of `features`.
	pub fn predict(&self, features: ArrayView2<f32>) -> Array1<f32> {
		self.scaler.transform(features).dot(&self.weights) + self.bias
	}
}

#[test]
fn test_exact_fit() {
	let features = arr2(&[
		[1.0, 2.0],
		[2.0, 1.0],
		[3.0, 5.0],
		[4.0, 3.0],
		[5.0, 8.0],
		[6.0, 0.0],
	]);
	let labels = features.map_axis(Axis(1), |row| 2.0 * row[0] - 3.0 * row[1] + 1.0);
	let model = Regressor::train(features.view(), labels.view(), &RegressorOptions::default())
		.unwrap();
	let predictions = model.predict(arr2(&[[10.0, 10.0], [0.0, 0.0]]).view());
	assert!((predictions[0] - -9.0).abs() < 1e-3);
	assert!((predictions[1] - 1.0).abs() < 1e-3);
}

#[test]
fn test_collinear_and_constant_features() {
	let features = arr2(&[[1.0, 2.0, 7.0], [2.0, 4.0, 7.0], [3.0, 6.0, 7.0], [4.0, 8.0, 7.0]]);
	let labels = arr1(&[3.0, 5.0, 7.0, 9.0]);
	let model = Regressor::train(features.view(), labels.view(), &RegressorOptions::default())
		.unwrap();
	let predictions = model.predict(features.view());
	for (prediction, label) in predictions.iter().zip(labels.iter()) {
		assert!((prediction - label).abs() < 1e-3);
	}
}
