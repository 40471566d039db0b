use super::{
	check_features, check_finite, early_stopping::EarlyStoppingMonitor, scaler::mean_std, Scaler,
	SvmOptions, TrainError,
};
use ndarray::{prelude::*, Zip};

/// This struct describes a linear support vector regressor. You can train one by calling `SvmRegressor::train`.
#[derive(Clone, Debug)]
pub struct SvmRegressor {
	pub scaler: Scaler,
	/// The target is standardized before training with this mean.
	pub label_mean: f32,
	/// The target is standardized before training with this standard deviation.
	pub label_std: f32,
	pub bias: f32,
	pub weights: Array1<f32>,
	pub losses: Vec<f32>,
}

impl SvmRegressor {
	/// Train a support vector regressor by minibatch subgradient descent on the epsilon insensitive loss.
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<f32>,
		options: &SvmOptions,
	) -> Result<SvmRegressor, TrainError> {
		check_features(features)?;
		check_finite(labels.iter()).map_err(|_| TrainError::NonFiniteLabel)?;
		let n_examples = features.nrows();
		let scaler = Scaler::fit(features);
		let features = scaler.transform(features);
		let (label_mean, label_std) = mean_std(labels.iter().copied());
		let label_std = if label_std > 0.0 { label_std } else { 1.0 };
		let labels = labels.mapv(|label| (label - label_mean) / label_std);
		let mut model = SvmRegressor {
			scaler,
			label_mean,
			label_std,
			bias: 0.0,
			weights: Array1::zeros(features.ncols()),
			losses: Vec::new(),
		};
		let l2_regularization = 1.0 / (options.c * n_examples as f32);
		let mut early_stopping_monitor = options
			.early_stopping_options
			.as_ref()
			.map(EarlyStoppingMonitor::new);
		let n_examples_per_batch = options.n_examples_per_batch.max(1);
		for epoch in 0..options.max_epochs {
			let learning_rate = options.learning_rate / ((epoch + 1) as f32).sqrt();
			for (features, labels) in features
				.axis_chunks_iter(Axis(0), n_examples_per_batch)
				.zip(labels.axis_chunks_iter(Axis(0), n_examples_per_batch))
			{
				let residuals = features.dot(&model.weights) + model.bias - labels;
				let gradients = residuals.mapv(|residual| {
					if residual.abs() > options.epsilon {
						residual.signum()
					} else {
						0.0
					}
				});
				let batch_size = features.nrows() as f32;
				let weight_gradients = features.t().dot(&gradients) / batch_size;
				Zip::from(&mut model.weights)
					.and(&weight_gradients)
					.for_each(|weight, weight_gradient| {
						*weight -= learning_rate * (weight_gradient + l2_regularization * *weight)
					});
				model.bias -= learning_rate * gradients.sum() / batch_size;
			}
			check_finite(model.weights.iter().chain(std::iter::once(&model.bias)))?;
			let residuals = features.dot(&model.weights) + model.bias - &labels;
			let loss = residuals
				.mapv(|residual| (residual.abs() - options.epsilon).max(0.0))
				.mean()
				.unwrap_or(0.0) + 0.5 * l2_regularization * model.weights.dot(&model.weights);
			model.losses.push(loss);
			if let Some(early_stopping_monitor) = early_stopping_monitor.as_mut() {
				if early_stopping_monitor.update(loss) {
					break;
				}
			}
		}
		Ok(model)
	}

	/// Predict the label for each row of `features`, in the units of the original target.
	pub fn predict(&self, features: ArrayView2<f32>) -> Array1<f32> {
		let standardized = self.scaler.transform(features).dot(&self.weights) + self.bias;
		standardized.mapv(|value| value * self.label_std + self.label_mean)
	}
}

#[test]
fn test_linear_target() {
	let features = Array::from_shape_fn((20, 1), |(i, _)| i as f32);
	let labels = features.column(0).mapv(|x| 2.0 * x + 1.0);
	let model = SvmRegressor::train(features.view(), labels.view(), &SvmOptions::default())
		.unwrap();
	let predictions = model.predict(arr2(&[[0.0], [19.0]]).view());
	assert!((predictions[0] - 1.0).abs() < 3.0);
	assert!((predictions[1] - 39.0).abs() < 3.0);
}

#[test]
fn test_infinite_learning_rate_diverges() {
	let features = Array::from_shape_fn((8, 2), |(i, j)| (i * (j + 1)) as f32);
	let labels = Array::from_shape_fn(8, |i| (i * i) as f32);
	let options = SvmOptions {
		learning_rate: std::f32::INFINITY,
		..Default::default()
	};
	let result = SvmRegressor::train(features.view(), labels.view(), &options);
	assert_eq!(result.unwrap_err(), TrainError::Diverged);
}
