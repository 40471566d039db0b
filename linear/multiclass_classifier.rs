use super::{
	argmax, check_features, check_finite, check_labels,
	early_stopping::EarlyStoppingMonitor, Scaler, TrainError, TrainOptions,
};
use bakeoff_metrics::{CrossEntropy, CrossEntropyInput, StreamingMetric};
use ndarray::{prelude::*, Zip};

/// This struct describes a linear multiclass classifier model. You can train one by calling `MulticlassClassifier::train`.
#[derive(Clone, Debug)]
pub struct MulticlassClassifier {
	pub scaler: Scaler,
	/// (n_classes)
	pub biases: Array1<f32>,
	/// (n_features, n_classes)
	pub weights: Array2<f32>,
	/// The cross entropy on the training set after each epoch.
	pub losses: Vec<f32>,
}

impl MulticlassClassifier {
	/// Train a multiclass classifier. `labels` are 0-indexed and must be less than `n_classes`.
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		n_classes: usize,
		options: &TrainOptions,
	) -> Result<MulticlassClassifier, TrainError> {
		check_features(features)?;
		check_labels(labels, n_classes)?;
		let n_features = features.ncols();
		let scaler = Scaler::fit(features);
		let features = scaler.transform(features);
		let mut model = MulticlassClassifier {
			scaler,
			biases: Array1::<f32>::zeros(n_classes),
			weights: Array2::<f32>::zeros((n_features, n_classes)),
			losses: Vec::new(),
		};
		let mut early_stopping_monitor = options
			.early_stopping_options
			.as_ref()
			.map(EarlyStoppingMonitor::new);
		let n_examples_per_batch = options.n_examples_per_batch.max(1);
		for _ in 0..options.max_epochs {
			for (features, labels) in features
				.axis_chunks_iter(Axis(0), n_examples_per_batch)
				.zip(labels.axis_chunks_iter(Axis(0), n_examples_per_batch))
			{
				model.train_batch(features, labels, options);
			}
			check_finite(model.weights.iter().chain(model.biases.iter()))?;
			let loss = model.compute_loss(features.view(), labels);
			model.losses.push(loss);
			if let Some(early_stopping_monitor) = early_stopping_monitor.as_mut() {
				if early_stopping_monitor.update(loss) {
					break;
				}
			}
		}
		Ok(model)
	}

	fn train_batch(
		&mut self,
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		options: &TrainOptions,
	) {
		let learning_rate = options.learning_rate;
		let l2_regularization = options.l2_regularization;
		let n_examples = features.nrows() as f32;
		let mut py = self.predict_scaled(features);
		for (mut row, label) in py.rows_mut().into_iter().zip(labels.iter()) {
			row[*label] -= 1.0;
		}
		let weight_gradients = features.t().dot(&py) / n_examples;
		let bias_gradients = py.sum_axis(Axis(0)) / n_examples;
		Zip::from(&mut self.weights)
			.and(&weight_gradients)
			.for_each(|weight, weight_gradient| {
				*weight -= learning_rate * (weight_gradient + l2_regularization * *weight)
			});
		Zip::from(&mut self.biases)
			.and(&bias_gradients)
			.for_each(|bias, bias_gradient| *bias -= learning_rate * bias_gradient);
	}

	fn compute_loss(&self, features: ArrayView2<f32>, labels: ArrayView1<usize>) -> f32 {
		let probabilities = self.predict_scaled(features);
		let mut metric = CrossEntropy::default();
		for (probabilities, label) in probabilities.axis_iter(Axis(0)).zip(labels.iter()) {
			metric.update(CrossEntropyInput {
				probabilities,
				label: *label,
			});
		}
		metric.finalize().unwrap_or(std::f32::NAN)
	}

	fn predict_scaled(&self, features: ArrayView2<f32>) -> Array2<f32> {
		let mut probabilities = features.dot(&self.weights) + &self.biases;
		softmax(probabilities.view_mut());
		probabilities
	}

	/// Compute the probability of each class for each row of `features`. The result has shape (n_examples, n_classes).
	pub fn predict(&self, features: ArrayView2<f32>) -> Array2<f32> {
		self.predict_scaled(self.scaler.transform(features).view())
	}

	/// Compute the most probable class for each row of `features`.
	pub fn predict_classes(&self, features: ArrayView2<f32>) -> Vec<usize> {
		self.predict(features)
			.axis_iter(Axis(0))
			.map(argmax)
			.collect()
	}
}

fn softmax(mut logits: ArrayViewMut2<f32>) {
	for mut logits in logits.rows_mut() {
		let max = logits.iter().fold(std::f32::MIN, |a, &b| a.max(b));
		logits -= max;
		logits.mapv_inplace(|l| l.exp());
		let sum = logits.iter().fold(0.0, |a, b| a + b);
		logits /= sum;
	}
}

#[test]
fn test_separable() {
	let features = Array::from_shape_fn((20, 1), |(i, _)| i as f32);
	let labels = Array::from_shape_fn(20, |i| if i >= 10 { 1 } else { 0 });
	let model =
		MulticlassClassifier::train(features.view(), labels.view(), 2, &TrainOptions::default())
			.unwrap();
	assert!(!model.losses.is_empty());
	assert!(model.losses.last().unwrap() < model.losses.first().unwrap());
	let predictions = model.predict_classes(arr2(&[[0.0], [3.0], [16.0], [19.0]]).view());
	assert_eq!(predictions, vec![0, 0, 1, 1]);
	let probabilities = model.predict(arr2(&[[5.0]]).view());
	assert!((probabilities.sum() - 1.0).abs() < 1e-5);
}

#[test]
fn test_label_out_of_range() {
	let features = arr2(&[[0.0], [1.0]]);
	let labels = arr1(&[0, 3]);
	let result =
		MulticlassClassifier::train(features.view(), labels.view(), 2, &TrainOptions::default());
	assert_eq!(
		result.unwrap_err(),
		TrainError::LabelOutOfRange {
			label: 3,
			n_classes: 2
		}
	);
}
