use super::{
	argmax, check_features, check_finite, check_labels, early_stopping::EarlyStoppingMonitor,
	Scaler, SvmOptions, TrainError,
};
use ndarray::{prelude::*, Zip};
use rayon::prelude::*;

/// This struct describes a linear support vector classifier with one binary model per class. You can train one by calling `SvmClassifier::train`.
#[derive(Clone, Debug)]
pub struct SvmClassifier {
	pub scaler: Scaler,
	/// (n_classes)
	pub biases: Array1<f32>,
	/// (n_features, n_classes)
	pub weights: Array2<f32>,
}

impl SvmClassifier {
	/// Train a one vs rest support vector classifier. The per class models are trained in parallel.
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		n_classes: usize,
		options: &SvmOptions,
	) -> Result<SvmClassifier, TrainError> {
		check_features(features)?;
		check_labels(labels, n_classes)?;
		let scaler = Scaler::fit(features);
		let features = scaler.transform(features);
		let n_features = features.ncols();
		let class_models = (0..n_classes)
			.into_par_iter()
			.map(|class_index| {
				let signs = labels.mapv(|label| if label == class_index { 1.0 } else { -1.0 });
				train_binary(features.view(), signs.view(), options)
			})
			.collect::<Result<Vec<_>, _>>()?;
		let mut weights = Array2::zeros((n_features, n_classes));
		let mut biases = Array1::zeros(n_classes);
		for (class_index, (class_weights, class_bias)) in class_models.into_iter().enumerate() {
			weights.column_mut(class_index).assign(&class_weights);
			biases[class_index] = class_bias;
		}
		Ok(SvmClassifier {
			scaler,
			biases,
			weights,
		})
	}

	/// Compute the decision value of each class for each row of `features`. The result has shape (n_examples, n_classes).
	pub fn decision_function(&self, features: ArrayView2<f32>) -> Array2<f32> {
		self.scaler.transform(features).dot(&self.weights) + &self.biases
	}

	/// Predict the class with the largest decision value for each row of `features`.
	pub fn predict_classes(&self, features: ArrayView2<f32>) -> Vec<usize> {
		self.decision_function(features)
			.axis_iter(Axis(0))
			.map(argmax)
			.collect()
	}
}

/// Train a binary hinge loss model where `signs` are +1 for the positive class and -1 otherwise.
fn train_binary(
	features: ArrayView2<f32>,
	signs: ArrayView1<f32>,
	options: &SvmOptions,
) -> Result<(Array1<f32>, f32), TrainError> {
	let n_examples = features.nrows();
	let mut weights = Array1::<f32>::zeros(features.ncols());
	let mut bias = 0.0f32;
	let l2_regularization = 1.0 / (options.c * n_examples as f32);
	let mut early_stopping_monitor = options
		.early_stopping_options
		.as_ref()
		.map(EarlyStoppingMonitor::new);
	let n_examples_per_batch = options.n_examples_per_batch.max(1);
	for epoch in 0..options.max_epochs {
		let learning_rate = options.learning_rate / ((epoch + 1) as f32).sqrt();
		for (features, signs) in features
			.axis_chunks_iter(Axis(0), n_examples_per_batch)
			.zip(signs.axis_chunks_iter(Axis(0), n_examples_per_batch))
		{
			let margins = (features.dot(&weights) + bias) * signs;
			// The subgradient of the hinge loss is -y x inside the margin and zero outside it.
			let gradients = Zip::from(&margins)
				.and(signs)
				.map_collect(|margin, sign| if *margin < 1.0 { -sign } else { 0.0 });
			let batch_size = features.nrows() as f32;
			let weight_gradients = features.t().dot(&gradients) / batch_size;
			Zip::from(&mut weights)
				.and(&weight_gradients)
				.for_each(|weight, weight_gradient| {
					*weight -= learning_rate * (weight_gradient + l2_regularization * *weight)
				});
			bias -= learning_rate * gradients.sum() / batch_size;
		}
		check_finite(weights.iter().chain(std::iter::once(&bias)))?;
		let margins = (features.dot(&weights) + bias) * signs;
		let loss = margins.mapv(|margin| (1.0 - margin).max(0.0)).mean().unwrap_or(0.0)
			+ 0.5 * l2_regularization * weights.dot(&weights);
		if let Some(early_stopping_monitor) = early_stopping_monitor.as_mut() {
			if early_stopping_monitor.update(loss) {
				break;
			}
		}
	}
	Ok((weights, bias))
}

#[test]
fn test_binary() {
	let features = Array::from_shape_fn((20, 1), |(i, _)| i as f32);
	let labels = Array::from_shape_fn(20, |i| if i >= 10 { 1 } else { 0 });
	let model =
		SvmClassifier::train(features.view(), labels.view(), 2, &SvmOptions::default()).unwrap();
	let predictions = model.predict_classes(arr2(&[[0.0], [2.0], [17.0], [19.0]]).view());
	assert_eq!(predictions, vec![0, 0, 1, 1]);
}

#[test]
fn test_three_clusters() {
	let centers = [[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
	let offsets = [[0.0, 0.0], [0.5, 0.0], [0.0, 0.5], [-0.5, 0.0], [0.0, -0.5]];
	let mut features = Array2::zeros((15, 2));
	let mut labels = Array1::zeros(15);
	for (class_index, center) in centers.iter().enumerate() {
		for (offset_index, offset) in offsets.iter().enumerate() {
			let row = class_index * offsets.len() + offset_index;
			features[[row, 0]] = center[0] + offset[0];
			features[[row, 1]] = center[1] + offset[1];
			labels[row] = class_index;
		}
	}
	let model =
		SvmClassifier::train(features.view(), labels.view(), 3, &SvmOptions::default()).unwrap();
	let predictions = model.predict_classes(arr2(&centers).view());
	assert_eq!(predictions, vec![0, 1, 2]);
}
