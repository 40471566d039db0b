use crate::{check_features, train::train_forest, Target, TrainError, TrainOptions, Tree};
use ndarray::prelude::*;

/// `Classifier`s predict which of `n_classes` classes an example belongs to. The probability of each class is the average over the trees of the fraction of training examples of that class in the leaf the example reaches.
#[derive(Clone, Debug)]
pub struct Classifier {
	pub n_classes: usize,
	pub trees: Vec<Tree>,
}

impl Classifier {
	/// Train a classifier. `labels` are 0-indexed and must be less than `n_classes`.
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		n_classes: usize,
		options: &TrainOptions,
	) -> Result<Classifier, TrainError> {
		check_features(features)?;
		if let Some(label) = labels.iter().find(|label| **label >= n_classes) {
			return Err(TrainError::LabelOutOfRange {
				label: *label,
				n_classes,
			});
		}
		let target = Target::Classification { labels: labels.view(), n_classes };
		let trees = train_forest(features.view(), target, options)?;
		Ok(Classifier { n_classes, trees })
	}

	/// Compute the probability of each class for each row of `features`. The result has shape (n_examples, n_classes).
	pub fn predict(&self, features: ArrayView2<f32>) -> Array2<f32> {
		let mut probabilities = Array2::zeros((features.nrows(), self.n_classes));
		let n_trees = self.trees.len() as f32;
		for (example, mut probabilities) in features
			.axis_iter(Axis(0))
			.zip(probabilities.axis_iter_mut(Axis(0)))
		{
			for tree in self.trees.iter() {
				for (probability, value) in probabilities.iter_mut().zip(tree.predict(example)) {
					*probability += value;
				}
			}
			probabilities /= n_trees;
		}
		probabilities
	}

	/// Predict the most probable class for each row of `features`. Ties go to the lowest class index.
	pub fn predict_classes(&self, features: ArrayView2<f32>) -> Vec<usize> {
		self.predict(features)
			.axis_iter(Axis(0))
			.map(|probabilities| {
				let mut best = 0;
				for (class_index, probability) in probabilities.iter().enumerate() {
					if *probability > probabilities[best] {
						best = class_index;
					}
				}
				best
			})
			.collect()
	}
}

#[test]
fn test_decision_tree_fits_training_data() {
	let features = arr2(&[[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [2.0, 2.0], [2.0, 0.0]]);
	let labels = arr1(&[1, 1, 0, 0, 2, 2]);
	let model = Classifier::train(
		features.view(),
		labels.view(),
		3,
		&TrainOptions::decision_tree(),
	)
	.unwrap();
	assert_eq!(model.predict_classes(features.view()), vec![1, 1, 0, 0, 2, 2]);
}

#[test]
fn test_random_forest_probabilities() {
	let features = Array::from_shape_fn((30, 4), |(i, j)| ((i + j) % 7) as f32 + (i as f32) * 0.1);
	let labels = Array::from_shape_fn(30, |i| if i < 15 { 0 } else { 1 });
	let options = crate::TrainOptions::random_forest(crate::MaxFeatures::Sqrt);
	let model = Classifier::train(features.view(), labels.view(), 2, &options).unwrap();
	let probabilities = model.predict(features.view());
	for row in probabilities.axis_iter(Axis(0)) {
		assert!((row.sum() - 1.0).abs() < 1e-4);
	}
	let again = Classifier::train(features.view(), labels.view(), 2, &options).unwrap();
	assert_eq!(again.predict(features.view()), probabilities);
}

#[test]
fn test_label_out_of_range() {
	let features = arr2(&[[0.0], [1.0]]);
	let labels = arr1(&[0, 2]);
	let result = Classifier::train(
		features.view(),
		labels.view(),
		2,
		&TrainOptions::decision_tree(),
	);
	assert_eq!(
		result.unwrap_err(),
		TrainError::LabelOutOfRange {
			label: 2,
			n_classes: 2
		}
	);
}
