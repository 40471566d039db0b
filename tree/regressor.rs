use crate::{check_features, train::train_forest, Target, TrainError, TrainOptions, Tree};
use ndarray::prelude::*;

/// `Regressor`s predict continuous target values by averaging the outputs of their trees.
#[derive(Clone, Debug)]
pub struct Regressor {
	pub trees: Vec<Tree>,
}

impl Regressor {
	/// Train a regressor.
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<f32>,
		options: &TrainOptions,
	) -> Result<Regressor, TrainError> {
		check_features(features)?;
		if !labels.iter().all(|label| label.is_finite()) {
			return Err(TrainError::NonFiniteLabel);
		}
		let trees = train_forest(features.view(), Target::Regression(labels.view()), options)?;
		Ok(Regressor { trees })
	}

	/// Make predictions.
	pub fn predict(&self, features: ArrayView2<f32>) -> Array1<f32> {
		let n_trees = self.trees.len() as f32;
		features
			.axis_iter(Axis(0))
			.map(|example| {
				self.trees
					.iter()
					.map(|tree| tree.predict(example)[0])
					.sum::<f32>()
					/ n_trees
			})
			.collect()
	}
}

#[test]
fn test_decision_tree_fits_training_data() {
	let features = Array::from_shape_fn((12, 1), |(i, _)| i as f32);
	let labels = Array::from_shape_fn(12, |i| ((i * 7) % 5) as f32);
	let model =
		Regressor::train(features.view(), labels.view(), &TrainOptions::decision_tree()).unwrap();
	assert_eq!(model.trees.len(), 1);
	assert_eq!(model.predict(features.view()), labels);
}

#[test]
fn test_max_depth() {
	let features = Array::from_shape_fn((16, 1), |(i, _)| i as f32);
	let labels = Array::from_shape_fn(16, |i| (i * i) as f32);
	let options = TrainOptions {
		max_depth: Some(2),
		..TrainOptions::decision_tree()
	};
	let model = Regressor::train(features.view(), labels.view(), &options).unwrap();
	// Three branches and four leaves.
	assert_eq!(model.trees[0].nodes.len(), 7);
	let predictions = model.predict(features.view());
	let mut distinct: Vec<f32> = predictions.to_vec();
	distinct.dedup();
	assert_eq!(distinct.len(), 4);
}

#[test]
fn test_constant_labels_make_a_single_leaf() {
	let features = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
	let labels = arr1(&[7.0, 7.0, 7.0]);
	let model =
		Regressor::train(features.view(), labels.view(), &TrainOptions::decision_tree()).unwrap();
	assert_eq!(model.trees[0].nodes.len(), 1);
	assert_eq!(model.predict(arr2(&[[100.0, -100.0]]).view()), arr1(&[7.0]));
}

#[test]
fn test_random_forest_is_deterministic() {
	let features = Array::from_shape_fn((40, 3), |(i, j)| ((i * (j + 3)) % 17) as f32);
	let labels = Array::from_shape_fn(40, |i| (i as f32).sqrt());
	let options = TrainOptions::random_forest(crate::MaxFeatures::All);
	let a = Regressor::train(features.view(), labels.view(), &options).unwrap();
	let b = Regressor::train(features.view(), labels.view(), &options).unwrap();
	assert_eq!(a.trees.len(), 100);
	assert_eq!(a.predict(features.view()), b.predict(features.view()));
}

#[test]
fn test_empty_training_set() {
	let features = Array2::<f32>::zeros((0, 2));
	let labels = Array1::<f32>::zeros(0);
	let result = Regressor::train(features.view(), labels.view(), &TrainOptions::decision_tree());
	assert_eq!(result.unwrap_err(), TrainError::EmptyTrainingSet);
}
