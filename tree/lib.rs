/*!
This crate implements decision trees and random forests for regression and classification. Trees are grown with the CART algorithm: each branch compares a single number feature with a threshold, and splits are chosen to maximize the decrease in variance for regression or in Gini impurity for classification.

A [`Regressor`](struct.Regressor.html) or [`Classifier`](struct.Classifier.html) holds one or more trees. A single decision tree is a forest of one tree trained on every example with every feature. A random forest trains many trees in parallel, each on a bootstrap sample of the examples, and averages their outputs.
*/

#![allow(clippy::tabs_in_doc_comments)]

use ndarray::prelude::*;
use thiserror::Error;

mod choose_best_split;
mod classifier;
mod regressor;
mod train;

pub use self::classifier::Classifier;
pub use self::regressor::Regressor;

/// These are the options passed to `Regressor::train` and `Classifier::train`.
#[derive(Clone, Debug)]
pub struct TrainOptions {
	/// This is the number of trees to train.
	pub n_trees: usize,
	/// If true, each tree is trained on a sample of the examples drawn with replacement. Otherwise each tree sees every example once.
	pub bootstrap: bool,
	/// This controls how many features are considered when choosing the split for each branch.
	pub max_features: MaxFeatures,
	/// The depth of a single tree will never exceed this value. If it is `None`, trees grow until their leaves are pure or too small to split.
	pub max_depth: Option<usize>,
	/// A node will only be split if at least this many training examples reach it.
	pub min_examples_per_split: usize,
	/// A split will only be considered valid if the number of training examples sent to each of the resulting children is at least this value.
	pub min_examples_per_leaf: usize,
	/// The random number generator for the tree at index `i` is seeded with `seed + i`.
	pub seed: u64,
}

/// This controls how many features are considered when choosing a split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaxFeatures {
	/// Consider every feature.
	All,
	/// Consider a random subset of `ceil(sqrt(n_features))` features, drawn again for every branch.
	Sqrt,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self::decision_tree()
	}
}

impl TrainOptions {
	/// Options for a single fully grown decision tree.
	pub fn decision_tree() -> TrainOptions {
		TrainOptions {
			n_trees: 1,
			bootstrap: false,
			max_features: MaxFeatures::All,
			max_depth: None,
			min_examples_per_split: 2,
			min_examples_per_leaf: 1,
			seed: 42,
		}
	}

	/// Options for a random forest of 100 trees trained on bootstrap samples.
	pub fn random_forest(max_features: MaxFeatures) -> TrainOptions {
		TrainOptions {
			n_trees: 100,
			bootstrap: true,
			max_features,
			..TrainOptions::decision_tree()
		}
	}
}

#[derive(Debug, Error, PartialEq)]
pub enum TrainError {
	#[error("cannot train on an empty training set")]
	EmptyTrainingSet,
	#[error("feature {feature_index} contains a value that is not finite")]
	NonFiniteFeature { feature_index: usize },
	#[error("the labels contain a value that is not finite")]
	NonFiniteLabel,
	#[error("label {label} is out of range for {n_classes} classes")]
	LabelOutOfRange { label: usize, n_classes: usize },
	#[error("a forest must have at least one tree")]
	NoTrees,
}

/// Trees are stored as a `Vec` of `Node`s. Each branch in the tree has two indexes into the `Vec`, one for each of its children. The root is at index 0.
#[derive(Clone, Debug)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

impl Tree {
	/// Make a prediction for a given example. Regression trees output a single value. Classification trees output the fraction of training examples of each class that reached the leaf.
	pub fn predict(&self, features: ArrayView1<f32>) -> &[f32] {
		// Start at the root node.
		let mut node_index = 0;
		// Traverse the tree until we get to a leaf.
		loop {
			match &self.nodes[node_index] {
				Node::Branch(BranchNode {
					left_child_index,
					right_child_index,
					feature_index,
					split_value,
					..
				}) => {
					node_index = if features[*feature_index] <= *split_value {
						*left_child_index
					} else {
						*right_child_index
					};
				}
				Node::Leaf(LeafNode { values, .. }) => return values,
			}
		}
	}
}

/// A node is either a branch or a leaf.
#[derive(Clone, Debug)]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

/// A `BranchNode` sends an example to its left child if the value of the feature at `feature_index` is <= `split_value`, and to its right child otherwise.
#[derive(Clone, Debug)]
pub struct BranchNode {
	/// This is the index in the tree's node vector for this node's left child.
	pub left_child_index: usize,
	/// This is the index in the tree's node vector for this node's right child.
	pub right_child_index: usize,
	pub feature_index: usize,
	pub split_value: f32,
}

/// The leaves in a tree hold the values to output for examples that get sent to them.
#[derive(Clone, Debug)]
pub struct LeafNode {
	pub values: Vec<f32>,
}

/// The labels a tree is trained on.
#[derive(Clone, Copy)]
pub(crate) enum Target<'a> {
	Regression(ArrayView1<'a, f32>),
	Classification {
		labels: ArrayView1<'a, usize>,
		n_classes: usize,
	},
}

fn check_features(features: ArrayView2<f32>) -> Result<(), TrainError> {
	if features.nrows() == 0 {
		return Err(TrainError::EmptyTrainingSet);
	}
	for (feature_index, column) in features.axis_iter(Axis(1)).enumerate() {
		if !column.iter().all(|value| value.is_finite()) {
			return Err(TrainError::NonFiniteFeature { feature_index });
		}
	}
	Ok(())
}
