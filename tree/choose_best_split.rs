use crate::Target;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use std::cmp::Ordering;

/// A candidate split of a node. Examples whose value for `feature_index` is <= `split_value` go left.
#[derive(Clone, Debug)]
pub(crate) struct Split {
	pub feature_index: usize,
	pub split_value: f32,
	/// The decrease in impurity achieved by the split.
	pub gain: f64,
}

/// Aggregate label statistics for the examples that reach a node.
#[derive(Clone, Debug)]
pub(crate) enum NodeStats {
	Regression {
		n: usize,
		sum: f64,
		sum_of_squares: f64,
	},
	Classification {
		n: usize,
		class_counts: Vec<usize>,
	},
}

impl NodeStats {
	pub fn empty(target: Target) -> NodeStats {
		match target {
			Target::Regression(_) => NodeStats::Regression {
				n: 0,
				sum: 0.0,
				sum_of_squares: 0.0,
			},
			Target::Classification { n_classes, .. } => NodeStats::Classification {
				n: 0,
				class_counts: vec![0; n_classes],
			},
		}
	}

	pub fn compute(target: Target, examples_index: &[usize]) -> NodeStats {
		let mut stats = NodeStats::empty(target);
		for example_index in examples_index {
			stats.add(target, *example_index);
		}
		stats
	}

	pub fn add(&mut self, target: Target, example_index: usize) {
		match (self, target) {
			(
				NodeStats::Regression {
					n,
					sum,
					sum_of_squares,
				},
				Target::Regression(labels),
			) => {
				let label = labels[example_index] as f64;
				*n += 1;
				*sum += label;
				*sum_of_squares += label * label;
			}
			(NodeStats::Classification { n, class_counts }, Target::Classification { labels, .. }) => {
				*n += 1;
				class_counts[labels[example_index]] += 1;
			}
			_ => unreachable!(),
		}
	}

	pub fn remove(&mut self, target: Target, example_index: usize) {
		match (self, target) {
			(
				NodeStats::Regression {
					n,
					sum,
					sum_of_squares,
				},
				Target::Regression(labels),
			) => {
				let label = labels[example_index] as f64;
				*n -= 1;
				*sum -= label;
				*sum_of_squares -= label * label;
			}
			(NodeStats::Classification { n, class_counts }, Target::Classification { labels, .. }) => {
				*n -= 1;
				class_counts[labels[example_index]] -= 1;
			}
			_ => unreachable!(),
		}
	}

	pub fn n(&self) -> usize {
		match self {
			NodeStats::Regression { n, .. } => *n,
			NodeStats::Classification { n, .. } => *n,
		}
	}

	/// The impurity of the node weighted by its number of examples. This is the sum of squared deviations from the mean for regression and `n * gini` for classification.
	pub fn impurity(&self) -> f64 {
		match self {
			NodeStats::Regression {
				n,
				sum,
				sum_of_squares,
			} => {
				if *n == 0 {
					return 0.0;
				}
				(sum_of_squares - sum * sum / *n as f64).max(0.0)
			}
			NodeStats::Classification { n, class_counts } => {
				if *n == 0 {
					return 0.0;
				}
				let n = *n as f64;
				let sum_of_squared_counts = class_counts
					.iter()
					.map(|count| (*count as f64).powi(2))
					.sum::<f64>();
				n - sum_of_squared_counts / n
			}
		}
	}

	/// The values a leaf with these stats outputs: the mean label for regression, or the fraction of examples in each class for classification.
	pub fn leaf_values(&self) -> Vec<f32> {
		match self {
			NodeStats::Regression { n, sum, .. } => {
				vec![(sum / (*n).max(1) as f64).to_f32().unwrap_or(std::f32::NAN)]
			}
			NodeStats::Classification { n, class_counts } => class_counts
				.iter()
				.map(|count| *count as f32 / (*n).max(1) as f32)
				.collect(),
		}
	}
}

/// Find the split with the largest gain among `feature_indexes`. Returns `None` if no split sends at least `min_examples_per_leaf` examples to each side.
pub(crate) fn choose_best_split(
	features: ArrayView2<f32>,
	target: Target,
	examples_index: &[usize],
	stats: &NodeStats,
	feature_indexes: &[usize],
	min_examples_per_leaf: usize,
) -> Option<Split> {
	let parent_impurity = stats.impurity();
	let min_examples_per_leaf = min_examples_per_leaf.max(1);
	let mut best_split: Option<Split> = None;
	let mut sorted: Vec<(f32, usize)> = Vec::with_capacity(examples_index.len());
	for feature_index in feature_indexes.iter().copied() {
		let column = features.column(feature_index);
		sorted.clear();
		sorted.extend(
			examples_index
				.iter()
				.map(|example_index| (column[*example_index], *example_index)),
		);
		sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
		let mut left_stats = NodeStats::empty(target);
		let mut right_stats = stats.clone();
		for position in 0..sorted.len().saturating_sub(1) {
			let (value, example_index) = sorted[position];
			left_stats.add(target, example_index);
			right_stats.remove(target, example_index);
			let next_value = sorted[position + 1].0;
			// Examples with equal values must go to the same side.
			if value == next_value {
				continue;
			}
			if left_stats.n() < min_examples_per_leaf || right_stats.n() < min_examples_per_leaf {
				continue;
			}
			let gain = parent_impurity - left_stats.impurity() - right_stats.impurity();
			let is_better = match &best_split {
				Some(best_split) => gain > best_split.gain,
				None => true,
			};
			if is_better {
				best_split = Some(Split {
					feature_index,
					split_value: midpoint(value, next_value),
					gain,
				});
			}
		}
	}
	best_split
}

/// A threshold in `[low, high)`.
fn midpoint(low: f32, high: f32) -> f32 {
	let midpoint = low + (high - low) / 2.0;
	if midpoint >= low && midpoint < high {
		midpoint
	} else {
		low
	}
}

#[test]
fn test_choose_best_split_regression() {
	let features = arr2(&[[5.0, 1.0], [5.0, 2.0], [5.0, 3.0], [5.0, 10.0], [5.0, 11.0], [5.0, 12.0]]);
	let labels = arr1(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
	let target = Target::Regression(labels.view());
	let examples_index: Vec<usize> = (0..6).collect();
	let stats = NodeStats::compute(target, &examples_index);
	assert!((stats.impurity() - 1.5).abs() < 1e-12);
	let split =
		choose_best_split(features.view(), target, &examples_index, &stats, &[0, 1], 1).unwrap();
	assert_eq!(split.feature_index, 1);
	assert_eq!(split.split_value, 6.5);
	assert!((split.gain - 1.5).abs() < 1e-12);
}

#[test]
fn test_choose_best_split_classification() {
	let features = arr2(&[[1.0], [2.0], [3.0], [4.0]]);
	let labels = arr1(&[0, 0, 1, 1]);
	let target = Target::Classification {
		labels: labels.view(),
		n_classes: 2,
	};
	let examples_index: Vec<usize> = (0..4).collect();
	let stats = NodeStats::compute(target, &examples_index);
	assert!((stats.impurity() - 2.0).abs() < 1e-12);
	assert_eq!(stats.leaf_values(), vec![0.5, 0.5]);
	let split =
		choose_best_split(features.view(), target, &examples_index, &stats, &[0], 1).unwrap();
	assert_eq!(split.split_value, 2.5);
	// A minimum leaf size of 3 leaves no valid split of 4 examples.
	assert!(choose_best_split(features.view(), target, &examples_index, &stats, &[0], 3).is_none());
}
