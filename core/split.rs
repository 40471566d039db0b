use crate::{task::EncodedTarget, Error};
use bakeoff_dataframe::DataFrame;
use ndarray::prelude::*;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::cmp::Ordering;

/// The fraction of rows held out for testing. Smaller datasets hold out a larger share so the test set keeps more than a single row.
pub fn test_fraction(n_rows: usize) -> f64 {
	if n_rows < 6 {
		0.5
	} else if n_rows < 10 {
		0.4
	} else {
		0.2
	}
}

/// The labels of one side of a split.
#[derive(Clone, Debug, PartialEq)]
pub enum Labels {
	Regression(Array1<f32>),
	Classification {
		labels: Array1<usize>,
		n_classes: usize,
	},
}

impl Labels {
	pub fn len(&self) -> usize {
		match self {
			Labels::Regression(values) => values.len(),
			Labels::Classification { labels, .. } => labels.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn take(&self, indexes: &[usize]) -> Labels {
		match self {
			Labels::Regression(values) => {
				Labels::Regression(indexes.iter().map(|index| values[*index]).collect())
			}
			Labels::Classification { labels, n_classes } => Labels::Classification {
				labels: indexes.iter().map(|index| labels[*index]).collect(),
				n_classes: *n_classes,
			},
		}
	}
}

/// A train/test partition of the feature columns and the encoded target.
#[derive(Clone, Debug)]
pub struct Split {
	pub features_train: DataFrame,
	pub features_test: DataFrame,
	pub labels_train: Labels,
	pub labels_test: Labels,
}

/// Split the rows of `features` and `target` into train and test sets. `ceil(test_fraction * n_rows)` rows are held out. Classification targets are stratified, so each class is represented in the test set in proportion to its share of the rows, while every class keeps at least one training row.
pub fn split(
	features: &DataFrame,
	target: &EncodedTarget,
	test_fraction: f64,
	seed: u64,
) -> Result<Split, Error> {
	let n_rows = target.len();
	if n_rows < 2 {
		return Err(Error::TooFewRows { rows: n_rows });
	}
	let n_test = n_test_rows(n_rows, test_fraction).max(1).min(n_rows - 1);
	let mut rng = Xoshiro256Plus::seed_from_u64(seed);
	let (mut train_indexes, mut test_indexes) = match target {
		EncodedTarget::Regression { .. } => {
			let mut indexes: Vec<usize> = (0..n_rows).collect();
			indexes.shuffle(&mut rng);
			let train_indexes = indexes.split_off(n_test);
			(train_indexes, indexes)
		}
		EncodedTarget::Classification { labels, classes } => {
			stratified_indexes(labels, classes.len(), n_test, &mut rng)
		}
	};
	train_indexes.shuffle(&mut rng);
	test_indexes.shuffle(&mut rng);
	let labels = match target {
		EncodedTarget::Regression { values } => Labels::Regression(values.iter().copied().collect()),
		EncodedTarget::Classification { labels, classes } => Labels::Classification {
			labels: labels.iter().copied().collect(),
			n_classes: classes.len(),
		},
	};
	Ok(Split {
		features_train: features.take_rows(&train_indexes),
		features_test: features.take_rows(&test_indexes),
		labels_train: labels.take(&train_indexes),
		labels_test: labels.take(&test_indexes),
	})
}

/// `ceil(test_fraction * n_rows)`, computed in millionths so that a fraction like 0.2 holds out exactly a fifth of a multiple of five rows.
pub fn n_test_rows(n_rows: usize, test_fraction: f64) -> usize {
	const PARTS: usize = 1_000_000;
	let parts = (test_fraction.max(0.0).min(1.0) * PARTS as f64).round() as usize;
	(parts * n_rows + PARTS - 1) / PARTS
}

/// Returns the train and test row indexes.
fn stratified_indexes(
	labels: &[usize],
	n_classes: usize,
	n_test: usize,
	rng: &mut Xoshiro256Plus,
) -> (Vec<usize>, Vec<usize>) {
	let n_rows = labels.len();
	let mut class_rows: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
	for (index, label) in labels.iter().enumerate() {
		class_rows[*label].push(index);
	}
	for rows in class_rows.iter_mut() {
		rows.shuffle(rng);
	}
	// Allocate the test rows to classes by largest remainder, keeping at least one training row per class.
	let quotas: Vec<f64> = class_rows
		.iter()
		.map(|rows| n_test as f64 * rows.len() as f64 / n_rows as f64)
		.collect();
	let capacities: Vec<usize> = class_rows
		.iter()
		.map(|rows| rows.len().saturating_sub(1))
		.collect();
	let mut allocation: Vec<usize> = quotas
		.iter()
		.zip(capacities.iter())
		.map(|(quota, capacity)| (quota.floor() as usize).min(*capacity))
		.collect();
	let mut order: Vec<usize> = (0..n_classes).collect();
	order.sort_by(|a, b| {
		let remainder_a = quotas[*a] - quotas[*a].floor();
		let remainder_b = quotas[*b] - quotas[*b].floor();
		remainder_b
			.partial_cmp(&remainder_a)
			.unwrap_or(Ordering::Equal)
			.then(a.cmp(b))
	});
	let mut remaining = n_test.saturating_sub(allocation.iter().sum());
	while remaining > 0 {
		let mut allocated = false;
		for class_index in order.iter().copied() {
			if remaining == 0 {
				break;
			}
			if allocation[class_index] < capacities[class_index] {
				allocation[class_index] += 1;
				remaining -= 1;
				allocated = true;
			}
		}
		if !allocated {
			break;
		}
	}
	// When no class can spare a row, hold out a row of the largest class so the test set is not empty.
	if allocation.iter().sum::<usize>() == 0 {
		if let Some(class_index) = (0..n_classes).max_by_key(|class_index| {
			(class_rows[*class_index].len(), std::cmp::Reverse(*class_index))
		}) {
			allocation[class_index] = 1;
		}
	}
	let mut train_indexes = Vec::with_capacity(n_rows);
	let mut test_indexes = Vec::with_capacity(n_test);
	for (rows, n_class_test) in class_rows.into_iter().zip(allocation.into_iter()) {
		test_indexes.extend_from_slice(&rows[..n_class_test]);
		train_indexes.extend_from_slice(&rows[n_class_test..]);
	}
	(train_indexes, test_indexes)
}

#[test]
fn test_test_fraction() {
	assert_eq!(test_fraction(2), 0.5);
	assert_eq!(test_fraction(5), 0.5);
	assert_eq!(test_fraction(6), 0.4);
	assert_eq!(test_fraction(9), 0.4);
	assert_eq!(test_fraction(10), 0.2);
	assert_eq!(test_fraction(1000), 0.2);
}

#[test]
fn test_n_test_rows() {
	for n_rows in (10..=1000).step_by(5) {
		assert_eq!(n_test_rows(n_rows, test_fraction(n_rows)), n_rows / 5);
	}
	assert_eq!(n_test_rows(11, 0.2), 3);
	assert_eq!(n_test_rows(4, 0.5), 2);
	assert_eq!(n_test_rows(5, 0.5), 3);
	assert_eq!(n_test_rows(6, 0.4), 3);
	assert_eq!(n_test_rows(9, 0.4), 4);
	for n_rows in [10, 35, 50, 1000].iter().copied() {
		let target = EncodedTarget::Regression {
			values: (0..n_rows).map(|value| value as f32).collect(),
		};
		let output = split(&row_number_features(n_rows), &target, test_fraction(n_rows), 42).unwrap();
		assert_eq!(output.labels_test.len(), n_rows / 5);
		assert_eq!(output.labels_train.len(), n_rows - n_rows / 5);
	}
}

#[cfg(test)]
fn classification_target(labels: Vec<usize>, n_classes: usize) -> EncodedTarget {
	EncodedTarget::Classification {
		labels,
		classes: (0..n_classes).map(|class| class.to_string()).collect(),
	}
}

#[cfg(test)]
fn row_number_features(n_rows: usize) -> DataFrame {
	DataFrame {
		columns: vec![bakeoff_dataframe::Column::Number(
			bakeoff_dataframe::NumberColumn {
				name: "row".to_owned(),
				data: (0..n_rows).map(|row| row as f32).collect(),
			},
		)],
	}
}

#[test]
fn test_regression_split() {
	let target = EncodedTarget::Regression {
		values: (0..50).map(|value| value as f32).collect(),
	};
	let features = row_number_features(50);
	let a = split(&features, &target, 0.2, 42).unwrap();
	let b = split(&features, &target, 0.2, 42).unwrap();
	assert_eq!(a.labels_test.len(), 10);
	assert_eq!(a.labels_train.len(), 40);
	assert_eq!(a.labels_test, b.labels_test);
	assert_eq!(a.features_test, b.features_test);
	// Features and labels stay aligned.
	let rows = &a.features_test.columns[0];
	match (&a.labels_test, rows) {
		(Labels::Regression(values), bakeoff_dataframe::Column::Number(rows)) => {
			assert_eq!(values.to_vec(), rows.data)
		}
		_ => unreachable!(),
	}
}

#[test]
fn test_stratified_split() {
	let labels: Vec<usize> = (0..50).map(|row| if row < 40 { 0 } else { 1 }).collect();
	let target = classification_target(labels, 2);
	let output = split(&row_number_features(50), &target, 0.2, 42).unwrap();
	match output.labels_test {
		Labels::Classification { labels, .. } => {
			assert_eq!(labels.len(), 10);
			assert_eq!(labels.iter().filter(|label| **label == 1).count(), 2);
		}
		_ => unreachable!(),
	}
}

#[test]
fn test_stratified_split_keeps_a_training_row_per_class() {
	let target = classification_target(vec![0, 1, 1, 2], 3);
	let output = split(&row_number_features(4), &target, 0.5, 42).unwrap();
	assert_eq!(output.labels_test.len(), 1);
	match output.labels_train {
		Labels::Classification { labels, .. } => {
			let mut labels = labels.to_vec();
			labels.sort_unstable();
			assert_eq!(labels, vec![0, 1, 2]);
		}
		_ => unreachable!(),
	}
	let target = classification_target(vec![0, 1], 2);
	let output = split(&row_number_features(2), &target, 0.5, 42).unwrap();
	assert_eq!(output.labels_train.len(), 1);
	assert_eq!(output.labels_test.len(), 1);
}

#[test]
fn test_too_few_rows() {
	let target = EncodedTarget::Regression { values: vec![1.0] };
	let error = split(&row_number_features(1), &target, 0.5, 42).unwrap_err();
	assert!(matches!(error, Error::TooFewRows { rows: 1 }));
}
