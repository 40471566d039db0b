use crate::Error;
use bakeoff_dataframe::{Column, DEFAULT_INVALID_VALUES};
use fnv::FnvHashSet;
use std::cmp::Ordering;

/// Whether the target is continuous or categorical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
	Regression,
	Classification,
}

impl std::fmt::Display for TaskKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			TaskKind::Regression => write!(f, "regression"),
			TaskKind::Classification => write!(f, "classification"),
		}
	}
}

/// The thresholds used to decide the task from the target column.
#[derive(Clone, Copy, Debug)]
pub struct TaskPolicy {
	pub classification_max_distinct_values: usize,
	pub near_threshold_margin: usize,
}

impl Default for TaskPolicy {
	fn default() -> Self {
		Self {
			classification_max_distinct_values: 20,
			near_threshold_margin: 5,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaskDecision {
	pub kind: TaskKind,
	/// For number targets, the number of distinct non-missing values.
	pub distinct_values: Option<usize>,
	/// Set when the number of distinct values is close enough to the threshold that the decision could easily have gone the other way.
	pub warning: Option<String>,
}

/**
Decide whether `target` describes a regression or a classification task. Targets that are not numbers are always classification targets. Number targets with at most `policy.classification_max_distinct_values` distinct values are classification targets, because small sets of numbers are usually encoded labels. Every other target is a regression target.
*/
pub fn classify_task(target: &Column, policy: &TaskPolicy) -> TaskDecision {
	let column = match target {
		Column::Number(column) => column,
		_ => {
			return TaskDecision {
				kind: TaskKind::Classification,
				distinct_values: None,
				warning: None,
			}
		}
	};
	let distinct_values = column
		.data
		.iter()
		.filter(|value| !value.is_nan())
		.map(|value| normalize_zero(*value).to_bits())
		.collect::<FnvHashSet<u32>>()
		.len();
	let threshold = policy.classification_max_distinct_values;
	let kind = if distinct_values <= threshold {
		TaskKind::Classification
	} else {
		TaskKind::Regression
	};
	let distance = if distinct_values > threshold {
		distinct_values - threshold
	} else {
		threshold - distinct_values
	};
	let warning = if distance <= policy.near_threshold_margin {
		Some(format!(
			"target column \"{}\" has {} distinct values, close to the classification threshold of {}, and was treated as a {} target",
			column.name, distinct_values, threshold, kind
		))
	} else {
		None
	};
	TaskDecision {
		kind,
		distinct_values: Some(distinct_values),
		warning,
	}
}

/// The target column encoded for training.
#[derive(Clone, Debug, PartialEq)]
pub enum EncodedTarget {
	Regression {
		values: Vec<f32>,
	},
	Classification {
		/// Indexes into `classes`.
		labels: Vec<usize>,
		/// The distinct values of the target in sorted order.
		classes: Vec<String>,
	},
}

impl EncodedTarget {
	pub fn len(&self) -> usize {
		match self {
			EncodedTarget::Regression { values } => values.len(),
			EncodedTarget::Classification { labels, .. } => labels.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/**
Encode `target` for `kind`. Rows whose target is missing are skipped, and the indexes of the rows that were kept are returned alongside the encoded values. Classification targets must have at least two classes among the kept rows.
*/
pub fn encode_target(
	target: &Column,
	kind: TaskKind,
) -> Result<(EncodedTarget, Vec<usize>), Error> {
	let (encoded, kept_rows) = match (kind, target) {
		(TaskKind::Regression, Column::Number(column)) => {
			let kept_rows: Vec<usize> = (0..column.data.len())
				.filter(|index| column.data[*index].is_finite())
				.collect();
			let values = kept_rows.iter().map(|index| column.data[*index]).collect();
			(EncodedTarget::Regression { values }, kept_rows)
		}
		(TaskKind::Regression, _) => {
			return Err(Error::invalid_target(format!(
				"regression requires a number target, but column \"{}\" is not a number column",
				target.name()
			)))
		}
		(TaskKind::Classification, Column::Number(column)) => {
			let kept_rows: Vec<usize> = (0..column.data.len())
				.filter(|index| column.data[*index].is_finite())
				.collect();
			let mut distinct: Vec<f32> = kept_rows
				.iter()
				.map(|index| normalize_zero(column.data[*index]))
				.collect();
			distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
			distinct.dedup();
			let labels = kept_rows
				.iter()
				.map(|index| {
					let value = normalize_zero(column.data[*index]);
					distinct
						.binary_search_by(|probe| probe.partial_cmp(&value).unwrap_or(Ordering::Equal))
						.unwrap_or(0)
				})
				.collect();
			let classes = distinct.iter().map(|value| value.to_string()).collect();
			(EncodedTarget::Classification { labels, classes }, kept_rows)
		}
		(TaskKind::Classification, Column::Enum(column)) => {
			let kept_rows: Vec<usize> = (0..column.data.len())
				.filter(|index| column.data[*index].is_some())
				.collect();
			let mut present: Vec<&str> = kept_rows
				.iter()
				.filter_map(|index| column.option(column.data[*index]))
				.collect();
			present.sort_unstable();
			present.dedup();
			let labels = kept_rows
				.iter()
				.map(|index| {
					column
						.option(column.data[*index])
						.and_then(|option| present.binary_search(&option).ok())
						.unwrap_or(0)
				})
				.collect();
			let classes = present.iter().map(|option| option.to_string()).collect();
			(EncodedTarget::Classification { labels, classes }, kept_rows)
		}
		(TaskKind::Classification, Column::Text(column)) => {
			let kept_rows: Vec<usize> = column
				.data
				.iter()
				.enumerate()
				.filter(|(_, value)| !DEFAULT_INVALID_VALUES.contains(&value.as_str()))
				.map(|(index, _)| index)
				.collect();
			let mut distinct: Vec<&str> = kept_rows
				.iter()
				.map(|index| column.data[*index].as_str())
				.collect();
			distinct.sort_unstable();
			distinct.dedup();
			let labels = kept_rows
				.iter()
				.map(|index| {
					distinct
						.binary_search(&column.data[*index].as_str())
						.unwrap_or(0)
				})
				.collect();
			let classes = distinct.iter().map(|value| value.to_string()).collect();
			(EncodedTarget::Classification { labels, classes }, kept_rows)
		}
		(TaskKind::Classification, Column::Unknown(_)) => (
			EncodedTarget::Classification {
				labels: Vec::new(),
				classes: Vec::new(),
			},
			Vec::new(),
		),
	};
	if let EncodedTarget::Classification { classes, .. } = &encoded {
		if classes.len() < 2 {
			return Err(Error::invalid_target(format!(
				"classification requires at least 2 classes, but target column \"{}\" has {}",
				target.name(),
				classes.len()
			)));
		}
	}
	Ok((encoded, kept_rows))
}

fn normalize_zero(value: f32) -> f32 {
	if value == 0.0 {
		0.0
	} else {
		value
	}
}

#[cfg(test)]
use bakeoff_dataframe::{EnumColumn, NumberColumn, TextColumn};

#[test]
fn test_classify_task() {
	let policy = TaskPolicy::default();
	let column = Column::Number(NumberColumn {
		name: "price".to_owned(),
		data: (0..100).map(|i| i as f32 * 1.5).collect(),
	});
	let decision = classify_task(&column, &policy);
	assert_eq!(decision.kind, TaskKind::Regression);
	assert_eq!(decision.distinct_values, Some(100));
	assert_eq!(decision.warning, None);
	let column = Column::Number(NumberColumn {
		name: "rating".to_owned(),
		data: (0..100).map(|i| (i % 5) as f32).collect(),
	});
	assert_eq!(
		classify_task(&column, &policy).kind,
		TaskKind::Classification
	);
	let column = Column::Number(NumberColumn {
		name: "age".to_owned(),
		data: (0..22).map(|i| i as f32).collect(),
	});
	let decision = classify_task(&column, &policy);
	assert_eq!(decision.kind, TaskKind::Regression);
	insta::assert_snapshot!(decision.warning.unwrap(), @r###"target column "age" has 22 distinct values, close to the classification threshold of 20, and was treated as a regression target"###);
}

#[test]
fn test_classify_task_ignores_missing_and_signed_zero() {
	let column = Column::Number(NumberColumn {
		name: "y".to_owned(),
		data: vec![0.0, -0.0, std::f32::NAN, 1.0],
	});
	let decision = classify_task(&column, &TaskPolicy::default());
	assert_eq!(decision.distinct_values, Some(2));
}

#[test]
fn test_encode_number_classes() {
	let column = Column::Number(NumberColumn {
		name: "y".to_owned(),
		data: vec![3.0, 1.0, 2.5, 1.0, 3.0],
	});
	let (encoded, kept_rows) = encode_target(&column, TaskKind::Classification).unwrap();
	assert_eq!(kept_rows, vec![0, 1, 2, 3, 4]);
	assert_eq!(
		encoded,
		EncodedTarget::Classification {
			labels: vec![2, 0, 1, 0, 2],
			classes: vec!["1".to_owned(), "2.5".to_owned(), "3".to_owned()],
		}
	);
}

#[test]
fn test_encode_enum_drops_missing_rows() {
	let column = Column::Enum(EnumColumn {
		name: "y".to_owned(),
		options: vec!["no".to_owned(), "unused".to_owned(), "yes".to_owned()],
		data: vec![
			std::num::NonZeroUsize::new(3),
			None,
			std::num::NonZeroUsize::new(1),
			std::num::NonZeroUsize::new(3),
		],
	});
	let (encoded, kept_rows) = encode_target(&column, TaskKind::Classification).unwrap();
	assert_eq!(kept_rows, vec![0, 2, 3]);
	assert_eq!(
		encoded,
		EncodedTarget::Classification {
			labels: vec![1, 0, 1],
			classes: vec!["no".to_owned(), "yes".to_owned()],
		}
	);
}

#[test]
fn test_encode_text_drops_invalid_rows() {
	let column = Column::Text(TextColumn {
		name: "y".to_owned(),
		data: ["cat", "", "dog", "?", "cat", "null"]
			.iter()
			.map(|value| value.to_string())
			.collect(),
	});
	let (encoded, kept_rows) = encode_target(&column, TaskKind::Classification).unwrap();
	assert_eq!(kept_rows, vec![0, 2, 4]);
	assert_eq!(
		encoded,
		EncodedTarget::Classification {
			labels: vec![0, 1, 0],
			classes: vec!["cat".to_owned(), "dog".to_owned()],
		}
	);
}

#[test]
fn test_single_class_is_invalid() {
	let column = Column::Text(TextColumn {
		name: "y".to_owned(),
		data: vec!["a".to_owned(), "a".to_owned()],
	});
	let error = encode_target(&column, TaskKind::Classification).unwrap_err();
	assert!(matches!(error, Error::InvalidTarget { .. }));
}

#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn non_number_targets_are_classification(values in prop::collection::vec("[a-z]{1,8}", 0..50)) {
			let column = Column::Text(TextColumn { name: "y".to_owned(), data: values });
			prop_assert_eq!(classify_task(&column, &TaskPolicy::default()).kind, TaskKind::Classification);
		}

		#[test]
		fn many_distinct_numbers_are_regression(offset in -1000i32..1000, n in 21usize..200) {
			let data = (0..n).map(|i| (offset + i as i32) as f32).collect();
			let column = Column::Number(NumberColumn { name: "y".to_owned(), data });
			let decision = classify_task(&column, &TaskPolicy::default());
			prop_assert_eq!(decision.kind, TaskKind::Regression);
			prop_assert_eq!(decision.distinct_values, Some(n));
		}

		#[test]
		fn few_distinct_numbers_are_classification(values in prop::collection::vec(0u8..20, 1..100)) {
			let data = values.iter().map(|value| *value as f32).collect();
			let column = Column::Number(NumberColumn { name: "y".to_owned(), data });
			prop_assert_eq!(classify_task(&column, &TaskPolicy::default()).kind, TaskKind::Classification);
		}
	}
}
