use crate::{report::EvaluationOutcome, TaskKind};
use std::cmp::Ordering;

/// The metric outcomes are ranked by.
pub fn primary_metric(task: TaskKind) -> &'static str {
	match task {
		TaskKind::Regression => "r2_test",
		TaskKind::Classification => "accuracy",
	}
}

/**
Order `outcomes` from best to worst. Completed outcomes come first, sorted by the primary metric in descending order, followed by failed outcomes. For regression an absent `r2_test` ranks below every present one. For classification an absent accuracy counts as 0. The sort is stable, so ties keep their panel order.
*/
pub fn rank(task: TaskKind, mut outcomes: Vec<EvaluationOutcome>) -> Vec<EvaluationOutcome> {
	outcomes.sort_by(|a, b| compare_outcomes(task, a, b));
	outcomes
}

fn compare_outcomes(task: TaskKind, a: &EvaluationOutcome, b: &EvaluationOutcome) -> Ordering {
	match (a.is_completed(), b.is_completed()) {
		(true, false) => Ordering::Less,
		(false, true) => Ordering::Greater,
		(false, false) => Ordering::Equal,
		(true, true) => match (ranking_value(task, a), ranking_value(task, b)) {
			(Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		},
	}
}

fn ranking_value(task: TaskKind, outcome: &EvaluationOutcome) -> Option<f64> {
	let value = outcome.metric(primary_metric(task));
	match task {
		TaskKind::Regression => value,
		TaskKind::Classification => Some(value.unwrap_or(0.0)),
	}
}

#[cfg(test)]
fn outcome(index: usize, task: TaskKind, value: Option<f64>, failed: bool) -> EvaluationOutcome {
	let name = format!("model {}", index);
	if failed {
		return EvaluationOutcome::failed(&name, "failed".to_owned());
	}
	let mut metrics = std::collections::BTreeMap::new();
	metrics.insert(primary_metric(task).to_owned(), value);
	EvaluationOutcome::completed(&name, metrics, None, 0.0)
}

#[cfg(test)]
fn names(outcomes: &[EvaluationOutcome]) -> Vec<&str> {
	outcomes
		.iter()
		.map(|outcome| outcome.model_name.as_str())
		.collect()
}

#[test]
fn test_rank_regression() {
	let task = TaskKind::Regression;
	let outcomes = vec![
		outcome(0, task, Some(0.5), false),
		outcome(1, task, None, false),
		outcome(2, task, Some(-3.0), false),
		outcome(3, task, None, true),
		outcome(4, task, Some(0.9), false),
		outcome(5, task, Some(0.5), false),
	];
	let ranked = rank(task, outcomes);
	assert_eq!(
		names(&ranked),
		vec!["model 4", "model 0", "model 5", "model 2", "model 1", "model 3"]
	);
}

#[test]
fn test_rank_classification_treats_absent_accuracy_as_zero() {
	let task = TaskKind::Classification;
	let outcomes = vec![
		outcome(0, task, None, false),
		outcome(1, task, Some(0.0), false),
		outcome(2, task, Some(0.75), true),
		outcome(3, task, Some(0.75), false),
	];
	let ranked = rank(task, outcomes);
	assert_eq!(
		names(&ranked),
		vec!["model 3", "model 0", "model 1", "model 2"]
	);
}

#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	fn arbitrary_outcomes() -> impl Strategy<Value = Vec<(Option<f64>, bool)>> {
		prop::collection::vec((prop::option::of(-5.0f64..1.0), prop::bool::weighted(0.2)), 0..12)
	}

	proptest! {
		#[test]
		fn ranking_orders_completed_outcomes(
			entries in arbitrary_outcomes(),
			classification in prop::bool::ANY,
		) {
			let task = if classification { TaskKind::Classification } else { TaskKind::Regression };
			let outcomes: Vec<EvaluationOutcome> = entries
				.iter()
				.enumerate()
				.map(|(index, (value, failed))| outcome(index, task, *value, *failed))
				.collect();
			let ranked = rank(task, outcomes.clone());
			prop_assert_eq!(ranked.len(), outcomes.len());
			// Failed outcomes come after every completed outcome.
			let first_failed = ranked.iter().position(|outcome| !outcome.is_completed()).unwrap_or(ranked.len());
			prop_assert!(ranked[first_failed..].iter().all(|outcome| !outcome.is_completed()));
			// The primary metric never increases among completed outcomes.
			let completed = &ranked[..first_failed];
			for pair in completed.windows(2) {
				match (ranking_value(task, &pair[0]), ranking_value(task, &pair[1])) {
					(Some(a), Some(b)) => prop_assert!(a >= b),
					(None, Some(_)) => prop_assert!(false, "an absent value ranked above a present one"),
					_ => {}
				}
			}
			// Ties keep their original order.
			for pair in ranked.windows(2) {
				if compare_outcomes(task, &pair[0], &pair[1]) == Ordering::Equal {
					let index = |outcome: &EvaluationOutcome| outcomes.iter().position(|o| o.model_name == outcome.model_name);
					prop_assert!(index(&pair[0]) < index(&pair[1]));
				}
			}
		}
	}
}
