/*!
This crate evaluates a tabular dataset against a small panel of models and produces a ranked report.

Given a CSV file and the name of its target column, [`evaluate`](fn.evaluate.html) decides whether the task is regression or classification, holds out a stratified test set, trains every model of the matching panel concurrently, and ranks the models by their score on the test set. A model that fails to train is recorded as failed in the report and does not abort the evaluation. Every metric in the report is either a finite number rounded to five decimal places or absent, so the report always serializes to valid JSON.

```no_run
let report = bakeoff_core::evaluate("heart_disease.csv".as_ref(), "diagnosis").unwrap();
println!("best model: {}", report.results[0].model_name);
```
*/

use bakeoff_dataframe::DataFrame;
use std::path::Path;

mod config;
mod dataset;
mod dispatch;
mod error;
mod features;
mod model;
mod panel;
mod rank;
mod report;
mod sanitize;
mod split;
mod task;
mod trainer;

pub use self::{
	config::{load_config, Config, SamplingOptions},
	dataset::load_dataset,
	dispatch::dispatch,
	error::Error,
	features::encode_features,
	model::{Predictions, TrainedModel},
	panel::{panel, ModelKind, ModelSpec},
	rank::{primary_metric, rank},
	report::{assemble_report, DatasetSummary, EvaluationOutcome, EvaluationReport, OutcomeStatus},
	sanitize::{sanitize, sanitize_metrics, DECIMAL_DIGITS},
	split::{split, test_fraction, Labels, Split},
	task::{classify_task, encode_target, EncodedTarget, TaskDecision, TaskKind, TaskPolicy},
	trainer::{train_and_score, SMALL_TEST_SET_WARNING, SMALL_TRAINING_SET_ROWS},
};

/// Evaluate the dataset at `path` against the model panel for its target column, using the default config.
pub fn evaluate(path: &Path, target_column_name: &str) -> Result<EvaluationReport, Error> {
	Evaluator::default().evaluate(path, target_column_name)
}

/// An `Evaluator` runs evaluations with a fixed [`Config`](struct.Config.html). Running the same evaluator twice on the same input produces the same report, apart from training times.
#[derive(Clone, Debug, Default)]
pub struct Evaluator {
	config: Config,
}

impl Evaluator {
	pub fn new(config: Config) -> Evaluator {
		Evaluator { config }
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Load the dataset at `path`, sampling it if it is large, and evaluate it.
	pub fn evaluate(
		&self,
		path: &Path,
		target_column_name: &str,
	) -> Result<EvaluationReport, Error> {
		let dataframe = load_dataset(path, &self.config.sampling, self.config.seed)?;
		self.evaluate_dataframe(dataframe, target_column_name)
	}

	/// Evaluate a dataframe that is already in memory. No sampling is applied.
	pub fn evaluate_dataframe(
		&self,
		dataframe: DataFrame,
		target_column_name: &str,
	) -> Result<EvaluationReport, Error> {
		self.evaluate_with_panel(dataframe, target_column_name, panel)
	}

	pub(crate) fn evaluate_with_panel(
		&self,
		mut dataframe: DataFrame,
		target_column_name: &str,
		make_panel: impl Fn(TaskKind, u64) -> Vec<ModelSpec>,
	) -> Result<EvaluationReport, Error> {
		let seed = self.config.seed;
		let columns = dataframe.column_names();
		let target_column = dataframe.remove_column(target_column_name).ok_or_else(|| {
			Error::invalid_target(format!(
				"did not find target column \"{}\" among column names \"{}\"",
				target_column_name,
				columns.join(", ")
			))
		})?;

		let policy = TaskPolicy {
			classification_max_distinct_values: self.config.classification_max_distinct_values,
			near_threshold_margin: self.config.near_threshold_margin,
		};
		let decision = classify_task(&target_column, &policy);
		match decision.distinct_values {
			Some(distinct_values) => log::info!(
				"target column \"{}\" has {} distinct values, evaluating a {} task",
				target_column_name,
				distinct_values,
				decision.kind
			),
			None => log::info!(
				"target column \"{}\" is not numeric, evaluating a {} task",
				target_column_name,
				decision.kind
			),
		}
		let mut warnings = Vec::new();
		if let Some(warning) = decision.warning {
			log::warn!("{}", warning);
			warnings.push(warning);
		}

		let (target, kept_rows) = encode_target(&target_column, decision.kind)?;
		if kept_rows.len() < target_column.len() {
			log::warn!(
				"dropped {} rows with a missing target",
				target_column.len() - kept_rows.len()
			);
			dataframe = dataframe.take_rows(&kept_rows);
		}
		let rows_used = target.len();
		let classes = match &target {
			EncodedTarget::Regression { .. } => Vec::new(),
			EncodedTarget::Classification { classes, .. } => classes.clone(),
		};

		let test_fraction = test_fraction(rows_used);
		log::debug!(
			"holding out {} of {} rows for testing",
			test_fraction,
			rows_used
		);
		let split = split(&dataframe, &target, test_fraction, seed)?;

		let panel = make_panel(decision.kind, seed);
		let outcomes = dispatch(&panel, &split, seed, self.config.n_threads);
		let summary = DatasetSummary {
			rows_used,
			columns,
			target_column: target_column_name.to_owned(),
			classes,
			test_fraction,
			train_rows: split.labels_train.len(),
			test_rows: split.labels_test.len(),
			warnings,
		};
		Ok(assemble_report(summary, decision.kind, outcomes))
	}
}

#[cfg(test)]
fn number_column(name: &str, data: Vec<f32>) -> bakeoff_dataframe::Column {
	bakeoff_dataframe::Column::Number(bakeoff_dataframe::NumberColumn {
		name: name.to_owned(),
		data,
	})
}

#[cfg(test)]
fn assert_ranked(report: &EvaluationReport) {
	let metric = primary_metric(report.task);
	for pair in report.results.windows(2) {
		match (pair[0].metric(metric), pair[1].metric(metric)) {
			(Some(a), Some(b)) => assert!(a >= b),
			(None, Some(_)) => panic!("an unscored model ranked above a scored one"),
			_ => {}
		}
	}
}

#[cfg(test)]
fn assert_json_safe(report: &EvaluationReport) {
	for outcome in report.results.iter() {
		for value in outcome.metrics.values().flatten() {
			assert!(value.is_finite());
		}
	}
	let json = serde_json::to_string(report).unwrap();
	assert!(!json.contains("NaN"));
}

#[test]
fn test_large_numeric_target_is_regression() {
	let n = 1000;
	let x: Vec<f32> = (0..n).map(|i| (i % 400) as f32).collect();
	let noise: Vec<f32> = (0..n).map(|i| ((i * 7) % 13) as f32).collect();
	let price: Vec<f32> = x.iter().map(|x| 3.0 * x + 1.0).collect();
	let dataframe = DataFrame {
		columns: vec![
			number_column("x", x),
			number_column("noise", noise),
			number_column("price", price),
		],
	};
	let report = Evaluator::default()
		.evaluate_dataframe(dataframe, "price")
		.unwrap();
	assert_eq!(report.task, TaskKind::Regression);
	assert_eq!(report.rows_used, 1000);
	assert_eq!(report.columns, vec!["x", "noise", "price"]);
	assert!(report.classes.is_empty());
	assert!(report.warnings.is_empty());
	assert_eq!(report.test_fraction, 0.2);
	assert_eq!(report.train_rows, 800);
	assert_eq!(report.test_rows, 200);
	assert_eq!(report.results.len(), 4);
	assert!(report.results.iter().all(|outcome| outcome.is_completed()));
	let best = report.results[0].metric("r2_test").unwrap();
	for outcome in report.results.iter() {
		assert!(outcome.metric("r2_test").unwrap() <= best);
		assert!(outcome.metrics.contains_key("mse"));
		assert!(!outcome.metrics.contains_key("accuracy"));
	}
	assert!(best > 0.99);
	assert_ranked(&report);
	assert_json_safe(&report);
}

#[test]
fn test_binary_csv_target_is_classification() {
	let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
	use std::io::Write;
	writeln!(file, "income,age,approved").unwrap();
	for i in 0..50 {
		let approved = if i % 2 == 0 { 1 } else { 0 };
		writeln!(file, "{},{},{}", 1000 + i * 10 + approved * 500, 20 + i % 30, approved).unwrap();
	}
	file.flush().unwrap();
	let report = evaluate(file.path(), "approved").unwrap();
	assert_eq!(report.task, TaskKind::Classification);
	assert_eq!(report.rows_used, 50);
	assert_eq!(report.classes, vec!["0", "1"]);
	assert_eq!(report.test_fraction, 0.2);
	assert_eq!(report.train_rows, 40);
	assert_eq!(report.test_rows, 10);
	assert_eq!(report.results.len(), 4);
	let names: std::collections::BTreeSet<&str> = report
		.results
		.iter()
		.map(|outcome| outcome.model_name.as_str())
		.collect();
	assert_eq!(
		names,
		vec![
			"Decision Tree",
			"Logistic Regression",
			"Random Forest",
			"Support Vector Machine"
		]
		.into_iter()
		.collect()
	);
	for outcome in report.results.iter() {
		assert!(outcome.is_completed());
		let accuracy = outcome.metric("accuracy").unwrap();
		assert!((0.0..=1.0).contains(&accuracy));
		assert!(outcome.metrics.contains_key("f1"));
		assert!(!outcome.metrics.contains_key("r2_test"));
	}
	assert_ranked(&report);
	assert_json_safe(&report);
}

#[test]
fn test_tiny_dataset_is_cross_validated() {
	let dataframe = DataFrame {
		columns: vec![
			number_column("x", vec![1.0, 2.0, 3.0, 4.0]),
			number_column("y", vec![0.0, 0.0, 1.0, 1.0]),
		],
	};
	let report = Evaluator::default()
		.evaluate_dataframe(dataframe.clone(), "y")
		.unwrap();
	assert_eq!(report.task, TaskKind::Classification);
	assert_eq!(report.test_fraction, 0.5);
	assert_eq!(report.train_rows, 2);
	assert_eq!(report.test_rows, 2);
	assert_eq!(report.results.len(), 4);
	for outcome in report.results.iter() {
		assert!(outcome.is_completed());
		assert!(outcome.metric("cv_mean").is_some());
	}

	let config = Config {
		classification_max_distinct_values: 1,
		near_threshold_margin: 0,
		..Config::default()
	};
	let report = Evaluator::new(config)
		.evaluate_dataframe(dataframe, "y")
		.unwrap();
	assert_eq!(report.task, TaskKind::Regression);
	for outcome in report.results.iter() {
		assert!(outcome.metrics.contains_key("cv_mean"));
	}
	assert_json_safe(&report);
}

#[test]
fn test_missing_target_column() {
	let dataframe = DataFrame {
		columns: vec![
			number_column("a", vec![1.0, 2.0]),
			number_column("b", vec![3.0, 4.0]),
		],
	};
	let error = Evaluator::default()
		.evaluate_dataframe(dataframe, "missing")
		.unwrap_err();
	match error {
		Error::InvalidTarget { message } => assert_eq!(
			message,
			"did not find target column \"missing\" among column names \"a, b\""
		),
		error => panic!("unexpected error {:?}", error),
	}

	let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
	use std::io::Write;
	writeln!(file, "a,b\n1,2\n3,4").unwrap();
	file.flush().unwrap();
	let error = evaluate(file.path(), "missing").unwrap_err();
	assert!(matches!(error, Error::InvalidTarget { .. }));
}

#[test]
fn test_single_class_target() {
	let dataframe = DataFrame {
		columns: vec![
			number_column("x", vec![1.0, 2.0, 3.0]),
			number_column("y", vec![1.0, 1.0, 1.0]),
		],
	};
	let error = Evaluator::default()
		.evaluate_dataframe(dataframe, "y")
		.unwrap_err();
	assert!(matches!(error, Error::InvalidTarget { .. }));
}

#[test]
fn test_failed_model_does_not_abort_evaluation() {
	let n = 100;
	let x: Vec<f32> = (0..n).map(|i| i as f32).collect();
	let y: Vec<f32> = x.iter().map(|x| 2.0 * x - 5.0).collect();
	let dataframe = DataFrame {
		columns: vec![number_column("x", x), number_column("y", y)],
	};
	let diverging_panel = |task, seed| {
		let mut panel = panel(task, seed);
		for spec in panel.iter_mut() {
			if let ModelKind::SupportVectorRegressor(options) = &mut spec.model {
				options.learning_rate = std::f32::INFINITY;
			}
		}
		panel
	};
	let report = Evaluator::default()
		.evaluate_with_panel(dataframe, "y", diverging_panel)
		.unwrap();
	assert_eq!(report.results.len(), 4);
	let failed: Vec<&EvaluationOutcome> = report
		.results
		.iter()
		.filter(|outcome| !outcome.is_completed())
		.collect();
	assert_eq!(failed.len(), 1);
	assert_eq!(failed[0].model_name, "Support Vector Machine");
	assert_eq!(failed[0].status, OutcomeStatus::Failed);
	assert!(failed[0].metrics.is_empty());
	assert!(failed[0].error_message.is_some());
	assert_eq!(
		report.results.last().unwrap().model_name,
		"Support Vector Machine"
	);
	assert_json_safe(&report);
}

#[test]
fn test_text_feature_fails_every_model() {
	let n = 30;
	let dataframe = DataFrame {
		columns: vec![
			bakeoff_dataframe::Column::Text(bakeoff_dataframe::TextColumn {
				name: "notes".to_owned(),
				data: (0..n).map(|i| format!("note {}", i)).collect(),
			}),
			number_column("y", (0..n).map(|i| i as f32 * 1.5).collect()),
		],
	};
	let report = Evaluator::default()
		.evaluate_dataframe(dataframe, "y")
		.unwrap();
	assert_eq!(report.task, TaskKind::Regression);
	assert_eq!(report.results.len(), 4);
	for outcome in report.results.iter() {
		assert_eq!(outcome.status, OutcomeStatus::Failed);
		assert!(outcome
			.error_message
			.as_ref()
			.unwrap()
			.contains("notes"));
	}
}

#[test]
fn test_evaluation_is_deterministic() {
	let n = 60;
	let dataframe = DataFrame {
		columns: vec![
			number_column("a", (0..n).map(|i| ((i * 17) % 23) as f32).collect()),
			number_column("b", (0..n).map(|i| (i % 7) as f32).collect()),
			number_column("label", (0..n).map(|i| (i % 3) as f32).collect()),
		],
	};
	let evaluator = Evaluator::default();
	let first = evaluator
		.evaluate_dataframe(dataframe.clone(), "label")
		.unwrap();
	let second = evaluator.evaluate_dataframe(dataframe, "label").unwrap();
	assert_eq!(first.results.len(), second.results.len());
	for (first, second) in first.results.iter().zip(second.results.iter()) {
		assert_eq!(first.model_name, second.model_name);
		assert_eq!(first.status, second.status);
		assert_eq!(first.metrics, second.metrics);
	}
	assert_eq!(first.classes, second.classes);
	assert_eq!(first.rows_used, second.rows_used);
}

#[test]
fn test_file_evaluation_is_deterministic() {
	let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
	use std::io::Write;
	writeln!(file, "rooms,area,price").unwrap();
	for i in 0..45 {
		let rooms = 1 + i % 5;
		let area = 30 + (i * 13) % 90;
		writeln!(file, "{},{},{}", rooms, area, 1000 * rooms + 25 * area + i).unwrap();
	}
	file.flush().unwrap();
	let first = evaluate(file.path(), "price").unwrap();
	let second = evaluate(file.path(), "price").unwrap();
	assert_eq!(first.task, TaskKind::Regression);
	assert_eq!(first.task, second.task);
	assert_eq!(first.rows_used, 45);
	assert_eq!(first.rows_used, second.rows_used);
	assert_eq!(first.test_rows, 9);
	assert_eq!(first.test_rows, second.test_rows);
	assert_eq!(first.results.len(), second.results.len());
	for (first, second) in first.results.iter().zip(second.results.iter()) {
		assert_eq!(first.model_name, second.model_name);
		assert_eq!(first.status, second.status);
		assert_eq!(first.metrics, second.metrics);
	}
}

#[test]
fn test_rows_with_missing_target_are_dropped() {
	let dataframe = DataFrame {
		columns: vec![
			number_column("x", (0..40).map(|i| i as f32).collect()),
			number_column(
				"y",
				(0..40)
					.map(|i| if i % 10 == 0 { std::f32::NAN } else { i as f32 * 0.5 })
					.collect(),
			),
		],
	};
	let report = Evaluator::default()
		.evaluate_dataframe(dataframe, "y")
		.unwrap();
	assert_eq!(report.task, TaskKind::Regression);
	assert_eq!(report.rows_used, 36);
	assert_eq!(report.results.len(), 4);
}
