use crate::{rank::rank, sanitize::sanitize, sanitize::sanitize_metrics, TaskKind};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
	Completed,
	Failed,
}

/// The result of training and scoring one model. Every numeric value is finite and rounded, and values that could not be computed are `None`, which serializes as `null`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvaluationOutcome {
	pub model_name: String,
	pub status: OutcomeStatus,
	pub metrics: BTreeMap<String, Option<f64>>,
	pub error_message: Option<String>,
	pub warning: Option<String>,
	pub training_time_seconds: Option<f64>,
}

impl EvaluationOutcome {
	/// Build a completed outcome, sanitizing every metric and the training time.
	pub fn completed(
		model_name: &str,
		metrics: BTreeMap<String, Option<f64>>,
		warning: Option<String>,
		training_time_seconds: f64,
	) -> EvaluationOutcome {
		EvaluationOutcome {
			model_name: model_name.to_owned(),
			status: OutcomeStatus::Completed,
			metrics: sanitize_metrics(metrics),
			error_message: None,
			warning,
			training_time_seconds: sanitize(training_time_seconds),
		}
	}

	pub fn failed(model_name: &str, error_message: String) -> EvaluationOutcome {
		EvaluationOutcome {
			model_name: model_name.to_owned(),
			status: OutcomeStatus::Failed,
			metrics: BTreeMap::new(),
			error_message: Some(error_message),
			warning: None,
			training_time_seconds: None,
		}
	}

	/// The value of the metric named `name`, if it was computed.
	pub fn metric(&self, name: &str) -> Option<f64> {
		self.metrics.get(name).copied().flatten()
	}

	pub fn is_completed(&self) -> bool {
		self.status == OutcomeStatus::Completed
	}
}

/// The ranked comparison of every model in the panel.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvaluationReport {
	/// The number of rows used, after sampling and after dropping rows with a missing target.
	pub rows_used: usize,
	/// Every column of the dataset in file order, including the target.
	pub columns: Vec<String>,
	pub task: TaskKind,
	pub target_column: String,
	/// The class names in label order. Empty for regression.
	pub classes: Vec<String>,
	pub test_fraction: f64,
	/// The number of rows the models were trained on.
	pub train_rows: usize,
	/// The number of rows held out for scoring.
	pub test_rows: usize,
	pub warnings: Vec<String>,
	pub results: Vec<EvaluationOutcome>,
}

/// Everything in a report besides the task and the outcomes.
#[derive(Clone, Debug)]
pub struct DatasetSummary {
	pub rows_used: usize,
	pub columns: Vec<String>,
	pub target_column: String,
	pub classes: Vec<String>,
	pub test_fraction: f64,
	pub train_rows: usize,
	pub test_rows: usize,
	pub warnings: Vec<String>,
}

/// Rank `outcomes` and combine them with the dataset summary.
pub fn assemble_report(
	summary: DatasetSummary,
	task: TaskKind,
	outcomes: Vec<EvaluationOutcome>,
) -> EvaluationReport {
	let DatasetSummary {
		rows_used,
		columns,
		target_column,
		classes,
		test_fraction,
		train_rows,
		test_rows,
		warnings,
	} = summary;
	EvaluationReport {
		rows_used,
		columns,
		task,
		target_column,
		classes,
		test_fraction,
		train_rows,
		test_rows,
		warnings,
		results: rank(task, outcomes),
	}
}

#[test]
fn test_outcome_json() {
	let mut metrics = BTreeMap::new();
	metrics.insert("r2_test".to_owned(), Some(0.912345678));
	metrics.insert("mape".to_owned(), None);
	metrics.insert("mse".to_owned(), Some(std::f64::NAN));
	let outcome = EvaluationOutcome::completed("Linear Regression", metrics, None, 0.0123456);
	insta::assert_snapshot!(serde_json::to_string(&outcome).unwrap(), @r###"{"model_name":"Linear Regression","status":"completed","metrics":{"mape":null,"mse":null,"r2_test":0.91235},"error_message":null,"warning":null,"training_time_seconds":0.01235}"###);
	let outcome = EvaluationOutcome::failed("Decision Tree", "boom".to_owned());
	insta::assert_snapshot!(serde_json::to_string(&outcome).unwrap(), @r###"{"model_name":"Decision Tree","status":"failed","metrics":{},"error_message":"boom","warning":null,"training_time_seconds":null}"###);
}
