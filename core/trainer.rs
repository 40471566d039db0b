use crate::{
	features::encode_features,
	model::Predictions,
	panel::ModelSpec,
	report::EvaluationOutcome,
	split::{Labels, Split},
};
use anyhow::{bail, Result};
use bakeoff_metrics::{
	Accuracy, ClassificationMetrics, ClassificationMetricsInput, RegressionMetrics, RegressionMetricsInput,
	RegressionMetricsOutput, StreamingMetric,
};
use ndarray::prelude::*;
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::{
	any::Any,
	collections::BTreeMap,
	panic::{catch_unwind, AssertUnwindSafe},
	time::Instant,
};

/// Training sets with fewer rows than this also get a cross validated score.
pub const SMALL_TRAINING_SET_ROWS: usize = 10;

const MAX_CROSS_VALIDATION_FOLDS: usize = 3;

pub const SMALL_TEST_SET_WARNING: &str = "dataset too small for reliable R²";

/**
Train the model described by `spec` on the training half of `split` and score it on both halves. This function never fails and never panics: errors and panics raised while encoding features, training or predicting are recorded in a failed outcome.
*/
pub fn train_and_score(spec: &ModelSpec, split: &Split, seed: u64) -> EvaluationOutcome {
	let result = catch_unwind(AssertUnwindSafe(|| score(spec, split, seed)));
	let outcome = match result {
		Ok(Ok(scores)) => EvaluationOutcome::completed(
			spec.name,
			scores.metrics,
			scores.warning,
			scores.training_time_seconds,
		),
		Ok(Err(error)) => EvaluationOutcome::failed(spec.name, format!("{:#}", error)),
		Err(panic) => EvaluationOutcome::failed(
			spec.name,
			format!("{} panicked: {}", spec.name, panic_message(panic.as_ref())),
		),
	};
	match &outcome.error_message {
		None => log::info!(
			"{} completed in {:.3}s",
			spec.name,
			outcome.training_time_seconds.unwrap_or(0.0)
		),
		Some(error_message) => log::warn!("{} failed: {}", spec.name, error_message),
	}
	outcome
}

/// Extract the message from a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic".to_owned()
	}
}

struct Scores {
	metrics: BTreeMap<String, Option<f64>>,
	warning: Option<String>,
	training_time_seconds: f64,
}

fn score(spec: &ModelSpec, split: &Split, seed: u64) -> Result<Scores> {
	let features_train = encode_features(&split.features_train, split.labels_train.len())?;
	let features_test = encode_features(&split.features_test, split.labels_test.len())?;
	let mut metrics = BTreeMap::new();
	if split.labels_train.len() < SMALL_TRAINING_SET_ROWS {
		let cv_mean = cross_validate(spec, features_train.view(), &split.labels_train, seed);
		metrics.insert("cv_mean".to_owned(), cv_mean);
	}
	let start = Instant::now();
	let model = spec.fit_named(features_train.view(), &split.labels_train)?;
	let training_time_seconds = start.elapsed().as_secs_f64();
	let predictions_train = model.predict(features_train.view());
	let predictions_test = model.predict(features_test.view());
	let mut warning = None;
	match (
		&predictions_train,
		&predictions_test,
		&split.labels_train,
		&split.labels_test,
	) {
		(
			Predictions::Regression(predictions_train),
			Predictions::Regression(predictions_test),
			Labels::Regression(labels_train),
			Labels::Regression(labels_test),
		) => {
			let train = regression_metrics(predictions_train, labels_train);
			let test = regression_metrics(predictions_test, labels_test);
			let r2_test = if labels_test.len() >= 2 {
				Some(test.r2 as f64)
			} else {
				warning = Some(SMALL_TEST_SET_WARNING.to_owned());
				None
			};
			metrics.insert("r2_train".to_owned(), Some(train.r2 as f64));
			metrics.insert("r2_test".to_owned(), r2_test);
			metrics.insert("mse".to_owned(), Some(test.mse as f64));
			metrics.insert("mae".to_owned(), Some(test.mae as f64));
			metrics.insert("rmse".to_owned(), Some(test.rmse as f64));
			metrics.insert("mape".to_owned(), test.mape.map(f64::from));
		}
		(
			Predictions::Classification(predictions_train),
			Predictions::Classification(predictions_test),
			Labels::Classification {
				labels: labels_train,
				..
			},
			Labels::Classification { labels, n_classes },
		) => {
			let mut classification_metrics = ClassificationMetrics::new(*n_classes);
			classification_metrics.update(ClassificationMetricsInput {
				predictions: predictions_test,
				labels: &labels.to_vec(),
			});
			let test = classification_metrics.finalize();
			metrics.insert(
				"accuracy_train".to_owned(),
				accuracy(predictions_train, labels_train).map(f64::from),
			);
			metrics.insert("accuracy".to_owned(), Some(test.accuracy as f64));
			metrics.insert("f1".to_owned(), Some(test.f1_score_weighted as f64));
			metrics.insert("precision".to_owned(), Some(test.precision_weighted as f64));
			metrics.insert("recall".to_owned(), Some(test.recall_weighted as f64));
		}
		_ => bail!("{} produced predictions that do not match the target", spec.name),
	}
	Ok(Scores {
		metrics,
		warning,
		training_time_seconds,
	})
}

fn regression_metrics(predictions: &Array1<f32>, labels: &Array1<f32>) -> RegressionMetricsOutput {
	let mut metrics = RegressionMetrics::default();
	metrics.update(RegressionMetricsInput {
		predictions: &predictions.to_vec(),
		labels: &labels.to_vec(),
	});
	metrics.finalize()
}

/**
Compute the mean score over `min(3, n_rows)` shuffled folds of the training set: R² for regression and accuracy for classification. Folds whose model fails to train score NaN, which makes the mean NaN and the sanitized metric absent. Returns `None` if there are fewer than two rows.
*/
fn cross_validate(
	spec: &ModelSpec,
	features: ArrayView2<f32>,
	labels: &Labels,
	seed: u64,
) -> Option<f64> {
	let n_rows = labels.len();
	let n_folds = n_rows.min(MAX_CROSS_VALIDATION_FOLDS);
	if n_folds < 2 {
		return None;
	}
	let mut indexes: Vec<usize> = (0..n_rows).collect();
	indexes.shuffle(&mut Xoshiro256Plus::seed_from_u64(seed));
	let mut scores = Vec::with_capacity(n_folds);
	let mut fold_start = 0;
	for fold_index in 0..n_folds {
		// The first `n_rows % n_folds` folds get one extra row.
		let fold_size = n_rows / n_folds + if fold_index < n_rows % n_folds { 1 } else { 0 };
		let fold_end = fold_start + fold_size;
		let test_indexes = &indexes[fold_start..fold_end];
		let train_indexes: Vec<usize> = indexes[..fold_start]
			.iter()
			.chain(indexes[fold_end..].iter())
			.copied()
			.collect();
		fold_start = fold_end;
		let labels_train = labels.take(&train_indexes);
		let labels_test = labels.take(test_indexes);
		let score = match spec.fit(features.select(Axis(0), &train_indexes).view(), &labels_train) {
			Ok(model) => {
				let predictions = model.predict(features.select(Axis(0), test_indexes).view());
				fold_score(&predictions, &labels_test)
			}
			Err(error) => {
				log::debug!("{} failed on cross validation fold {}: {:#}", spec.name, fold_index, error);
				std::f64::NAN
			}
		};
		scores.push(score);
	}
	Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

fn fold_score(predictions: &Predictions, labels: &Labels) -> f64 {
	match (predictions, labels) {
		(Predictions::Regression(predictions), Labels::Regression(labels)) => {
			regression_metrics(predictions, labels).r2 as f64
		}
		(Predictions::Classification(predictions), Labels::Classification { labels, .. }) => {
			accuracy(predictions, labels)
				.map(f64::from)
				.unwrap_or(std::f64::NAN)
		}
		_ => std::f64::NAN,
	}
}

fn accuracy(predictions: &[usize], labels: &Array1<usize>) -> Option<f32> {
	let mut accuracy = Accuracy::new();
	for (prediction, label) in predictions.iter().zip(labels.iter()) {
		accuracy.update((*prediction, *label));
	}
	accuracy.finalize()
}

#[cfg(test)]
fn number_frame(columns: Vec<(&str, Vec<f32>)>) -> bakeoff_dataframe::DataFrame {
	bakeoff_dataframe::DataFrame {
		columns: columns
			.into_iter()
			.map(|(name, data)| {
				bakeoff_dataframe::Column::Number(bakeoff_dataframe::NumberColumn {
					name: name.to_owned(),
					data,
				})
			})
			.collect(),
	}
}

#[test]
fn test_regression_outcome() {
	let split = Split {
		features_train: number_frame(vec![("x", (0..20).map(|x| x as f32).collect())]),
		features_test: number_frame(vec![("x", vec![2.5, 7.5, 12.5])]),
		labels_train: Labels::Regression((0..20).map(|x| 2.0 * x as f32 + 1.0).collect()),
		labels_test: Labels::Regression(arr1(&[6.0, 16.0, 26.0])),
	};
	let spec = &crate::panel::panel(crate::TaskKind::Regression, 42)[0];
	let outcome = train_and_score(spec, &split, 42);
	assert!(outcome.is_completed());
	assert_eq!(outcome.metric("r2_test"), Some(1.0));
	assert_eq!(outcome.metric("mse"), Some(0.0));
	assert!(!outcome.metrics.contains_key("cv_mean"));
	assert!(outcome.training_time_seconds.is_some());
	let keys: Vec<&str> = outcome.metrics.keys().map(|key| key.as_str()).collect();
	assert_eq!(keys, vec!["mae", "mape", "mse", "r2_test", "r2_train", "rmse"]);
}

#[test]
fn test_single_test_row_has_no_r2() {
	let split = Split {
		features_train: number_frame(vec![("x", vec![1.0, 2.0, 3.0])]),
		features_test: number_frame(vec![("x", vec![4.0])]),
		labels_train: Labels::Regression(arr1(&[1.0, 2.0, 3.0])),
		labels_test: Labels::Regression(arr1(&[0.0])),
	};
	let spec = &crate::panel::panel(crate::TaskKind::Regression, 42)[2];
	let outcome = train_and_score(spec, &split, 42);
	assert!(outcome.is_completed());
	assert_eq!(outcome.metric("r2_test"), None);
	assert!(outcome.metrics.contains_key("r2_test"));
	assert_eq!(outcome.warning.as_deref(), Some(SMALL_TEST_SET_WARNING));
	// A zero label makes the percentage error undefined.
	assert_eq!(outcome.metric("mape"), None);
	// Three training rows give three single row folds, whose R² is undefined.
	assert!(outcome.metrics.contains_key("cv_mean"));
	assert_eq!(outcome.metric("cv_mean"), None);
}

#[test]
fn test_classification_outcome_with_cross_validation() {
	let split = Split {
		features_train: number_frame(vec![("x", vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0])]),
		features_test: number_frame(vec![("x", vec![0.5, 11.5])]),
		labels_train: Labels::Classification {
			labels: arr1(&[0, 0, 0, 1, 1, 1]),
			n_classes: 2,
		},
		labels_test: Labels::Classification {
			labels: arr1(&[0, 1]),
			n_classes: 2,
		},
	};
	let spec = &crate::panel::panel(crate::TaskKind::Classification, 42)[2];
	let outcome = train_and_score(spec, &split, 42);
	assert!(outcome.is_completed());
	assert_eq!(outcome.metric("accuracy"), Some(1.0));
	assert_eq!(outcome.metric("accuracy_train"), Some(1.0));
	assert_eq!(outcome.metric("f1"), Some(1.0));
	assert!(outcome.metric("cv_mean").is_some());
}

#[test]
fn test_text_feature_fails_the_model() {
	let mut features = number_frame(vec![("x", vec![1.0, 2.0])]);
	features
		.columns
		.push(bakeoff_dataframe::Column::Text(bakeoff_dataframe::TextColumn {
			name: "notes".to_owned(),
			data: vec!["a".to_owned(), "b".to_owned()],
		}));
	let split = Split {
		features_train: features.clone(),
		features_test: features,
		labels_train: Labels::Regression(arr1(&[1.0, 2.0])),
		labels_test: Labels::Regression(arr1(&[1.0, 2.0])),
	};
	let spec = &crate::panel::panel(crate::TaskKind::Regression, 42)[0];
	let outcome = train_and_score(spec, &split, 42);
	assert!(!outcome.is_completed());
	assert!(outcome.metrics.is_empty());
	insta::assert_snapshot!(outcome.error_message.unwrap(), @r###"feature column "notes" contains text values and cannot be used as a numeric feature"###);
}

#[test]
fn test_panic_message() {
	let panic = catch_unwind(|| panic!("out of {}", "range")).unwrap_err();
	assert_eq!(panic_message(panic.as_ref()), "out of range");
	let panic = catch_unwind(|| std::panic::panic_any(7)).unwrap_err();
	assert_eq!(panic_message(panic.as_ref()), "unknown panic");
}
