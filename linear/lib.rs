/*!
This crate is an implementation of linear machine learning models for regression and classification. There are four model types:

- [`Regressor`](struct.Regressor.html) is ordinary least squares linear regression, solved exactly with the normal equations.
- [`MulticlassClassifier`](struct.MulticlassClassifier.html) is logistic regression. It trains `n_classes` linear models whose outputs are combined with the `softmax` function, which covers binary classification as the two class case.
- [`SvmRegressor`](struct.SvmRegressor.html) is a linear kernel support vector regressor using the epsilon insensitive loss.
- [`SvmClassifier`](struct.SvmClassifier.html) is a linear kernel support vector classifier using the hinge loss with one model per class.

Every model standardizes its features to zero mean and unit variance with a [`Scaler`](struct.Scaler.html) fit on the training data. The models trained with gradient descent visit the training examples in order and start from zero weights, so training is deterministic. After each epoch the loss on the training set is monitored, and training terminates when the loss has stabilized.
*/

#![allow(clippy::tabs_in_doc_comments)]

use ndarray::prelude::*;
use thiserror::Error;

mod early_stopping;
mod multiclass_classifier;
mod regressor;
mod scaler;
mod solve;
mod svm_classifier;
mod svm_regressor;

pub use self::early_stopping::EarlyStoppingOptions;
pub use self::multiclass_classifier::MulticlassClassifier;
pub use self::regressor::{Regressor, RegressorOptions};
pub use self::scaler::Scaler;
pub use self::svm_classifier::SvmClassifier;
pub use self::svm_regressor::SvmRegressor;

/// These are the options passed to `MulticlassClassifier::train`.
#[derive(Clone, Debug)]
pub struct TrainOptions {
	/// Specify options for early stopping. If the value is `Some`, early stopping will be enabled. If it is `None`, early stopping will be disabled.
	pub early_stopping_options: Option<EarlyStoppingOptions>,
	/// This is the L2 regularization value to use when updating the model parameters.
	pub l2_regularization: f32,
	/// This is the learning rate to use when updating the model parameters.
	pub learning_rate: f32,
	/// This is the maximum number of epochs to train.
	pub max_epochs: usize,
	/// This is the number of examples to use for each batch of training.
	pub n_examples_per_batch: usize,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			early_stopping_options: Some(EarlyStoppingOptions::default()),
			l2_regularization: 1e-4,
			learning_rate: 0.1,
			max_epochs: 200,
			n_examples_per_batch: 32,
		}
	}
}

/// These are the options passed to `SvmRegressor::train` and `SvmClassifier::train`.
#[derive(Clone, Debug)]
pub struct SvmOptions {
	/// The inverse of the regularization strength. The L2 penalty applied per epoch is `1 / (c * n_examples)`.
	pub c: f32,
	/// Residuals smaller than `epsilon` are not penalized by the regressor. The regressor measures residuals in units of the standardized target.
	pub epsilon: f32,
	pub early_stopping_options: Option<EarlyStoppingOptions>,
	/// The learning rate at epoch `t` is `learning_rate / sqrt(t + 1)`.
	pub learning_rate: f32,
	pub max_epochs: usize,
	pub n_examples_per_batch: usize,
}

impl Default for SvmOptions {
	fn default() -> Self {
		Self {
			c: 1.0,
			epsilon: 0.1,
			early_stopping_options: Some(EarlyStoppingOptions::default()),
			learning_rate: 0.1,
			max_epochs: 500,
			n_examples_per_batch: 32,
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
	#[error("training diverged, the model parameters are no longer finite")]
	Diverged,
	#[error("the normal equations could not be solved")]
	Singular,
}

/// Check that there is at least one example and that every feature value is finite.
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

fn check_labels(labels: ArrayView1<usize>, n_classes: usize) -> Result<(), TrainError> {
	match labels.iter().find(|label| **label >= n_classes) {
		Some(label) => Err(TrainError::LabelOutOfRange {
			label: *label,
			n_classes,
		}),
		None => Ok(()),
	}
}

fn check_finite<'a>(values: impl IntoIterator<Item = &'a f32>) -> Result<(), TrainError> {
	if values.into_iter().all(|value| value.is_finite()) {
		Ok(())
	} else {
		Err(TrainError::Diverged)
	}
}

/// Return the index of the largest value, preferring the lowest index among ties.
fn argmax(values: ArrayView1<f32>) -> usize {
	let mut best = 0;
	for (index, value) in values.iter().enumerate() {
		if *value > values[best] {
			best = index;
		}
	}
	best
}
