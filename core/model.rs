use crate::{
	panel::{ModelKind, ModelSpec},
	split::Labels,
};
use anyhow::{bail, Context, Result};
use ndarray::prelude::*;

/// A model produced by [`ModelSpec::fit`].
#[derive(Debug)]
pub enum TrainedModel {
	LinearRegression(bakeoff_linear::Regressor),
	SupportVectorRegressor(bakeoff_linear::SvmRegressor),
	TreeRegressor(bakeoff_tree::Regressor),
	LogisticRegression(bakeoff_linear::MulticlassClassifier),
	SupportVectorClassifier(bakeoff_linear::SvmClassifier),
	TreeClassifier(bakeoff_tree::Classifier),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predictions {
	Regression(Array1<f32>),
	Classification(Vec<usize>),
}

impl ModelSpec {
	/// Train a fresh model with these options. Each call starts from an untrained model.
	pub fn fit(&self, features: ArrayView2<f32>, labels: &Labels) -> Result<TrainedModel> {
		let model = match (&self.model, labels) {
			(ModelKind::LinearRegression(options), Labels::Regression(values)) => {
				TrainedModel::LinearRegression(bakeoff_linear::Regressor::train(
					features,
					values.view(),
					options,
				)?)
			}
			(ModelKind::SupportVectorRegressor(options), Labels::Regression(values)) => {
				TrainedModel::SupportVectorRegressor(bakeoff_linear::SvmRegressor::train(
					features,
					values.view(),
					options,
				)?)
			}
			(ModelKind::DecisionTreeRegressor(options), Labels::Regression(values))
			| (ModelKind::RandomForestRegressor(options), Labels::Regression(values)) => {
				TrainedModel::TreeRegressor(bakeoff_tree::Regressor::train(
					features,
					values.view(),
					options,
				)?)
			}
			(
				ModelKind::LogisticRegression(options),
				Labels::Classification { labels, n_classes },
			) => TrainedModel::LogisticRegression(bakeoff_linear::MulticlassClassifier::train(
				features,
				labels.view(),
				*n_classes,
				options,
			)?),
			(
				ModelKind::SupportVectorClassifier(options),
				Labels::Classification { labels, n_classes },
			) => TrainedModel::SupportVectorClassifier(bakeoff_linear::SvmClassifier::train(
				features,
				labels.view(),
				*n_classes,
				options,
			)?),
			(
				ModelKind::DecisionTreeClassifier(options),
				Labels::Classification { labels, n_classes },
			)
			| (
				ModelKind::RandomForestClassifier(options),
				Labels::Classification { labels, n_classes },
			) => TrainedModel::TreeClassifier(bakeoff_tree::Classifier::train(
				features,
				labels.view(),
				*n_classes,
				options,
			)?),
			_ => bail!(
				"{} is a {} model and cannot be trained on these labels",
				self.name,
				self.task()
			),
		};
		Ok(model)
	}

	/// Fit on the training set, wrapping any error with the model's name.
	pub fn fit_named(&self, features: ArrayView2<f32>, labels: &Labels) -> Result<TrainedModel> {
		self.fit(features, labels)
			.with_context(|| format!("failed to train {}", self.name))
	}
}

impl TrainedModel {
	pub fn predict(&self, features: ArrayView2<f32>) -> Predictions {
		match self {
			TrainedModel::LinearRegression(model) => Predictions::Regression(model.predict(features)),
			TrainedModel::SupportVectorRegressor(model) => {
				Predictions::Regression(model.predict(features))
			}
			TrainedModel::TreeRegressor(model) => Predictions::Regression(model.predict(features)),
			TrainedModel::LogisticRegression(model) => {
				Predictions::Classification(model.predict_classes(features))
			}
			TrainedModel::SupportVectorClassifier(model) => {
				Predictions::Classification(model.predict_classes(features))
			}
			TrainedModel::TreeClassifier(model) => {
				Predictions::Classification(model.predict_classes(features))
			}
		}
	}
}

#[test]
fn test_mismatched_labels() {
	let spec = &crate::panel::panel(crate::TaskKind::Regression, 42)[0];
	let features = arr2(&[[0.0], [1.0]]);
	let labels = Labels::Classification {
		labels: arr1(&[0, 1]),
		n_classes: 2,
	};
	let error = spec.fit_named(features.view(), &labels).unwrap_err();
	insta::assert_snapshot!(format!("{:#}", error), @"failed to train Linear Regression: Linear Regression is a regression model and cannot be trained on these labels");
}
