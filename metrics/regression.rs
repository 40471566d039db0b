use super::{mean_variance::merge_mean_m2, StreamingMetric};

/// `RegressionMetrics` computes metrics used to evaluate regressors.
#[derive(Debug, Default)]
pub struct RegressionMetrics {
	mean_variance: Option<MeanVariance>,
	absolute_error: f64,
	squared_error: f64,
	absolute_percentage_error: f64,
	has_zero_label: bool,
}

#[derive(Debug)]
struct MeanVariance {
	pub n: u64,
	pub m2: f64,
	pub mean: f64,
}

/// The input to [`RegressionMetrics`](struct.RegressionMetrics.html).
pub struct RegressionMetricsInput<'a> {
	pub predictions: &'a [f32],
	pub labels: &'a [f32],
}

/// The output from [`RegressionMetrics`](struct.RegressionMetrics.html).
#[derive(Debug)]
pub struct RegressionMetricsOutput {
	/// The number of examples.
	pub n: u64,
	/// The mean squared error is equal to the mean of the squared errors. For a given example, the error is the difference between the true value and the model's predicted value.
	pub mse: f32,
	/// The root mean squared error is equal to the square root of the mean squared error.
	pub rmse: f32,
	/// The mean of the absolute value of the errors.
	pub mae: f32,
	/// The coefficient of determination. It is NaN when there are fewer than two examples. When every label is the same it is 1 for a perfect fit and 0 otherwise.
	pub r2: f32,
	/// The mean absolute percentage error, in percent. It is `None` if any label is exactly zero.
	pub mape: Option<f32>,
}

impl<'a> StreamingMetric<'a> for RegressionMetrics {
	type Input = RegressionMetricsInput<'a>;
	type Output = RegressionMetricsOutput;

	fn update(&mut self, input: RegressionMetricsInput) {
		let RegressionMetricsInput {
			predictions,
			labels,
		} = input;
		for (prediction, label) in predictions.iter().zip(labels.iter()) {
			let prediction = *prediction as f64;
			let label = *label as f64;
			match &mut self.mean_variance {
				Some(mean_variance) => {
					let (mean, m2) = merge_mean_m2(
						mean_variance.n,
						mean_variance.mean,
						mean_variance.m2,
						1,
						label,
						0.0,
					);
					mean_variance.n += 1;
					mean_variance.mean = mean;
					mean_variance.m2 = m2;
				}
				None => {
					self.mean_variance = Some(MeanVariance {
						n: 1,
						mean: label,
						m2: 0.0,
					})
				}
			}
			let error = label - prediction;
			self.absolute_error += error.abs();
			self.squared_error += error * error;
			if label == 0.0 {
				self.has_zero_label = true;
			} else {
				self.absolute_percentage_error += (error / label).abs();
			}
		}
	}

	fn merge(&mut self, other: Self) {
		match &mut self.mean_variance {
			Some(mean_variance) => {
				if let Some(other) = other.mean_variance {
					let (mean, m2) = merge_mean_m2(
						mean_variance.n,
						mean_variance.mean,
						mean_variance.m2,
						other.n,
						other.mean,
						other.m2,
					);
					mean_variance.mean = mean;
					mean_variance.m2 = m2;
					mean_variance.n += other.n;
				}
			}
			None => {
				self.mean_variance = other.mean_variance;
			}
		}
		self.absolute_error += other.absolute_error;
		self.squared_error += other.squared_error;
		self.absolute_percentage_error += other.absolute_percentage_error;
		self.has_zero_label |= other.has_zero_label;
	}

	fn finalize(self) -> Self::Output {
		let (n, m2) = match self.mean_variance {
			Some(m) => (m.n, m.m2),
			None => (0, f64::NAN),
		};
		let n_f64 = n as f64;
		let mae = self.absolute_error / n_f64;
		let mse = self.squared_error / n_f64;
		let rmse = mse.sqrt();
		let r2 = if n < 2 {
			f64::NAN
		} else if m2 == 0.0 {
			if self.squared_error == 0.0 {
				1.0
			} else {
				0.0
			}
		} else {
			1.0 - self.squared_error / m2
		};
		let mape = if self.has_zero_label || n == 0 {
			None
		} else {
			Some((100.0 * self.absolute_percentage_error / n_f64) as f32)
		};
		RegressionMetricsOutput {
			n,
			mae: mae as f32,
			mse: mse as f32,
			r2: r2 as f32,
			rmse: rmse as f32,
			mape,
		}
	}
}

#[test]
fn test_regression_metrics() {
	let mut metrics = RegressionMetrics::default();
	metrics.update(RegressionMetricsInput {
		predictions: &[1.0, 2.0],
		labels: &[1.5, 2.0],
	});
	let mut other = RegressionMetrics::default();
	other.update(RegressionMetricsInput {
		predictions: &[3.0, 4.0],
		labels: &[2.5, 5.0],
	});
	metrics.merge(other);
	let metrics = metrics.finalize();
	assert_eq!(metrics.n, 4);
	assert!((metrics.mae - 0.5).abs() < 1e-6);
	assert!((metrics.mse - 0.375).abs() < 1e-6);
	assert!((metrics.rmse - 0.375f32.sqrt()).abs() < 1e-6);
	assert!((metrics.r2 - (1.0 - 1.5 / 7.25)).abs() < 1e-6);
	assert!((metrics.mape.unwrap() - 18.333_334).abs() < 1e-4);
}

#[test]
fn test_regression_metrics_degenerate() {
	let mut metrics = RegressionMetrics::default();
	metrics.update(RegressionMetricsInput {
		predictions: &[1.0],
		labels: &[0.0],
	});
	let metrics = metrics.finalize();
	assert!(metrics.r2.is_nan());
	assert_eq!(metrics.mape, None);
	let mut metrics = RegressionMetrics::default();
	metrics.update(RegressionMetricsInput {
		predictions: &[2.0, 2.0],
		labels: &[2.0, 2.0],
	});
	assert_eq!(metrics.finalize().r2, 1.0);
	assert!(RegressionMetrics::default().finalize().mse.is_nan());
}
