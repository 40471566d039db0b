use super::StreamingMetric;
use ndarray::prelude::*;

/// `ClassificationMetrics` computes metrics used to evaluate classifiers from a confusion matrix. Weighted averages weight each class by its support, the number of examples whose label is that class.
pub struct ClassificationMetrics {
	/// The shape of the confusion matrix is (n_classes x n_classes).
	confusion_matrix: Array2<u64>,
}

/// The input to [`ClassificationMetrics`](struct.ClassificationMetrics.html). Both predictions and labels are 0-indexed class indexes.
pub struct ClassificationMetricsInput<'a> {
	pub predictions: &'a [usize],
	pub labels: &'a [usize],
}

/// The output from [`ClassificationMetrics`](struct.ClassificationMetrics.html).
#[derive(Debug)]
pub struct ClassificationMetricsOutput {
	pub accuracy: f32,
	pub precision_weighted: f32,
	pub recall_weighted: f32,
	pub f1_score_weighted: f32,
}

/// Precision, recall and f1 score are 0 when their denominator is 0.
#[derive(Debug)]
struct ClassMetrics {
	support: u64,
	precision: f64,
	recall: f64,
	f1_score: f64,
}

impl ClassificationMetrics {
	pub fn new(n_classes: usize) -> Self {
		//                                           prediction    label
		//                                               |           |
		//                                               v           v
		let confusion_matrix = <Array2<u64>>::zeros((n_classes, n_classes));
		Self { confusion_matrix }
	}
}

impl<'a> StreamingMetric<'a> for ClassificationMetrics {
	type Input = ClassificationMetricsInput<'a>;
	type Output = ClassificationMetricsOutput;

	fn update(&mut self, input: ClassificationMetricsInput) {
		let n_classes = self.confusion_matrix.nrows();
		for (prediction, label) in input.predictions.iter().zip(input.labels.iter()) {
			if *prediction < n_classes && *label < n_classes {
				self.confusion_matrix[(*prediction, *label)] += 1;
			}
		}
	}

	fn merge(&mut self, other: Self) {
		self.confusion_matrix += &other.confusion_matrix;
	}

	fn finalize(self) -> ClassificationMetricsOutput {
		let n_examples = self.confusion_matrix.sum();
		let n_correct: u64 = self.confusion_matrix.diag().sum();
		let accuracy = n_correct as f64 / n_examples as f64;
		let class_metrics = class_metrics(&self.confusion_matrix);
		let weighted = |value: fn(&ClassMetrics) -> f64| {
			class_metrics
				.iter()
				.map(|class| value(class) * class.support as f64)
				.sum::<f64>()
				/ n_examples as f64
		};
		ClassificationMetricsOutput {
			accuracy: accuracy as f32,
			precision_weighted: weighted(|class| class.precision) as f32,
			recall_weighted: weighted(|class| class.recall) as f32,
			f1_score_weighted: weighted(|class| class.f1_score) as f32,
		}
	}
}

fn class_metrics(confusion_matrix: &Array2<u64>) -> Vec<ClassMetrics> {
	(0..confusion_matrix.nrows())
		.map(|class_index| {
			let true_positives = confusion_matrix[(class_index, class_index)];
			let false_positives = confusion_matrix.row(class_index).sum() - true_positives;
			let false_negatives = confusion_matrix.column(class_index).sum() - true_positives;
			let precision = ratio(true_positives, true_positives + false_positives);
			let recall = ratio(true_positives, true_positives + false_negatives);
			let f1_score = if precision + recall > 0.0 {
				2.0 * (precision * recall) / (precision + recall)
			} else {
				0.0
			};
			ClassMetrics {
				support: true_positives + false_negatives,
				precision,
				recall,
				f1_score,
			}
		})
		.collect()
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
	if denominator == 0 {
		0.0
	} else {
		numerator as f64 / denominator as f64
	}
}

#[test]
fn test_binary() {
	let mut metrics = ClassificationMetrics::new(2);
	let labels = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
	let predictions = [0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 0, 0];
	metrics.update(ClassificationMetricsInput {
		predictions: &predictions,
		labels: &labels,
	});
	let class = &class_metrics(&metrics.confusion_matrix)[0];
	assert_eq!(class.support, 8);
	assert!((class.precision - 5.0 / 7.0).abs() < 1e-12);
	assert!((class.recall - 0.625).abs() < 1e-12);
	let metrics = metrics.finalize();
	assert!((metrics.accuracy - 8.0 / 13.0).abs() < 1e-6);
	assert!((metrics.recall_weighted - metrics.accuracy).abs() < 1e-6);
}

#[test]
fn test_multiclass() {
	// example taken from https://en.wikipedia.org/wiki/Confusion_matrix
	let mut metrics = ClassificationMetrics::new(3);
	let labels = [
		0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 1, 2, 2, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
	];
	let predictions = [
		0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
	];
	metrics.update(ClassificationMetricsInput {
		predictions: &predictions,
		labels: &labels,
	});
	let metrics = metrics.finalize();
	assert!((metrics.accuracy - 0.703_703_7).abs() < 1e-5);
	assert!((metrics.precision_weighted - 0.736_331_6).abs() < 1e-5);
	assert!((metrics.recall_weighted - 0.703_703_7).abs() < 1e-5);
	assert!((metrics.f1_score_weighted - 0.716_472_9).abs() < 1e-5);
}

#[test]
fn test_class_without_predictions() {
	let mut metrics = ClassificationMetrics::new(2);
	metrics.update(ClassificationMetricsInput {
		predictions: &[0, 0, 0],
		labels: &[0, 1, 1],
	});
	let classes = class_metrics(&metrics.confusion_matrix);
	assert_eq!(classes[1].precision, 0.0);
	assert_eq!(classes[1].f1_score, 0.0);
	let metrics = metrics.finalize();
	assert!((metrics.precision_weighted - 1.0 / 9.0).abs() < 1e-6);
}
