use crate::{
	panel::ModelSpec,
	report::EvaluationOutcome,
	split::Split,
	trainer::{panic_message, train_and_score},
};
use bakeoff_util::thread_pool::ThreadPool;

/**
Train and score every model in `panel` concurrently on a pool of `n_threads` workers, one worker per model by default, and block until all of them are done. The outcome for `panel[i]` is at index `i` of the result, whatever order the models finish in. The workers share only read access to `panel` and `split`.
*/
pub fn dispatch(
	panel: &[ModelSpec],
	split: &Split,
	seed: u64,
	n_threads: Option<usize>,
) -> Vec<EvaluationOutcome> {
	let thread_pool = ThreadPool::new(n_threads.unwrap_or_else(|| panel.len()));
	log::debug!(
		"training {} models on {} threads",
		panel.len(),
		thread_pool.size()
	);
	let tasks: Vec<_> = panel
		.iter()
		.map(|spec| move || train_and_score(spec, split, seed))
		.collect();
	thread_pool
		.execute(tasks)
		.into_iter()
		.zip(panel.iter())
		.map(|(result, spec)| {
			result.unwrap_or_else(|panic| {
				EvaluationOutcome::failed(spec.name, panic_message(panic.as_ref()))
			})
		})
		.collect()
}

#[test]
fn test_dispatch_keeps_panel_order() {
	use crate::split::Labels;
	use bakeoff_dataframe::{Column, DataFrame, NumberColumn};
	let features = DataFrame {
		columns: vec![Column::Number(NumberColumn {
			name: "x".to_owned(),
			data: (0..30).map(|x| x as f32).collect(),
		})],
	};
	let split = Split {
		features_train: features.clone(),
		features_test: features,
		labels_train: Labels::Regression((0..30).map(|x| (x * x) as f32).collect()),
		labels_test: Labels::Regression((0..30).map(|x| (x * x) as f32).collect()),
	};
	let panel = crate::panel::panel(crate::TaskKind::Regression, 42);
	for n_threads in [None, Some(1), Some(3)].iter().copied() {
		let outcomes = dispatch(&panel, &split, 42, n_threads);
		let names: Vec<&str> = outcomes
			.iter()
			.map(|outcome| outcome.model_name.as_str())
			.collect();
		let expected: Vec<&str> = panel.iter().map(|spec| spec.name).collect();
		assert_eq!(names, expected);
		assert!(outcomes.iter().all(|outcome| outcome.is_completed()));
	}
}
