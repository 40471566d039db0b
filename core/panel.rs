use crate::TaskKind;

/// One entry of a model panel: a display name and the hyperparameters of an untrained model.
#[derive(Clone, Debug)]
pub struct ModelSpec {
	pub name: &'static str,
	pub model: ModelKind,
}

/// Every model variant the evaluator can train, with its options.
#[derive(Clone, Debug)]
pub enum ModelKind {
	LinearRegression(bakeoff_linear::RegressorOptions),
	SupportVectorRegressor(bakeoff_linear::SvmOptions),
	DecisionTreeRegressor(bakeoff_tree::TrainOptions),
	RandomForestRegressor(bakeoff_tree::TrainOptions),
	LogisticRegression(bakeoff_linear::TrainOptions),
	SupportVectorClassifier(bakeoff_linear::SvmOptions),
	DecisionTreeClassifier(bakeoff_tree::TrainOptions),
	RandomForestClassifier(bakeoff_tree::TrainOptions),
}

impl ModelSpec {
	pub fn task(&self) -> TaskKind {
		match self.model {
			ModelKind::LinearRegression(_)
			| ModelKind::SupportVectorRegressor(_)
			| ModelKind::DecisionTreeRegressor(_)
			| ModelKind::RandomForestRegressor(_) => TaskKind::Regression,
			ModelKind::LogisticRegression(_)
			| ModelKind::SupportVectorClassifier(_)
			| ModelKind::DecisionTreeClassifier(_)
			| ModelKind::RandomForestClassifier(_) => TaskKind::Classification,
		}
	}
}

/// The models evaluated for `task`, in the order they are reported before ranking. Models that use randomness are seeded with `seed`.
pub fn panel(task: TaskKind, seed: u64) -> Vec<ModelSpec> {
	let tree_options = bakeoff_tree::TrainOptions {
		seed,
		..bakeoff_tree::TrainOptions::decision_tree()
	};
	match task {
		TaskKind::Regression => vec![
			ModelSpec {
				name: "Linear Regression",
				model: ModelKind::LinearRegression(Default::default()),
			},
			ModelSpec {
				name: "Support Vector Machine",
				model: ModelKind::SupportVectorRegressor(Default::default()),
			},
			ModelSpec {
				name: "Decision Tree",
				model: ModelKind::DecisionTreeRegressor(tree_options.clone()),
			},
			ModelSpec {
				name: "Random Forest",
				model: ModelKind::RandomForestRegressor(bakeoff_tree::TrainOptions {
					seed,
					..bakeoff_tree::TrainOptions::random_forest(bakeoff_tree::MaxFeatures::All)
				}),
			},
		],
		TaskKind::Classification => vec![
			ModelSpec {
				name: "Logistic Regression",
				model: ModelKind::LogisticRegression(Default::default()),
			},
			ModelSpec {
				name: "Support Vector Machine",
				model: ModelKind::SupportVectorClassifier(Default::default()),
			},
			ModelSpec {
				name: "Decision Tree",
				model: ModelKind::DecisionTreeClassifier(tree_options),
			},
			ModelSpec {
				name: "Random Forest",
				model: ModelKind::RandomForestClassifier(bakeoff_tree::TrainOptions {
					seed,
					..bakeoff_tree::TrainOptions::random_forest(bakeoff_tree::MaxFeatures::Sqrt)
				}),
			},
		],
	}
}

#[test]
fn test_panels_match_their_task() {
	for task in [TaskKind::Regression, TaskKind::Classification].iter().copied() {
		let panel = panel(task, 42);
		assert_eq!(panel.len(), 4);
		assert!(panel.iter().all(|spec| spec.task() == task));
	}
	let names: Vec<&str> = panel(TaskKind::Classification, 42)
		.iter()
		.map(|spec| spec.name)
		.collect();
	assert_eq!(
		names,
		vec![
			"Logistic Regression",
			"Support Vector Machine",
			"Decision Tree",
			"Random Forest"
		]
	);
}
