/*!
This module defines the `Config` struct, which is used to configure an evaluation with an [`Evaluator`](../struct.Evaluator.html). Every field has a default, so a config file only needs to name the values it changes:

```yaml
seed: 7
classification_max_distinct_values: 10
sampling:
  enabled: false
```
*/

use crate::Error;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// This seed drives the train/test split, the cross validation folds, the dataset sample and the random forests.
	pub seed: u64,
	/// A numeric target with at most this many distinct values is treated as a classification target.
	pub classification_max_distinct_values: usize,
	/// A numeric target whose number of distinct values is within this margin of `classification_max_distinct_values` adds a warning to the report.
	pub near_threshold_margin: usize,
	/// The number of worker threads used to train the panel. The default is one thread per model.
	pub n_threads: Option<usize>,
	pub sampling: SamplingOptions,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			seed: 42,
			classification_max_distinct_values: 20,
			near_threshold_margin: 5,
			n_threads: None,
			sampling: SamplingOptions::default(),
		}
	}
}

/// Large datasets are evaluated on a sample of their rows.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingOptions {
	pub enabled: bool,
	/// Datasets with at most this many rows are used in full.
	pub max_rows_without_sampling: usize,
	/// Datasets with more than `max_rows_without_sampling` and at most this many rows are sampled down to `fixed_sample_rows`.
	pub max_rows_for_fixed_sample: usize,
	pub fixed_sample_rows: usize,
	/// Larger datasets are sampled down to this fraction of their rows, but never fewer than `min_sample_rows`.
	pub large_dataset_fraction: f64,
	pub min_sample_rows: usize,
}

impl Default for SamplingOptions {
	fn default() -> Self {
		Self {
			enabled: true,
			max_rows_without_sampling: 1000,
			max_rows_for_fixed_sample: 10_000,
			fixed_sample_rows: 500,
			large_dataset_fraction: 0.01,
			min_sample_rows: 25,
		}
	}
}

impl SamplingOptions {
	/// The number of rows to keep from a dataset with `n_rows` rows.
	pub fn sample_size(&self, n_rows: usize) -> usize {
		let sample_size = if !self.enabled || n_rows <= self.max_rows_without_sampling {
			n_rows
		} else if n_rows <= self.max_rows_for_fixed_sample {
			self.fixed_sample_rows
		} else {
			((n_rows as f64 * self.large_dataset_fraction) as usize).max(self.min_sample_rows)
		};
		sample_size.min(n_rows)
	}
}

/// Load the config from the yaml file at `config_path`, or the default config if there is none.
pub fn load_config(config_path: Option<&Path>) -> Result<Config, Error> {
	let config_path = match config_path {
		Some(config_path) => config_path,
		None => return Ok(Config::default()),
	};
	let config = std::fs::read_to_string(config_path).map_err(|source| Error::Io {
		path: config_path.to_owned(),
		source,
	})?;
	serde_yaml::from_str(&config).map_err(|error| Error::Config {
		path: config_path.to_owned(),
		message: error.to_string(),
	})
}

#[test]
fn test_sample_size() {
	let options = SamplingOptions::default();
	assert_eq!(options.sample_size(10), 10);
	assert_eq!(options.sample_size(1000), 1000);
	assert_eq!(options.sample_size(1001), 500);
	assert_eq!(options.sample_size(10_000), 500);
	assert_eq!(options.sample_size(10_001), 100);
	assert_eq!(options.sample_size(200_000), 2000);
	let options = SamplingOptions {
		large_dataset_fraction: 0.0001,
		..Default::default()
	};
	assert_eq!(options.sample_size(20_000), 25);
	let options = SamplingOptions {
		enabled: false,
		..Default::default()
	};
	assert_eq!(options.sample_size(1_000_000), 1_000_000);
}

#[test]
fn test_load_config() {
	use std::io::Write;
	assert_eq!(load_config(None).unwrap(), Config::default());
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "seed: 7\nsampling:\n  enabled: false").unwrap();
	let config = load_config(Some(file.path())).unwrap();
	assert_eq!(config.seed, 7);
	assert_eq!(config.classification_max_distinct_values, 20);
	assert!(!config.sampling.enabled);
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "sed: 7").unwrap();
	assert!(matches!(
		load_config(Some(file.path())),
		Err(Error::Config { .. })
	));
}
