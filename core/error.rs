use std::path::PathBuf;
use thiserror::Error;

/// These errors abort an evaluation before any model is trained. Failures of individual models are never reported through this type; they are recorded in that model's [`EvaluationOutcome`](struct.EvaluationOutcome.html).
#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid target: {message}")]
	InvalidTarget { message: String },
	#[error("unsupported file format for \"{}\", expected a .csv, .tsv or .xlsx file", path.display())]
	UnsupportedFormat { path: PathBuf },
	#[error("failed to read \"{}\"", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse \"{}\"", path.display())]
	Csv {
		path: PathBuf,
		#[source]
		source: csv::Error,
	},
	#[error("failed to read the spreadsheet \"{}\"", path.display())]
	Spreadsheet {
		path: PathBuf,
		#[source]
		source: bakeoff_dataframe::LoadError,
	},
	#[error("the dataset has {rows} usable rows, but at least 2 are required to split it")]
	TooFewRows { rows: usize },
	#[error("invalid config file \"{}\": {message}", path.display())]
	Config { path: PathBuf, message: String },
}

impl Error {
	pub(crate) fn invalid_target(message: impl Into<String>) -> Error {
		Error::InvalidTarget {
			message: message.into(),
		}
	}
}
