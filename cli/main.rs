//! This module contains the main entrypoint to the bakeoff cli.

use anyhow::{Context, Result};
use bakeoff_core::{load_config, Evaluator};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bakeoff")]
#[command(about = "Compare a panel of models on a dataset and rank them.", version)]
struct Options {
	/// the path to your .csv, .tsv or .xlsx file
	#[arg(short, long)]
	file: PathBuf,
	/// the name of the column to predict
	#[arg(short, long)]
	target: String,
	/// the path to a config file
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// indent the json report
	#[arg(long)]
	pretty: bool,
	/// log the progress of the evaluation to stderr
	#[arg(short, long)]
	verbose: bool,
}

fn main() {
	let options = Options::parse();
	let default_level = if options.verbose { "info" } else { "warn" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
	if let Err(error) = cli_evaluate(options) {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_evaluate(options: Options) -> Result<()> {
	let config = load_config(options.config.as_deref())?;
	log::debug!("{:?}", config);
	let report = Evaluator::new(config).evaluate(&options.file, &options.target)?;
	let json = if options.pretty {
		serde_json::to_string_pretty(&report)
	} else {
		serde_json::to_string(&report)
	}
	.context("failed to serialize the report")?;
	println!("{}", json);
	Ok(())
}

#[test]
fn test_options() {
	let options = Options::try_parse_from(&[
		"bakeoff",
		"--file",
		"heart_disease.csv",
		"--target",
		"diagnosis",
		"--pretty",
	])
	.unwrap();
	assert_eq!(options.file, PathBuf::from("heart_disease.csv"));
	assert_eq!(options.target, "diagnosis");
	assert_eq!(options.config, None);
	assert!(options.pretty);
	assert!(!options.verbose);
	assert!(Options::try_parse_from(&["bakeoff", "--file", "data.csv"]).is_err());
}
