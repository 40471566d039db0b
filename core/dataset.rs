use crate::{config::SamplingOptions, Error};
use bakeoff_dataframe::{DataFrame, FromCsvOptions, LoadError};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::path::Path;

/// Load the dataset at `path`. Files ending in `.csv` are comma delimited, files ending in `.tsv` are tab delimited, and `.xlsx` workbooks are read from their first worksheet. Large files are sampled according to `sampling`, and missing values in number columns are replaced with zero.
pub fn load_dataset(path: &Path, sampling: &SamplingOptions, seed: u64) -> Result<DataFrame, Error> {
	let extension = path
		.extension()
		.and_then(|extension| extension.to_str())
		.map(|extension| extension.to_ascii_lowercase());
	let result = match extension.as_deref() {
		Some("csv") => DataFrame::from_path(path, FromCsvOptions::default()),
		Some("tsv") => DataFrame::from_path(
			path,
			FromCsvOptions {
				delimiter: b'\t',
				..Default::default()
			},
		),
		Some("xlsx") => DataFrame::from_xlsx(path, FromCsvOptions::default()),
		_ => {
			return Err(Error::UnsupportedFormat {
				path: path.to_owned(),
			})
		}
	};
	let mut dataframe = result.map_err(|error| match error {
		LoadError::Io(source) => Error::Io {
			path: path.to_owned(),
			source,
		},
		LoadError::Csv(source) => Error::Csv {
			path: path.to_owned(),
			source,
		},
		LoadError::Utf8 { column_name } => Error::Io {
			path: path.to_owned(),
			source: std::io::Error::new(
				std::io::ErrorKind::InvalidData,
				format!("a value in column \"{}\" is not valid utf-8", column_name),
			),
		},
		source @ LoadError::Xlsx(_) | source @ LoadError::NoWorksheet => Error::Spreadsheet {
			path: path.to_owned(),
			source,
		},
	})?;
	let n_rows = dataframe.nrows();
	let sample_size = sampling.sample_size(n_rows);
	if sample_size < n_rows {
		let mut rng = Xoshiro256Plus::seed_from_u64(seed);
		dataframe = dataframe.sample_rows(sample_size, &mut rng);
		log::info!(
			"loaded {} rows and {} columns from {}, sampled {} rows",
			n_rows,
			dataframe.ncols(),
			path.display(),
			sample_size
		);
	} else {
		log::info!(
			"loaded {} rows and {} columns from {}",
			n_rows,
			dataframe.ncols(),
			path.display()
		);
	}
	dataframe.fill_invalid_numbers(0.0);
	Ok(dataframe)
}

#[cfg(test)]
fn write_temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
	use std::io::Write;
	let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
	file.write_all(contents.as_bytes()).unwrap();
	file
}

#[test]
fn test_load_csv_and_tsv() {
	let csv = write_temp_file(".csv", "a,b,label\n1,x,0\n,y,1\n3,x,1\n");
	let dataframe = load_dataset(csv.path(), &SamplingOptions::default(), 42).unwrap();
	assert_eq!(dataframe.nrows(), 3);
	assert_eq!(dataframe.column_names(), vec!["a", "b", "label"]);
	assert_eq!(
		dataframe.column("a").unwrap().as_number().unwrap().data,
		vec![1.0, 0.0, 3.0]
	);
	assert!(dataframe.column("label").unwrap().as_enum().is_some());
	let tsv = write_temp_file(".TSV", "a\tb\n1\t2\n3\t4\n");
	let dataframe = load_dataset(tsv.path(), &SamplingOptions::default(), 42).unwrap();
	assert_eq!(dataframe.column_names(), vec!["a", "b"]);
	assert_eq!(
		dataframe.column("b").unwrap().as_number().unwrap().data,
		vec![2.0, 4.0]
	);
}

#[test]
fn test_unsupported_format() {
	let file = write_temp_file(".xls", "a,b\n1,2\n");
	let error = load_dataset(file.path(), &SamplingOptions::default(), 42).unwrap_err();
	assert!(matches!(error, Error::UnsupportedFormat { .. }));
	let file = write_temp_file(".json", "[]");
	let error = load_dataset(file.path(), &SamplingOptions::default(), 42).unwrap_err();
	assert!(matches!(error, Error::UnsupportedFormat { .. }));
}

#[test]
fn test_load_xlsx() {
	let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
	let mut workbook = rust_xlsxwriter::Workbook::new();
	let worksheet = workbook.add_worksheet();
	for (column, name) in ["size", "color", "approved"].iter().enumerate() {
		worksheet.write_string(0, column as u16, *name).unwrap();
	}
	let rows: &[(f64, &str, f64)] = &[(1.5, "red", 0.0), (2.0, "blue", 1.0), (3.25, "red", 1.0)];
	for (index, (size, color, approved)) in rows.iter().enumerate() {
		let row = index as u32 + 1;
		worksheet.write_number(row, 0, *size).unwrap();
		worksheet.write_string(row, 1, *color).unwrap();
		worksheet.write_number(row, 2, *approved).unwrap();
	}
	workbook.save(file.path()).unwrap();

	let dataframe = load_dataset(file.path(), &SamplingOptions::default(), 42).unwrap();
	assert_eq!(dataframe.column_names(), vec!["size", "color", "approved"]);
	assert_eq!(
		dataframe.column("size").unwrap().as_number().unwrap().data,
		vec![1.5, 2.0, 3.25]
	);
	let color = dataframe.column("color").unwrap().as_enum().unwrap();
	assert_eq!(color.options, vec!["blue", "red"]);
	let approved = dataframe.column("approved").unwrap().as_enum().unwrap();
	assert_eq!(approved.options, vec!["0", "1"]);
}

#[test]
fn test_invalid_xlsx() {
	let file = write_temp_file(".xlsx", "a,b\n1,2\n");
	let error = load_dataset(file.path(), &SamplingOptions::default(), 42).unwrap_err();
	assert!(matches!(error, Error::Spreadsheet { .. }));
}

#[test]
fn test_missing_file() {
	let error = load_dataset(
		Path::new("/this/file/does/not/exist.csv"),
		&SamplingOptions::default(),
		42,
	)
	.unwrap_err();
	assert!(matches!(error, Error::Io { .. }));
}

#[test]
fn test_sampling_is_seeded_and_ordered() {
	let mut contents = String::from("x,y\n");
	for i in 0..1500 {
		contents.push_str(&format!("{},{}\n", i, i * 2));
	}
	let file = write_temp_file(".csv", &contents);
	let a = load_dataset(file.path(), &SamplingOptions::default(), 42).unwrap();
	let b = load_dataset(file.path(), &SamplingOptions::default(), 42).unwrap();
	assert_eq!(a.nrows(), 500);
	assert_eq!(a, b);
	let x = &a.column("x").unwrap().as_number().unwrap().data;
	assert!(x.windows(2).all(|pair| pair[0] < pair[1]));
}
