use super::*;
use calamine::{Data, Reader, Xlsx};
use std::{
	collections::{BTreeMap, BTreeSet},
	fs::File,
	io::BufReader,
	path::Path,
};
use thiserror::Error;

#[derive(Clone)]
pub struct FromCsvOptions<'a> {
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub delimiter: u8,
	pub infer_options: InferOptions,
	pub invalid_values: &'a [&'a str],
}

impl<'a> Default for FromCsvOptions<'a> {
	fn default() -> Self {
		Self {
			column_types: None,
			delimiter: b',',
			infer_options: InferOptions::default(),
			invalid_values: DEFAULT_INVALID_VALUES,
		}
	}
}

#[derive(Clone, Debug)]
pub struct InferOptions {
	pub enum_max_unique_values: usize,
}

impl Default for InferOptions {
	fn default() -> Self {
		Self {
			enum_max_unique_values: 100,
		}
	}
}

/// These values are the default values that are considered invalid.
pub const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

#[derive(Debug, Error)]
pub enum LoadError {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Csv(csv::Error),
	#[error("a value in column \"{column_name}\" is not valid utf-8")]
	Utf8 { column_name: String },
	#[error(transparent)]
	Xlsx(calamine::XlsxError),
	#[error("the workbook has no worksheets")]
	NoWorksheet,
}

impl From<calamine::XlsxError> for LoadError {
	fn from(error: calamine::XlsxError) -> Self {
		match error {
			calamine::XlsxError::Io(error) => LoadError::Io(error),
			error => LoadError::Xlsx(error),
		}
	}
}

impl From<csv::Error> for LoadError {
	fn from(error: csv::Error) -> Self {
		if !error.is_io_error() {
			return LoadError::Csv(error);
		}
		match error.into_kind() {
			csv::ErrorKind::Io(error) => LoadError::Io(error),
			_ => LoadError::Io(std::io::Error::new(
				std::io::ErrorKind::Other,
				"failed to read the csv",
			)),
		}
	}
}

impl DataFrame {
	pub fn from_path(path: &Path, options: FromCsvOptions) -> Result<Self, LoadError> {
		let file = std::fs::File::open(path)?;
		let mut reader = csv::ReaderBuilder::new()
			.delimiter(options.delimiter)
			.from_reader(file);
		Self::from_csv(&mut reader, options)
	}

	pub fn from_csv<R>(
		reader: &mut csv::Reader<R>,
		options: FromCsvOptions,
	) -> Result<Self, LoadError>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let n_columns = column_names.len();
		let start_position = reader.position().clone();
		let infer_options = &options.infer_options;
		let invalid_values = options.invalid_values;
		let mut n_rows = None;

		#[derive(Clone, Debug)]
		enum ColumnTypeOrInferStats<'a> {
			ColumnType(ColumnType),
			InferStats(InferStats<'a>),
		}

		// Retrieve any column types present in the options.
		let mut column_types: Vec<ColumnTypeOrInferStats> =
			if let Some(column_types) = options.column_types.as_ref() {
				column_names
					.iter()
					.map(|column_name| {
						column_types
							.get(column_name)
							.map(|column_type| ColumnTypeOrInferStats::ColumnType(column_type.clone()))
							.unwrap_or_else(|| {
								ColumnTypeOrInferStats::InferStats(InferStats::new(
									infer_options,
									invalid_values,
								))
							})
					})
					.collect()
			} else {
				vec![
					ColumnTypeOrInferStats::InferStats(InferStats::new(
						infer_options,
						invalid_values
					));
					n_columns
				]
			};

		// Passing over the csv to infer column types is only necessary if one or more columns did not have its type specified.
		let needs_infer = column_types.iter().any(|column_type_or_infer_stats| {
			matches!(
				column_type_or_infer_stats,
				ColumnTypeOrInferStats::InferStats(_)
			)
		});

		// If the infer pass is necessary, pass over the dataset and infer the types for those columns whose types were not specified.
		if needs_infer {
			let mut infer_stats: Vec<(usize, &mut InferStats)> = column_types
				.iter_mut()
				.enumerate()
				.filter_map(
					|(index, column_type_or_infer_stats)| match column_type_or_infer_stats {
						ColumnTypeOrInferStats::ColumnType(_) => None,
						ColumnTypeOrInferStats::InferStats(infer_stats) => {
							Some((index, infer_stats))
						}
					},
				)
				.collect();
			let mut record = csv::StringRecord::new();
			let mut n_rows_computed = 0;
			while reader.read_record(&mut record)? {
				n_rows_computed += 1;
				for (index, infer_stats) in infer_stats.iter_mut() {
					infer_stats.update(record.get(*index).unwrap_or(""));
				}
			}
			n_rows = Some(n_rows_computed);
			// After inference, return back to the beginning of the csv to load the values.
			reader.seek(start_position)?;
		}
		let column_types: Vec<ColumnType> = column_types
			.into_iter()
			.map(
				|column_type_or_infer_stats| match column_type_or_infer_stats {
					ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
					ColumnTypeOrInferStats::InferStats(infer_stats) => infer_stats.finalize(),
				},
			)
			.collect();

		let mut dataframe = Self::new(column_names, column_types);
		// If an inference pass was done, reserve storage for the values because we know how many rows are in the csv.
		if let Some(n_rows) = n_rows {
			for column in dataframe.columns.iter_mut() {
				match column {
					Column::Unknown(_) => {}
					Column::Number(column) => column.data.reserve_exact(n_rows),
					Column::Enum(column) => column.data.reserve_exact(n_rows),
					Column::Text(column) => column.data.reserve_exact(n_rows),
				}
			}
		}
		// Read each csv record and insert the values into the columns of the dataframe.
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			for (column, value) in dataframe.columns.iter_mut().zip(record.iter()) {
				push_value(column, value)?;
			}
		}
		Ok(dataframe)
	}

	/// Load the first worksheet of the .xlsx workbook at `path`. The first row holds the column names. Cells are converted to text and go through the same type inference as csv values, so a cell containing the number 1 is read as "1".
	pub fn from_xlsx(path: &Path, options: FromCsvOptions) -> Result<Self, LoadError> {
		let mut workbook: Xlsx<BufReader<File>> = calamine::open_workbook(path)?;
		let range = workbook
			.worksheet_range_at(0)
			.ok_or(LoadError::NoWorksheet)??;
		let mut rows = range.rows();
		let column_names: Vec<String> = rows
			.next()
			.map(|row| row.iter().map(cell_to_string).collect())
			.unwrap_or_default();
		let records: Vec<Vec<String>> = rows
			.map(|row| row.iter().map(cell_to_string).collect())
			.collect();
		Self::from_records(column_names, &records, options)
	}

	/// Build a dataframe from rows of text values, inferring the type of each column whose type is not given in `options`. Missing trailing values are treated as empty.
	pub fn from_records(
		column_names: Vec<String>,
		records: &[Vec<String>],
		options: FromCsvOptions,
	) -> Result<Self, LoadError> {
		let column_types: Vec<ColumnType> = column_names
			.iter()
			.enumerate()
			.map(|(index, column_name)| {
				if let Some(column_type) = options
					.column_types
					.as_ref()
					.and_then(|column_types| column_types.get(column_name))
				{
					return column_type.clone();
				}
				let mut infer_stats = InferStats::new(&options.infer_options, options.invalid_values);
				for record in records {
					infer_stats.update(record.get(index).map(|value| value.as_str()).unwrap_or(""));
				}
				infer_stats.finalize()
			})
			.collect();
		let mut dataframe = Self::new(column_names, column_types);
		for record in records {
			for (index, column) in dataframe.columns.iter_mut().enumerate() {
				let value = record.get(index).map(|value| value.as_bytes()).unwrap_or(b"");
				push_value(column, value)?;
			}
		}
		Ok(dataframe)
	}
}

fn push_value(column: &mut Column, value: &[u8]) -> Result<(), LoadError> {
	match column {
		Column::Unknown(column) => {
			column.len += 1;
		}
		Column::Number(column) => {
			let value = match lexical::parse::<f32, _>(value) {
				Ok(value) if value.is_finite() => value,
				_ => std::f32::NAN,
			};
			column.data.push(value);
		}
		Column::Enum(column) => {
			let value = std::str::from_utf8(value)
				.ok()
				.and_then(|value| column.options.binary_search_by(|option| option.as_str().cmp(value)).ok())
				.and_then(|position| NonZeroUsize::new(position + 1));
			column.data.push(value);
		}
		Column::Text(column) => {
			let value = std::str::from_utf8(value).map_err(|_| LoadError::Utf8 {
				column_name: column.name.clone(),
			})?;
			column.data.push(value.to_owned())
		}
	}
	Ok(())
}

fn cell_to_string(cell: &Data) -> String {
	match cell {
		Data::Empty => String::new(),
		Data::String(value) => value.clone(),
		Data::Float(value) => value.to_string(),
		Data::Int(value) => value.to_string(),
		Data::Bool(value) => value.to_string(),
		cell => cell.to_string(),
	}
}

#[derive(Clone, Debug)]
pub struct InferStats<'a> {
	infer_options: &'a InferOptions,
	invalid_values: &'a [&'a str],
	column_type: InferColumnType,
	unique_values: Option<BTreeSet<String>>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Number,
	Enum,
	Text,
}

impl<'a> InferStats<'a> {
	pub fn new(infer_options: &'a InferOptions, invalid_values: &'a [&'a str]) -> Self {
		Self {
			infer_options,
			invalid_values,
			column_type: InferColumnType::Unknown,
			unique_values: Some(BTreeSet::new()),
		}
	}

	pub fn update(&mut self, value: &str) {
		if self.invalid_values.contains(&value) {
			return;
		}
		if let Some(unique_values) = self.unique_values.as_mut() {
			if !unique_values.contains(value) {
				unique_values.insert(value.to_owned());
			}
			if unique_values.len() > self.infer_options.enum_max_unique_values {
				self.unique_values = None;
			}
		}
		match self.column_type {
			InferColumnType::Unknown | InferColumnType::Number => {
				if lexical::parse::<f32, _>(value)
					.map(|v| v.is_finite())
					.unwrap_or(false)
				{
					self.column_type = InferColumnType::Number;
				} else if self.unique_values.is_some() {
					self.column_type = InferColumnType::Enum;
				} else {
					self.column_type = InferColumnType::Text;
				}
			}
			InferColumnType::Enum => {
				if self.unique_values.is_none() {
					self.column_type = InferColumnType::Text;
				}
			}
			InferColumnType::Text => {}
		}
	}

	pub fn finalize(self) -> ColumnType {
		match self.column_type {
			InferColumnType::Unknown => ColumnType::Unknown,
			InferColumnType::Number => {
				// If the only values in a number column are zero and one then make this an enum column instead.
				if let Some(unique_values) = self.unique_values {
					if unique_values.len() == 2
						&& unique_values.contains("0")
						&& unique_values.contains("1")
					{
						return ColumnType::Enum {
							options: unique_values.into_iter().collect(),
						};
					}
				}
				ColumnType::Number
			}
			InferColumnType::Enum => ColumnType::Enum {
				options: self
					.unique_values
					.map(|unique_values| unique_values.into_iter().collect())
					.unwrap_or_default(),
			},
			InferColumnType::Text => ColumnType::Text,
		}
	}
}

#[test]
fn test_infer() {
	let csv = r#"number,enum,text,flag
1,test,hello,0
2,test,world,1
"#;
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: None,
			infer_options: InferOptions {
				enum_max_unique_values: 1,
			},
			..Default::default()
		},
	)
	.unwrap();
	insta::assert_debug_snapshot!(df, @r###"
 DataFrame {
     columns: [
         Number(
             NumberColumn {
                 name: "number",
                 data: [
                     1.0,
                     2.0,
                 ],
             },
         ),
         Enum(
             EnumColumn {
                 name: "enum",
                 options: [
                     "test",
                 ],
                 data: [
                     Some(
                         1,
                     ),
                     Some(
                         1,
                     ),
                 ],
             },
         ),
         Text(
             TextColumn {
                 name: "text",
                 data: [
                     "hello",
                     "world",
                 ],
             },
         ),
         Number(
             NumberColumn {
                 name: "flag",
                 data: [
                     0.0,
                     1.0,
                 ],
             },
         ),
     ],
 }
 "###);
}

#[test]
fn test_zero_one_columns_are_enums() {
	let csv = "approved,score\n0,0.5\n1,0.25\n1,0.75\n";
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
	)
	.unwrap();
	let approved = df.columns[0].as_enum().unwrap();
	assert_eq!(approved.options, vec!["0".to_owned(), "1".to_owned()]);
	assert_eq!(approved.option(approved.data[2]), Some("1"));
	assert!(df.columns[1].as_number().is_some());
}

#[test]
fn test_from_records_matches_csv_inference() {
	let records = vec![
		vec!["1".to_owned(), "0".to_owned(), "red".to_owned()],
		vec!["2.5".to_owned(), "1".to_owned(), "?".to_owned()],
		vec!["".to_owned(), "1".to_owned()],
	];
	let df = DataFrame::from_records(
		vec!["x".to_owned(), "flag".to_owned(), "color".to_owned()],
		&records,
		FromCsvOptions::default(),
	)
	.unwrap();
	let x = df.columns[0].as_number().unwrap();
	assert_eq!(&x.data[..2], &[1.0, 2.5]);
	assert!(x.data[2].is_nan());
	let flag = df.columns[1].as_enum().unwrap();
	assert_eq!(flag.options, vec!["0".to_owned(), "1".to_owned()]);
	let color = df.columns[2].as_enum().unwrap();
	assert_eq!(color.options, vec!["red".to_owned()]);
	assert_eq!(color.data, vec![NonZeroUsize::new(1), None, None]);
}

#[test]
fn test_invalid_values() {
	let csv = "a,b,c\n1,,x\nNaN,?,y\n3,null,\n";
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions::default(),
	)
	.unwrap();
	let a = df.columns[0].as_number().unwrap();
	assert_eq!(a.data[0], 1.0);
	assert!(a.data[1].is_nan());
	assert_eq!(df.columns[1], Column::Unknown(UnknownColumn {
		name: "b".to_owned(),
		len: 3,
	}));
	let c = df.columns[2].as_enum().unwrap();
	assert_eq!(c.data[2], None);
}

#[test]
fn test_column_types() {
	let csv = r#"number,text,enum
1,test,hello
2,test,world
"#;
	let mut column_types = BTreeMap::new();
	column_types.insert("text".to_owned(), ColumnType::Text);
	column_types.insert(
		"enum".to_owned(),
		ColumnType::Enum {
			options: vec!["hello".to_owned(), "world".to_owned()],
		},
	);
	let df = DataFrame::from_csv(
		&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
		FromCsvOptions {
			column_types: Some(column_types),
			infer_options: InferOptions {
				enum_max_unique_values: 2,
			},
			..Default::default()
		},
	)
	.unwrap();
	assert_eq!(df.columns[1].as_text().unwrap().data, vec!["test", "test"]);
	let enum_column = df.columns[2].as_enum().unwrap();
	assert_eq!(enum_column.option(enum_column.data[0]), Some("hello"));
	assert_eq!(enum_column.option(enum_column.data[1]), Some("world"));
}
