/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. It implements only what bakeoff needs: loading a delimited file or a spreadsheet with column type inference, looking up and removing columns, and gathering subsets of rows.
*/

#![allow(clippy::tabs_in_doc_comments)]

use rand::Rng;
use std::num::NonZeroUsize;

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Unknown(UnknownColumn),
	Number(NumberColumn),
	Enum(EnumColumn),
	Text(TextColumn),
}

/// An `UnknownColumn` is a column none of whose values were valid, so no type could be inferred for it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownColumn {
	pub name: String,
	pub len: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

/// Enum values are 1-indexed into `options`. `None` marks a missing or invalid value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
	Unknown,
	Number,
	Enum { options: Vec<String> },
	Text,
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Unknown => Column::Unknown(UnknownColumn::new(column_name)),
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
				ColumnType::Text => Column::Text(TextColumn::new(column_name)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column_names(&self) -> Vec<String> {
		self.columns
			.iter()
			.map(|column| column.name().to_owned())
			.collect()
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Remove the column named `name` and return it, leaving the remaining columns in their original order.
	pub fn remove_column(&mut self, name: &str) -> Option<Column> {
		let index = self
			.columns
			.iter()
			.position(|column| column.name() == name)?;
		Some(self.columns.remove(index))
	}

	/// Create a new dataframe containing the rows at `indexes`, in the order given.
	pub fn take_rows(&self, indexes: &[usize]) -> DataFrame {
		let columns = self
			.columns
			.iter()
			.map(|column| column.take_rows(indexes))
			.collect();
		DataFrame { columns }
	}

	/// Choose `n_rows` rows uniformly at random without replacement. The chosen rows keep their original relative order.
	pub fn sample_rows<R>(&self, n_rows: usize, rng: &mut R) -> DataFrame
	where
		R: Rng + ?Sized,
	{
		let n_rows = n_rows.min(self.nrows());
		let mut indexes = rand::seq::index::sample(rng, self.nrows(), n_rows).into_vec();
		indexes.sort_unstable();
		self.take_rows(&indexes)
	}

	/// Replace every NaN in every number column with `value`.
	pub fn fill_invalid_numbers(&mut self, value: f32) {
		for column in self.columns.iter_mut() {
			if let Column::Number(column) = column {
				for item in column.data.iter_mut() {
					if !item.is_finite() {
						*item = value;
					}
				}
			}
		}
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Unknown(s) => s.len,
			Self::Number(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
			Self::Text(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Unknown(s) => s.name.as_str(),
			Self::Number(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
			Self::Text(s) => s.name.as_str(),
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Self::Enum(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Self::Text(s) => Some(s),
			_ => None,
		}
	}

	pub fn take_rows(&self, indexes: &[usize]) -> Column {
		match self {
			Self::Unknown(column) => Self::Unknown(UnknownColumn {
				name: column.name.clone(),
				len: indexes.len(),
			}),
			Self::Number(column) => Self::Number(NumberColumn {
				name: column.name.clone(),
				data: indexes.iter().map(|index| column.data[*index]).collect(),
			}),
			Self::Enum(column) => Self::Enum(EnumColumn {
				name: column.name.clone(),
				options: column.options.clone(),
				data: indexes.iter().map(|index| column.data[*index]).collect(),
			}),
			Self::Text(column) => Self::Text(TextColumn {
				name: column.name.clone(),
				data: indexes
					.iter()
					.map(|index| column.data[*index].clone())
					.collect(),
			}),
		}
	}
}

impl UnknownColumn {
	pub fn new(name: String) -> Self {
		Self { name, len: 0 }
	}
}

impl NumberColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	/// Look up the option a value refers to.
	pub fn option(&self, value: Option<NonZeroUsize>) -> Option<&str> {
		value
			.and_then(|value| self.options.get(value.get() - 1))
			.map(|option| option.as_str())
	}
}

impl TextColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}
}

#[test]
fn test_take_and_remove() {
	let mut dataframe = DataFrame {
		columns: vec![
			Column::Number(NumberColumn {
				name: "x".to_owned(),
				data: vec![1.0, f32::NAN, 3.0],
			}),
			Column::Text(TextColumn {
				name: "label".to_owned(),
				data: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
			}),
		],
	};
	dataframe.fill_invalid_numbers(0.0);
	let subset = dataframe.take_rows(&[2, 0]);
	assert_eq!(subset.nrows(), 2);
	assert_eq!(subset.column("x").unwrap().as_number().unwrap().data, vec![3.0, 1.0]);
	let label = dataframe.remove_column("label").unwrap();
	assert_eq!(label.as_text().unwrap().data[1], "b");
	assert_eq!(dataframe.column_names(), vec!["x".to_owned()]);
	assert_eq!(dataframe.columns[0].as_number().unwrap().data, vec![1.0, 0.0, 3.0]);
	assert!(dataframe.remove_column("missing").is_none());
}

#[test]
fn test_sample_rows_keeps_order() {
	use rand::SeedableRng;
	let dataframe = DataFrame {
		columns: vec![Column::Number(NumberColumn {
			name: "x".to_owned(),
			data: (0..100).map(|value| value as f32).collect(),
		})],
	};
	let mut rng = rand::rngs::StdRng::seed_from_u64(42);
	let sample = dataframe.sample_rows(10, &mut rng);
	let data = &sample.columns[0].as_number().unwrap().data;
	assert_eq!(data.len(), 10);
	assert!(data.windows(2).all(|pair| pair[0] < pair[1]));
	let everything = dataframe.sample_rows(1000, &mut rng);
	assert_eq!(everything, dataframe);
}
