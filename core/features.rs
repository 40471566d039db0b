use anyhow::{bail, Result};
use bakeoff_dataframe::{Column, DataFrame};
use ndarray::prelude::*;

/**
Convert the columns of `dataframe` into a dense feature matrix with `n_rows` rows and one column per dataframe column. A dataframe without columns yields a matrix without columns.

| column type | feature value                              |
|-------------|--------------------------------------------|
| Number      | the value                                  |
| Enum        | the 1-based option index, or 0 if missing  |
| Unknown     | 0                                          |
| Text        | not supported, this function returns an error |
*/
pub fn encode_features(dataframe: &DataFrame, n_rows: usize) -> Result<Array2<f32>> {
	let mut features = Array2::zeros((n_rows, dataframe.ncols()));
	for (column, mut feature) in dataframe
		.columns
		.iter()
		.zip(features.axis_iter_mut(Axis(1)))
	{
		match column {
			Column::Unknown(_) => {}
			Column::Number(column) => {
				for (feature, value) in feature.iter_mut().zip(column.data.iter()) {
					*feature = *value;
				}
			}
			Column::Enum(column) => {
				for (feature, value) in feature.iter_mut().zip(column.data.iter()) {
					*feature = value.map(|value| value.get()).unwrap_or(0) as f32;
				}
			}
			Column::Text(column) => bail!(
				"feature column \"{}\" contains text values and cannot be used as a numeric feature",
				column.name
			),
		}
	}
	Ok(features)
}

#[test]
fn test_encode_features() {
	use bakeoff_dataframe::{EnumColumn, NumberColumn, UnknownColumn};
	use std::num::NonZeroUsize;
	let dataframe = DataFrame {
		columns: vec![
			Column::Number(NumberColumn {
				name: "a".to_owned(),
				data: vec![1.5, -2.0],
			}),
			Column::Enum(EnumColumn {
				name: "b".to_owned(),
				options: vec!["x".to_owned(), "y".to_owned()],
				data: vec![NonZeroUsize::new(2), None],
			}),
			Column::Unknown(UnknownColumn {
				name: "c".to_owned(),
				len: 2,
			}),
		],
	};
	let features = encode_features(&dataframe, 2).unwrap();
	assert_eq!(features, arr2(&[[1.5, 2.0, 0.0], [-2.0, 0.0, 0.0]]));
}

#[test]
fn test_text_features_are_rejected() {
	use bakeoff_dataframe::TextColumn;
	let dataframe = DataFrame {
		columns: vec![Column::Text(TextColumn {
			name: "notes".to_owned(),
			data: vec!["hello".to_owned()],
		})],
	};
	let error = encode_features(&dataframe, 1).unwrap_err();
	insta::assert_snapshot!(error, @r###"feature column "notes" contains text values and cannot be used as a numeric feature"###);
}
