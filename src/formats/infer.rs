use anyhow::Result;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use super::conversion::strings_to_array;

/// Field values from a record, as read from CSV/TSV
pub type FieldValues = Vec<String>;

/// Column type guessed from text values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guess {
    Integer,
    Float,
    Text,
}

impl Guess {
    /// Guess for a single non-empty value
    fn of(value: &str) -> Guess {
        if value.parse::<i64>().is_ok() {
            Guess::Integer
        } else if value.parse::<f64>().is_ok() {
            Guess::Float
        } else {
            Guess::Text
        }
    }

    /// Narrowest guess that holds both
    fn widen(self, other: Guess) -> Guess {
        use Guess::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Text,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Guess::Integer => DataType::Int64,
            Guess::Float => DataType::Float64,
            Guess::Text => DataType::Utf8,
        }
    }
}

/// Turns untyped delimited records into a typed Arrow batch
pub struct SchemaInferrer {
    /// Take column names from the first record if true
    pub has_header: bool,
}

impl SchemaInferrer {
    /// Infer the Arrow type of one column from its text values.
    ///
    /// Empty values are nulls and do not vote. A column with no values at
    /// all is text.
    fn infer_column_type(values: &[&str]) -> (DataType, bool) {
        let mut guess: Option<Guess> = None;
        let mut has_nulls = false;

        for value in values {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                has_nulls = true;
                continue;
            }
            let value_guess = Guess::of(trimmed);
            guess = Some(match guess {
                None => value_guess,
                Some(current) => current.widen(value_guess),
            });
        }

        (guess.unwrap_or(Guess::Text).data_type(), has_nulls)
    }

    /// Infer a schema and build the batch from raw records
    pub fn infer_batch(&self, records: &[FieldValues]) -> Result<RecordBatch> {
        if records.is_empty() {
            anyhow::bail!("Cannot infer schema from empty dataset");
        }

        let (header_names, data_start_idx) = if self.has_header {
            (records[0].clone(), 1)
        } else {
            let num_cols = records[0].len();
            let names = (0..num_cols).map(|i| format!("column_{}", i + 1)).collect();
            (names, 0)
        };

        let data_rows = &records[data_start_idx..];

        let mut fields = Vec::with_capacity(header_names.len());
        let mut columns = Vec::with_capacity(header_names.len());

        for (col_idx, name) in header_names.iter().enumerate() {
            let column_values: Vec<&str> = data_rows
                .iter()
                .map(|row| row.get(col_idx).map(|s| s.as_str()).unwrap_or(""))
                .collect();

            let (data_type, nullable) = Self::infer_column_type(&column_values);

            let cells: Vec<Option<String>> = column_values
                .iter()
                .map(|v| {
                    if v.trim().is_empty() {
                        None
                    } else {
                        Some(v.to_string())
                    }
                })
                .collect();

            columns.push(strings_to_array(&data_type, &cells)?);
            fields.push(Field::new(name.clone(), data_type, nullable));
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}
