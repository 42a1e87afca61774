//! Conversion between Arrow columns and the text cells used on the wire.
//!
//! Loading goes Arrow -> text: every value becomes the string written to the
//! staging file, with nulls as empty fields. Fetching and inference go the
//! other way: text cells from the driver or a delimited file are parsed
//! into typed Arrow columns.

use anyhow::{Context, Result, anyhow};
use arrow::array::*;
use arrow::datatypes::{
    DataType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::sync::Arc;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a RecordBatch to rows of text cells
pub fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<Vec<String>>> {
    let num_rows = batch.num_rows();

    if num_rows == 0 {
        return Ok(Vec::new());
    }

    let mut columns: Vec<Vec<String>> = Vec::with_capacity(batch.num_columns());
    for (col_idx, array) in batch.columns().iter().enumerate() {
        let cells = array_to_strings(array.as_ref()).with_context(|| {
            format!(
                "Failed to convert column {} ({:?}) to text",
                batch.schema().field(col_idx).name(),
                array.data_type()
            )
        })?;
        columns.push(cells);
    }

    // Transpose to rows
    let rows = (0..num_rows)
        .map(|row_idx| columns.iter().map(|col| col[row_idx].clone()).collect())
        .collect();

    Ok(rows)
}

/// Text form of every value in `array`, nulls as empty strings
fn array_to_strings(array: &dyn Array) -> Result<Vec<String>> {
    match array.data_type() {
        DataType::Binary => {
            let arr = as_generic_binary_array::<i32>(array);
            Ok(arr
                .iter()
                .map(|v| v.map(hex::encode).unwrap_or_default())
                .collect())
        }
        DataType::LargeBinary => {
            let arr = as_generic_binary_array::<i64>(array);
            Ok(arr
                .iter()
                .map(|v| v.map(hex::encode).unwrap_or_default())
                .collect())
        }
        DataType::Timestamp(unit, _) => timestamp_to_strings(array, unit),
        _ => {
            let options = FormatOptions::default();
            let formatter = ArrayFormatter::try_new(array, &options)?;
            Ok((0..array.len())
                .map(|i| {
                    if array.is_null(i) {
                        String::new()
                    } else {
                        formatter.value(i).to_string()
                    }
                })
                .collect())
        }
    }
}

/// Timestamps as `YYYY-MM-DD HH:MM:SS`, the form the external table loader accepts
fn timestamp_to_strings(array: &dyn Array, unit: &TimeUnit) -> Result<Vec<String>> {
    let mut strings = Vec::with_capacity(array.len());
    for i in 0..array.len() {
        if array.is_null(i) {
            strings.push(String::new());
            continue;
        }
        let datetime = match unit {
            TimeUnit::Second => {
                chrono::DateTime::from_timestamp(
                    as_primitive_array::<TimestampSecondType>(array).value(i),
                    0,
                )
            }
            TimeUnit::Millisecond => chrono::DateTime::from_timestamp_millis(
                as_primitive_array::<TimestampMillisecondType>(array).value(i),
            ),
            TimeUnit::Microsecond => chrono::DateTime::from_timestamp_micros(
                as_primitive_array::<TimestampMicrosecondType>(array).value(i),
            ),
            TimeUnit::Nanosecond => Some(chrono::DateTime::from_timestamp_nanos(
                as_primitive_array::<TimestampNanosecondType>(array).value(i),
            )),
        }
        .context("Invalid timestamp")?;
        strings.push(datetime.format(TIMESTAMP_FORMAT).to_string());
    }
    Ok(strings)
}

/// Build a typed Arrow column from text cells.
///
/// Supports the types the fetch path and the inferrer produce: Int64,
/// Float64, Boolean and Utf8. Cells that do not parse are an error.
pub fn strings_to_array(data_type: &DataType, cells: &[Option<String>]) -> Result<ArrayRef> {
    let array: ArrayRef = match data_type {
        DataType::Int64 => Arc::new(
            cells
                .iter()
                .map(|cell| parse_cell::<i64>(cell.as_deref()))
                .collect::<Result<Int64Array>>()?,
        ),
        DataType::Float64 => Arc::new(
            cells
                .iter()
                .map(|cell| parse_cell::<f64>(cell.as_deref()))
                .collect::<Result<Float64Array>>()?,
        ),
        DataType::Boolean => Arc::new(
            cells
                .iter()
                .map(|cell| parse_bool(cell.as_deref()))
                .collect::<Result<BooleanArray>>()?,
        ),
        DataType::Utf8 => Arc::new(StringArray::from_iter(cells.iter().map(|c| c.as_deref()))),
        other => return Err(anyhow!("Unsupported column type for text conversion: {:?}", other)),
    };
    Ok(array)
}

fn parse_cell<T: std::str::FromStr>(cell: Option<&str>) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Cannot parse '{}': {}", text, e)),
    }
}

fn parse_bool(cell: Option<&str>) -> Result<Option<bool>> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some("1") => Ok(Some(true)),
        Some("0") => Ok(Some(false)),
        Some(text) if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("t") => {
            Ok(Some(true))
        }
        Some(text) if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("f") => {
            Ok(Some(false))
        }
        Some(text) => Err(anyhow!("Cannot parse '{}' as boolean", text)),
    }
}

/// First cell of the first column as an integer, if there is one.
///
/// Count queries come back as whatever integer or decimal type the driver
/// picks, so this accepts any integer, float, or numeric-looking text.
pub fn first_value_as_i64(batch: &RecordBatch) -> Option<i64> {
    if batch.num_columns() == 0 || batch.num_rows() == 0 {
        return None;
    }
    let array = batch.column(0);
    if array.is_null(0) {
        return None;
    }
    match array.data_type() {
        DataType::Int64 => Some(as_primitive_array::<arrow::datatypes::Int64Type>(array).value(0)),
        DataType::Int32 => {
            Some(as_primitive_array::<arrow::datatypes::Int32Type>(array).value(0) as i64)
        }
        DataType::Float64 => {
            Some(as_primitive_array::<arrow::datatypes::Float64Type>(array).value(0) as i64)
        }
        DataType::Utf8 => as_string_array(array).value(0).trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};

    fn batch(fields: Vec<Field>, columns: Vec<ArrayRef>) -> RecordBatch {
        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
    }

    #[test]
    fn test_batch_to_rows_mixed_types() {
        let batch = batch(
            vec![
                Field::new("id", DataType::Int32, false),
                Field::new("name", DataType::Utf8, true),
                Field::new("balance", DataType::Float64, true),
                Field::new("active", DataType::Boolean, false),
            ],
            vec![
                Arc::new(Int32Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("Alice"), Some("Bob")])),
                Arc::new(Float64Array::from(vec![Some(100.50), None])),
                Arc::new(BooleanArray::from(vec![true, false])),
            ],
        );

        let rows = batch_to_rows(&batch).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "Alice", "100.5", "true"]);
        assert_eq!(rows[1], vec!["2", "Bob", "", "false"]);
    }

    #[test]
    fn test_batch_to_rows_dates_and_timestamps() {
        let batch = batch(
            vec![
                Field::new("day", DataType::Date32, true),
                Field::new(
                    "at",
                    DataType::Timestamp(TimeUnit::Millisecond, None),
                    true,
                ),
            ],
            vec![
                // 18993 days after the epoch is 2022-01-01
                Arc::new(Date32Array::from(vec![Some(0), Some(18993), None])),
                Arc::new(TimestampMillisecondArray::from(vec![
                    Some(0),
                    Some(1_640_995_200_000),
                    None,
                ])),
            ],
        );

        let rows = batch_to_rows(&batch).unwrap();

        assert_eq!(rows[0], vec!["1970-01-01", "1970-01-01 00:00:00"]);
        assert_eq!(rows[1], vec!["2022-01-01", "2022-01-01 00:00:00"]);
        assert_eq!(rows[2], vec!["", ""]);
    }

    #[test]
    fn test_binary_is_hex_encoded() {
        let batch = batch(
            vec![Field::new("blob", DataType::Binary, true)],
            vec![Arc::new(BinaryArray::from(vec![
                Some(&[0xde, 0xad][..]),
                None,
            ]))],
        );

        let rows = batch_to_rows(&batch).unwrap();

        assert_eq!(rows, vec![vec!["dead".to_string()], vec![String::new()]]);
    }

    #[test]
    fn test_batch_to_rows_empty() {
        let batch = batch(
            vec![Field::new("id", DataType::Int32, false)],
            vec![Arc::new(Int32Array::from(Vec::<i32>::new()))],
        );
        assert!(batch_to_rows(&batch).unwrap().is_empty());
    }

    #[test]
    fn test_strings_to_array_parses_types() {
        let cells = vec![Some("1".to_string()), None, Some(" 3 ".to_string())];
        let ints = strings_to_array(&DataType::Int64, &cells).unwrap();
        let ints = ints.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ints.value(0), 1);
        assert!(ints.is_null(1));
        assert_eq!(ints.value(2), 3);

        let cells = vec![Some("t".to_string()), Some("0".to_string())];
        let bools = strings_to_array(&DataType::Boolean, &cells).unwrap();
        let bools = bools.as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(bools.value(0));
        assert!(!bools.value(1));
    }

    #[test]
    fn test_strings_to_array_rejects_bad_cells() {
        let cells = vec![Some("abc".to_string())];
        assert!(strings_to_array(&DataType::Int64, &cells).is_err());
        assert!(strings_to_array(&DataType::Date32, &cells).is_err());
    }

    #[test]
    fn test_first_value_as_i64() {
        let counts = batch(
            vec![Field::new("N", DataType::Int64, false)],
            vec![Arc::new(Int64Array::from(vec![42]))],
        );
        assert_eq!(first_value_as_i64(&counts), Some(42));

        let text = batch(
            vec![Field::new("N", DataType::Utf8, false)],
            vec![Arc::new(StringArray::from(vec!["7"]))],
        );
        assert_eq!(first_value_as_i64(&text), Some(7));

        let empty = batch(
            vec![Field::new("N", DataType::Int64, false)],
            vec![Arc::new(Int64Array::from(Vec::<i64>::new()))],
        );
        assert_eq!(first_value_as_i64(&empty), None);
    }
}
