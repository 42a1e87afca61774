use anyhow::{Context, Result};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;

use super::infer::{FieldValues, SchemaInferrer};

/// Supported source file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Tsv,
    Parquet,
}

impl Format {
    /// Parse format from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "tsv" => Ok(Format::Tsv),
            "parquet" => Ok(Format::Parquet),
            _ => Err(anyhow::anyhow!(
                "Unsupported format: {}. Supported formats: csv, tsv, parquet",
                s
            )),
        }
    }

    /// Auto-detect file format from its extension
    pub fn detect(path: &Path) -> Option<Self> {
        let lower = path.to_string_lossy().to_lowercase();

        if lower.ends_with(".csv") {
            Some(Format::Csv)
        } else if lower.ends_with(".tsv") {
            Some(Format::Tsv)
        } else if lower.ends_with(".parquet") {
            Some(Format::Parquet)
        } else {
            None
        }
    }
}

/// Configuration for delimited file reading (CSV, TSV, etc.)
#[derive(Debug, Clone)]
pub struct DelimitedConfig {
    pub delimiter: u8,
    pub has_header: bool,
    pub quote: u8,
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            quote: b'"',
        }
    }
}

impl DelimitedConfig {
    pub fn csv() -> Self {
        Self::default()
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }
}

/// Read a local source file into a single batch.
///
/// Delimited files carry no types, so each column's type is inferred from
/// its values. Parquet files keep their declared schema.
pub fn read_source(path: &Path, format: Format) -> Result<RecordBatch> {
    match format {
        Format::Csv => read_delimited(path, &DelimitedConfig::csv()),
        Format::Tsv => read_delimited(path, &DelimitedConfig::tsv()),
        Format::Parquet => read_parquet(path),
    }
}

/// Read a delimited file and infer its column types
pub fn read_delimited(path: &Path, config: &DelimitedConfig) -> Result<RecordBatch> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .quote(config.quote)
        .has_headers(false) // the inferrer takes names from the first record
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records: Vec<FieldValues> = Vec::new();
    for result in csv_reader.records() {
        let record = result.context("Failed to parse delimited record")?;
        records.push(record.iter().map(|s| s.to_string()).collect());
    }

    let inferrer = SchemaInferrer {
        has_header: config.has_header,
    };
    inferrer
        .infer_batch(&records)
        .with_context(|| format!("Failed to infer column types for {}", path.display()))
}

/// Read every row group of a parquet file into one batch
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("Failed to read parquet footer")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("Failed to build parquet reader")?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read parquet row group")?;

    Ok(concat_batches(&schema, &batches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, Int32Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_parse_and_detect() {
        assert_eq!(Format::parse("CSV").unwrap(), Format::Csv);
        assert_eq!(Format::parse("parquet").unwrap(), Format::Parquet);
        assert!(Format::parse("xlsx").is_err());

        assert_eq!(Format::detect(Path::new("/data/a.TSV")), Some(Format::Tsv));
        assert_eq!(
            Format::detect(Path::new("s.parquet")),
            Some(Format::Parquet)
        );
        assert_eq!(Format::detect(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_read_csv_infers_types() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "id,name,amount").unwrap();
        writeln!(temp_file, "1,Alice,10.5").unwrap();
        writeln!(temp_file, "2,\"Bob, Jr\",").unwrap();
        temp_file.flush().unwrap();

        let batch = read_source(temp_file.path(), Format::Csv).unwrap();

        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);

        let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(1), "Bob, Jr");
        assert!(batch.column(2).is_null(1));
    }

    #[test]
    fn test_read_tsv() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "id\tlabel").unwrap();
        writeln!(temp_file, "7\tseven").unwrap();
        temp_file.flush().unwrap();

        let batch = read_source(temp_file.path(), Format::Tsv).unwrap();

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.value(0), 7);
    }

    #[test]
    fn test_read_parquet_keeps_declared_types() {
        let temp_file = NamedTempFile::new().unwrap();
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("value", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(Float64Array::from(vec![1.5, 3.0, 4.5])),
            ],
        )
        .unwrap();

        let file = File::create(temp_file.path()).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let read = read_source(temp_file.path(), Format::Parquet).unwrap();

        assert_eq!(read.num_rows(), 3);
        assert_eq!(read.schema().field(0).data_type(), &DataType::Int32);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(read_source(Path::new("/nonexistent/source.csv"), Format::Csv).is_err());
    }
}
