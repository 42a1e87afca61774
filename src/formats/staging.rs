//! Staging files handed to Netezza's external table loader.
//!
//! A staging file is comma-delimited, has no header row, and ends every
//! record with `\n`. Values containing the delimiter, quotes, or newlines
//! are double-quoted, matching `quotedvalue double` on the load side.
//! The file outlives the load: nothing removes it afterwards.

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::conversion::batch_to_rows;
use crate::config::STAGING_SUFFIX;

/// Create a fresh, uniquely named staging file in the temp directory.
///
/// The file is persisted: dropping the handle does not delete it.
pub fn create_staging_file() -> Result<(File, PathBuf)> {
    let temp = tempfile::Builder::new()
        .suffix(STAGING_SUFFIX)
        .tempfile()
        .context("Failed to create staging file")?;
    let (file, path) = temp.keep().context("Failed to persist staging file")?;
    Ok((file, path))
}

/// Serialize every row of `batch` as CSV into `file`
pub fn write_csv(batch: &RecordBatch, file: File) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(file);

    for row in batch_to_rows(batch)? {
        writer
            .write_record(&row)
            .context("Failed to write staging record")?;
    }
    writer.flush().context("Failed to flush staging file")?;
    Ok(())
}

/// Stage `batch` in a new file and return its path
pub fn stage_batch(batch: &RecordBatch) -> Result<PathBuf> {
    let (file, path) = create_staging_file()?;
    write_csv(batch, file).with_context(|| format!("Failed to stage {}", path.display()))?;
    Ok(path)
}

/// Size of a staged file in megabytes, for diagnostics
pub fn size_in_mb(path: &Path) -> Result<f64> {
    let bytes = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    Ok(bytes as f64 / 1024.0 / 1024.0)
}
