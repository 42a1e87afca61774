//! Bulk load of an Arrow batch through a staged CSV file and an external table.

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use derive_builder::Builder;
use std::path::PathBuf;
use tracing::info;

use super::{ExecuteOptions, Session};
use crate::config::{DEFAULT_DISTRIBUTION, SAMPLE_ROWS};
use crate::db::netezza_types_for_schema;
use crate::db::sql::{self, ExternalLoad};
use crate::error::{Result, SessionError};
use crate::formats::staging::{size_in_mb, stage_batch};

/// Options for [`Session::load_table`]
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct LoadOptions {
    /// Distribution key columns, or `random` for Netezza's default
    #[builder(default = "DEFAULT_DISTRIBUTION.to_string()")]
    pub distribute_on: String,

    /// Drop the destination table first if it exists
    #[builder(default)]
    pub clobber: bool,

    /// Column type declarations used verbatim instead of the mapped types
    #[builder(default, setter(into, strip_option))]
    pub column_types: Option<Vec<String>>,

    /// Sets `maxerrors 0` on the load instead of `maxerrors 1`
    #[builder(default)]
    pub ignore_load_errors: bool,

    /// Print a sample of the source, the staging file, and the load statement
    #[builder(default)]
    pub verbose: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            distribute_on: DEFAULT_DISTRIBUTION.to_string(),
            clobber: false,
            column_types: None,
            ignore_load_errors: false,
            verbose: false,
        }
    }
}

/// Outcome of a bulk load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    /// Fully qualified destination, `<database>..<table>`
    pub table: String,
    pub source_rows: usize,
    /// Rows counted in the destination after the load; zero in a dry run
    pub loaded_rows: i64,
    /// Staging file handed to the loader. It is left on disk.
    pub staging_path: PathBuf,
}

impl Session {
    /// Create `database..table` from `batch`.
    ///
    /// The batch is written to a headerless CSV staging file, then a single
    /// `create table .. as select * from external ..` statement loads it.
    /// Statement failures are fatal. The staging file is never removed.
    pub async fn load_table(
        &mut self,
        batch: &RecordBatch,
        database: &str,
        table: &str,
        options: &LoadOptions,
    ) -> Result<LoadSummary> {
        let destination = sql::qualified(database, table);
        let schema = batch.schema();

        self.say(format_args!(
            "Loading {} rows and {} columns into {}.",
            batch.num_rows(),
            batch.num_columns(),
            destination
        ));

        if options.verbose {
            let sample = batch.slice(0, batch.num_rows().min(SAMPLE_ROWS));
            let rendered = pretty_format_batches(&[sample])?;
            self.say(format_args!("Sample of the source data:\n{}", rendered));
        }

        let column_types = match &options.column_types {
            Some(types) => {
                if types.len() != batch.num_columns() {
                    return Err(SessionError::ColumnTypeCount {
                        types: types.len(),
                        columns: batch.num_columns(),
                    });
                }
                types.clone()
            }
            None => netezza_types_for_schema(&schema),
        };

        if options.clobber {
            if options.verbose {
                self.say(format_args!("Dropping {} if it exists.", destination));
            }
            self.drop_table(&destination).await?;
        }

        let staging_path = stage_batch(batch).map_err(SessionError::Staging)?;
        if options.verbose {
            let mb = size_in_mb(&staging_path).map_err(SessionError::Staging)?;
            self.say(format_args!(
                "Staged data in {} ({:.2} MB).",
                staging_path.display(),
                mb
            ));
        }

        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        let column_ddl = sql::column_ddl(names.as_slice(), &column_types);
        let log_dir = std::env::temp_dir();
        let statement = ExternalLoad {
            table: &destination,
            staging_path: &staging_path,
            column_ddl: &column_ddl,
            log_dir: &log_dir,
            max_errors: if options.ignore_load_errors { 0 } else { 1 },
            distribute_on: &options.distribute_on,
        }
        .to_sql();

        if options.verbose {
            self.say(format_args!("Load statement:\n{}", statement));
        }

        self.execute(&statement, ExecuteOptions::statement()).await?;

        let loaded_rows = if self.is_dry_run() {
            0
        } else {
            let loaded_rows = self.row_count(&destination).await?;
            self.say(format_args!(
                "Done. Staged {} rows, and then loaded {} rows.",
                batch.num_rows(),
                loaded_rows
            ));
            loaded_rows
        };
        info!(
            table = %destination,
            source_rows = batch.num_rows(),
            loaded_rows,
            staging = %staging_path.display(),
            "load finished"
        );

        Ok(LoadSummary {
            table: destination,
            source_rows: batch.num_rows(),
            loaded_rows,
            staging_path,
        })
    }
}
