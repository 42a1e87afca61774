use arrow::record_batch::RecordBatch;
use derive_builder::Builder;
use tracing::warn;

use super::{ExecuteOptions, Session};
use crate::db::sql;
use crate::error::Result;

/// Options for [`Session::dump_to_disk`]
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DumpOptions {
    #[builder(default = "\",\".to_string()")]
    pub delimiter: String,

    /// Verbatim `order by` clause
    #[builder(default, setter(into, strip_option))]
    pub order_by: Option<String>,

    /// Accepted for compatibility; Netezza compression is not applied
    #[builder(default)]
    pub compress: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            order_by: None,
            compress: false,
        }
    }
}

impl Session {
    /// Every row of `database..table`. `None` in a dry run.
    pub async fn read_table(&mut self, database: &str, table: &str) -> Result<Option<RecordBatch>> {
        self.query_table(database, table, "", "").await
    }

    /// Rows of `database..table` with optional verbatim `where` and
    /// `order by` clauses; empty strings leave a clause out.
    pub async fn query_table(
        &mut self,
        database: &str,
        table: &str,
        where_clause: &str,
        order_by: &str,
    ) -> Result<Option<RecordBatch>> {
        let query = sql::select_all(database, table, where_clause, order_by);
        self.execute(&query, ExecuteOptions::query()).await
    }

    /// Write `table` to `out_file` on the client through a remote-source
    /// external table.
    pub async fn dump_to_disk(
        &mut self,
        table: &str,
        out_file: &str,
        options: &DumpOptions,
    ) -> Result<()> {
        self.say(format_args!("Dumping {} to {}...", table, out_file));
        if options.compress {
            self.say("Compression is not supported; writing the dump uncompressed.");
            warn!(table, out_file, "compress requested but not supported");
        }

        let statement = sql::dump_external(
            table,
            out_file,
            &options.delimiter,
            options.order_by.as_deref(),
        );
        self.execute(&statement, ExecuteOptions::statement()).await?;
        Ok(())
    }
}
