//! The database session: one connection plus execution settings.
//!
//! Every operation is a short statement built in [`crate::db::sql`] and sent
//! through [`Session::execute`]. Diagnostics meant for the person running the
//! load (echoed statements, dry-run notices, load progress) go to the
//! session's output sink, standard output unless replaced.

mod export;
mod load;

pub use export::{DumpOptions, DumpOptionsBuilder};
pub use load::{LoadOptions, LoadOptionsBuilder, LoadSummary};

use arrow::record_batch::RecordBatch;
use std::fmt::Display;
use std::io::Write;
use tracing::{debug, info, warn};

use crate::config::ECHO_RULE_WIDTH;
use crate::db::{ConnectArgs, Connection, Connector, sql};
use crate::error::{Result, SessionError};
use crate::formats::conversion::first_value_as_i64;

/// How chatty [`Session::execute`] is about the statements it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    /// Echo every statement before running it
    Loud,
}

impl Verbosity {
    /// `1` is loud; every other level clamps to quiet
    pub fn from_level(level: i32) -> Self {
        match level {
            1 => Verbosity::Loud,
            _ => Verbosity::Quiet,
        }
    }
}

/// Per-call switches for [`Session::execute`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Return the result set instead of committing
    pub with_results: bool,
    /// Echo this statement regardless of verbosity
    pub print_query: bool,
    /// Skip this statement even when the session is live
    pub dry_run: bool,
    /// Report a failed statement and carry on instead of failing the call
    pub ignore_errors: bool,
}

impl ExecuteOptions {
    /// Options for a statement without a result set
    pub fn statement() -> Self {
        Self::default()
    }

    /// Options for a query whose result set is returned
    pub fn query() -> Self {
        Self {
            with_results: true,
            ..Self::default()
        }
    }

    pub fn print_query(mut self, print_query: bool) -> Self {
        self.print_query = print_query;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }
}

/// One open connection to a Netezza database.
///
/// The connection is released exactly once, by [`close`](Session::close) or
/// when the session is dropped.
pub struct Session {
    args: ConnectArgs,
    connection: Option<Box<dyn Connection>>,
    dry_run: bool,
    verbosity: Verbosity,
    out: Box<dyn Write>,
}

impl Session {
    /// Connect through the system ODBC driver manager
    #[cfg(feature = "odbc")]
    pub async fn open(args: ConnectArgs) -> Result<Self> {
        Self::open_with(&crate::db::OdbcConnector, args).await
    }

    /// Connect with `connector`, reporting to standard output
    pub async fn open_with(connector: &dyn Connector, args: ConnectArgs) -> Result<Self> {
        Self::open_with_output(connector, args, Box::new(std::io::stdout())).await
    }

    /// Connect with `connector`, reporting to `out`.
    ///
    /// The connection runs in autocommit mode. A refused connection is
    /// reported to `out` and returned as [`SessionError::Connect`].
    pub async fn open_with_output(
        connector: &dyn Connector,
        args: ConnectArgs,
        mut out: Box<dyn Write>,
    ) -> Result<Self> {
        let redacted = args.redacted_connection_string();

        let connection = match connector.connect(&args.connection_string(), true).await {
            Ok(connection) => connection,
            Err(source) => {
                let _ = writeln!(out, "Error connecting using {}", redacted);
                let _ = writeln!(out, ">>> {:#}", source);
                return Err(SessionError::Connect {
                    connection_string: redacted,
                    source,
                });
            }
        };

        info!(host = %args.host, database = %args.database, "connected");

        Ok(Self {
            args,
            connection: Some(connection),
            dry_run: false,
            verbosity: Verbosity::Quiet,
            out,
        })
    }

    /// Database this session was opened against
    pub fn database(&self) -> &str {
        &self.args.database
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Print statements instead of running them
    pub fn run_dry(&mut self) {
        self.set_dry_run(true);
    }

    /// Run statements against the database
    pub fn run_live(&mut self) {
        self.set_dry_run(false);
    }

    /// `0` for quiet, `1` to echo every statement; anything else is quiet
    pub fn set_verbosity(&mut self, level: i32) {
        self.verbosity = Verbosity::from_level(level);
    }

    /// Release the connection. Later calls are no-ops.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            drop(connection);
            debug!(database = %self.args.database, "connection closed");
        }
    }

    /// Run one statement.
    ///
    /// With `with_results` the full result set is returned and a driver
    /// error comes back as [`SessionError::Query`] without being reported.
    /// Otherwise the statement is committed; a driver error is reported and
    /// returned as [`SessionError::Statement`], or only reported when
    /// `ignore_errors` is set. Dry runs return `Ok(None)` without touching
    /// the connection.
    pub async fn execute(
        &mut self,
        sql: &str,
        options: ExecuteOptions,
    ) -> Result<Option<RecordBatch>> {
        self.run(sql, None, options).await
    }

    async fn run(
        &mut self,
        sql: &str,
        param: Option<&str>,
        options: ExecuteOptions,
    ) -> Result<Option<RecordBatch>> {
        if options.print_query || self.verbosity == Verbosity::Loud {
            self.echo(sql);
        }

        if options.dry_run || self.dry_run {
            self.say(format_args!("Dry run, would have executed:\n{}\n", sql));
            return Ok(None);
        }

        if self.connection.is_none() {
            self.say("Session is not connected and will not reconnect on its own.");
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(SessionError::NotConnected);
        };

        if options.with_results {
            debug!(sql, "running query");
            let result = match param {
                Some(param) => connection.query_with_param(sql, param).await,
                None => connection.query(sql).await,
            };
            return result.map(Some).map_err(|source| SessionError::Query {
                sql: sql.to_string(),
                source,
            });
        }

        debug!(sql, "running statement");
        let outcome = match connection.execute(sql).await {
            Ok(()) => connection.commit().await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => Ok(None),
            Err(source) => {
                self.say(format_args!(
                    "Statement failed. Error first, then the statement:\n{:#}\n\n{}",
                    source, sql
                ));
                if options.ignore_errors {
                    warn!(error = %format!("{:#}", source), "ignoring failed statement");
                    self.say("Ignoring the failure as requested; check the statement above.");
                    Ok(None)
                } else {
                    self.say("Aborting due to the failed statement.");
                    Err(SessionError::Statement {
                        sql: sql.to_string(),
                        source,
                    })
                }
            }
        }
    }

    /// Single integer from a count-style query
    async fn query_count(&mut self, sql: &str, param: Option<&str>) -> Result<i64> {
        let batch = self
            .run(sql, param, ExecuteOptions::query())
            .await?
            .ok_or_else(|| SessionError::DryRun {
                sql: sql.to_string(),
            })?;
        first_value_as_i64(&batch).ok_or_else(|| SessionError::EmptyResult {
            sql: sql.to_string(),
        })
    }

    /// Whether `table` exists in the session's database.
    ///
    /// The catalog stores identifiers upper case, so the name is folded
    /// before comparison and any spelling of it matches.
    pub async fn table_exists(&mut self, table: &str) -> Result<bool> {
        let query = sql::table_exists(&self.args.database);
        Ok(self.query_count(&query, Some(table)).await? > 0)
    }

    /// Number of rows in `table`
    pub async fn row_count(&mut self, table: &str) -> Result<i64> {
        self.query_count(&sql::row_count(table), None).await
    }

    /// Drop `table`, doing nothing if it is absent
    pub async fn drop_table(&mut self, table: &str) -> Result<()> {
        self.execute(&sql::drop_if_exists(table), ExecuteOptions::statement())
            .await?;
        Ok(())
    }

    fn echo(&mut self, sql: &str) {
        let rule = "=".repeat(ECHO_RULE_WIDTH);
        self.say(format_args!("{}\n{}\n{}\n", rule, sql, rule));
    }

    fn say(&mut self, message: impl Display) {
        let _ = writeln!(self.out, "{}", message);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
