//! Driver boundary: how a session opens and talks to the database.
use anyhow::Result;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use derive_builder::Builder;

use crate::config::ODBC_DRIVER;

/// A live database connection.
///
/// Releasing the connection is dropping it. Implementations are not
/// required to be `Send`: a connection belongs to exactly one session.
#[async_trait(?Send)]
pub trait Connection {
    /// Run a statement, discarding any result set
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Commit the current unit of work
    async fn commit(&mut self) -> Result<()>;

    /// Run a query and materialize its full result set
    async fn query(&mut self, sql: &str) -> Result<RecordBatch>;

    /// Run a query with a single bound text parameter (`?` placeholder)
    async fn query_with_param(&mut self, sql: &str, param: &str) -> Result<RecordBatch>;
}

/// Something that can open [`Connection`]s from a connection string.
#[async_trait(?Send)]
pub trait Connector {
    async fn connect(&self, connection_string: &str, autocommit: bool)
    -> Result<Box<dyn Connection>>;
}

/// Parameters identifying the database and the login used for it
#[derive(Clone, Builder)]
pub struct ConnectArgs {
    #[builder(setter(into))]
    pub host: String,
    #[builder(setter(into))]
    pub database: String,
    #[builder(setter(into))]
    pub user: String,
    #[builder(setter(into))]
    pub password: String,
}

impl std::fmt::Debug for ConnectArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectArgs")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl ConnectArgs {
    /// Connection string understood by the Netezza ODBC driver
    pub fn connection_string(&self) -> String {
        format!(
            "DRIVER={{{}}};SERVER={};DATABASE={};UID={};PWD={}",
            ODBC_DRIVER, self.host, self.database, self.user, self.password
        )
    }

    /// Same as [`connection_string`](Self::connection_string) with the password masked
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "DRIVER={{{}}};SERVER={};DATABASE={};UID={};PWD=***",
            ODBC_DRIVER, self.host, self.database, self.user
        )
    }
}
