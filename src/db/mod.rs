//! Database layer - driver boundary, type mapping, and statement text

pub mod connection;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod sql;
pub mod types;

pub use connection::{ConnectArgs, ConnectArgsBuilder, Connection, Connector};
#[cfg(feature = "odbc")]
pub use odbc::OdbcConnector;
pub use types::{NzType, netezza_types_for_schema};
