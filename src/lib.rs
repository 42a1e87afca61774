//! Session handle for running SQL against Netezza and moving Arrow tables
//! in and out of it.

// Public API
pub mod db;
pub mod error;
pub mod formats;
pub mod session;

// Internal modules
mod config;

#[cfg(test)]
mod testing;


pub use error::{Result, SessionError};
pub use session::{
    DumpOptions, DumpOptionsBuilder, ExecuteOptions, LoadOptions, LoadOptionsBuilder,
    LoadSummary, Session, Verbosity,
};
