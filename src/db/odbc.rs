//! ODBC backend: the Netezza driver behind the system driver manager.
//!
//! ODBC calls block and run on the calling task, one at a time.

use anyhow::{Context, Result};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use odbc_api::buffers::TextRowSet;
use odbc_api::{ConnectionOptions, Cursor, Environment, IntoParameter};
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::connection::{Connection, Connector};
use crate::config::{FETCH_BATCH_SIZE, MAX_TEXT_CELL_BYTES};
use crate::formats::conversion::strings_to_array;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Process-wide ODBC environment, created on first use
fn environment() -> Result<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().context("Failed to create ODBC environment")?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

/// Opens connections through the ODBC driver manager
#[derive(Debug, Default, Clone, Copy)]
pub struct OdbcConnector;

#[async_trait(?Send)]
impl Connector for OdbcConnector {
    async fn connect(
        &self,
        connection_string: &str,
        autocommit: bool,
    ) -> Result<Box<dyn Connection>> {
        let connection = environment()?
            .connect_with_connection_string(connection_string, ConnectionOptions::default())?;
        connection
            .set_autocommit(autocommit)
            .context("Failed to set autocommit")?;
        Ok(Box::new(OdbcConnection { connection }))
    }
}

pub struct OdbcConnection {
    connection: odbc_api::Connection<'static>,
}

#[async_trait(?Send)]
impl Connection for OdbcConnection {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.connection.execute(sql, ())?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.connection.commit()?;
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<RecordBatch> {
        match self.connection.execute(sql, ())? {
            Some(cursor) => fetch_all(cursor),
            None => Ok(RecordBatch::new_empty(Arc::new(Schema::empty()))),
        }
    }

    async fn query_with_param(&mut self, sql: &str, param: &str) -> Result<RecordBatch> {
        match self.connection.execute(sql, &param.into_parameter())? {
            Some(cursor) => fetch_all(cursor),
            None => Ok(RecordBatch::new_empty(Arc::new(Schema::empty()))),
        }
    }
}

/// Arrow type a result column is materialized as.
///
/// Integers and whole-number decimals that fit in 64 bits become Int64,
/// approximate numerics Float64. Everything else keeps the driver's text
/// form.
fn arrow_type(sql_type: &odbc_api::DataType) -> DataType {
    use odbc_api::DataType as Sql;
    match sql_type {
        Sql::BigInt | Sql::Integer | Sql::SmallInt | Sql::TinyInt => DataType::Int64,
        Sql::Numeric { precision, scale } | Sql::Decimal { precision, scale }
            if *scale == 0 && *precision <= 18 =>
        {
            DataType::Int64
        }
        Sql::Double | Sql::Float { .. } | Sql::Real => DataType::Float64,
        Sql::Bit => DataType::Boolean,
        _ => DataType::Utf8,
    }
}

/// Drain `cursor` into a single batch, fetching as text and parsing per column
fn fetch_all(mut cursor: impl Cursor) -> Result<RecordBatch> {
    let num_cols = cursor.num_result_cols()? as u16;
    let mut fields = Vec::with_capacity(num_cols as usize);
    for col in 1..=num_cols {
        let name = cursor.col_name(col)?;
        let data_type = arrow_type(&cursor.col_data_type(col)?);
        fields.push(Field::new(name, data_type, true));
    }

    let buffer = TextRowSet::for_cursor(FETCH_BATCH_SIZE, &mut cursor, Some(MAX_TEXT_CELL_BYTES))
        .context("Failed to allocate fetch buffer")?;
    let mut row_set_cursor = cursor.bind_buffer(buffer)?;

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); fields.len()];
    while let Some(batch) = row_set_cursor.fetch()? {
        for row in 0..batch.num_rows() {
            for (col, column) in cells.iter_mut().enumerate() {
                let value = batch
                    .at_as_str(col, row)
                    .context("Result cell is not valid UTF-8")?;
                column.push(value.map(str::to_string));
            }
        }
    }
    debug!(
        columns = fields.len(),
        rows = cells.first().map_or(0, Vec::len),
        "fetched result set"
    );

    let columns = fields
        .iter()
        .zip(&cells)
        .map(|(field, column)| {
            strings_to_array(field.data_type(), column)
                .with_context(|| format!("Failed to convert column {}", field.name()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
