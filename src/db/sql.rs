//! Statement text for every operation the session issues.
//!
//! Netezza offers no parameter binding for identifiers, DDL, or external
//! table options, so table names, column names, paths, and filter clauses
//! are interpolated verbatim. Everything in this module is an unchecked
//! passthrough: callers must not feed it untrusted input. The only
//! parameterized statement is [`table_exists`], whose table name is bound
//! by the driver.

use std::path::Path;

use crate::config::DEFAULT_DISTRIBUTION;

/// Catalog probe for a table in the connected database, one `?` parameter
pub fn table_exists(database: &str) -> String {
    format!(
        "select count(*) as n from {}.._V_TABLE where tablename = upper(?)",
        database
    )
}

/// `<database>..<table>` addressing form
pub fn qualified(database: &str, table: &str) -> String {
    format!("{}..{}", database, table)
}

pub fn row_count(table: &str) -> String {
    format!("select count(*) as n from {}", table)
}

pub fn drop_if_exists(table: &str) -> String {
    format!("drop table {} if exists;", table)
}

/// `select *` over a qualified table with optional verbatim clauses
pub fn select_all(database: &str, table: &str, where_clause: &str, order_by: &str) -> String {
    let mut query = format!("select * from {}", qualified(database, table));
    if !where_clause.is_empty() {
        query.push_str("\nwhere ");
        query.push_str(where_clause);
    }
    if !order_by.is_empty() {
        query.push_str("\norder by ");
        query.push_str(order_by);
    }
    query
}

/// Column list of an external table definition.
///
/// One indented line per column, comma after every column but the last.
pub fn column_ddl<S: AsRef<str>>(names: &[S], types: &[String]) -> String {
    let mut ddl = String::new();
    for (idx, (name, sql_type)) in names.iter().zip(types).enumerate() {
        let separator = if idx + 1 < names.len() { "," } else { "" };
        ddl.push_str(&format!("    {} {}{}\n", name.as_ref(), sql_type, separator));
    }
    ddl
}

/// Inputs for a create-table-from-external-file load
#[derive(Debug, Clone)]
pub struct ExternalLoad<'a> {
    pub table: &'a str,
    pub staging_path: &'a Path,
    pub column_ddl: &'a str,
    pub log_dir: &'a Path,
    pub max_errors: u32,
    pub distribute_on: &'a str,
}

impl ExternalLoad<'_> {
    pub fn to_sql(&self) -> String {
        let distribution = if self.distribute_on.eq_ignore_ascii_case(DEFAULT_DISTRIBUTION) {
            String::new()
        } else {
            format!("distribute on ({})\n", self.distribute_on)
        };

        format!(
            "create table {table} as
select * from external '{staging}'
(
{ddl})
using ( logdir '{log_dir}'
        delimiter ','
        maxerrors {max_errors}
        skiprows 0
        datestyle 'mdy'
        datedelim '/'
        encoding 'internal'
        remotesource 'odbc'
        quotedvalue double
      )
{distribution};
",
            table = self.table,
            staging = self.staging_path.display(),
            ddl = self.column_ddl,
            log_dir = self.log_dir.display(),
            max_errors = self.max_errors,
            distribution = distribution,
        )
    }
}

/// Create-external-table-as-select writing `table` to `out_file`
pub fn dump_external(table: &str, out_file: &str, delimiter: &str, order_by: Option<&str>) -> String {
    let order_clause = match order_by {
        Some(order) if !order.is_empty() => format!("\norder by {}", order),
        _ => String::new(),
    };

    format!(
        "create external table '{out_file}'
using ( remotesource 'odbc'
        delim '{delimiter}'
        escapechar '\\'
      ) as
select *
from {table}{order_clause}",
        out_file = out_file,
        delimiter = delimiter,
        table = table,
        order_clause = order_clause,
    )
}
