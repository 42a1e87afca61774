//! In-memory driver and output sink for exercising sessions without a database.

use anyhow::{Result, anyhow};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use crate::db::{ConnectArgs, ConnectArgsBuilder, Connection, Connector};
use crate::session::Session;

/// One request that reached the driver
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute(String),
    Commit,
    Query(String),
    QueryWithParam(String, String),
}

/// Shared state behind a scripted connector and its connections
#[derive(Debug, Default)]
pub struct Script {
    /// Refuse every connection attempt
    pub refuse: bool,
    pub connection_string: Option<String>,
    pub autocommit: Option<bool>,
    pub calls: Vec<Call>,
    /// Upper-case table names the catalog probe finds
    pub catalog: HashSet<String>,
    /// Answers to `select count(*) as n from <table>`, keyed by table
    pub row_counts: HashMap<String, i64>,
    /// Any statement containing one of these fails
    pub failing: Vec<String>,
    /// Canned result sets keyed by exact query text
    pub results: HashMap<String, RecordBatch>,
    /// Number of connections dropped
    pub closed: usize,
}

pub type SharedScript = Rc<RefCell<Script>>;

pub struct ScriptedConnector {
    pub script: SharedScript,
}

#[async_trait(?Send)]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        connection_string: &str,
        autocommit: bool,
    ) -> Result<Box<dyn Connection>> {
        let mut script = self.script.borrow_mut();
        if script.refuse {
            return Err(anyhow!("[08001] Unable to connect to the server"));
        }
        script.connection_string = Some(connection_string.to_string());
        script.autocommit = Some(autocommit);
        Ok(Box::new(ScriptedConnection {
            script: self.script.clone(),
        }))
    }
}

struct ScriptedConnection {
    script: SharedScript,
}

impl ScriptedConnection {
    fn check(&self, sql: &str) -> Result<()> {
        let script = self.script.borrow();
        match script.failing.iter().find(|needle| sql.contains(needle.as_str())) {
            Some(needle) => Err(anyhow!("ERROR:  scripted failure on '{}'", needle)),
            None => Ok(()),
        }
    }

    fn answer(&self, sql: &str, param: Option<&str>) -> Result<RecordBatch> {
        let script = self.script.borrow();
        if let Some(batch) = script.results.get(sql) {
            return Ok(batch.clone());
        }
        if sql.contains("_V_TABLE") {
            let name = param.unwrap_or_default().to_uppercase();
            return count_batch(i64::from(script.catalog.contains(&name)));
        }
        if let Some(table) = sql.strip_prefix("select count(*) as n from ") {
            return count_batch(script.row_counts.get(table).copied().unwrap_or(0));
        }
        let schema = Schema::new(vec![Field::new("ANSWER", DataType::Utf8, true)]);
        Ok(RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["ok"]))],
        )?)
    }
}

#[async_trait(?Send)]
impl Connection for ScriptedConnection {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.script
            .borrow_mut()
            .calls
            .push(Call::Execute(sql.to_string()));
        self.check(sql)
    }

    async fn commit(&mut self) -> Result<()> {
        self.script.borrow_mut().calls.push(Call::Commit);
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<RecordBatch> {
        self.script
            .borrow_mut()
            .calls
            .push(Call::Query(sql.to_string()));
        self.check(sql)?;
        self.answer(sql, None)
    }

    async fn query_with_param(&mut self, sql: &str, param: &str) -> Result<RecordBatch> {
        self.script
            .borrow_mut()
            .calls
            .push(Call::QueryWithParam(sql.to_string(), param.to_string()));
        self.check(sql)?;
        self.answer(sql, Some(param))
    }
}

impl Drop for ScriptedConnection {
    fn drop(&mut self) {
        self.script.borrow_mut().closed += 1;
    }
}

/// Single-cell `N` column, the shape of a Netezza count
fn count_batch(n: i64) -> Result<RecordBatch> {
    let schema = Schema::new(vec![Field::new("N", DataType::Int64, false)]);
    Ok(RecordBatch::try_new(
        Arc::new(schema),
        vec![Arc::new(Int64Array::from(vec![n]))],
    )?)
}

/// Clonable in-memory writer for capturing session output
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn test_args() -> ConnectArgs {
    ConnectArgsBuilder::default()
        .host("nzhost")
        .database("dbo")
        .user("user1")
        .password("p4ss")
        .build()
        .unwrap()
}

/// A live session over a fresh script, plus the script and captured output
pub async fn scripted_session() -> (Session, SharedScript, SharedBuffer) {
    let script = SharedScript::default();
    let out = SharedBuffer::default();
    let connector = ScriptedConnector {
        script: script.clone(),
    };
    let session = Session::open_with_output(&connector, test_args(), Box::new(out.clone()))
        .await
        .unwrap();
    (session, script, out)
}
