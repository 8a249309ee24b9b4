//! A scripted [`Connection`] for unit tests.
//!
//! Responses are keyed by a substring of the SQL they answer and consumed
//! in the order they were scripted. Every executed query is recorded.

use crate::query::{CatalogRow, Value};
use crate::traced::QueryFuture;
use crate::{Connection, Error};
use std::sync::Mutex;

type Response = std::result::Result<Vec<CatalogRow>, String>;

#[derive(Default)]
pub(crate) struct ScriptedConn {
    script: Mutex<Vec<(&'static str, Response)>>,
    log: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedConn {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer the next query containing `needle` with `rows`.
    pub(crate) fn respond(self, needle: &'static str, rows: Vec<CatalogRow>) -> Self {
        self.script.lock().unwrap().push((needle, Ok(rows)));
        self
    }

    /// Fail the next query containing `needle` with a server message.
    pub(crate) fn fail(self, needle: &'static str, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push((needle, Err(message.to_string())));
        self
    }

    /// Executed queries with their parameters, in order.
    pub(crate) fn executed(&self) -> Vec<(String, Vec<String>)> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn executed_sql(&self) -> Vec<String> {
        self.executed().into_iter().map(|(sql, _)| sql).collect()
    }

    /// Responses nobody asked for.
    pub(crate) fn unused(&self) -> Vec<&'static str> {
        self.script.lock().unwrap().iter().map(|(n, _)| *n).collect()
    }
}

impl Connection for ScriptedConn {
    fn query<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> QueryFuture<'a> {
        self.log.lock().unwrap().push((
            sql.to_string(),
            params.iter().map(|p| p.to_string()).collect(),
        ));
        let response = {
            let mut script = self.script.lock().unwrap();
            script
                .iter()
                .position(|(needle, _)| sql.contains(needle))
                .map(|idx| script.remove(idx).1)
        };
        Box::pin(async move {
            match response {
                Some(Ok(rows)) => Ok(rows),
                Some(Err(message)) => Err(Error::Query(message)),
                None => Err(Error::Query(format!("unscripted query: {sql}"))),
            }
        })
    }
}

/// Build a row from `(column, value)` pairs.
pub(crate) fn row<const N: usize>(fields: [(&str, Value); N]) -> CatalogRow {
    CatalogRow::new(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}
