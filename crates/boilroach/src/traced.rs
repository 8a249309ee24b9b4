//! Catalog connections and query tracing.
//!
//! Every introspection step talks to the database through [`Connection`],
//! which returns fully materialized [`CatalogRow`]s. [`TracedConn`] wraps any
//! connection and logs each round-trip via tracing.

use crate::query::CatalogRow;
use crate::{Error, Result};
use std::future::Future;
use std::pin::Pin;
use tokio_postgres::types::ToSql;
use tracing::Instrument;

/// Future returned by [`Connection::query`].
pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<CatalogRow>>> + Send + 'a>>;

/// Trait for database connections that can run catalog queries.
///
/// Catalog queries only ever bind text parameters (schema, relation and
/// column names), so parameters are plain string slices.
///
/// This is implemented for `tokio_postgres::Client` and for
/// [`Session`](crate::Session).
pub trait Connection: Send + Sync {
    /// Execute a query, returning all rows.
    fn query<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> QueryFuture<'a>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn query<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> QueryFuture<'a> {
        (**self).query(sql, params)
    }
}

impl Connection for tokio_postgres::Client {
    fn query<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> QueryFuture<'a> {
        Box::pin(async move {
            let params: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p as &(dyn ToSql + Sync))
                .collect();
            let rows = tokio_postgres::Client::query(self, sql, &params)
                .await
                .map_err(Error::Postgres)?;
            rows.iter().map(CatalogRow::from_pg).collect()
        })
    }
}

/// A wrapper around a connection that logs all queries via tracing.
///
/// # Example
///
/// ```ignore
/// use boilroach::ConnectionExt;
///
/// let conn = client.traced();
/// let rows = conn.query("SHOW ENUMS", &[]).await?;
/// ```
pub struct TracedConn<'a, C: Connection + ?Sized> {
    conn: &'a C,
}

impl<'a, C: Connection + ?Sized> TracedConn<'a, C> {
    /// Create a new traced connection wrapper.
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }
}

impl<C: Connection + ?Sized> Connection for TracedConn<'_, C> {
    fn query<'a>(&'a self, sql: &'a str, params: &'a [&'a str]) -> QueryFuture<'a> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
        );
        Box::pin(async move {
            let rows = self
                .conn
                .query(sql, params)
                .instrument(span.clone())
                .await?;
            span.record("rows", rows.len());
            Ok(rows)
        })
    }
}

/// Extension trait to get a traced wrapper from a connection.
pub trait ConnectionExt: Connection {
    /// Wrap this connection in a `TracedConn` for query logging.
    fn traced(&self) -> TracedConn<'_, Self> {
        TracedConn::new(self)
    }
}

impl<C: Connection + ?Sized> ConnectionExt for C {}
