//! Enumerating the tables and views of a schema.

use crate::{Connection, Result};
use boilroach_db_schema::RelationKind;
use boilroach_sql::ListFilter;

/// List relation names of `kind` in `schema`, honoring the relation-level
/// entries of the whitelist and blacklist.
///
/// Views come back ordered by name. Tables come back in catalog order.
pub async fn list_relations<C: Connection + ?Sized>(
    conn: &C,
    kind: RelationKind,
    schema: &str,
    whitelist: &[String],
    blacklist: &[String],
) -> Result<Vec<String>> {
    let filter = ListFilter::tables(whitelist, blacklist);
    let clause = filter.clause("table_name", 2);

    let sql = match kind {
        RelationKind::Table => format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = $1 AND table_type = 'BASE TABLE'{clause}"
        ),
        RelationKind::View => format!(
            "SELECT table_name FROM information_schema.views \
             WHERE table_schema = $1{clause} ORDER BY table_name"
        ),
    };

    let mut params = vec![schema];
    params.extend_from_slice(filter.params());

    let rows = conn.query(&sql, &params).await?;
    let names = rows
        .iter()
        .map(|row| row.text(0))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(%kind, schema, count = names.len(), "listed relations");
    Ok(names)
}

/// Names of the base tables in `schema`.
pub async fn table_names<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    whitelist: &[String],
    blacklist: &[String],
) -> Result<Vec<String>> {
    list_relations(conn, RelationKind::Table, schema, whitelist, blacklist).await
}

/// Names of the views in `schema`, sorted.
pub async fn view_names<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    whitelist: &[String],
    blacklist: &[String],
) -> Result<Vec<String>> {
    list_relations(conn, RelationKind::View, schema, whitelist, blacklist).await
}
