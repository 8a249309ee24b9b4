//! Primary and foreign key introspection.

use crate::{Connection, Result};
use boilroach_db_schema::{ForeignKey, PrimaryKey};

const PRIMARY_KEY_NAME: &str = "SELECT tc.constraint_name \
     FROM information_schema.table_constraints AS tc \
     WHERE tc.table_name = $1 \
     AND tc.constraint_type = 'PRIMARY KEY' \
     AND tc.table_schema = $2";

const PRIMARY_KEY_COLUMNS: &str = "SELECT kcu.column_name \
     FROM information_schema.key_column_usage AS kcu \
     WHERE kcu.constraint_name = $1 \
     AND kcu.table_schema = $2 \
     AND kcu.table_name = $3 \
     ORDER BY kcu.ordinal_position ASC";

const FOREIGN_KEYS: &str = "SELECT DISTINCT pgcon.conname, \
     pgc.relname AS source_table, \
     kcu.column_name AS source_column, \
     dstlookupname.relname AS dest_table, \
     pgadst.attname AS dest_column \
     FROM pg_namespace AS pgn \
     INNER JOIN pg_class AS pgc \
     ON pgn.oid = pgc.relnamespace AND pgc.relkind = 'r' \
     INNER JOIN pg_constraint AS pgcon \
     ON pgn.oid = pgcon.connamespace AND pgc.oid = pgcon.conrelid \
     INNER JOIN pg_class AS dstlookupname \
     ON pgcon.confrelid = dstlookupname.oid \
     LEFT JOIN information_schema.key_column_usage AS kcu \
     ON pgcon.conname = kcu.constraint_name AND pgc.relname = kcu.table_name \
     INNER JOIN pg_attribute AS pgadst \
     ON pgcon.confrelid = pgadst.attrelid AND pgadst.attnum = ANY (pgcon.confkey) \
     WHERE pgn.nspname = $2 \
     AND pgc.relname = $1 \
     AND pgcon.contype = 'f' \
     ORDER BY pgcon.conname DESC";

/// The primary key of `table`, or `None` if it has none.
///
/// Columns are listed in key declaration order.
pub async fn primary_key<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    table: &str,
) -> Result<Option<PrimaryKey>> {
    let rows = conn.query(PRIMARY_KEY_NAME, &[table, schema]).await?;
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    let name = row.text(0)?;

    let rows = conn.query(PRIMARY_KEY_COLUMNS, &[name.as_str(), schema, table]).await?;
    let columns = rows
        .iter()
        .map(|row| row.text(0))
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(PrimaryKey { name, columns }))
}

/// Foreign keys declared on `table`, ordered by constraint name descending.
///
/// Multi-column constraints yield one entry per referencing column.
pub async fn foreign_keys<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    table: &str,
) -> Result<Vec<ForeignKey>> {
    let rows = conn.query(FOREIGN_KEYS, &[table, schema]).await?;
    rows.iter()
        .map(|row| {
            Ok(ForeignKey {
                name: row.text(0)?,
                table: table.to_string(),
                column: row.text(2)?,
                foreign_table: row.text(3)?,
                foreign_column: row.text(4)?,
            })
        })
        .collect()
}
