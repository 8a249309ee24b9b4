//! One full introspection pass.

use crate::columns::columns_with_enums;
use crate::enums::enum_types;
use crate::keys::{foreign_keys, primary_key};
use crate::relations::{table_names, view_names};
use crate::translate::{EnumNaming, translate_column};
use crate::views::view_capabilities;
use crate::{Connection, ConnectionExt, Result, Session};
use boilroach_config::Config;
use boilroach_db_schema::{Column, DbInfo, Dialect, EnumCatalog, Relation, RelationKind};

/// Connect, introspect the configured schema and disconnect.
///
/// A failure to close the connection is reported when introspection itself
/// succeeded; otherwise the introspection error wins.
pub async fn assemble(config: &Config) -> Result<DbInfo> {
    let session = Session::connect(config).await?;
    let result = introspect(&session.traced(), config).await;
    let closed = session.close().await;

    match (result, closed) {
        (Ok(info), Ok(())) => Ok(info),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), closed) => {
            if let Err(close_err) = closed {
                tracing::warn!(error = %close_err, "failed to close connection after error");
            }
            Err(err)
        }
    }
}

/// Introspect the configured schema over an open connection.
///
/// Tables come first, in catalog order, each with its columns, primary key
/// and foreign keys. Views follow in name order, each with its columns and
/// insert/upsert capabilities.
pub async fn introspect<C: Connection + ?Sized>(conn: &C, config: &Config) -> Result<DbInfo> {
    let schema = config.schema.as_str();
    let naming = EnumNaming::from(config);
    let mut info = DbInfo::new(schema, Dialect::cockroach(config.uses_schema()));

    let enums = enum_types(conn, schema)
        .await
        .map_err(|e| e.context(schema, "load enums"))?;

    let tables = table_names(conn, schema, &config.whitelist, &config.blacklist)
        .await
        .map_err(|e| e.context(schema, "list tables"))?;
    for name in tables {
        let mut table = Relation::new(&name, RelationKind::Table);
        table.columns = relation_columns(conn, config, &name, &enums, &naming).await?;
        table.primary_key = primary_key(conn, schema, &name)
            .await
            .map_err(|e| e.context(&name, "load primary key"))?;
        table.foreign_keys = foreign_keys(conn, schema, &name)
            .await
            .map_err(|e| e.context(&name, "load foreign keys"))?;
        table.mark_join_table();
        info.push(table);
    }

    let views = view_names(conn, schema, &config.whitelist, &config.blacklist)
        .await
        .map_err(|e| e.context(schema, "list views"))?;
    for name in views {
        let mut view = Relation::new(&name, RelationKind::View);
        view.columns = relation_columns(conn, config, &name, &enums, &naming).await?;
        view.view_capabilities = Some(
            view_capabilities(conn, schema, &name)
                .await
                .map_err(|e| e.context(&name, "load view capabilities"))?,
        );
        info.push(view);
    }

    tracing::info!(
        schema,
        tables = info.tables().count(),
        views = info.views().count(),
        enums = enums.len(),
        "introspected schema"
    );
    Ok(info)
}

async fn relation_columns<C: Connection + ?Sized>(
    conn: &C,
    config: &Config,
    relation: &str,
    enums: &EnumCatalog,
    naming: &EnumNaming,
) -> Result<Vec<Column>> {
    let columns = columns_with_enums(
        conn,
        &config.schema,
        relation,
        &config.whitelist,
        &config.blacklist,
        enums,
    )
    .await
    .map_err(|e| e.context(relation, "load columns"))?;

    Ok(columns
        .into_iter()
        .map(|column| translate_column(column, naming))
        .collect())
}
