//! Column introspection.
//!
//! The richest query reads CockroachDB's own `crdb_sql_type` and skips
//! hidden columns (`rowid`). Older servers lack one or both of those
//! catalog columns, so the query is retried with progressively plainer
//! variants when the server names the missing column in its error.

use crate::classify::{ARRAY_MARKER, array_element, classify_type, normalize_type};
use crate::enums::enum_types;
use crate::query::CatalogRow;
use crate::{Connection, Error, Result};
use boilroach_db_schema::{Column, EnumCatalog, NULL_DEFAULT};
use boilroach_sql::ListFilter;

/// One rendition of the column query.
#[derive(Debug, Clone, Copy)]
struct ColumnQuery {
    /// Where the declared type comes from.
    type_column: &'static str,
    /// Exclude `is_hidden` columns.
    skip_hidden: bool,
    /// Server message that sends us to this variant.
    retry_on: Option<&'static str>,
}

const COLUMN_QUERIES: [ColumnQuery; 3] = [
    ColumnQuery {
        type_column: "c.crdb_sql_type",
        skip_hidden: true,
        retry_on: None,
    },
    ColumnQuery {
        type_column: "c.data_type",
        skip_hidden: true,
        retry_on: Some(r#"column "crdb_sql_type" does not exist"#),
    },
    ColumnQuery {
        type_column: "c.data_type",
        skip_hidden: false,
        retry_on: Some(r#"column "is_hidden" does not exist"#),
    },
];

impl ColumnQuery {
    fn sql(&self, filter_clause: &str) -> String {
        let type_column = self.type_column;
        let hidden = if self.skip_hidden {
            " AND c.is_hidden = 'NO'"
        } else {
            ""
        };
        format!(
            "SELECT DISTINCT c.column_name, c.ordinal_position, \
             max({type_column}) AS data_type, \
             max(c.column_default) AS column_default, \
             bool_or(CASE WHEN c.is_nullable = 'NO' THEN false ELSE true END) AS is_nullable, \
             bool_or(CASE WHEN pc.count < 2 AND pgc.contype IN ('p', 'u') THEN true ELSE false END) AS is_unique \
             FROM information_schema.columns AS c \
             LEFT JOIN (\
             SELECT DISTINCT c.column_name, pgc.conname AS conname, pgc.contype AS contype \
             FROM information_schema.columns AS c \
             LEFT JOIN information_schema.key_column_usage AS kcu \
             ON c.table_name = kcu.table_name \
             AND c.table_schema = kcu.table_schema \
             AND c.column_name = kcu.column_name \
             LEFT JOIN pg_constraint AS pgc ON kcu.constraint_name = pgc.conname \
             WHERE c.table_schema = $1 AND c.table_name = $2\
             ) AS pgc ON c.column_name = pgc.column_name \
             LEFT JOIN (\
             SELECT kcu.table_schema, kcu.table_name, kcu.constraint_name, count(*) \
             FROM information_schema.key_column_usage AS kcu \
             GROUP BY kcu.table_schema, kcu.table_name, kcu.constraint_name\
             ) AS pc ON c.table_schema = pc.table_schema \
             AND c.table_name = pc.table_name \
             AND pgc.conname = pc.constraint_name \
             WHERE c.table_schema = $1 AND c.table_name = $2{filter_clause}{hidden} \
             GROUP BY c.ordinal_position, c.column_name \
             ORDER BY c.ordinal_position ASC"
        )
    }
}

/// Run the column query, falling back to plainer variants on known
/// catalog incompatibilities.
async fn query_columns<C: Connection + ?Sized>(
    conn: &C,
    filter_clause: &str,
    params: &[&str],
) -> Result<Vec<CatalogRow>> {
    let mut current = 0;
    loop {
        let sql = COLUMN_QUERIES[current].sql(filter_clause);
        let err = match conn.query(&sql, params).await {
            Ok(rows) => return Ok(rows),
            Err(err) => err,
        };

        let message = err.message();
        let next = COLUMN_QUERIES
            .iter()
            .enumerate()
            .skip(current + 1)
            .find(|(_, query)| query.retry_on.is_some_and(|token| message.contains(token)))
            .map(|(idx, _)| idx);

        match next {
            Some(idx) => {
                tracing::debug!(%message, variant = idx, "retrying column query");
                current = idx;
            }
            None => return Err(err),
        }
    }
}

/// Introspect the columns of `relation` in ordinal order.
///
/// Loads the schema's enum catalog for the duration of the call. Use
/// [`columns_with_enums`] to share one catalog across relations.
pub async fn columns<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    relation: &str,
    whitelist: &[String],
    blacklist: &[String],
) -> Result<Vec<Column>> {
    let enums = enum_types(conn, schema).await?;
    columns_with_enums(conn, schema, relation, whitelist, blacklist, &enums).await
}

/// Introspect the columns of `relation` against an already loaded enum
/// catalog.
pub async fn columns_with_enums<C: Connection + ?Sized>(
    conn: &C,
    schema: &str,
    relation: &str,
    whitelist: &[String],
    blacklist: &[String],
    enums: &EnumCatalog,
) -> Result<Vec<Column>> {
    let filter = ListFilter::columns(whitelist, blacklist, relation);
    let clause = filter.clause("c.column_name", 3);

    let mut params = vec![schema, relation];
    params.extend_from_slice(filter.params());

    let rows = query_columns(conn, &clause, &params).await?;
    rows.iter()
        .map(|row| column_from_row(row, schema, relation, enums))
        .collect()
}

fn column_from_row(
    row: &CatalogRow,
    schema: &str,
    relation: &str,
    enums: &EnumCatalog,
) -> Result<Column> {
    let name = row.text(0)?;
    let ordinal = row.int(1)?;
    let raw_type = row.text(2)?;
    let default = row.opt_text(3)?;
    let nullable = row.bool(4)?;
    let unique = row.bool(5)?;

    let default = match default {
        None if nullable => Some(NULL_DEFAULT.to_string()),
        default => default,
    };

    let mut db_type = normalize_type(&raw_type);
    let mut array_type = None;
    if let Some(element) = array_element(&db_type) {
        array_type = Some(element.to_string());
        db_type = ARRAY_MARKER.to_string();
    }

    let type_desc = classify_type(&db_type, nullable, array_type.as_deref(), enums, schema)
        .map_err(|source| Error::Classify {
            relation: relation.to_string(),
            column: name.clone(),
            source,
        })?;

    // db_type carries enums to the generator as markers
    if let Some(enum_type) = type_desc.enum_type() {
        db_type = enum_type.marker();
    }

    Ok(Column {
        name,
        ordinal,
        raw_type,
        db_type,
        type_desc,
        host_type: None,
        nullable,
        unique,
        default,
        array_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassifyError;
    use crate::fake::{ScriptedConn, row};
    use crate::query::Value;
    use boilroach_db_schema::{EnumType, TypeDescriptor, TypeKind};

    fn column_row(
        name: &str,
        ordinal: i64,
        data_type: &str,
        default: Option<&str>,
        nullable: bool,
        unique: bool,
    ) -> CatalogRow {
        row([
            ("column_name", name.into()),
            ("ordinal_position", ordinal.into()),
            ("data_type", data_type.into()),
            ("column_default", default.into()),
            ("is_nullable", nullable.into()),
            ("is_unique", unique.into()),
        ])
    }

    fn mood_catalog() -> EnumCatalog {
        [EnumType::new("mood", vec!["happy".to_string(), "sad".to_string()])]
            .into_iter()
            .collect()
    }

    async fn introspect(conn: &ScriptedConn) -> Vec<Column> {
        columns_with_enums(conn, "public", "users", &[], &[], &mood_catalog())
            .await
            .unwrap()
    }

    #[test]
    fn test_primary_query_shape() {
        insta::assert_snapshot!(COLUMN_QUERIES[0].sql(""), @"SELECT DISTINCT c.column_name, c.ordinal_position, max(c.crdb_sql_type) AS data_type, max(c.column_default) AS column_default, bool_or(CASE WHEN c.is_nullable = 'NO' THEN false ELSE true END) AS is_nullable, bool_or(CASE WHEN pc.count < 2 AND pgc.contype IN ('p', 'u') THEN true ELSE false END) AS is_unique FROM information_schema.columns AS c LEFT JOIN (SELECT DISTINCT c.column_name, pgc.conname AS conname, pgc.contype AS contype FROM information_schema.columns AS c LEFT JOIN information_schema.key_column_usage AS kcu ON c.table_name = kcu.table_name AND c.table_schema = kcu.table_schema AND c.column_name = kcu.column_name LEFT JOIN pg_constraint AS pgc ON kcu.constraint_name = pgc.conname WHERE c.table_schema = $1 AND c.table_name = $2) AS pgc ON c.column_name = pgc.column_name LEFT JOIN (SELECT kcu.table_schema, kcu.table_name, kcu.constraint_name, count(*) FROM information_schema.key_column_usage AS kcu GROUP BY kcu.table_schema, kcu.table_name, kcu.constraint_name) AS pc ON c.table_schema = pc.table_schema AND c.table_name = pc.table_name AND pgc.conname = pc.constraint_name WHERE c.table_schema = $1 AND c.table_name = $2 AND c.is_hidden = 'NO' GROUP BY c.ordinal_position, c.column_name ORDER BY c.ordinal_position ASC");
    }

    #[tokio::test]
    async fn test_basic_columns() {
        let conn = ScriptedConn::new().respond(
            "information_schema.columns",
            vec![
                column_row("id", 1, "INT8", Some("unique_rowid()"), false, true),
                column_row("email", 2, "STRING(255)", None, false, true),
                column_row("bio", 3, "STRING", None, true, false),
                column_row("score", 4, "DECIMAL(10,2)", Some("0"), true, false),
            ],
        );

        let cols = introspect(&conn).await;
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "bio", "score"]);

        assert_eq!(cols[0].db_type, "int8");
        assert_eq!(cols[0].default.as_deref(), Some("unique_rowid()"));
        assert!(cols[0].unique);
        assert_eq!(cols[0].type_desc, TypeDescriptor::plain(TypeKind::Int { bits: 64 }));

        assert_eq!(cols[1].raw_type, "STRING(255)");
        assert_eq!(cols[1].db_type, "string");
        assert_eq!(cols[1].default, None);

        // nullable without default reports a NULL default
        assert_eq!(cols[2].default.as_deref(), Some("NULL"));
        assert!(cols[2].type_desc.nullable);

        // an explicit default is kept as is
        assert_eq!(cols[3].default.as_deref(), Some("0"));
        assert_eq!(cols[3].db_type, "decimal");

        let executed = conn.executed();
        let (_, params) = &executed[0];
        assert_eq!(params, &vec!["public".to_string(), "users".to_string()]);
    }

    #[tokio::test]
    async fn test_array_columns() {
        let conn = ScriptedConn::new().respond(
            "information_schema.columns",
            vec![
                column_row("tags", 1, "STRING[]", None, true, false),
                column_row("scores", 2, "INT8[]", None, false, false),
            ],
        );

        let cols = introspect(&conn).await;
        assert_eq!(cols[0].db_type, "array");
        assert_eq!(cols[0].array_type.as_deref(), Some("string"));
        assert!(cols[0].is_array());
        assert_eq!(
            cols[0].type_desc.element(),
            Some(&TypeDescriptor::plain(TypeKind::Text))
        );
        assert_eq!(cols[1].array_type.as_deref(), Some("int8"));
        assert!(!cols[1].type_desc.nullable);
    }

    #[tokio::test]
    async fn test_enum_columns() {
        let conn = ScriptedConn::new().respond(
            "information_schema.columns",
            vec![
                column_row("mood", 1, "public.mood", None, false, false),
                column_row("moods", 2, "public.mood[]", None, true, false),
                column_row("elsewhere", 3, "other.mood", None, false, false),
            ],
        );

        let cols = introspect(&conn).await;
        assert_eq!(cols[0].db_type, "enum.mood('happy','sad')");
        assert_eq!(cols[0].type_desc.enum_type().map(|e| e.name.as_str()), Some("mood"));

        assert_eq!(cols[1].db_type, "array");
        assert_eq!(cols[1].array_type.as_deref(), Some("public.mood"));
        assert!(cols[1].type_desc.element().and_then(|e| e.enum_type()).is_some());

        assert_eq!(cols[2].db_type, "other.mood");
        assert!(matches!(cols[2].type_desc.kind, TypeKind::Unknown { .. }));
    }

    #[tokio::test]
    async fn test_enum_identity_comes_from_catalog() {
        let catalog: EnumCatalog = [
            EnumType::new("my$mood", vec!["happy".to_string()]),
            EnumType::new("quote", vec!["a','b".to_string(), "c".to_string()]),
        ]
        .into_iter()
        .collect();
        let conn = ScriptedConn::new().respond(
            "information_schema.columns",
            vec![
                column_row("m", 1, "public.my$mood", None, false, false),
                column_row("q", 2, "public.quote", None, true, false),
            ],
        );

        let cols = columns_with_enums(&conn, "public", "users", &[], &[], &catalog)
            .await
            .unwrap();

        assert_eq!(cols[0].db_type, "enum.my$mood('happy')");
        assert_eq!(
            cols[0].type_desc.kind,
            TypeKind::Enum(EnumType::new("my$mood", vec!["happy".to_string()]))
        );

        assert_eq!(
            cols[1].type_desc.enum_type().map(|e| e.values.clone()),
            Some(vec!["a','b".to_string(), "c".to_string()])
        );
        assert!(cols[1].type_desc.nullable);
    }

    #[tokio::test]
    async fn test_falls_back_to_data_type() {
        let conn = ScriptedConn::new()
            .fail("max(c.crdb_sql_type)", r#"column "crdb_sql_type" does not exist"#)
            .respond(
                "max(c.data_type)",
                vec![column_row("id", 1, "bigint", None, false, true)],
            );

        let cols = introspect(&conn).await;
        assert_eq!(cols[0].db_type, "bigint");

        let sql = conn.executed_sql();
        assert_eq!(sql.len(), 2);
        assert!(sql[1].contains("max(c.data_type)"));
        assert!(sql[1].contains("c.is_hidden = 'NO'"));
    }

    #[tokio::test]
    async fn test_falls_back_twice() {
        let conn = ScriptedConn::new()
            .fail("max(c.crdb_sql_type)", r#"column "crdb_sql_type" does not exist"#)
            .fail("c.is_hidden", r#"column "is_hidden" does not exist"#)
            .respond(
                "max(c.data_type)",
                vec![column_row("id", 1, "bigint", None, false, true)],
            );

        let cols = introspect(&conn).await;
        assert_eq!(cols.len(), 1);

        let sql = conn.executed_sql();
        assert_eq!(sql.len(), 3);
        assert!(!sql[2].contains("is_hidden"));
        assert!(conn.unused().is_empty());
    }

    #[tokio::test]
    async fn test_hidden_error_skips_straight_to_last_variant() {
        let conn = ScriptedConn::new()
            .fail("max(c.crdb_sql_type)", r#"column "is_hidden" does not exist"#)
            .respond("max(c.data_type)", Vec::new());

        introspect(&conn).await;

        let sql = conn.executed_sql();
        assert_eq!(sql.len(), 2);
        assert!(!sql[1].contains("is_hidden"));
    }

    #[tokio::test]
    async fn test_unrelated_errors_are_not_retried() {
        let conn = ScriptedConn::new().fail("information_schema.columns", "relation does not exist");

        let err = columns_with_enums(&conn, "public", "users", &[], &[], &EnumCatalog::new())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "relation does not exist");
        assert_eq!(conn.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_column_filter_params() {
        let conn = ScriptedConn::new().respond("information_schema.columns", Vec::new());
        let blacklist = vec!["users.password".to_string(), "*.secret".to_string(), "posts.body".to_string()];

        columns_with_enums(&conn, "public", "users", &[], &blacklist, &EnumCatalog::new())
            .await
            .unwrap();

        let executed = conn.executed();
        let (sql, params) = &executed[0];
        assert!(sql.contains("AND c.table_name = $2 AND c.column_name NOT IN ($3,$4) AND c.is_hidden"));
        assert_eq!(params[2..], ["password".to_string(), "secret".to_string()]);
    }

    #[tokio::test]
    async fn test_array_without_element_is_fatal() {
        let conn = ScriptedConn::new()
            .fail("max(c.crdb_sql_type)", r#"column "crdb_sql_type" does not exist"#)
            .respond(
                "max(c.data_type)",
                vec![column_row("tags", 1, "ARRAY", None, true, false)],
            );

        let err = columns_with_enums(&conn, "public", "posts", &[], &[], &EnumCatalog::new())
            .await
            .unwrap_err();
        match err {
            Error::Classify { relation, column, source } => {
                assert_eq!(relation, "posts");
                assert_eq!(column, "tags");
                assert!(matches!(source, ClassifyError::MissingArrayElement { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_columns_loads_enums() {
        let conn = ScriptedConn::new()
            .respond(
                "SHOW ENUMS",
                vec![row([
                    ("schema", "public".into()),
                    ("name", "mood".into()),
                    ("values", Value::TextArray(vec!["ok".to_string()])),
                ])],
            )
            .respond(
                "information_schema.columns",
                vec![column_row("mood", 1, "PUBLIC.MOOD", None, false, false)],
            );

        let cols = columns(&conn, "public", "users", &[], &[]).await.unwrap();
        assert_eq!(cols[0].db_type, "enum.mood('ok')");
    }
}
